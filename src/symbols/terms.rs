//  TERMS.rs
//    by Lut99
//
//  Created:
//    18 Mar 2025, 10:31:47
//  Last edited:
//    09 Jul 2025, 14:02:19
//  Auto updated?
//    Yes
//
//  Description:
//!   Objects, variables, terms, and the scoped term tables.
//!
//!   A [`TermTable`] holds the objects declared in one scope; a problem-level table extends
//!   the domain-level one through a parent pointer, so object handles are unique across the
//!   chain. `compatible_objects` is the grounding engine's hot path and is cached per table.
//

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FResult};
use std::rc::Rc;

use super::types::{Type, TypeTable};


/***** LIBRARY *****/
/// A handle to a named domain individual.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Object(pub(crate) usize);

/// A handle to an anonymous parameter slot, scoped to the schema or quantifier that
/// introduced it.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Variable(pub(crate) usize);

/// A term is either an object or a variable; the two never alias.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Term {
    /// A named domain individual.
    Object(Object),
    /// A parameter slot.
    Variable(Variable),
}
impl Term {
    /// Returns whether this term is an object.
    #[inline]
    pub fn is_object(&self) -> bool { matches!(self, Self::Object(_)) }

    /// Returns the variable inside, if this term is one.
    #[inline]
    pub fn as_variable(&self) -> Option<Variable> {
        match self {
            Self::Variable(var) => Some(*var),
            Self::Object(_) => None,
        }
    }

    /// Returns a formatter that resolves this term's name in the given table.
    #[inline]
    pub fn display<'a>(&'a self, terms: &'a TermTable<'a>) -> impl Display + 'a { DisplayTerm { term: *self, terms } }
}
impl From<Object> for Term {
    #[inline]
    fn from(value: Object) -> Self { Self::Object(value) }
}
impl From<Variable> for Term {
    #[inline]
    fn from(value: Variable) -> Self { Self::Variable(value) }
}

/// A binding of variables to objects, built up during grounding.
pub type Substitution = BTreeMap<Variable, Object>;



/// The objects and variables of one scope, optionally extending a parent scope.
#[derive(Debug, Default)]
pub struct TermTable<'a> {
    /// The table this one extends (domain-level, for a problem-level table).
    parent: Option<&'a TermTable<'a>>,
    /// The number of objects in all ancestor tables.
    object_offset: usize,
    /// The number of variables in all ancestor tables.
    variable_offset: usize,
    /// The names of this table's own objects.
    names: Vec<String>,
    /// Map from name to object handle for this table's own objects.
    objects: BTreeMap<String, Object>,
    /// The types of this table's own objects.
    object_types: Vec<Type>,
    /// The types of this table's own variables.
    variable_types: Vec<Type>,
    /// Cache for [`compatible_objects`](TermTable::compatible_objects).
    compatible: RefCell<BTreeMap<Type, Rc<Vec<Object>>>>,
}

// Constructors
impl<'a> TermTable<'a> {
    /// Constructs an empty root table.
    #[inline]
    pub fn new() -> Self { Self::default() }

    /// Constructs an empty table extending the given parent.
    #[inline]
    pub fn with_parent(parent: &'a TermTable<'a>) -> Self {
        Self {
            parent: Some(parent),
            object_offset: parent.total_objects(),
            variable_offset: parent.total_variables(),
            ..Self::default()
        }
    }
}

// Table management
impl<'a> TermTable<'a> {
    /// The total number of objects in this table and its ancestors.
    #[inline]
    pub fn total_objects(&self) -> usize { self.object_offset + self.names.len() }

    /// The total number of variables in this table and its ancestors.
    #[inline]
    pub fn total_variables(&self) -> usize { self.variable_offset + self.variable_types.len() }

    /// Adds an object with the given name and type, or returns the existing one with that
    /// name in this scope.
    pub fn add_object(&mut self, name: impl Into<String>, ty: Type) -> Object {
        let name: String = name.into();
        if let Some(object) = self.objects.get(&name) {
            return *object;
        }
        let object: Object = Object(self.total_objects());
        self.names.push(name.clone());
        self.objects.insert(name, object);
        self.object_types.push(ty);
        self.compatible.borrow_mut().clear();
        object
    }

    /// Returns the object with the given name, searching ancestors too.
    pub fn find_object(&self, name: &str) -> Option<Object> {
        match self.objects.get(name) {
            Some(object) => Some(*object),
            None => self.parent.and_then(|parent| parent.find_object(name)),
        }
    }

    /// Adds a variable with the given type.
    pub fn add_variable(&mut self, ty: Type) -> Variable {
        self.variable_types.push(ty);
        Variable(self.total_variables() - 1)
    }

    /// Returns the type of the given term.
    pub fn type_of(&self, term: Term) -> Type {
        match term {
            Term::Object(Object(i)) => {
                if i < self.object_offset {
                    match self.parent {
                        Some(parent) => parent.type_of(term),
                        None => Type::OBJECT,
                    }
                } else {
                    self.object_types[i - self.object_offset]
                }
            },
            Term::Variable(Variable(i)) => {
                if i < self.variable_offset {
                    match self.parent {
                        Some(parent) => parent.type_of(term),
                        None => Type::OBJECT,
                    }
                } else {
                    self.variable_types[i - self.variable_offset]
                }
            },
        }
    }

    /// Returns the name of the given object.
    pub fn name_of(&self, object: Object) -> &str {
        if object.0 < self.object_offset {
            match self.parent {
                Some(parent) => parent.name_of(object),
                None => "?",
            }
        } else {
            &self.names[object.0 - self.object_offset]
        }
    }

    /// Returns all objects in scope whose type is a subtype of the given type.
    ///
    /// The result is cached per table; the cache is invalidated when an object is added.
    pub fn compatible_objects(&self, types: &TypeTable, ty: Type) -> Rc<Vec<Object>> {
        if let Some(objects) = self.compatible.borrow().get(&ty) {
            return objects.clone();
        }
        let mut objects: Vec<Object> = match self.parent {
            Some(parent) => parent.compatible_objects(types, ty).as_ref().clone(),
            None => Vec::new(),
        };
        for object in self.objects.values() {
            if types.subtype(self.object_types[object.0 - self.object_offset], ty) {
                objects.push(*object);
            }
        }
        let objects: Rc<Vec<Object>> = Rc::new(objects);
        self.compatible.borrow_mut().insert(ty, objects.clone());
        objects
    }
}

impl<'a> Display for TermTable<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        if let Some(parent) = self.parent {
            parent.fmt(f)?;
        }
        for object in self.objects.values() {
            write!(f, "\n  {}", self.name_of(*object))?;
        }
        Ok(())
    }
}



/// Formats a [`Term`] by resolving its name in a [`TermTable`].
struct DisplayTerm<'a> {
    term: Term,
    terms: &'a TermTable<'a>,
}
impl<'a> Display for DisplayTerm<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self.term {
            Term::Object(object) => write!(f, "{}", self.terms.name_of(object)),
            Term::Variable(Variable(i)) => write!(f, "?v{}", i + 1),
        }
    }
}





/***** TESTS *****/

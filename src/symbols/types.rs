//  TYPES.rs
//    by Lut99
//
//  Created:
//    18 Mar 2025, 10:09:31
//  Last edited:
//    09 Jul 2025, 13:51:02
//  Auto updated?
//    Yes
//
//  Description:
//!   The type table and the subtype lattice.
//!
//!   Simple types are interned by name; union ("either") types are stored as explicit
//!   component sets. The transitive closure of the subtype relation over simple types
//!   lives in a triangular boolean matrix: adding a type costs one new row, adding a
//!   supertype edge closes over all existing sub/super relations.
//

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FResult};

use indexmap::IndexMap;

use crate::errors::{Error, Result};


/***** LIBRARY *****/
/// Name of the universal object type.
pub const OBJECT_NAME: &str = "object";
/// Name of the (reserved) number type used by fluents.
pub const NUMBER_NAME: &str = "number";



/// A handle to a type: either a simple named type or a union of simple types.
///
/// Simple index 0 is the distinguished universal [`OBJECT`](Type::OBJECT) type; simple
/// indices 1 and up point into the table's name list. Union indices point into the table's
/// component-set list.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Type {
    /// A simple named type.
    Simple(usize),
    /// A union ("either") of simple types.
    Union(usize),
}
impl Type {
    /// The universal type, supertype of every simple type.
    pub const OBJECT: Self = Self::Simple(0);

    /// Returns whether this is a simple (non-union) type.
    #[inline]
    pub fn simple(&self) -> bool { matches!(self, Self::Simple(_)) }

    /// Returns a formatter that resolves this type's name(s) in the given table.
    #[inline]
    pub fn display<'a>(&'a self, types: &'a TypeTable) -> impl Display + 'a { DisplayType { ty: *self, types } }
}



/// The table of all declared types and their subtype relation.
#[derive(Clone, Debug, Default)]
pub struct TypeTable {
    /// Map from name to simple type, in declaration order. [`OBJECT`](Type::OBJECT) is not listed.
    types: IndexMap<String, Type>,
    /// Names of the simple types; `Type::Simple(i)` with `i >= 1` is `names[i - 1]`.
    names: Vec<String>,
    /// Transitive closure of the subtype relation over simple types, as a triangular matrix.
    ///
    /// The row for type `i` (added at `i >= 2`) has `2 * (i - 1)` cells. For simple types
    /// `t1 > t2` the cell is `subtype[t1 - 2][2 * t1 - t2 - 2]`, else `subtype[t2 - 2][t1 - 1]`.
    subtype: Vec<Vec<bool>>,
    /// The component sets of union types; `Type::Union(i)` is `utypes[i]`.
    utypes: Vec<BTreeSet<Type>>,
}

// Constructors
impl TypeTable {
    /// Constructs an empty type table.
    #[inline]
    pub fn new() -> Self { Self::default() }
}

// Table management
impl TypeTable {
    /// Adds a simple type with the given name, or returns the existing one.
    pub fn add_type(&mut self, name: impl Into<String>) -> Type {
        let name: String = name.into();
        if let Some(ty) = self.types.get(&name) {
            return *ty;
        }
        self.names.push(name.clone());
        let index: usize = self.names.len();
        if index > 1 {
            self.subtype.push(vec![false; 2 * (index - 1)]);
        }
        let ty: Type = Type::Simple(index);
        self.types.insert(name, ty);
        ty
    }

    /// Returns the type with the given name, if it was declared.
    #[inline]
    pub fn find_type(&self, name: &str) -> Option<Type> {
        if name == OBJECT_NAME { Some(Type::OBJECT) } else { self.types.get(name).copied() }
    }

    /// Adds a union type over the given component types.
    ///
    /// A singleton union collapses to its only component.
    ///
    /// # Errors
    /// Fails with [`Error::EmptyUnionType`] if `types` is empty.
    pub fn union_type(&mut self, types: BTreeSet<Type>) -> Result<Type> {
        if types.is_empty() {
            Err(Error::EmptyUnionType)
        } else if types.len() == 1 {
            Ok(*types.iter().next().ok_or(Error::EmptyUnionType)?)
        } else {
            self.utypes.push(types);
            Ok(Type::Union(self.utypes.len() - 1))
        }
    }

    /// Makes `type2` a supertype of `type1`, closing the subtype relation transitively.
    ///
    /// # Returns
    /// False if `type2` is already a subtype of `type1` (the edge would create a cycle, and
    /// is not added); true otherwise.
    pub fn add_supertype(&mut self, type1: Type, type2: Type) -> bool {
        if let Type::Union(u) = type2 {
            // Add all component types as supertypes instead.
            let components: Vec<Type> = self.utypes[u].iter().copied().collect();
            for ty in components {
                if !self.add_supertype(type1, ty) {
                    return false;
                }
            }
            true
        } else if self.subtype(type1, type2) {
            true
        } else if self.subtype(type2, type1) {
            false
        } else {
            // Make all subtypes of type1 subtypes of all supertypes of type2.
            let n: usize = self.names.len();
            for k in 1..=n {
                if self.subtype(Type::Simple(k), type1) && !self.subtype(Type::Simple(k), type2) {
                    for l in 1..=n {
                        if self.subtype(type2, Type::Simple(l)) {
                            if k > l {
                                self.subtype[k - 2][2 * k - l - 2] = true;
                            } else {
                                self.subtype[l - 2][k - 1] = true;
                            }
                        }
                    }
                }
            }
            true
        }
    }

    /// Tests whether `type1` is a subtype of `type2`.
    pub fn subtype(&self, type1: Type, type2: Type) -> bool {
        if type1 == type2 {
            return true;
        }
        match (type1, type2) {
            // Every component of a union must be a subtype of the right-hand side.
            (Type::Union(u), _) => self.utypes[u].iter().all(|ty| self.subtype(*ty, type2)),
            // The left-hand side must be a subtype of some component.
            (_, Type::Union(u)) => self.utypes[u].iter().any(|ty| self.subtype(type1, *ty)),
            (Type::Simple(i1), Type::Simple(i2)) => {
                if type1 == Type::OBJECT {
                    false
                } else if type2 == Type::OBJECT {
                    true
                } else if i2 < i1 {
                    self.subtype[i1 - 2][2 * i1 - i2 - 2]
                } else {
                    self.subtype[i2 - 2][i1 - 1]
                }
            },
        }
    }

    /// Returns the simple component types of the given type (empty for OBJECT).
    pub fn components(&self, ty: Type) -> BTreeSet<Type> {
        match ty {
            Type::Union(u) => self.utypes[u].clone(),
            Type::OBJECT => BTreeSet::new(),
            simple => BTreeSet::from([simple]),
        }
    }

    /// Returns the name of the given simple type.
    pub fn name_of(&self, ty: Type) -> &str {
        match ty {
            Type::OBJECT => OBJECT_NAME,
            Type::Simple(i) => &self.names[i - 1],
            Type::Union(_) => "either",
        }
    }
}

impl Display for TypeTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        for ty in self.types.values() {
            write!(f, "\n  {}", ty.display(self))?;
            let mut first: bool = true;
            for other in self.types.values() {
                if ty != other && self.subtype(*ty, *other) {
                    if first {
                        write!(f, " <:")?;
                        first = false;
                    }
                    write!(f, " {}", other.display(self))?;
                }
            }
        }
        Ok(())
    }
}



/// Formats a [`Type`] by resolving its name(s) in a [`TypeTable`].
struct DisplayType<'a> {
    ty: Type,
    types: &'a TypeTable,
}
impl<'a> Display for DisplayType<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self.ty {
            Type::Union(u) => {
                write!(f, "(either")?;
                for ty in &self.types.utypes[u] {
                    write!(f, " {}", self.types.name_of(*ty))?;
                }
                write!(f, ")")
            },
            simple => write!(f, "{}", self.types.name_of(simple)),
        }
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_reflexive_and_object_top() {
        let mut table: TypeTable = TypeTable::new();
        let vehicle: Type = table.add_type("vehicle");
        let truck: Type = table.add_type("truck");
        let city: Type = table.add_type("city");
        for ty in [Type::OBJECT, vehicle, truck, city] {
            assert!(table.subtype(ty, ty));
        }
        for ty in [vehicle, truck, city] {
            assert!(table.subtype(ty, Type::OBJECT));
            assert!(!table.subtype(Type::OBJECT, ty));
        }
    }

    #[test]
    fn test_supertype_transitive_closure() {
        let mut table: TypeTable = TypeTable::new();
        let vehicle: Type = table.add_type("vehicle");
        let truck: Type = table.add_type("truck");
        let dumper: Type = table.add_type("dumper");
        assert!(table.add_supertype(truck, vehicle));
        assert!(table.add_supertype(dumper, truck));
        assert!(table.subtype(dumper, vehicle), "closure missed dumper <: vehicle");
        assert!(table.subtype(truck, vehicle));
        assert!(!table.subtype(vehicle, truck));
    }

    #[test]
    fn test_supertype_cycle_rejected() {
        let mut table: TypeTable = TypeTable::new();
        let a: Type = table.add_type("a");
        let b: Type = table.add_type("b");
        let c: Type = table.add_type("c");
        assert!(table.add_supertype(a, b));
        assert!(table.add_supertype(b, c));
        assert!(!table.add_supertype(c, a), "cycle c <: a <: b <: c accepted");
        // And the lattice is not corrupted
        assert!(table.subtype(a, c));
        assert!(!table.subtype(c, a));
    }

    #[test]
    fn test_union_types() {
        let mut table: TypeTable = TypeTable::new();
        let truck: Type = table.add_type("truck");
        let plane: Type = table.add_type("plane");
        let boat: Type = table.add_type("boat");

        assert!(table.union_type(BTreeSet::new()).is_err());
        assert_eq!(table.union_type(BTreeSet::from([truck])).unwrap(), truck);

        let mover: Type = table.union_type(BTreeSet::from([truck, plane])).unwrap();
        assert!(!mover.simple());
        assert!(table.subtype(truck, mover));
        assert!(table.subtype(plane, mover));
        assert!(!table.subtype(boat, mover));
        assert!(!table.subtype(mover, truck));
        assert!(table.subtype(mover, Type::OBJECT));
    }

    #[test]
    fn test_find_and_display() {
        let mut table: TypeTable = TypeTable::new();
        let truck: Type = table.add_type("truck");
        assert_eq!(table.add_type("truck"), truck);
        assert_eq!(table.find_type("truck"), Some(truck));
        assert_eq!(table.find_type(OBJECT_NAME), Some(Type::OBJECT));
        assert_eq!(table.find_type("boat"), None);
        assert_eq!(truck.display(&table).to_string(), "truck");
        assert_eq!(Type::OBJECT.display(&table).to_string(), "object");
    }
}

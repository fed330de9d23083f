//  PREDICATES.rs
//    by Lut99
//
//  Created:
//    18 Mar 2025, 11:02:33
//  Last edited:
//    20 Mar 2025, 17:15:48
//  Auto updated?
//    Yes
//
//  Description:
//!   The predicate table.
//!
//!   A predicate is static until some action effect adds or deletes one of its atoms;
//!   static predicates can be folded against the initial atom set at grounding time.
//

use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::types::Type;


/***** LIBRARY *****/
/// A handle to a declared predicate.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Predicate(pub(crate) usize);

/// The table of all declared predicates.
#[derive(Clone, Debug, Default)]
pub struct PredicateTable {
    /// Map from name to handle, in declaration order.
    predicates: IndexMap<String, Predicate>,
    /// The parameter-type list of every predicate, filled in incrementally.
    parameters: Vec<Vec<Type>>,
    /// The predicates no effect ever mentions. Every predicate starts here.
    statics: BTreeSet<Predicate>,
}

// Constructors
impl PredicateTable {
    /// Constructs an empty predicate table.
    #[inline]
    pub fn new() -> Self { Self::default() }
}

// Table management
impl PredicateTable {
    /// Adds a predicate with the given name (initially static, with no parameters), or
    /// returns the existing one.
    pub fn add_predicate(&mut self, name: impl Into<String>) -> Predicate {
        let name: String = name.into();
        if let Some(predicate) = self.predicates.get(&name) {
            return *predicate;
        }
        let predicate: Predicate = Predicate(self.parameters.len());
        self.predicates.insert(name, predicate);
        self.parameters.push(Vec::new());
        self.statics.insert(predicate);
        predicate
    }

    /// Returns the predicate with the given name, if it was declared.
    #[inline]
    pub fn find_predicate(&self, name: &str) -> Option<Predicate> { self.predicates.get(name).copied() }

    /// Appends a parameter type to the given predicate.
    #[inline]
    pub fn add_parameter(&mut self, predicate: Predicate, ty: Type) { self.parameters[predicate.0].push(ty); }

    /// Returns the parameter types of the given predicate.
    #[inline]
    pub fn parameters(&self, predicate: Predicate) -> &[Type] { &self.parameters[predicate.0] }

    /// Returns the name of the given predicate.
    pub fn name_of(&self, predicate: Predicate) -> &str {
        self.predicates.get_index(predicate.0).map(|(name, _)| name.as_str()).unwrap_or("?")
    }

    /// Marks the given predicate as mentioned by an effect (idempotent).
    #[inline]
    pub fn make_dynamic(&mut self, predicate: Predicate) { self.statics.remove(&predicate); }

    /// Returns whether no effect ever mentions the given predicate.
    #[inline]
    pub fn is_static(&self, predicate: Predicate) -> bool { self.statics.contains(&predicate) }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::types::TypeTable;

    #[test]
    fn test_predicate_table() {
        let mut types: TypeTable = TypeTable::new();
        let city: Type = types.add_type("city");

        let mut table: PredicateTable = PredicateTable::new();
        let at: Predicate = table.add_predicate("at");
        assert_eq!(table.add_predicate("at"), at);
        assert_eq!(table.find_predicate("at"), Some(at));
        assert_eq!(table.find_predicate("on"), None);
        assert_eq!(table.name_of(at), "at");

        table.add_parameter(at, city);
        table.add_parameter(at, city);
        assert_eq!(table.parameters(at), &[city, city]);
    }

    #[test]
    fn test_static_flag() {
        let mut table: PredicateTable = PredicateTable::new();
        let at: Predicate = table.add_predicate("at");
        let road: Predicate = table.add_predicate("road");
        assert!(table.is_static(at));
        assert!(table.is_static(road));
        table.make_dynamic(at);
        table.make_dynamic(at);
        assert!(!table.is_static(at));
        assert!(table.is_static(road));
    }
}

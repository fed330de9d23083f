//  FUNCTIONS.rs
//    by Lut99
//
//  Created:
//    18 Mar 2025, 11:14:09
//  Last edited:
//    20 Mar 2025, 17:16:30
//  Auto updated?
//    Yes
//
//  Description:
//!   The function table.
//!
//!   Functions name numeric state variables (fluents). Like predicates, a function is
//!   static until some effect updates one of its fluents; static fluents are folded into
//!   constants at grounding time.
//

use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::types::Type;


/***** LIBRARY *****/
/// A handle to a declared function.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Function(pub(crate) usize);

/// The table of all declared functions.
#[derive(Clone, Debug, Default)]
pub struct FunctionTable {
    /// Map from name to handle, in declaration order.
    functions: IndexMap<String, Function>,
    /// The parameter-type list of every function, filled in incrementally.
    parameters: Vec<Vec<Type>>,
    /// The functions no effect ever updates. Every function starts here.
    statics: BTreeSet<Function>,
}

// Constructors
impl FunctionTable {
    /// Constructs an empty function table.
    #[inline]
    pub fn new() -> Self { Self::default() }
}

// Table management
impl FunctionTable {
    /// Adds a function with the given name (initially static, with no parameters), or
    /// returns the existing one.
    pub fn add_function(&mut self, name: impl Into<String>) -> Function {
        let name: String = name.into();
        if let Some(function) = self.functions.get(&name) {
            return *function;
        }
        let function: Function = Function(self.parameters.len());
        self.functions.insert(name, function);
        self.parameters.push(Vec::new());
        self.statics.insert(function);
        function
    }

    /// Returns the function with the given name, if it was declared.
    #[inline]
    pub fn find_function(&self, name: &str) -> Option<Function> { self.functions.get(name).copied() }

    /// Appends a parameter type to the given function.
    #[inline]
    pub fn add_parameter(&mut self, function: Function, ty: Type) { self.parameters[function.0].push(ty); }

    /// Returns the parameter types of the given function.
    #[inline]
    pub fn parameters(&self, function: Function) -> &[Type] { &self.parameters[function.0] }

    /// Returns the name of the given function.
    pub fn name_of(&self, function: Function) -> &str {
        self.functions.get_index(function.0).map(|(name, _)| name.as_str()).unwrap_or("?")
    }

    /// Marks the given function as updated by an effect (idempotent).
    #[inline]
    pub fn make_dynamic(&mut self, function: Function) { self.statics.remove(&function); }

    /// Returns whether no effect ever updates the given function.
    #[inline]
    pub fn is_static(&self, function: Function) -> bool { self.statics.contains(&function) }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::types::TypeTable;

    #[test]
    fn test_function_table() {
        let mut types: TypeTable = TypeTable::new();
        let city: Type = types.add_type("city");

        let mut table: FunctionTable = FunctionTable::new();
        let fuel: Function = table.add_function("fuel");
        assert_eq!(table.add_function("fuel"), fuel);
        assert_eq!(table.find_function("fuel"), Some(fuel));
        assert_eq!(table.name_of(fuel), "fuel");
        table.add_parameter(fuel, city);
        assert_eq!(table.parameters(fuel), &[city]);

        assert!(table.is_static(fuel));
        table.make_dynamic(fuel);
        assert!(!table.is_static(fuel));
    }
}

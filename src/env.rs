//  ENV.rs
//    by Lut99
//
//  Created:
//    19 Mar 2025, 11:20:18
//  Last edited:
//    02 Jul 2025, 11:41:50
//  Auto updated?
//    Yes
//
//  Description:
//!   The explicit evaluation environment.
//!
//!   Formula and effect evaluation needs the symbol tables, the interners, and the atoms
//!   and fluent values they are evaluated against. Rather than keeping those in global
//!   tables, they are bundled here and passed by reference: the single-writer phase builds
//!   them, after which every reader shares them immutably.
//

use crate::expressions::{FluentTable, ValueMap};
use crate::formulas::{AtomSet, AtomTable};
use crate::symbols::{FunctionTable, PredicateTable, TermTable, TypeTable};


/***** LIBRARY *****/
/// The name-resolving subset of the environment, enough for formatting and type lookups.
#[derive(Clone, Copy, Debug)]
pub struct Names<'e> {
    /// The type table, with the subtype lattice.
    pub types: &'e TypeTable,
    /// The predicate table.
    pub predicates: &'e PredicateTable,
    /// The function table.
    pub functions: &'e FunctionTable,
    /// The term table of the current scope (problem-level, extending the domain's).
    pub terms: &'e TermTable<'e>,
}

/// Everything needed to instantiate or evaluate formulas, expressions, and effects.
#[derive(Clone, Copy, Debug)]
pub struct Env<'e> {
    /// The symbol tables.
    pub names: Names<'e>,
    /// The interner for ground atoms.
    pub atom_table: &'e AtomTable,
    /// The interner for ground fluents.
    pub fluent_table: &'e FluentTable,
    /// The atoms the evaluation runs against (initial atoms during grounding, the current
    /// state's atoms during simulation).
    pub atoms: &'e AtomSet,
    /// The fluent values the evaluation runs against.
    pub values: &'e ValueMap,
    /// Whether `atoms` describes a concrete state rather than just the initial atoms.
    ///
    /// When set, ground atoms of _dynamic_ predicates fold to constants too (used when a
    /// quantified formula is tested against a state); when unset, only static predicates
    /// fold (used during grounding, where dynamic atoms must survive as formulas).
    pub state: bool,
}
impl<'e> Env<'e> {
    /// Constructs a new Env from its parts.
    #[inline]
    pub fn new(
        names: Names<'e>,
        atom_table: &'e AtomTable,
        fluent_table: &'e FluentTable,
        atoms: &'e AtomSet,
        values: &'e ValueMap,
        state: bool,
    ) -> Self {
        Self { names, atom_table, fluent_table, atoms, values, state }
    }
}

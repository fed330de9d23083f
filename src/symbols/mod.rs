//  MOD.rs
//    by Lut99
//
//  Created:
//    18 Mar 2025, 10:04:55
//  Last edited:
//    20 Mar 2025, 16:40:12
//  Auto updated?
//    Yes
//
//  Description:
//!   The symbol tables: types (with the subtype lattice), predicates, functions, and terms
//!   (objects and variables).
//!
//!   All identities are small copyable handles into their owning table. The tables are
//!   explicit values (usually owned by a [`Domain`](crate::domains::Domain)) and are passed
//!   by reference wherever they are needed; nothing here is global.
//

// Declare the modules
pub mod functions;
pub mod predicates;
pub mod terms;
pub mod types;

// Bring the main types into the module root
pub use functions::{Function, FunctionTable};
pub use predicates::{Predicate, PredicateTable};
pub use terms::{Object, Substitution, Term, TermTable, Variable};
pub use types::{Type, TypeTable};

//  LIB.rs
//    by Lut99
//
//  Created:
//    18 Mar 2025, 09:55:41
//  Last edited:
//    16 Jul 2025, 11:52:20
//  Auto updated?
//    Yes
//
//  Description:
//!   A grounding and stochastic simulation core for typed, probabilistic
//!   planning domains.
//

// Declare modules
pub mod actions;
pub mod domains;
pub mod effects;
pub mod env;
pub mod errors;
pub mod expressions;
pub mod formulas;
pub mod planner;
pub mod problems;
pub mod rational;
pub mod states;
pub mod symbols;

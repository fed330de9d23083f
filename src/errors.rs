//  ERRORS.rs
//    by Lut99
//
//  Created:
//    18 Mar 2025, 09:41:26
//  Last edited:
//    02 Jul 2025, 11:08:54
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the crate-wide error type.
//!
//!   The core raises and propagates; it never logs-and-recovers. Catching and
//!   reporting is the responsibility of whatever drives the simulation.
//

use thiserror::Error;


/***** LIBRARY *****/
/// Convenience alias for a [`Result`](std::result::Result) over [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;



/// The ways in which grounding or simulation can fail.
///
/// Note that a precondition collapsing to the false sentinel during grounding is _not_ an
/// error; that is expected pruning control flow.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// A rational was constructed with a zero denominator, or a division by zero was attempted.
    #[error("division by zero")]
    DivisionByZero,
    /// A fluent's value was read (or arithmetically updated) before it was ever defined.
    #[error("undefined value of fluent {0}")]
    UndefinedValue(String),
    /// A malformed effect, e.g. probabilistic outcome weights summing above 1.
    #[error("inconsistent effect: {0}")]
    InconsistentEffect(String),
    /// A construct was evaluated in a context where only a closed subset is valid.
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),
    /// A string did not parse as a rational number.
    #[error("cannot parse {0:?} as a rational number")]
    InvalidRational(String),
    /// A union type was requested over zero component types.
    #[error("empty union type")]
    EmptyUnionType,
}

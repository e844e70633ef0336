//! Matching logic module
//!
//! Price-time priority: the crossing predicate decides whether the taker
//! trades at all, the recorder stamps what happened.

pub mod crossing;
pub(crate) mod executor;

pub use crossing::crosses;

//! Derived metrics over an article set.
//!
//! Pure, session-independent functions: sentiment aggregation and
//! follow-up question suggestion.

pub mod sentiment;
pub mod suggest;

pub use sentiment::{aggregate, label, percent};
pub use suggest::{suggest, MAX_SUGGESTIONS};

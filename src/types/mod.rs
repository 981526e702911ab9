//! Shared data structures for the composition optimization pipeline
//!
//! - `element`: ElementSymbol and the seven-slot ElementMap (Composition)
//! - `parameters`: per-element operating parameters of a grade
//! - `prediction`: per-element results, totals, and the full report

mod element;
mod parameters;
mod prediction;

pub use element::*;
pub use parameters::*;
pub use prediction::*;

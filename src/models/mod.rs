//! Models module for the content-model engine
//!
//! Occurrence bounds and the immutable compiled grammar shared by every
//! container tree.

pub mod bound;
pub mod grammar;

// Re-export commonly used types
pub use bound::{Bound, MaxOccurs};
pub use grammar::GrammarNode;

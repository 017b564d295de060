//! # Frontend Crate
//!
//! The `edge-frontend` crate assembles circuit artifacts for the `edge-witness` engine. Instead of
//! hand-writing template programs, circuits are declared through a typed builder and composed from
//! a library of standard gadgets.
//!
//! ## Modules
//!
//! - `builder`: `CircuitBuilder` and `TemplateBuilder`, which lay out signals and record template
//!   programs.
//! - `error`: Defines error types used throughout the crate.
//! - `gadgets`: Comparators, bit decomposition and array gadgets.
//! - `program`: Complete named circuits with sample inputs.
//! - `tests`: Contains tests for the named programs.

pub mod builder;
pub mod error;
pub mod gadgets;
pub mod program;

#[cfg(test)] mod tests;

pub use builder::{CircuitBuilder, TemplateBuilder};
pub use edge_witness::{Circuit, FieldElement, InputMap, WitnessCalculator};
pub use error::FrontendError;
pub use program::Program;

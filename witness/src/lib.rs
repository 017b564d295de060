//! # Witness Calculation
//!
//! `edge-witness` computes witnesses for compiled arithmetic circuits. A compiled [`Circuit`] is
//! a set of templates, each a signal layout plus a small statement program, instantiated into a
//! tree of components rooted at `main`. Given values for main's inputs,
//! [`WitnessCalculator::calculate`] assigns every signal of every component and checks every
//! constraint along the way.
//!
//! ## Modules
//!
//! - `field`: BN254 scalar field elements with the integer operations circuits use.
//! - `constants`: the circuit's literal pool.
//! - `arena`: flat signal storage shared by all components.
//! - `component`: per-instance bookkeeping and the "run when saturated" counter.
//! - `template`: the template program representation.
//! - `circuit`: the artifact, its validation and its JSON/binary forms.
//! - `fast_serde`: the binary artifact codec.
//! - `calculator`: the entry point and the resulting [`Witness`].
//! - `inputs`: parsing of named inputs.
//! - `config`: calculator settings.
//! - `error`: error types.
//!
//! Evaluation is single threaded. A [`WitnessCalculator`] holds only immutable data, so hosts
//! may compute several witnesses concurrently by sharing one calculator.

pub mod arena;
pub mod calculator;
pub mod circuit;
pub mod component;
pub mod config;
pub mod constants;
pub mod error;
mod evaluator;
pub mod fast_serde;
pub mod field;
pub mod inputs;
pub mod template;

pub use calculator::{Witness, WitnessCalculator};
pub use circuit::{Circuit, SignalInfo};
pub use config::CalculatorConfig;
pub use error::{Diagnostic, WitnessError};
pub use field::FieldElement;
pub use inputs::InputMap;

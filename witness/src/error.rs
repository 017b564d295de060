//! Error types for the `edge-witness` crate.
//!
//! [`WitnessError`] is the single error surfaced by circuit loading and witness calculation. Its
//! variants fall into three groups:
//!
//! - Infeasible witness: `ConstraintViolation` and `DivisionByZero`. The inputs admit no valid
//!   witness along the executed path. Both carry a [`Diagnostic`] naming the template, the
//!   statement and the chain of component names from `main` down to the failing instance.
//! - Broken artifact: `MalformedArtifact`, `IndexDefect`, `LoopLimit`. The compiled circuit is
//!   inconsistent, independent of the inputs.
//! - Bad inputs or I/O: `UnknownInput`, `MissingInput`, `InvalidInput`, `InputSize`, `Io`,
//!   `Serde`, `Bincode`, `SerdeByte`, `Field`.
use std::fmt;

use thiserror::Error;

use crate::fast_serde::SerdeByteError;

/// Errors raised by [`crate::field::FieldElement`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
  /// Division by the zero element
  #[error("division by zero")]
  DivisionByZero,

  /// A string that is not a decimal, hex or signed decimal integer
  #[error("cannot parse field element from {0:?}")]
  Parse(String),
}

/// Where a fatal statement failed: the template, the statement identifier within it and the
/// component names from the root down to the failing instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub template: String,
  pub line:     u32,
  pub trace:    Vec<String>,
}

impl Diagnostic {
  /// The component path, root first, joined with `/`.
  pub fn path(&self) -> String { self.trace.join("/") }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "template {} line {}. Followed trace of components: {}",
      self.template,
      self.line,
      self.path()
    )
  }
}

/// Represents the error conditions of circuit loading and witness calculation.
#[derive(Debug, Error)]
pub enum WitnessError {
  /// An asserted equality did not hold
  #[error("Failed assert in {0}")]
  ConstraintViolation(Diagnostic),

  /// A division by zero outside of a guarded branch
  #[error("Division by zero in {0}")]
  DivisionByZero(Diagnostic),

  /// A loop ran past the configured iteration limit
  #[error("Loop limit exceeded in {0}")]
  LoopLimit(Diagnostic),

  /// The circuit artifact is inconsistent
  #[error("Malformed circuit artifact: {0}")]
  MalformedArtifact(String),

  /// Internal bookkeeping went out of range
  #[error("Index defect: {0}")]
  IndexDefect(String),

  /// An input name that main does not declare
  #[error("Unknown input signal: {0}")]
  UnknownInput(String),

  /// A declared input that was not supplied
  #[error("Missing input signal: {0}")]
  MissingInput(String),

  /// An input value that is not a number, a numeric string or an array of those
  #[error("Invalid input {name}: {reason}")]
  InvalidInput { name: String, reason: String },

  /// An input supplied with the wrong number of values
  #[error("Input signal {name} expects {expected} values, got {actual}")]
  InputSize { name: String, expected: usize, actual: usize },

  /// The error is a `FieldError`
  #[error(transparent)]
  Field(#[from] FieldError),

  /// The error is a `std::io::Error`
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// The error is a `serde_json::Error`
  #[error(transparent)]
  Serde(#[from] serde_json::Error),

  /// The error is a `bincode::ErrorKind`
  #[error(transparent)]
  Bincode(#[from] Box<bincode::ErrorKind>),

  /// The error is a `SerdeByteError`
  #[error(transparent)]
  SerdeByte(#[from] SerdeByteError),
}

impl WitnessError {
  /// Whether the error means "no witness exists for these inputs" rather than a broken artifact
  /// or bad host input.
  pub fn is_infeasible(&self) -> bool {
    matches!(self, Self::ConstraintViolation(_) | Self::DivisionByZero(_))
  }

  /// The diagnostic context, for the variants that carry one.
  pub fn diagnostic(&self) -> Option<&Diagnostic> {
    match self {
      Self::ConstraintViolation(d) | Self::DivisionByZero(d) | Self::LoopLimit(d) => Some(d),
      _ => None,
    }
  }
}

//! Error type for the `edge-frontend` crate.
//!
//! This enum represents the various error conditions that can occur while assembling circuits
//! with the builder or running the bundled demo programs.
//!
//! The possible error variants include:
//!
//! - `Witness`: An error from the witness engine, including artifact validation.
//! - `Io`: Represents an I/O error.
//! - `Serde`: Represents a serialization or deserialization error.
//! - `Layout`: A signal or child declared out of order, or declared twice.
//! - `UnknownSignal`: A reference to a signal that a template does not declare.
//! - `Other`: Represents any other error with a custom error message.
use thiserror::Error;

/// Represents the various error conditions that can occur within the `frontend` crate.
#[derive(Debug, Error)]
pub enum FrontendError {
  /// The error is an `edge_witness::WitnessError`
  #[error(transparent)]
  Witness(#[from] edge_witness::WitnessError),

  /// The error is a `std::io::Error`
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// The error is a `serde_json::Error`
  #[error(transparent)]
  Serde(#[from] serde_json::Error),

  /// The error is a template layout violation
  #[error("Invalid layout in template {template}: {reason}")]
  Layout { template: String, reason: String },

  /// The error is a reference to an undeclared signal
  #[error("Template {template} has no signal named {signal}")]
  UnknownSignal { template: String, signal: String },

  /// The error is a custom error with a message
  #[error("Other error: {0}")]
  Other(String),
}

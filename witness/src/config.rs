//! Calculator settings.

use serde::{Deserialize, Serialize};

/// Knobs for [`crate::WitnessCalculator`]. Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
  /// Drop each child's metadata once its parent's program has finished.
  pub release_components: bool,
  /// Upper bound on the iterations of any single loop. `None` trusts the artifact.
  pub loop_limit:         Option<u64>,
}

impl Default for CalculatorConfig {
  fn default() -> Self { Self { release_components: true, loop_limit: None } }
}

impl CalculatorConfig {
  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> { serde_json::from_str(json) }
}

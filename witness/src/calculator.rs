//! Entry point: validated circuit in, witness out.

use std::{collections::BTreeMap, time::Instant};

use tracing::{debug, info};

use crate::{
  circuit::{Circuit, SignalInfo},
  config::CalculatorConfig,
  error::WitnessError,
  evaluator::Evaluator,
  field::FieldElement,
  inputs::InputMap,
};

/// Computes witnesses for one circuit. Each call to [`WitnessCalculator::calculate`] works on a
/// fresh arena and component table, so a calculator can be shared between threads.
#[derive(Debug, Clone)]
pub struct WitnessCalculator {
  circuit: Circuit,
  config:  CalculatorConfig,
}

impl WitnessCalculator {
  pub fn new(circuit: Circuit) -> Result<Self, WitnessError> {
    Self::with_config(circuit, CalculatorConfig::default())
  }

  pub fn with_config(circuit: Circuit, config: CalculatorConfig) -> Result<Self, WitnessError> {
    circuit.validate()?;
    Ok(Self { circuit, config })
  }

  pub fn circuit(&self) -> &Circuit { &self.circuit }

  pub fn config(&self) -> &CalculatorConfig { &self.config }

  /// Runs the component tree for `inputs`.
  ///
  /// Fails with [`WitnessError::ConstraintViolation`] or [`WitnessError::DivisionByZero`] when the
  /// inputs admit no witness, and with an input error before any computation when `inputs` does
  /// not match the main component's declared inputs.
  pub fn calculate(&self, inputs: &InputMap) -> Result<Witness, WitnessError> {
    self.check_inputs(inputs)?;
    let time = Instant::now();

    let mut evaluator = Evaluator::new(&self.circuit, &self.config);
    let main = evaluator.create_main()?;
    for info in &self.circuit.inputs {
      let values = inputs.get(&info.name).ok_or_else(|| WitnessError::MissingInput(info.name.clone()))?;
      evaluator.supply_main(main, info, values)?;
    }
    debug!(
      "{} components fired, {} still live before release",
      evaluator.fired(),
      evaluator.components().live()
    );
    if self.config.release_components {
      evaluator.release(main);
    }

    info!(
      "calculated witness of {} signals in {:?}",
      evaluator.arena().len(),
      time.elapsed()
    );
    Ok(Witness {
      values:      evaluator.into_arena().into_values(),
      outputs:     self.circuit.outputs.clone(),
      witness_map: self.circuit.witness_map.clone(),
    })
  }

  fn check_inputs(&self, inputs: &InputMap) -> Result<(), WitnessError> {
    if let Some(unknown) = inputs.keys().find(|name| self.circuit.input(name).is_none()) {
      return Err(WitnessError::UnknownInput(unknown.clone()));
    }
    for info in &self.circuit.inputs {
      let values = inputs.get(&info.name).ok_or_else(|| WitnessError::MissingInput(info.name.clone()))?;
      if values.len() != info.size {
        return Err(WitnessError::InputSize {
          name:     info.name.clone(),
          expected: info.size,
          actual:   values.len(),
        });
      }
    }
    Ok(())
  }
}

/// The fully assigned signal arena of one successful calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
  values:      Vec<FieldElement>,
  outputs:     Vec<SignalInfo>,
  witness_map: Option<Vec<usize>>,
}

impl Witness {
  /// Every arena slot, slot 0 (the constant one) included.
  pub fn values(&self) -> &[FieldElement] { &self.values }

  pub fn get(&self, index: usize) -> Option<FieldElement> { self.values.get(index).copied() }

  pub fn len(&self) -> usize { self.values.len() }

  pub fn is_empty(&self) -> bool { self.values.is_empty() }

  pub fn output(&self, name: &str) -> Option<&[FieldElement]> {
    self.outputs.iter().find(|info| info.name == name).map(|info| &self.values[info.range()])
  }

  pub fn outputs(&self) -> BTreeMap<String, Vec<FieldElement>> {
    self.outputs.iter().map(|info| (info.name.clone(), self.values[info.range()].to_vec())).collect()
  }

  /// The slots listed by the circuit's witness map, or the whole arena without one.
  pub fn exported(&self) -> Vec<FieldElement> {
    match &self.witness_map {
      Some(map) => map.iter().map(|&slot| self.values[slot]).collect(),
      None => self.values.clone(),
    }
  }

  pub fn to_json(&self) -> Result<String, WitnessError> { Ok(serde_json::to_string(&self.values)?) }

  pub fn into_values(self) -> Vec<FieldElement> { self.values }
}

//! Every named program must build a valid artifact and accept its own sample inputs.

use edge_witness::{fast_serde::FastSerde, WitnessCalculator};
use tracing_test::traced_test;

use super::*;

fn outputs(program: Program) -> Vec<u64> {
  let calculator = WitnessCalculator::new(program.build().unwrap()).unwrap();
  let witness = calculator.calculate(&program.sample_inputs()).unwrap();
  witness.outputs().values().flatten().map(FieldElement::to_u64).collect()
}

#[test]
#[traced_test]
fn sample_inputs_have_witnesses() {
  for program in Program::ALL {
    let circuit = program.build().unwrap();
    let calculator = WitnessCalculator::new(circuit).unwrap();
    calculator.calculate(&program.sample_inputs()).unwrap_or_else(|e| panic!("{program}: {e}"));
  }
  assert!(logs_contain("component fired"));
}

#[test]
fn sample_outputs() {
  assert_eq!(outputs(Program::IsZero), vec![1]);
  assert_eq!(outputs(Program::IsEqual), vec![1]);
  assert_eq!(outputs(Program::Num2Bits), vec![1, 0, 1, 0, 1, 1, 0, 1]);
  assert_eq!(outputs(Program::LessThan), vec![1]);
  assert_eq!(outputs(Program::InRange), vec![1]);
  assert_eq!(outputs(Program::Contains), vec![1]);
  // outputs are keyed by name: match, out
  assert_eq!(outputs(Program::SwitchArray), vec![1, 3, 4]);
  assert_eq!(outputs(Program::IsEqualArray), vec![1]);
  assert_eq!(outputs(Program::ArrayMul), vec![5, 12, 21, 32]);
  assert_eq!(outputs(Program::GenericArrayAdd), vec![11, 22, 33]);
  // accepted, in_range, member
  assert_eq!(outputs(Program::Classify), vec![1, 1, 1]);
}

#[test]
fn names_round_trip() {
  for program in Program::ALL {
    assert_eq!(program.name().parse::<Program>().unwrap(), program);
  }
  assert!("nope".parse::<Program>().is_err());
}

#[test]
fn artifacts_survive_binary_encoding() {
  for program in Program::ALL {
    let circuit = program.build().unwrap();
    let decoded = Circuit::from_bytes(&circuit.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, circuit, "{program}");
  }
}

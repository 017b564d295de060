use edge_frontend::Program;
use edge_witness::{CalculatorConfig, WitnessError};
use expect_test::expect;
use tracing_test::traced_test;

use super::*;

fn classify() -> WitnessCalculator { WitnessCalculator::new(Program::Classify.build().unwrap()).unwrap() }

#[test]
#[traced_test]
fn classify_reports_each_check() {
  let calc = classify();
  let cases: [(u64, [u64; 3]); 3] = [(65, [1, 1, 1]), (70, [0, 1, 0]), (40, [0, 0, 1])];
  for (value, [accepted, in_range, member]) in cases {
    let allowed: &[u64] = if value == 40 { &[40, 41, 42, 43] } else { &[65, 66, 67, 68] };
    let witness = run(&calc, &[("value", &[value]), ("range", &[48, 122]), ("allowed", allowed)]).unwrap();
    assert_eq!(output(&witness, "accepted"), vec![accepted], "{value}");
    assert_eq!(output(&witness, "in_range"), vec![in_range], "{value}");
    assert_eq!(output(&witness, "member"), vec![member], "{value}");
  }
  assert!(logs_contain("component fired: bounds"));
}

#[test]
#[traced_test]
fn out_of_width_values_fail_deep_in_the_tree() {
  let calc = classify();
  let err =
    run(&calc, &[("value", &[1000]), ("range", &[48, 122]), ("allowed", &[65, 66, 67, 68])]).unwrap_err();
  assert!(err.is_infeasible());
  expect!["Failed assert in template Num2Bits line 11. Followed trace of components: main/bounds/gte/lt/n2b"]
    .assert_eq(&err.to_string());
  assert!(logs_contain("failed assert"));
}

#[test]
fn component_counts() {
  // main, bounds, gte, lt, n2b, lte, lt, n2b, membership, 4 x (IsEqual, IsZero), someEqual
  assert_eq!(Program::Classify.build().unwrap().component_count, 1 + 7 + 1 + 8 + 1);
  assert_eq!(Program::SwitchArray.build().unwrap().component_count, 1 + 3 + 1 + 3 * 2 + 1);
}

#[test]
fn release_does_not_change_values() {
  let circuit = Program::SwitchArray.build().unwrap();
  let inputs = Program::SwitchArray.sample_inputs();
  let released = WitnessCalculator::new(circuit.clone()).unwrap().calculate(&inputs).unwrap();
  let config = CalculatorConfig { release_components: false, ..CalculatorConfig::default() };
  let kept = WitnessCalculator::with_config(circuit, config).unwrap().calculate(&inputs).unwrap();
  assert_eq!(released, kept);
}

#[test]
fn artifacts_round_trip_through_files() {
  let dir = tempfile::tempdir().unwrap();
  for (program, file) in [(Program::Contains, "contains.json"), (Program::Classify, "classify.bin")] {
    let circuit = program.build().unwrap();
    let path = dir.path().join(file);
    circuit.store(&path).unwrap();
    let loaded = edge_witness::Circuit::load(&path).unwrap();
    assert_eq!(loaded, circuit);
  }
}

#[test]
fn missing_inputs_are_rejected_before_running() {
  let err = run(&classify(), &[("value", &[1])]).unwrap_err();
  assert!(matches!(err, WitnessError::MissingInput(_)));
}

use edge_frontend::gadgets::*;
use edge_witness::WitnessError;
use tracing_test::traced_test;

use super::*;

#[test]
#[traced_test]
fn is_zero_sets_inverse() {
  let calc = calculator(is_zero);
  let zero = run(&calc, &[("in", &[0])]).unwrap();
  assert_eq!(output(&zero, "out"), vec![1]);

  let five = run(&calc, &[("in", &[5])]).unwrap();
  assert_eq!(output(&five, "out"), vec![0]);
  // signals: one, out, in, inv
  assert_eq!(five.get(3), FieldElement::from(5).inverse());
}

#[test]
fn is_equal() {
  let calc = calculator(edge_frontend::gadgets::is_equal);
  for (a, b) in [(0, 0), (3, 3), (3, 4), (9, 0)] {
    let witness = run(&calc, &[("in", &[a, b])]).unwrap();
    assert_eq!(output(&witness, "out"), vec![u64::from(a == b)], "{a} == {b}");
  }
}

#[test]
fn comparisons_are_exhaustively_correct() {
  let lt = calculator(|c| less_than(c, 4));
  let gte = calculator(|c| greater_eq_than(c, 4));
  let lte = calculator(|c| less_eq_than(c, 4));
  for a in 0..16u64 {
    for b in 0..16u64 {
      let pair: &[u64] = &[a, b];
      assert_eq!(output(&run(&lt, &[("in", pair)]).unwrap(), "out"), vec![u64::from(a < b)]);
      assert_eq!(output(&run(&gte, &[("in", pair)]).unwrap(), "out"), vec![u64::from(a >= b)]);
      assert_eq!(output(&run(&lte, &[("in", pair)]).unwrap(), "out"), vec![u64::from(a <= b)]);
    }
  }
}

#[test]
fn in_range_is_inclusive() {
  let calc = calculator(|c| in_range(c, 4));
  for value in 0..16u64 {
    let witness = run(&calc, &[("in", &[value]), ("range", &[3, 9])]).unwrap();
    assert_eq!(output(&witness, "out"), vec![u64::from((3..=9).contains(&value))], "{value}");
  }
}

#[test]
fn less_than_layout() {
  let calc = calculator(|c| less_than(c, 8));
  let circuit = calc.circuit();
  // one, out, in[2], n2b: out[9], in
  assert_eq!(circuit.signal_count, 14);
  assert_eq!(circuit.component_count, 2);
  assert_eq!(circuit.input("in").unwrap().offset, 2);
}

#[test]
fn less_than_rejects_wide_comparisons() {
  let calc = calculator(|c| less_than(c, 253));
  let err = run(&calc, &[("in", &[1, 2])]).unwrap_err();
  assert!(matches!(err, WitnessError::ConstraintViolation(ref d) if d.template == "LessThan"));
}

#[test]
fn contains() {
  let calc = calculator(|c| edge_frontend::gadgets::contains(c, 3));
  let cases: [(u64, [u64; 3], u64); 4] =
    [(5, [1, 5, 9], 1), (4, [1, 5, 9], 0), (7, [7, 7, 7], 1), (0, [0, 1, 2], 1)];
  for (value, array, expected) in cases {
    let witness = run(&calc, &[("in", &[value]), ("array", &array)]).unwrap();
    assert_eq!(output(&witness, "out"), vec![expected], "{value} in {array:?}");
  }
}

#[test]
fn switch_array_selects_matching_row() {
  let calc = calculator(|c| switch_array(c, 3, 2));
  let vals: &[u64] = &[1, 2, 3, 4, 5, 6];
  for (case, out, matched) in [(10, [1, 2], 1), (30, [5, 6], 1), (99, [0, 0], 0)] {
    let witness = run(&calc, &[("case", &[case]), ("branches", &[10, 20, 30]), ("vals", vals)]).unwrap();
    assert_eq!(output(&witness, "out"), out.to_vec(), "case {case}");
    assert_eq!(output(&witness, "match"), vec![matched], "case {case}");
  }
}

#[test]
fn is_equal_array() {
  let calc = calculator(|c| edge_frontend::gadgets::is_equal_array(c, 3));
  let same = run(&calc, &[("in", &[4, 5, 6, 4, 5, 6])]).unwrap();
  assert_eq!(output(&same, "out"), vec![1]);
  let differ = run(&calc, &[("in", &[4, 5, 6, 4, 0, 6])]).unwrap();
  assert_eq!(output(&differ, "out"), vec![0]);
}

#[test]
fn array_arithmetic() {
  let add = calculator(|c| generic_array_add(c, 3, 3));
  let witness = run(&add, &[("arrays", &[1, 2, 3, 10, 20, 30, 100, 200, 300])]).unwrap();
  assert_eq!(output(&witness, "out"), vec![111, 222, 333]);

  let scale = calculator(|c| scalar_array_mul(c, 3));
  let witness = run(&scale, &[("array", &[1, 2, 3]), ("scalar", &[7])]).unwrap();
  assert_eq!(output(&witness, "out"), vec![7, 14, 21]);

  let mul = calculator(|c| array_mul(c, 2));
  let witness = run(&mul, &[("lhs", &[3, 4]), ("rhs", &[5, 6])]).unwrap();
  assert_eq!(output(&witness, "out"), vec![15, 24]);
}

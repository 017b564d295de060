//! Hand-assembled circuits shared by the integration tests.
#![allow(dead_code)]

use edge_witness::{
  circuit::{Circuit, SignalInfo},
  constants::ConstantTable,
  template::{ChildGroup, ChildRef, Expr, Index, Instruction, Source, Target, Template},
  FieldElement,
};

pub const ZERO: usize = 0;
pub const ONE: usize = 1;

pub fn constants() -> ConstantTable { ConstantTable::new(vec![FieldElement::ZERO, FieldElement::ONE]) }

pub fn assign(signal: usize, expr: Expr, line: u32) -> Instruction {
  Instruction::Assign { dest: Target::Signal(Index::at(signal)), source: Source::Value(expr), line }
}

pub fn single(group: usize) -> ChildRef { ChildRef { group, element: Index::at(0) } }

/// `out = in == 0`, signals: out 0, in 1, inv 2.
pub fn is_zero() -> Template {
  Template {
    name:         "IsZero".into(),
    signal_count: 3,
    input_count:  1,
    local_count:  0,
    children:     vec![],
    program:      vec![
      Instruction::Branch {
        condition: Expr::signal(1).not_equals(Expr::Constant(ZERO)),
        then:      vec![assign(2, Expr::Constant(ONE).div(Expr::signal(1)), 30)],
        otherwise: vec![assign(2, Expr::Constant(ZERO), 30)],
        line:      30,
      },
      assign(0, -Expr::signal(1) * Expr::signal(2) + Expr::Constant(ONE), 32),
      Instruction::Assert {
        lhs:  Expr::signal(1) * Expr::signal(0),
        rhs:  Expr::Constant(ZERO),
        line: 33,
      },
    ],
  }
}

/// main(in) -> out, computed by one child of template `child`, signals: out 0, in 1, child at 2.
pub fn wrapper(child: usize, child_signals: usize) -> Template {
  Template {
    name:         "Main".into(),
    signal_count: 2 + child_signals,
    input_count:  1,
    local_count:  0,
    children:     vec![ChildGroup {
      name:          "isz".into(),
      template:      child,
      dims:          vec![],
      signal_offset: 2,
    }],
    program:      vec![
      Instruction::Create { group: 0, element: None },
      Instruction::Supply {
        child:  single(0),
        signal: Index::at(1),
        source: Source::Value(Expr::signal(1)),
        line:   12,
      },
      assign(0, Expr::child(single(0), 0), 13),
    ],
  }
}

pub fn io(templates: Vec<Template>, main: usize) -> Circuit {
  let main_signals = templates[main].signal_count;
  Circuit {
    signal_count: 1 + main_signals,
    component_count: 2,
    main,
    main_signal_start: 1,
    constants: constants(),
    templates,
    inputs: vec![SignalInfo { name: "in".into(), offset: 2, size: 1 }],
    outputs: vec![SignalInfo { name: "out".into(), offset: 1, size: 1 }],
    witness_map: None,
  }
}

/// The smallest two-template circuit: main wraps one IsZero.
pub fn is_zero_circuit() -> Circuit { io(vec![is_zero(), wrapper(0, 3)], 1) }

/// Main with no inputs whose only statement asserts `1 == 0`.
pub fn failing_circuit() -> Circuit {
  let main = Template {
    name:         "Fail".into(),
    signal_count: 1,
    input_count:  0,
    local_count:  0,
    children:     vec![],
    program:      vec![
      assign(0, Expr::Constant(ONE), 3),
      Instruction::Assert { lhs: Expr::Constant(ONE), rhs: Expr::Constant(ZERO), line: 4 },
    ],
  };
  Circuit {
    signal_count:      2,
    component_count:   1,
    main:              0,
    main_signal_start: 1,
    constants:         constants(),
    templates:         vec![main],
    inputs:            vec![],
    outputs:           vec![SignalInfo { name: "out".into(), offset: 1, size: 1 }],
    witness_map:       None,
  }
}

pub fn inputs(pairs: &[(&str, &[u64])]) -> edge_witness::InputMap {
  pairs
    .iter()
    .map(|(name, values)| (name.to_string(), values.iter().map(|&v| FieldElement::from(v)).collect()))
    .collect()
}

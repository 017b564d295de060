//! Ready-made circuits built from the gadget library.
//!
//! Every [`Program`] is a complete artifact with a main template, plus a sample input set that
//! yields a valid witness. The demo binary and the benchmarks draw their circuits from here.

use std::{fmt, str::FromStr};

use edge_witness::{template::TemplateId, Circuit, FieldElement, InputMap};
use tracing::debug;

use crate::{builder::CircuitBuilder, error::FrontendError, gadgets};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
  IsZero,
  IsEqual,
  Num2Bits,
  LessThan,
  InRange,
  Contains,
  SwitchArray,
  IsEqualArray,
  ArrayMul,
  GenericArrayAdd,
  Classify,
}

impl Program {
  pub const ALL: [Program; 11] = [
    Program::IsZero,
    Program::IsEqual,
    Program::Num2Bits,
    Program::LessThan,
    Program::InRange,
    Program::Contains,
    Program::SwitchArray,
    Program::IsEqualArray,
    Program::ArrayMul,
    Program::GenericArrayAdd,
    Program::Classify,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Program::IsZero => "is-zero",
      Program::IsEqual => "is-equal",
      Program::Num2Bits => "num2bits",
      Program::LessThan => "less-than",
      Program::InRange => "in-range",
      Program::Contains => "contains",
      Program::SwitchArray => "switch-array",
      Program::IsEqualArray => "is-equal-array",
      Program::ArrayMul => "array-mul",
      Program::GenericArrayAdd => "generic-array-add",
      Program::Classify => "classify",
    }
  }

  fn main(&self, c: &mut CircuitBuilder) -> Result<TemplateId, FrontendError> {
    match self {
      Program::IsZero => gadgets::is_zero(c),
      Program::IsEqual => gadgets::is_equal(c),
      Program::Num2Bits => gadgets::num2bits(c, 8),
      Program::LessThan => gadgets::less_than(c, 8),
      Program::InRange => gadgets::in_range(c, 8),
      Program::Contains => gadgets::contains(c, 4),
      Program::SwitchArray => gadgets::switch_array(c, 3, 2),
      Program::IsEqualArray => gadgets::is_equal_array(c, 4),
      Program::ArrayMul => gadgets::array_mul(c, 4),
      Program::GenericArrayAdd => gadgets::generic_array_add(c, 3, 2),
      Program::Classify => classify(c),
    }
  }

  /// Assembles the circuit artifact.
  pub fn build(&self) -> Result<Circuit, FrontendError> {
    let mut c = CircuitBuilder::new();
    let main = self.main(&mut c)?;
    let circuit = c.build(main)?;
    debug!("built program {self}");
    Ok(circuit)
  }

  /// An input set for which the program has a witness.
  pub fn sample_inputs(&self) -> InputMap {
    let entries: &[(&str, &[u64])] = match self {
      Program::IsZero => &[("in", &[0])],
      Program::IsEqual => &[("in", &[7, 7])],
      Program::Num2Bits => &[("in", &[0b1011_0101])],
      Program::LessThan => &[("in", &[17, 200])],
      Program::InRange => &[("in", &[42]), ("range", &[10, 100])],
      Program::Contains => &[("in", &[5]), ("array", &[1, 3, 5, 7])],
      Program::SwitchArray => &[
        ("case", &[20]),
        ("branches", &[10, 20, 30]),
        ("vals", &[1, 2, 3, 4, 5, 6]),
      ],
      Program::IsEqualArray => &[("in", &[1, 2, 3, 4, 1, 2, 3, 4])],
      Program::ArrayMul => &[("lhs", &[1, 2, 3, 4]), ("rhs", &[5, 6, 7, 8])],
      Program::GenericArrayAdd => &[("arrays", &[1, 2, 3, 10, 20, 30])],
      Program::Classify => &[("value", &[65]), ("range", &[48, 122]), ("allowed", &[65, 66, 67, 68])],
    };
    entries
      .iter()
      .map(|(name, values)| {
        (name.to_string(), values.iter().map(|&v| FieldElement::from(v)).collect())
      })
      .collect()
  }
}

impl fmt::Display for Program {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Program {
  type Err = FrontendError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Program::ALL
      .into_iter()
      .find(|program| program.name() == s)
      .ok_or_else(|| FrontendError::Other(format!("unknown program {s}")))
  }
}

/// `Classify`: checks a byte against an inclusive range and an allow-list.
///
/// Signals: outputs `in_range`, `member`, `accepted`; inputs `value`, `range[2]`, `allowed[4]`;
/// children `bounds: InRange(8)`, `membership: Contains(4)`.
fn classify(c: &mut CircuitBuilder) -> Result<TemplateId, FrontendError> {
  let in_range = gadgets::in_range(c, 8)?;
  let contains = gadgets::contains(c, 4)?;
  c.template("Classify", "Classify", |t| {
    let in_range_out = t.output("in_range")?;
    let member = t.output("member")?;
    let accepted = t.output("accepted")?;
    let value = t.input("value")?;
    let range = t.input_array("range", &[2])?;
    let allowed = t.input_array("allowed", &[4])?;
    let bounds = t.child("bounds", in_range)?;
    let membership = t.child("membership", contains)?;
    t.create_all(&bounds);
    t.create_all(&membership);

    let bounds_in = t.port(&bounds, "in")?;
    t.supply(&bounds_in, value.get());
    let bounds_range = t.port(&bounds, "range")?;
    t.supply_from(&bounds_range, range.place());

    let membership_in = t.port(&membership, "in")?;
    t.supply(&membership_in, value.get());
    let membership_array = t.port(&membership, "array")?;
    t.supply_from(&membership_array, allowed.place());

    let (bounds_out, membership_out) = (t.port(&bounds, "out")?, t.port(&membership, "out")?);
    t.assign(&in_range_out, bounds_out.get());
    t.assign(&member, membership_out.get());
    t.assign(&accepted, in_range_out.get() * member.get());
    Ok(())
  })
}

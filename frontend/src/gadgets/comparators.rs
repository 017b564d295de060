//! Zero tests, equality and range comparisons.

use edge_witness::{template::TemplateId, FieldElement};

use super::num2bits;
use crate::{builder::CircuitBuilder, error::FrontendError};

/// Widest comparison whose biased difference still fits below the modulus.
pub const MAX_COMPARISON_BITS: u64 = 252;

/// `IsZero`: `out = (in == 0)`. Signals: `out`, `in`, `inv`.
pub fn is_zero(c: &mut CircuitBuilder) -> Result<TemplateId, FrontendError> {
  c.template("IsZero", "IsZero", |t| {
    let out = t.output("out")?;
    let input = t.input("in")?;
    let inv = t.signal("inv")?;
    let (zero, one) = (t.lit(0), t.lit(1));
    t.branch(
      input.get().not_equals(zero.clone()),
      |t| {
        t.assign(&inv, one.clone().div(input.get()));
        Ok(())
      },
      |t| {
        t.assign(&inv, zero.clone());
        Ok(())
      },
    )?;
    t.assign(&out, -input.get() * inv.get() + one.clone());
    t.constrain(input.get() * out.get(), zero);
    Ok(())
  })
}

/// `IsEqual`: `out = (in[0] == in[1])`. Signals: `out`, `in[2]`, child `isz`.
pub fn is_equal(c: &mut CircuitBuilder) -> Result<TemplateId, FrontendError> {
  let is_zero = is_zero(c)?;
  c.template("IsEqual", "IsEqual", |t| {
    let out = t.output("out")?;
    let input = t.input_array("in", &[2])?;
    let isz = t.child("isz", is_zero)?;
    t.create_all(&isz);
    let isz_in = t.port(&isz, "in")?;
    t.supply(&isz_in, input.at(1).get() - input.at(0).get());
    let isz_out = t.port(&isz, "out")?;
    t.assign(&out, isz_out.get());
    Ok(())
  })
}

/// `LessThan(n)`: `out = (in[0] < in[1])` for operands below `2^n`.
///
/// Signals: `out`, `in[2]`, child `n2b: Num2Bits(n + 1)`.
pub fn less_than(c: &mut CircuitBuilder, n: usize) -> Result<TemplateId, FrontendError> {
  let bits = num2bits(c, n + 1)?;
  c.template(format!("LessThan({n})"), "LessThan", |t| {
    let out = t.output("out")?;
    let input = t.input_array("in", &[2])?;
    let n2b = t.child("n2b", bits)?;
    let n_var = t.param(n as u64);
    t.create_all(&n2b);
    let max_bits = t.lit(MAX_COMPARISON_BITS);
    t.require(n_var.get().less_eq(max_bits));
    let bias = t.constant(FieldElement::ONE.shl(FieldElement::from(n as u64)));
    let n2b_in = t.port(&n2b, "in")?;
    t.supply(&n2b_in, input.at(0).get() + bias - input.at(1).get());
    let top = t.port(&n2b, "out")?.at(n);
    let one = t.lit(1);
    t.assign(&out, one - top.get());
    Ok(())
  })
}

/// Shared shape of the comparisons derived from `LessThan`: one `lt` child fed with
/// `(in[a] + da, in[b] + db)`.
fn derived(
  c: &mut CircuitBuilder,
  name: &str,
  n: usize,
  (a, da): (usize, u64),
  (b, db): (usize, u64),
) -> Result<TemplateId, FrontendError> {
  let lt_template = less_than(c, n)?;
  c.template(format!("{name}({n})"), name, |t| {
    let out = t.output("out")?;
    let input = t.input_array("in", &[2])?;
    let lt = t.child("lt", lt_template)?;
    t.param(n as u64);
    t.create_all(&lt);
    let lt_in = t.port(&lt, "in")?;
    let (da, db) = (t.lit(da), t.lit(db));
    t.supply(&lt_in.at(0), input.at(a).get() + da);
    t.supply(&lt_in.at(1), input.at(b).get() + db);
    let lt_out = t.port(&lt, "out")?;
    t.assign(&out, lt_out.get());
    Ok(())
  })
}

/// `GreaterEqThan(n)`: `out = (in[0] >= in[1])`, computed as `in[1] < in[0] + 1`.
pub fn greater_eq_than(c: &mut CircuitBuilder, n: usize) -> Result<TemplateId, FrontendError> {
  derived(c, "GreaterEqThan", n, (1, 0), (0, 1))
}

/// `LessEqThan(n)`: `out = (in[0] <= in[1])`, computed as `in[0] < in[1] + 1`.
pub fn less_eq_than(c: &mut CircuitBuilder, n: usize) -> Result<TemplateId, FrontendError> {
  derived(c, "LessEqThan", n, (0, 0), (1, 1))
}

/// `InRange(n)`: `out = (range[0] <= in <= range[1])`.
///
/// Signals: `out`, `in`, `range[2]`, children `gte: GreaterEqThan(n)`, `lte: LessEqThan(n)`.
pub fn in_range(c: &mut CircuitBuilder, n: usize) -> Result<TemplateId, FrontendError> {
  let gte_template = greater_eq_than(c, n)?;
  let lte_template = less_eq_than(c, n)?;
  c.template(format!("InRange({n})"), "InRange", |t| {
    let out = t.output("out")?;
    let input = t.input("in")?;
    let range = t.input_array("range", &[2])?;
    let gte = t.child("gte", gte_template)?;
    let lte = t.child("lte", lte_template)?;
    t.param(n as u64);
    t.create_all(&gte);
    t.create_all(&lte);

    let gte_in = t.port(&gte, "in")?;
    t.supply(&gte_in.at(0), input.get());
    t.supply(&gte_in.at(1), range.at(0).get());

    let lte_in = t.port(&lte, "in")?;
    t.supply(&lte_in.at(0), input.get());
    t.supply(&lte_in.at(1), range.at(1).get());

    let (gte_out, lte_out) = (t.port(&gte, "out")?, t.port(&lte, "out")?);
    t.assign(&out, gte_out.get() * lte_out.get());
    Ok(())
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn signal_blocks_include_children() {
    let mut c = CircuitBuilder::new();
    let cases = [
      (is_zero(&mut c).unwrap(), 3),
      (is_equal(&mut c).unwrap(), 6),
      (less_than(&mut c, 8).unwrap(), 3 + 10),
      (greater_eq_than(&mut c, 8).unwrap(), 16),
      (in_range(&mut c, 8).unwrap(), 36),
    ];
    for (id, signals) in cases {
      assert_eq!(c.get(id).unwrap().signal_count, signals, "{}", c.get(id).unwrap().name);
    }
  }

  #[test]
  fn in_range_children_follow_own_signals() {
    let mut c = CircuitBuilder::new();
    let id = in_range(&mut c, 8).unwrap();
    let offsets: Vec<_> = c.get(id).unwrap().children.iter().map(|g| g.signal_offset).collect();
    assert_eq!(offsets, vec![4, 20]);
  }

  #[test]
  fn gadgets_are_defined_once_per_parameter() {
    let mut c = CircuitBuilder::new();
    let a = less_than(&mut c, 8).unwrap();
    let b = less_than(&mut c, 8).unwrap();
    let other = less_than(&mut c, 4).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, other);
  }
}

//! Gadgets over fixed-length arrays of field elements.

use edge_witness::template::TemplateId;

use super::{is_equal, is_zero};
use crate::{builder::CircuitBuilder, error::FrontendError};

/// `Contains(n)`: `out = 1` iff `in` equals some `array[i]`.
///
/// Signals: `out`, `in`, `array[n]`, children `equalComponent[n]: IsEqual`, `someEqual: IsZero`.
pub fn contains(c: &mut CircuitBuilder, n: usize) -> Result<TemplateId, FrontendError> {
  let is_equal = is_equal(c)?;
  let is_zero = is_zero(c)?;
  c.template(format!("Contains({n})"), "Contains", |t| {
    let out = t.output("out")?;
    let input = t.input("in")?;
    let array = t.input_array("array", &[n])?;
    let equal = t.child_array("equalComponent", is_equal, &[n])?;
    let some_equal = t.child("someEqual", is_zero)?;
    let n = t.param(n as u64);
    t.create_all(&equal);
    t.create_all(&some_equal);
    let (zero, one) = (t.lit(0), t.lit(1));
    t.require(n.get().greater_than(zero.clone()));

    let sum = t.var(zero);
    t.for_range(n.get(), |t, i| {
      let eq_in = t.port(&equal.at(i), "in")?;
      t.supply(&eq_in.at(0), input.get());
      t.supply(&eq_in.at(1), array.at(i).get());
      let eq_out = t.port(&equal.at(i), "out")?;
      t.set(&sum, sum.get() + eq_out.get());
      Ok(())
    })?;

    let some_in = t.port(&some_equal, "in")?;
    t.supply(&some_in, sum.get());
    let some_out = t.port(&some_equal, "out")?;
    t.assign(&out, one - some_out.get());
    Ok(())
  })
}

/// `ArrayMul(n)`: element-wise product. Signals: `out[n]`, `lhs[n]`, `rhs[n]`.
pub fn array_mul(c: &mut CircuitBuilder, n: usize) -> Result<TemplateId, FrontendError> {
  c.template(format!("ArrayMul({n})"), "ArrayMul", |t| {
    let out = t.output_array("out", &[n])?;
    let lhs = t.input_array("lhs", &[n])?;
    let rhs = t.input_array("rhs", &[n])?;
    let n = t.param(n as u64);
    t.for_range(n.get(), |t, i| {
      t.assign(&out.at(i), lhs.at(i).get() * rhs.at(i).get());
      Ok(())
    })
  })
}

/// `ScalarArrayMul(n)`: `out[i] = scalar * array[i]`. Signals: `out[n]`, `array[n]`, `scalar`.
pub fn scalar_array_mul(c: &mut CircuitBuilder, n: usize) -> Result<TemplateId, FrontendError> {
  c.template(format!("ScalarArrayMul({n})"), "ScalarArrayMul", |t| {
    let out = t.output_array("out", &[n])?;
    let array = t.input_array("array", &[n])?;
    let scalar = t.input("scalar")?;
    let n = t.param(n as u64);
    t.for_range(n.get(), |t, i| {
      t.assign(&out.at(i), scalar.get() * array.at(i).get());
      Ok(())
    })
  })
}

/// `GenericArrayAdd(m, n)`: sums `n` arrays of length `m` element-wise.
///
/// Signals: `out[m]`, `arrays[n][m]`.
pub fn generic_array_add(
  c: &mut CircuitBuilder,
  m: usize,
  n: usize,
) -> Result<TemplateId, FrontendError> {
  c.template(format!("GenericArrayAdd({m},{n})"), "GenericArrayAdd", |t| {
    let out = t.output_array("out", &[m])?;
    let arrays = t.input_array("arrays", &[n, m])?;
    let m_var = t.param(m as u64);
    let n_var = t.param(n as u64);
    let zero = t.lit(0);
    let sum = t.var_array(m, zero);
    t.for_range(m_var.get(), |t, i| {
      t.for_range(n_var.get(), |t, j| {
        t.set(&sum.at(i), sum.at(i).get() + arrays.at(j).at(i).get());
        Ok(())
      })
    })?;
    t.assign_from(&out, sum.place());
    Ok(())
  })
}

/// `SwitchArray(m, n)`: selects the row `vals[i]` whose `branches[i]` equals `case`.
///
/// `out` is the sum of every matching row, so it is all zeros when nothing matches. `match` is 1
/// iff some branch matched. Signals: `out[n]`, `match`, `case`, `branches[m]`, `vals[m][n]`,
/// `component_out[m][n]`, children `indicator[m]: IsZero`, `matchChecker: Contains(m)`.
pub fn switch_array(
  c: &mut CircuitBuilder,
  m: usize,
  n: usize,
) -> Result<TemplateId, FrontendError> {
  let is_zero = is_zero(c)?;
  let contains = contains(c, m)?;
  c.template(format!("SwitchArray({m},{n})"), "SwitchArray", |t| {
    let out = t.output_array("out", &[n])?;
    let output_match = t.output("match")?;
    let case = t.input("case")?;
    let branches = t.input_array("branches", &[m])?;
    let vals = t.input_array("vals", &[m, n])?;
    let component_out = t.signal_array("component_out", &[m, n])?;
    let indicator = t.child_array("indicator", is_zero, &[m])?;
    let match_checker = t.child("matchChecker", contains)?;
    let m_var = t.param(m as u64);
    let n_var = t.param(n as u64);
    t.create_all(&indicator);
    t.create_all(&match_checker);
    let (zero, one) = (t.lit(0), t.lit(1));
    t.require(m_var.get().greater_than(zero.clone()));
    t.require(n_var.get().greater_than(zero.clone()));

    let sum = t.var_array(n, zero.clone());
    let checker_array = t.port(&match_checker, "array")?;
    t.for_range(m_var.get(), |t, i| {
      let indicator_in = t.port(&indicator.at(i), "in")?;
      t.supply(&indicator_in, case.get() - branches.at(i).get());
      let indicator_out = t.port(&indicator.at(i), "out")?;
      t.supply(&checker_array.at(i), one - indicator_out.get());
      t.for_range(n_var.get(), |t, j| {
        let cell = component_out.at(i).at(j);
        t.assign(&cell, indicator_out.get() * vals.at(i).at(j).get());
        t.set(&sum.at(j), sum.at(j).get() + cell.get());
        Ok(())
      })
    })?;

    let checker_in = t.port(&match_checker, "in")?;
    t.supply(&checker_in, zero);
    let checker_out = t.port(&match_checker, "out")?;
    t.assign(&output_match, checker_out.get());
    t.assign_from(&out, sum.place());
    Ok(())
  })
}

/// `IsEqualArray(n)`: `out = 1` iff `in[0][i] == in[1][i]` for every `i`.
///
/// Signals: `out`, `in[2][n]`, children `equalComponent[n]: IsEqual`, `totalEqual: IsEqual`.
pub fn is_equal_array(c: &mut CircuitBuilder, n: usize) -> Result<TemplateId, FrontendError> {
  let is_equal = is_equal(c)?;
  c.template(format!("IsEqualArray({n})"), "IsEqualArray", |t| {
    let out = t.output("out")?;
    let input = t.input_array("in", &[2, n])?;
    let equal = t.child_array("equalComponent", is_equal, &[n])?;
    let total = t.child("totalEqual", is_equal)?;
    let n = t.param(n as u64);
    t.create_all(&equal);
    t.create_all(&total);
    let zero = t.lit(0);

    let accum = t.var(zero);
    t.for_range(n.get(), |t, i| {
      let eq_in = t.port(&equal.at(i), "in")?;
      t.supply(&eq_in.at(0), input.at(0).at(i).get());
      t.supply(&eq_in.at(1), input.at(1).at(i).get());
      let eq_out = t.port(&equal.at(i), "out")?;
      t.set(&accum, accum.get() + eq_out.get());
      Ok(())
    })?;

    let total_in = t.port(&total, "in")?;
    t.supply(&total_in.at(0), n.get());
    t.supply(&total_in.at(1), accum.get());
    let total_out = t.port(&total, "out")?;
    t.assign(&out, total_out.get());
    Ok(())
  })
}

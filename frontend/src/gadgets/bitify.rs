use edge_witness::template::TemplateId;

use crate::{builder::CircuitBuilder, error::FrontendError};

/// `Num2Bits(n)`: `out[i]` is bit `i` of `in`, little-endian. Fails when `in >= 2^n`.
///
/// Signals: `out[n]`, `in`.
pub fn num2bits(c: &mut CircuitBuilder, n: usize) -> Result<TemplateId, FrontendError> {
  c.template(format!("Num2Bits({n})"), "Num2Bits", |t| {
    let out = t.output_array("out", &[n])?;
    let input = t.input("in")?;
    let n = t.param(n as u64);
    let (zero, one) = (t.lit(0), t.lit(1));
    let lc1 = t.var(zero.clone());
    let e2 = t.var(one.clone());
    t.for_range(n.get(), |t, i| {
      let bit = out.at(i);
      t.assign(&bit, input.get().shr(i.get()).bit_and(one.clone()));
      t.constrain(bit.get() * (bit.get() - one.clone()), zero.clone());
      t.set(&lc1, lc1.get() + bit.get() * e2.get());
      t.set(&e2, e2.get() + e2.get());
      Ok(())
    })?;
    t.constrain(lc1.get(), input.get());
    Ok(())
  })
}

#[cfg(test)]
mod tests {
  use edge_witness::{FieldElement, WitnessCalculator, WitnessError};
  use proptest::prelude::*;

  use super::*;

  fn calculator(n: usize) -> WitnessCalculator {
    let mut c = CircuitBuilder::new();
    let main = num2bits(&mut c, n).unwrap();
    WitnessCalculator::new(c.build(main).unwrap()).unwrap()
  }

  proptest! {
    #[test]
    fn bits_reconstruct_the_input(value in 0u64..(1 << 16)) {
      let calculator = calculator(16);
      let inputs = [("in".to_string(), vec![FieldElement::from(value)])].into_iter().collect();
      let witness = calculator.calculate(&inputs).unwrap();
      let bits = witness.output("out").unwrap();
      let rebuilt = bits.iter().rev().fold(0u64, |acc, bit| 2 * acc + bit.to_u64());
      prop_assert_eq!(rebuilt, value);
      prop_assert!(bits.iter().all(|bit| *bit == FieldElement::ZERO || *bit == FieldElement::ONE));
    }
  }

  #[test]
  fn rejects_values_that_do_not_fit() {
    let calculator = calculator(4);
    let inputs = [("in".to_string(), vec![FieldElement::from(16)])].into_iter().collect();
    let err = calculator.calculate(&inputs).unwrap_err();
    assert!(matches!(err, WitnessError::ConstraintViolation(ref d) if d.template == "Num2Bits"));
  }
}

//! BN254 scalar field elements as seen by compiled circuits.
//!
//! [`FieldElement`] wraps [`halo2curves::bn256::Fr`] and adds the integer-flavoured operations a
//! circuit program can request: comparisons under the canonical ordering `0..p-1`, bit shifts,
//! bitwise logic and truncation to machine integers. Every such operation works on the canonical
//! representative and reduces its result back into the field, so no two stored values alias.

use std::{
  cmp::Ordering,
  fmt,
  hash::{Hash, Hasher},
  ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign},
  str::FromStr,
};

use ff::{Field, PrimeField};
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive};
use once_cell::sync::Lazy;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FieldError;

/// Scalar field of the bn254 curve.
pub type Scalar = halo2curves::bn256::Fr;

/// Number of significant bits of the modulus, bitwise results are masked to this width.
pub const MODULUS_BITS: u32 = 254;

static MODULUS: Lazy<BigUint> =
  Lazy::new(|| BigUint::from_bytes_le((-Scalar::ONE).to_repr().as_ref()) + 1u32);

static HALF_MODULUS: Lazy<BigUint> = Lazy::new(|| &*MODULUS >> 1);

static MASK: Lazy<BigUint> = Lazy::new(|| (BigUint::one() << MODULUS_BITS) - 1u32);

static TWO_POW_64: Lazy<Scalar> = Lazy::new(|| Scalar::from(u64::MAX) + Scalar::ONE);

/// A canonically reduced residue modulo the bn254 scalar field order.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FieldElement(Scalar);

impl FieldElement {
  pub const ONE: Self = Self(Scalar::ONE);
  pub const ZERO: Self = Self(Scalar::ZERO);

  /// The field order `p` as an integer.
  pub fn modulus() -> &'static BigUint { &MODULUS }

  pub fn new(inner: Scalar) -> Self { Self(inner) }

  pub fn into_inner(self) -> Scalar { self.0 }

  pub fn from_u64(value: u64) -> Self { Self(Scalar::from(value)) }

  /// Negative values map to `p - |value|`.
  pub fn from_i64(value: i64) -> Self {
    let magnitude = Self::from_u64(value.unsigned_abs());
    if value < 0 {
      -magnitude
    } else {
      magnitude
    }
  }

  pub fn from_bool(value: bool) -> Self {
    if value {
      Self::ONE
    } else {
      Self::ZERO
    }
  }

  /// Reduces an arbitrary integer into the field.
  pub fn from_biguint(value: &BigUint) -> Self {
    let reduced = value % &*MODULUS;
    let inner = reduced
      .iter_u64_digits()
      .rev()
      .fold(Scalar::ZERO, |acc, digit| acc * *TWO_POW_64 + Scalar::from(digit));
    Self(inner)
  }

  /// The canonical representative in `[0, p)`.
  pub fn to_biguint(&self) -> BigUint { BigUint::from_bytes_le(&self.to_bytes()) }

  /// Little-endian encoding of the canonical representative.
  pub fn to_bytes(&self) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(self.0.to_repr().as_ref());
    out
  }

  /// Inverse of [`FieldElement::to_bytes`]. Returns `None` for encodings of values `>= p`.
  pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
    let mut repr = <Scalar as PrimeField>::Repr::default();
    repr.as_mut().copy_from_slice(bytes);
    Option::from(Scalar::from_repr(repr)).map(Self)
  }

  pub fn is_zero(&self) -> bool { bool::from(self.0.is_zero()) }

  /// Field truthiness: any nonzero element is true.
  pub fn is_true(&self) -> bool { !self.is_zero() }

  /// Truncates the canonical representative to its low 64 bits.
  pub fn to_u64(&self) -> u64 {
    let mut low = [0u8; 8];
    low.copy_from_slice(&self.to_bytes()[..8]);
    u64::from_le_bytes(low)
  }

  /// Truncating conversion used for array indices and loop counters.
  pub fn to_usize(&self) -> usize { self.to_u64() as usize }

  pub fn inverse(&self) -> Option<Self> { Option::from(self.0.invert()).map(Self) }

  pub fn div(self, rhs: Self) -> Result<Self, FieldError> {
    rhs.inverse().map(|inv| self * inv).ok_or(FieldError::DivisionByZero)
  }

  pub fn pow(self, exponent: u64) -> Self { Self(self.0.pow_vartime([exponent])) }

  pub fn square(self) -> Self { Self(self.0.square()) }

  pub fn equals(self, rhs: Self) -> Self { Self::from_bool(self == rhs) }

  pub fn not_equals(self, rhs: Self) -> Self { Self::from_bool(self != rhs) }

  pub fn less_than(self, rhs: Self) -> Self { Self::from_bool(self < rhs) }

  pub fn greater_than(self, rhs: Self) -> Self { Self::from_bool(self > rhs) }

  pub fn less_eq(self, rhs: Self) -> Self { Self::from_bool(self <= rhs) }

  pub fn greater_eq(self, rhs: Self) -> Self { Self::from_bool(self >= rhs) }

  pub fn and(self, rhs: Self) -> Self { Self::from_bool(self.is_true() && rhs.is_true()) }

  pub fn or(self, rhs: Self) -> Self { Self::from_bool(self.is_true() || rhs.is_true()) }

  pub fn not(self) -> Self { Self::from_bool(!self.is_true()) }

  /// Shift right by `shift`. Shift amounts in the upper half of the field count as negative and
  /// shift left by `p - shift` instead.
  pub fn shr(self, shift: Self) -> Self {
    let amount = shift.to_biguint();
    if amount > *HALF_MODULUS {
      return self.shift_left(&(&*MODULUS - amount));
    }
    self.shift_right(&amount)
  }

  /// Shift left by `shift`, keeping the low 254 bits before reducing.
  pub fn shl(self, shift: Self) -> Self {
    let amount = shift.to_biguint();
    if amount > *HALF_MODULUS {
      return self.shift_right(&(&*MODULUS - amount));
    }
    self.shift_left(&amount)
  }

  pub fn band(self, rhs: Self) -> Self {
    Self::from_biguint(&(self.to_biguint() & rhs.to_biguint() & &*MASK))
  }

  pub fn bor(self, rhs: Self) -> Self {
    Self::from_biguint(&((self.to_biguint() | rhs.to_biguint()) & &*MASK))
  }

  pub fn bxor(self, rhs: Self) -> Self {
    Self::from_biguint(&((self.to_biguint() ^ rhs.to_biguint()) & &*MASK))
  }

  pub fn bnot(self) -> Self { Self::from_biguint(&(self.to_biguint() ^ &*MASK)) }

  fn shift_right(self, amount: &BigUint) -> Self {
    match amount.to_u32() {
      Some(bits) if bits < MODULUS_BITS => Self::from_biguint(&(self.to_biguint() >> bits)),
      _ => Self::ZERO,
    }
  }

  fn shift_left(self, amount: &BigUint) -> Self {
    match amount.to_u32() {
      Some(bits) if bits < MODULUS_BITS =>
        Self::from_biguint(&((self.to_biguint() << bits) & &*MASK)),
      _ => Self::ZERO,
    }
  }
}

impl Default for FieldElement {
  fn default() -> Self { Self::ZERO }
}

impl From<u64> for FieldElement {
  fn from(value: u64) -> Self { Self::from_u64(value) }
}

impl From<bool> for FieldElement {
  fn from(value: bool) -> Self { Self::from_bool(value) }
}

impl From<Scalar> for FieldElement {
  fn from(value: Scalar) -> Self { Self(value) }
}

impl From<FieldElement> for Scalar {
  fn from(value: FieldElement) -> Self { value.0 }
}

impl Add for FieldElement {
  type Output = Self;

  fn add(self, rhs: Self) -> Self { Self(self.0 + rhs.0) }
}

impl Sub for FieldElement {
  type Output = Self;

  fn sub(self, rhs: Self) -> Self { Self(self.0 - rhs.0) }
}

impl Mul for FieldElement {
  type Output = Self;

  fn mul(self, rhs: Self) -> Self { Self(self.0 * rhs.0) }
}

impl Neg for FieldElement {
  type Output = Self;

  fn neg(self) -> Self { Self(-self.0) }
}

impl AddAssign for FieldElement {
  fn add_assign(&mut self, rhs: Self) { self.0 += rhs.0 }
}

impl SubAssign for FieldElement {
  fn sub_assign(&mut self, rhs: Self) { self.0 -= rhs.0 }
}

impl MulAssign for FieldElement {
  fn mul_assign(&mut self, rhs: Self) { self.0 *= rhs.0 }
}

impl std::iter::Sum for FieldElement {
  fn sum<I: Iterator<Item = Self>>(iter: I) -> Self { iter.fold(Self::ZERO, |acc, x| acc + x) }
}

impl Ord for FieldElement {
  fn cmp(&self, other: &Self) -> Ordering {
    let (lhs, rhs) = (self.to_bytes(), other.to_bytes());
    lhs.iter().rev().cmp(rhs.iter().rev())
  }
}

impl PartialOrd for FieldElement {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Hash for FieldElement {
  fn hash<H: Hasher>(&self, state: &mut H) { self.to_bytes().hash(state) }
}

impl fmt::Display for FieldElement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.to_biguint()) }
}

impl fmt::Debug for FieldElement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.to_biguint()) }
}

impl FromStr for FieldElement {
  type Err = FieldError;

  /// Accepts decimal, `0x`-prefixed hex and `-`-prefixed decimal. Values are reduced mod `p`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix('-') {
      return rest.parse::<Self>().map(Neg::neg);
    }
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
      Some(hex) => BigUint::parse_bytes(hex.as_bytes(), 16),
      None => BigUint::parse_bytes(trimmed.as_bytes(), 10),
    };
    parsed.map(|value| Self::from_biguint(&value)).ok_or_else(|| FieldError::Parse(s.to_string()))
  }
}

impl Serialize for FieldElement {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for FieldElement {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct FieldVisitor;

    impl<'de> de::Visitor<'de> for FieldVisitor {
      type Value = FieldElement;

      fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a field element as an integer or a numeric string")
      }

      fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldElement, E> {
        Ok(FieldElement::from_u64(v))
      }

      fn visit_i64<E: de::Error>(self, v: i64) -> Result<FieldElement, E> {
        Ok(FieldElement::from_i64(v))
      }

      fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldElement, E> {
        v.parse().map_err(E::custom)
      }
    }

    if deserializer.is_human_readable() {
      deserializer.deserialize_any(FieldVisitor)
    } else {
      deserializer.deserialize_str(FieldVisitor)
    }
  }
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  fn fe(value: u64) -> FieldElement { FieldElement::from_u64(value) }

  fn minus_one() -> FieldElement { -FieldElement::ONE }

  #[test]
  fn modulus_is_bn254_order() {
    let expected = BigUint::parse_bytes(
      b"21888242871839275222246405745257275088548364400416034343698204186575808495617",
      10,
    )
    .unwrap();
    assert_eq!(FieldElement::modulus(), &expected);
    assert_eq!(minus_one().to_biguint(), expected - 1u32);
  }

  #[test]
  fn parse_and_display() {
    assert_eq!("42".parse::<FieldElement>().unwrap(), fe(42));
    assert_eq!("0x2a".parse::<FieldElement>().unwrap(), fe(42));
    assert_eq!("-1".parse::<FieldElement>().unwrap(), minus_one());
    assert_eq!(fe(1234567).to_string(), "1234567");
    assert!("banana".parse::<FieldElement>().is_err());

    let p = FieldElement::modulus().to_string();
    assert_eq!(p.parse::<FieldElement>().unwrap(), FieldElement::ZERO);
  }

  #[test]
  fn division() {
    assert_eq!(fe(10).div(fe(5)).unwrap(), fe(2));
    assert_eq!(fe(1).div(fe(2)).unwrap() * fe(2), FieldElement::ONE);
    assert!(matches!(fe(3).div(FieldElement::ZERO), Err(FieldError::DivisionByZero)));
  }

  #[test]
  fn comparisons_use_canonical_order() {
    assert_eq!(fe(3).less_than(fe(4)), FieldElement::ONE);
    assert_eq!(fe(4).less_than(fe(4)), FieldElement::ZERO);
    // p - 1 is the largest residue, not a negative number
    assert_eq!(minus_one().greater_than(fe(1)), FieldElement::ONE);
    assert_eq!(fe(7).less_eq(fe(7)), FieldElement::ONE);
    assert_eq!(fe(6).greater_eq(fe(7)), FieldElement::ZERO);
    assert_eq!(fe(6).not_equals(fe(7)), FieldElement::ONE);
    assert_eq!(fe(6).equals(fe(7)), FieldElement::ZERO);
  }

  #[test]
  fn bit_operations() {
    assert_eq!(fe(0b1011).shr(fe(1)), fe(0b101));
    assert_eq!(fe(0b1011).shr(fe(254)), FieldElement::ZERO);
    assert_eq!(fe(1).shl(fe(10)), fe(1024));
    assert_eq!(fe(1024).shr(-fe(2)), fe(4096));
    assert_eq!(fe(0b1100).band(fe(0b1010)), fe(0b1000));
    assert_eq!(fe(0b1100).bor(fe(0b1010)), fe(0b1110));
    assert_eq!(fe(0b1100).bxor(fe(0b1010)), fe(0b0110));
    assert_eq!(fe(1).shl(fe(253)).shl(fe(1)), FieldElement::ZERO);
  }

  #[test]
  fn logic_and_truthiness() {
    assert!(fe(5).is_true());
    assert!(!FieldElement::ZERO.is_true());
    assert_eq!(fe(5).and(fe(9)), FieldElement::ONE);
    assert_eq!(fe(5).and(FieldElement::ZERO), FieldElement::ZERO);
    assert_eq!(FieldElement::ZERO.or(fe(2)), FieldElement::ONE);
    assert_eq!(fe(2).not(), FieldElement::ZERO);
  }

  #[test]
  fn truncation() {
    assert_eq!(fe(77).to_usize(), 77);
    assert_eq!((fe(u64::MAX) + fe(3)).to_u64(), 2);
  }

  #[test]
  fn serde_as_decimal_strings() {
    let json = serde_json::to_string(&vec![fe(1), minus_one()]).unwrap();
    let expected_p_minus_one = (FieldElement::modulus() - 1u32).to_string();
    assert_eq!(json, format!("[\"1\",\"{expected_p_minus_one}\"]"));
    let back: Vec<FieldElement> = serde_json::from_str("[\"1\", 7, -1, \"0x10\"]").unwrap();
    assert_eq!(back, vec![fe(1), fe(7), minus_one(), fe(16)]);
  }

  #[test]
  fn bytes_reject_non_canonical() {
    assert_eq!(FieldElement::from_bytes(&fe(99).to_bytes()), Some(fe(99)));
    assert_eq!(FieldElement::from_bytes(&[0xff; 32]), None);
  }

  proptest! {
    #[test]
    fn additive_inverse(a in any::<u64>(), b in any::<u64>()) {
      let x = fe(a) * fe(b) + fe(b);
      prop_assert_eq!(x + (-x), FieldElement::ZERO);
    }

    #[test]
    fn multiplicative_inverse(a in 1..u64::MAX, b in any::<u64>()) {
      let x = fe(a) * fe(b).square() + fe(a);
      prop_assume!(x.is_true());
      prop_assert_eq!(x * x.inverse().unwrap(), FieldElement::ONE);
    }

    #[test]
    fn biguint_round_trip(a in any::<u64>(), b in any::<u64>()) {
      let x = fe(a) * fe(b) * fe(b);
      prop_assert_eq!(FieldElement::from_biguint(&x.to_biguint()), x);
    }

    #[test]
    fn ordering_matches_integers(a in any::<u64>(), b in any::<u64>()) {
      prop_assert_eq!(fe(a).cmp(&fe(b)), a.cmp(&b));
    }
  }
}

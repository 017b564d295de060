//! The circuit's literal pool.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::field::FieldElement;

/// Immutable table of the field literals a circuit's templates refer to by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstantTable(Vec<FieldElement>);

impl ConstantTable {
  pub fn new(values: Vec<FieldElement>) -> Self { Self(values) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn get(&self, index: usize) -> Option<FieldElement> { self.0.get(index).copied() }

  pub fn as_slice(&self) -> &[FieldElement] { &self.0 }

  pub fn iter(&self) -> impl Iterator<Item = &FieldElement> { self.0.iter() }
}

impl Index<usize> for ConstantTable {
  type Output = FieldElement;

  fn index(&self, index: usize) -> &FieldElement { &self.0[index] }
}

impl FromIterator<FieldElement> for ConstantTable {
  fn from_iter<I: IntoIterator<Item = FieldElement>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn preserves_source_order() {
    let table: ConstantTable = [5u64, 0, 1].into_iter().map(FieldElement::from).collect();
    assert_eq!(table.len(), 3);
    assert_eq!(table[0], FieldElement::from(5));
    assert_eq!(table.get(2), Some(FieldElement::ONE));
    assert_eq!(table.get(3), None);
  }

  #[test]
  fn serializes_as_plain_list() {
    let table = ConstantTable::new(vec![FieldElement::from(3), -FieldElement::ONE]);
    let json = serde_json::to_string(&table).unwrap();
    let p_minus_one = FieldElement::modulus() - 1u32;
    assert_eq!(json, format!("[\"3\",\"{p_minus_one}\"]"));
    assert_eq!(serde_json::from_str::<ConstantTable>(&json).unwrap(), table);
  }
}

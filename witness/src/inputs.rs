//! Named inputs for the main component.
//!
//! Hosts usually receive inputs as JSON, e.g. `{"in": ["3", 4], "m": [[1, 2], [3, 4]]}`. Values
//! may be integers, numeric strings (decimal, `0x` hex, or negative) or nested arrays of those.
//! Arrays are flattened row-major, which matches the layout of array signals in the arena.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::{error::WitnessError, field::FieldElement};

/// Input name to its flattened values.
pub type InputMap = BTreeMap<String, Vec<FieldElement>>;

pub fn parse_json(json: &str) -> Result<InputMap, WitnessError> {
  let value: Value = serde_json::from_str(json)?;
  from_value(&value)
}

pub fn from_value(value: &Value) -> Result<InputMap, WitnessError> {
  let object = value.as_object().ok_or_else(|| WitnessError::InvalidInput {
    name:   String::new(),
    reason: "inputs must be a JSON object".to_string(),
  })?;
  object
    .iter()
    .map(|(name, value)| {
      let mut values = Vec::new();
      flatten(name, value, &mut values)?;
      Ok((name.clone(), values))
    })
    .collect()
}

fn flatten(name: &str, value: &Value, out: &mut Vec<FieldElement>) -> Result<(), WitnessError> {
  let invalid = |reason: String| WitnessError::InvalidInput { name: name.to_string(), reason };
  match value {
    Value::Array(items) => items.iter().try_for_each(|item| flatten(name, item, out)),
    Value::Number(number) => {
      let element = match (number.as_u64(), number.as_i64()) {
        (Some(u), _) => FieldElement::from_u64(u),
        (None, Some(i)) => FieldElement::from_i64(i),
        _ => return Err(invalid(format!("{number} is not an integer, pass large values as strings"))),
      };
      out.push(element);
      Ok(())
    },
    Value::String(text) => {
      out.push(text.parse().map_err(|e| invalid(format!("{e}")))?);
      Ok(())
    },
    other => Err(invalid(format!("unsupported value {other}"))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fe(v: u64) -> FieldElement { FieldElement::from(v) }

  #[test]
  fn flattens_nested_arrays_row_major() {
    let inputs = parse_json(r#"{ "a": 5, "b": ["7", -1], "c": [[1, 2], [3, "0x4"]] }"#).unwrap();
    assert_eq!(inputs["a"], vec![fe(5)]);
    assert_eq!(inputs["b"], vec![fe(7), -FieldElement::ONE]);
    assert_eq!(inputs["c"], vec![fe(1), fe(2), fe(3), fe(4)]);
  }

  #[test]
  fn rejects_non_numeric_values() {
    assert!(matches!(parse_json(r#"{ "a": true }"#), Err(WitnessError::InvalidInput { .. })));
    assert!(matches!(parse_json(r#"{ "a": 1.5 }"#), Err(WitnessError::InvalidInput { .. })));
    assert!(matches!(parse_json(r#"[1, 2]"#), Err(WitnessError::InvalidInput { .. })));
    assert!(matches!(parse_json(r#"{ "a": "x1" }"#), Err(WitnessError::InvalidInput { .. })));
    assert!(matches!(parse_json("{"), Err(WitnessError::Serde(_))));
  }
}

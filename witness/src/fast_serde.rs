//! Compact binary encoding for circuit artifacts.
//!
//! Loading a circuit as JSON means parsing every constant from a decimal string. The binary form
//! stores constants as raw 32-byte little-endian words and the rest of the artifact as bincode,
//! behind a small header:
//!
//! ```text
//! magic (4) | type (1) | section count (1) | { section type (1) | length u32 LE (4) | bytes }*
//! ```

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

use crate::{circuit::Circuit, constants::ConstantTable, field::FieldElement};

pub static MAGIC_NUMBER: [u8; 4] = *b"WTNC";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerdeByteTypes {
  Circuit = 0x01,
  ConstantTable = 0x02,
}

#[derive(Debug, Error)]
pub enum SerdeByteError {
  #[error("{}", "invalid magic number")]
  InvalidMagicNumber,
  #[error("{}", "invalid serde type")]
  InvalidSerdeType,
  #[error("{}", "invalid section count")]
  InvalidSectionCount,
  #[error("{}", "invalid section type")]
  InvalidSectionType,
  #[error("{}", "invalid section size")]
  InvalidSectionSize,
  #[error(transparent)]
  IoError(#[from] std::io::Error),
  #[error(transparent)]
  BincodeError(#[from] Box<bincode::ErrorKind>),
  #[error("{}", "non-canonical field element")]
  FieldDecodeError,
}

/// A trait for fast conversions to bytes
pub trait FastSerde: Sized {
  fn to_bytes(&self) -> Result<Vec<u8>, SerdeByteError>;
  fn from_bytes(bytes: &[u8]) -> Result<Self, SerdeByteError>;

  fn write_header(out: &mut Vec<u8>, serde_type: SerdeByteTypes, sections: u8) {
    out.extend_from_slice(&MAGIC_NUMBER);
    out.push(serde_type as u8);
    out.push(sections);
  }

  fn validate_header(
    cursor: &mut Cursor<&[u8]>,
    expected_type: SerdeByteTypes,
    expected_sections: u8,
  ) -> Result<(), SerdeByteError> {
    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    if magic != MAGIC_NUMBER {
      return Err(SerdeByteError::InvalidMagicNumber);
    }
    if cursor.read_u8()? != expected_type as u8 {
      return Err(SerdeByteError::InvalidSerdeType);
    }
    if cursor.read_u8()? != expected_sections {
      return Err(SerdeByteError::InvalidSectionCount);
    }
    Ok(())
  }

  fn read_section_bytes(
    cursor: &mut Cursor<&[u8]>,
    expected_type: u8,
  ) -> Result<Vec<u8>, SerdeByteError> {
    if cursor.read_u8()? != expected_type {
      return Err(SerdeByteError::InvalidSectionType);
    }
    let size = cursor.read_u32::<LittleEndian>()? as usize;
    let remaining = cursor.get_ref().len().saturating_sub(cursor.position() as usize);
    if size > remaining {
      return Err(SerdeByteError::InvalidSectionSize);
    }
    let mut section_data = vec![0u8; size];
    cursor.read_exact(&mut section_data)?;
    Ok(section_data)
  }

  fn write_section_bytes(out: &mut Vec<u8>, section_type: u8, data: &[u8]) {
    out.push(section_type);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
  }
}

/// `count u32 LE | count * 32-byte canonical words`, the payload of a constants section.
fn encode_constants(table: &ConstantTable) -> Result<Vec<u8>, SerdeByteError> {
  let count = u32::try_from(table.len()).map_err(|_| SerdeByteError::InvalidSectionSize)?;
  let mut words = Vec::with_capacity(4 + 32 * table.len());
  words.write_u32::<LittleEndian>(count)?;
  for constant in table.iter() {
    words.extend_from_slice(&constant.to_bytes());
  }
  Ok(words)
}

fn decode_constants(section: &[u8]) -> Result<ConstantTable, SerdeByteError> {
  let mut words = Cursor::new(section);
  let count = words.read_u32::<LittleEndian>()? as usize;
  if Some(section.len()) != count.checked_mul(32).and_then(|n| n.checked_add(4)) {
    return Err(SerdeByteError::InvalidSectionSize);
  }
  (0..count)
    .map(|_| {
      let mut word = [0u8; 32];
      words.read_exact(&mut word)?;
      FieldElement::from_bytes(&word).ok_or(SerdeByteError::FieldDecodeError)
    })
    .collect()
}

impl FastSerde for ConstantTable {
  fn to_bytes(&self) -> Result<Vec<u8>, SerdeByteError> {
    let mut out = Vec::new();
    Self::write_header(&mut out, SerdeByteTypes::ConstantTable, 1);
    Self::write_section_bytes(&mut out, 1, &encode_constants(self)?);
    Ok(out)
  }

  fn from_bytes(bytes: &[u8]) -> Result<Self, SerdeByteError> {
    let mut cursor = Cursor::new(bytes);
    Self::validate_header(&mut cursor, SerdeByteTypes::ConstantTable, 1)?;
    decode_constants(&Self::read_section_bytes(&mut cursor, 1)?)
  }
}

impl FastSerde for Circuit {
  fn to_bytes(&self) -> Result<Vec<u8>, SerdeByteError> {
    let layout = Circuit { constants: ConstantTable::default(), ..self.clone() };
    let mut out = Vec::new();
    Self::write_header(&mut out, SerdeByteTypes::Circuit, 2);
    Self::write_section_bytes(&mut out, 1, &encode_constants(&self.constants)?);
    Self::write_section_bytes(&mut out, 2, &bincode::serialize(&layout)?);
    Ok(out)
  }

  fn from_bytes(bytes: &[u8]) -> Result<Self, SerdeByteError> {
    let mut cursor = Cursor::new(bytes);
    Self::validate_header(&mut cursor, SerdeByteTypes::Circuit, 2)?;
    let constants = decode_constants(&Self::read_section_bytes(&mut cursor, 1)?)?;
    let layout: Circuit = bincode::deserialize(&Self::read_section_bytes(&mut cursor, 2)?)?;
    Ok(Circuit { constants, ..layout })
  }
}

//! The compiled circuit artifact and its load-time validation.

use std::{collections::HashMap, path::Path};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  constants::ConstantTable,
  error::WitnessError,
  fast_serde::{FastSerde, MAGIC_NUMBER},
  template::{ChildGroup, ChildRef, Expr, Index, Instruction, Place, Source, Target, Template, TemplateId},
};

/// A named signal of the main component. `offset` is global, i.e. an arena index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalInfo {
  pub name:   String,
  pub offset: usize,
  pub size:   usize,
}

impl SignalInfo {
  pub fn range(&self) -> std::ops::Range<usize> { self.offset..self.offset.saturating_add(self.size) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circuit {
  /// Arena size, slot 0 included.
  pub signal_count:      usize,
  /// Number of component instances a full run creates, main included.
  pub component_count:   usize,
  pub main:              TemplateId,
  pub main_signal_start: usize,
  pub constants:         ConstantTable,
  pub templates:         Vec<Template>,
  /// Main inputs in the order they are supplied.
  pub inputs:            Vec<SignalInfo>,
  pub outputs:           Vec<SignalInfo>,
  /// Arena slots making up the exported witness. `None` exports the whole arena.
  #[serde(default)]
  pub witness_map:       Option<Vec<usize>>,
}

fn malformed(message: impl Into<String>) -> WitnessError {
  WitnessError::MalformedArtifact(message.into())
}

impl Circuit {
  pub fn from_json(json: &str) -> Result<Self, WitnessError> {
    let circuit: Circuit = serde_json::from_str(json)?;
    circuit.validate()?;
    Ok(circuit)
  }

  pub fn to_json(&self) -> Result<String, WitnessError> { Ok(serde_json::to_string_pretty(self)?) }

  /// Reads an artifact from disk, binary or JSON, and validates it.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, WitnessError> {
    let bytes = std::fs::read(path.as_ref())?;
    let circuit = if bytes.starts_with(&MAGIC_NUMBER) {
      <Circuit as FastSerde>::from_bytes(&bytes)?
    } else {
      serde_json::from_slice(&bytes)?
    };
    circuit.validate()?;
    debug!(
      "loaded circuit from {}: {} templates, {} signals",
      path.as_ref().display(),
      circuit.templates.len(),
      circuit.signal_count
    );
    Ok(circuit)
  }

  /// Writes the binary form when the extension is `bin`, JSON otherwise.
  pub fn store(&self, path: impl AsRef<Path>) -> Result<(), WitnessError> {
    let path = path.as_ref();
    let bytes = match path.extension().and_then(|e| e.to_str()) {
      Some("bin") => FastSerde::to_bytes(self)?,
      _ => self.to_json()?.into_bytes(),
    };
    std::fs::write(path, bytes)?;
    Ok(())
  }

  pub fn main_template(&self) -> Result<&Template, WitnessError> {
    self.templates.get(self.main).ok_or_else(|| malformed(format!("main template {} missing", self.main)))
  }

  pub fn input(&self, name: &str) -> Option<&SignalInfo> { self.inputs.iter().find(|s| s.name == name) }

  pub fn output(&self, name: &str) -> Option<&SignalInfo> {
    self.outputs.iter().find(|s| s.name == name)
  }

  /// Checks every count, offset and reference the interpreter relies on.
  pub fn validate(&self) -> Result<(), WitnessError> {
    let main = self.main_template()?;
    if self.main_signal_start == 0 {
      return Err(malformed("signal 0 is reserved for the constant one"));
    }
    let main_end = end_of(self.main_signal_start, main.signal_count, "main block")?;
    if main_end > self.signal_count {
      return Err(malformed(format!(
        "main block [{}, {main_end}) exceeds {} signals",
        self.main_signal_start, self.signal_count
      )));
    }

    let components = self.count_components(self.main, &mut HashMap::new(), &mut Vec::new())?;
    if components != self.component_count {
      return Err(malformed(format!(
        "declared {} components, the template tree has {components}",
        self.component_count
      )));
    }

    for (id, template) in self.templates.iter().enumerate() {
      let io_end = if id == self.main { self.main_io_end() } else { 0 };
      self.validate_template(template, io_end)?;
    }

    self.validate_io(main, main_end)?;

    if let Some(map) = &self.witness_map {
      if let Some(slot) = map.iter().find(|&&slot| slot >= self.signal_count) {
        return Err(malformed(format!("witness map refers to signal {slot}")));
      }
    }
    Ok(())
  }

  /// End of the main IO signals relative to the main block.
  fn main_io_end(&self) -> usize {
    self
      .inputs
      .iter()
      .chain(&self.outputs)
      .map(|info| info.offset.saturating_add(info.size).saturating_sub(self.main_signal_start))
      .max()
      .unwrap_or(0)
  }

  /// Own signals span at least the inputs, the main IO and every statically addressed signal.
  /// Child blocks must start after them.
  fn validate_template(&self, template: &Template, io_end: usize) -> Result<(), WitnessError> {
    let name = &template.name;
    let mut own_end = template.input_count.max(io_end);
    for instruction in template.instructions() {
      own_end = own_end.max(self.validate_instruction(template, instruction)?);
    }

    let mut blocks = Vec::with_capacity(template.children.len());
    for group in &template.children {
      let child = self.templates.get(group.template).ok_or_else(|| {
        malformed(format!("{name}.{} instantiates unknown template {}", group.name, group.template))
      })?;
      if group.signal_offset < own_end {
        return Err(malformed(format!(
          "{name}.{} starts at signal {} inside the {own_end} own signals of {name}",
          group.name, group.signal_offset
        )));
      }
      let width = group_len(group)
        .and_then(|len| len.checked_mul(child.signal_count))
        .ok_or_else(|| malformed(format!("{name}.{} spans more signals than fit in memory", group.name)))?;
      let end = end_of(group.signal_offset, width, &format!("{name}.{}", group.name))?;
      if end > template.signal_count {
        return Err(malformed(format!(
          "{name}.{} ends at signal {end}, past the {} signals of {name}",
          group.name, template.signal_count
        )));
      }
      blocks.push((group.signal_offset, end, &group.name));
    }
    let overlap = blocks
      .iter()
      .filter(|(start, end, _)| end > start)
      .sorted()
      .tuple_windows()
      .find(|(a, b)| a.1 > b.0);
    if let Some((a, b)) = overlap {
      return Err(malformed(format!("{name}: child blocks {} and {} overlap", a.2, b.2)));
    }
    Ok(())
  }

  /// Validates one instruction and returns the end of the own signals it addresses statically.
  fn validate_instruction(
    &self,
    template: &Template,
    instruction: &Instruction,
  ) -> Result<usize, WitnessError> {
    let name = &template.name;
    let mut exprs: Vec<&Expr> = Vec::new();
    let mut places: Vec<(Place, usize)> = Vec::new();
    match instruction {
      Instruction::Assign { dest, source, line } => {
        let width = nonzero_width(template, source, *line)?;
        places.push(match dest {
          Target::Signal(index) => (Place::Signal(index.clone()), width),
          Target::Local(index) => (Place::Local(index.clone()), width),
        });
        self.collect_source(source, &mut exprs, &mut places);
        collect_index(match dest {
          Target::Signal(index) | Target::Local(index) => index,
        }, &mut exprs);
      },
      Instruction::Supply { child, signal, source, line } => {
        let width = nonzero_width(template, source, *line)?;
        places.push((Place::Child { child: child.clone(), signal: signal.clone() }, width));
        self.collect_source(source, &mut exprs, &mut places);
        collect_index(&child.element, &mut exprs);
        collect_index(signal, &mut exprs);
      },
      Instruction::Assert { lhs, rhs, .. } => exprs.extend([lhs, rhs]),
      Instruction::Require { condition, .. }
      | Instruction::Branch { condition, .. }
      | Instruction::Loop { condition, .. } => exprs.push(condition),
      Instruction::Create { group, element } => {
        let group_desc = template
          .children
          .get(*group)
          .ok_or_else(|| malformed(format!("{name} creates unknown child group {group}")))?;
        if let Some(index) = element {
          if index.is_static() && group_len(group_desc).is_some_and(|len| index.offset >= len) {
            return Err(malformed(format!("{name} creates {}[{}]", group_desc.name, index.offset)));
          }
          collect_index(index, &mut exprs);
        }
      },
    }

    let mut nested = Vec::new();
    for expr in exprs {
      expr.walk(&mut |e| nested.push(e));
    }
    for expr in nested {
      match expr {
        Expr::Constant(c) if *c >= self.constants.len() => {
          return Err(malformed(format!(
            "{name} refers to constant {c} of {}",
            self.constants.len()
          )));
        },
        Expr::Load(place) => places.push((place.clone(), 1)),
        _ => {},
      }
    }

    let mut own_end = 0;
    for (place, width) in places {
      self.validate_place(template, &place, width)?;
      if let Place::Signal(index) = place {
        own_end = own_end.max(index.offset + width);
      }
    }
    Ok(own_end)
  }

  fn collect_source<'a>(
    &self,
    source: &'a Source,
    exprs: &mut Vec<&'a Expr>,
    places: &mut Vec<(Place, usize)>,
  ) {
    match source {
      Source::Value(expr) => exprs.push(expr),
      Source::Copy { from, width } => {
        places.push((from.clone(), *width));
        match from {
          Place::Signal(index) | Place::Local(index) => collect_index(index, exprs),
          Place::Child { child, signal } => {
            collect_index(&child.element, exprs);
            collect_index(signal, exprs);
          },
        }
      },
    }
  }

  /// Checks the static part of an address. Dynamic terms are trusted.
  fn validate_place(&self, template: &Template, place: &Place, width: usize) -> Result<(), WitnessError> {
    let name = &template.name;
    match place {
      Place::Signal(index) if !fits(index.offset, width, template.signal_count) =>
        Err(malformed(format!("{name} addresses signal {} of {}", index.offset, template.signal_count))),
      Place::Local(index) if !fits(index.offset, width, template.local_count) =>
        Err(malformed(format!("{name} addresses local {} of {}", index.offset, template.local_count))),
      Place::Child { child, signal } => self.validate_child_ref(template, child, signal, width),
      _ => Ok(()),
    }
  }

  fn validate_child_ref(
    &self,
    template: &Template,
    child: &ChildRef,
    signal: &Index,
    width: usize,
  ) -> Result<(), WitnessError> {
    let name = &template.name;
    let group = template
      .children
      .get(child.group)
      .ok_or_else(|| malformed(format!("{name} refers to unknown child group {}", child.group)))?;
    if child.element.is_static() && group_len(group).is_some_and(|len| child.element.offset >= len) {
      return Err(malformed(format!("{name} refers to {}[{}]", group.name, child.element.offset)));
    }
    let child_template = self.templates.get(group.template).ok_or_else(|| {
      malformed(format!("{name}.{} instantiates unknown template {}", group.name, group.template))
    })?;
    if !fits(signal.offset, width, child_template.signal_count) {
      return Err(malformed(format!(
        "{name} addresses signal {} of child {} with {} signals",
        signal.offset, group.name, child_template.signal_count
      )));
    }
    Ok(())
  }

  /// Components instantiated by one instance of `template`, itself included.
  fn count_components(
    &self,
    template: TemplateId,
    memo: &mut HashMap<TemplateId, usize>,
    stack: &mut Vec<TemplateId>,
  ) -> Result<usize, WitnessError> {
    if let Some(count) = memo.get(&template) {
      return Ok(*count);
    }
    let current =
      self.templates.get(template).ok_or_else(|| malformed(format!("unknown template {template}")))?;
    if stack.contains(&template) {
      let cycle = stack.iter().map(|t| self.templates[*t].name.as_str()).join(" -> ");
      return Err(malformed(format!("template recursion: {cycle} -> {}", current.name)));
    }
    stack.push(template);
    let mut count: usize = 1;
    for group in &current.children {
      let children = self.count_components(group.template, memo, stack)?;
      count = group_len(group)
        .and_then(|len| len.checked_mul(children))
        .and_then(|n| count.checked_add(n))
        .ok_or_else(|| malformed(format!("{} instantiates too many components", current.name)))?;
    }
    stack.pop();
    memo.insert(template, count);
    Ok(count)
  }

  fn validate_io(&self, main: &Template, main_end: usize) -> Result<(), WitnessError> {
    let declared: usize = self.inputs.iter().map(|s| s.size).sum();
    if declared != main.input_count {
      return Err(malformed(format!(
        "main declares {} input slots, the input list covers {declared}",
        main.input_count
      )));
    }
    let mut ranges = Vec::new();
    for info in self.inputs.iter().chain(&self.outputs) {
      let end = end_of(info.offset, info.size, &info.name)?;
      if info.offset < self.main_signal_start || end > main_end {
        return Err(malformed(format!("signal {} lies outside the main block", info.name)));
      }
      ranges.push((info.offset, end, &info.name));
    }
    if !self.inputs.iter().chain(&self.outputs).map(|s| &s.name).all_unique() {
      return Err(malformed("duplicate main signal name"));
    }
    let overlap = ranges.into_iter().filter(|r| r.1 > r.0).sorted().tuple_windows().find(|(a, b)| a.1 > b.0);
    if let Some((a, b)) = overlap {
      return Err(malformed(format!("main signals {} and {} overlap", a.2, b.2)));
    }
    Ok(())
  }
}

/// `start + width`, or a malformed artifact when it overflows.
fn end_of(start: usize, width: usize, what: &str) -> Result<usize, WitnessError> {
  start.checked_add(width).ok_or_else(|| malformed(format!("{what} at signal {start} overflows")))
}

fn fits(offset: usize, width: usize, len: usize) -> bool {
  offset.checked_add(width).is_some_and(|end| end <= len)
}

fn group_len(group: &ChildGroup) -> Option<usize> {
  group.dims.iter().try_fold(1usize, |len, &dim| len.checked_mul(dim))
}

/// A copy of nothing would count as a delivery without writing an input.
fn nonzero_width(template: &Template, source: &Source, line: u32) -> Result<usize, WitnessError> {
  match source.width() {
    0 => Err(malformed(format!("{} line {line} copies zero values", template.name))),
    width => Ok(width),
  }
}

fn collect_index<'a>(index: &'a Index, exprs: &mut Vec<&'a Expr>) {
  exprs.extend(index.terms.iter().map(|(_, expr)| expr));
}

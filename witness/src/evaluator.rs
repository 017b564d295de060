//! The interpreter that runs template programs over the signal arena.
//!
//! Children fire the instant their pending-input counter reaches zero, from inside the `Supply`
//! that delivered the last input, so evaluation order is exactly the order a compiled circuit
//! dictates. Zero-input children run from inside their `Create`.

use tracing::{debug, error, trace};

use crate::{
  arena::SignalArena,
  circuit::{Circuit, SignalInfo},
  component::{ComponentId, ComponentTable, Readiness},
  config::CalculatorConfig,
  error::{Diagnostic, FieldError, WitnessError},
  field::FieldElement,
  template::{
    BinaryOp, ChildRef, Expr, Index, Instruction, Place, Source, Target, Template, UnaryOp,
  },
};

/// State of one running template program.
struct Frame<'a> {
  id:           ComponentId,
  template:     &'a Template,
  signal_start: usize,
  locals:       Vec<FieldElement>,
}

pub(crate) struct Evaluator<'a> {
  circuit:    &'a Circuit,
  config:     &'a CalculatorConfig,
  arena:      SignalArena,
  components: ComponentTable,
  fired:      usize,
}

impl<'a> Evaluator<'a> {
  pub(crate) fn new(circuit: &'a Circuit, config: &'a CalculatorConfig) -> Self {
    let mut arena = SignalArena::new(circuit.signal_count);
    arena.write(0, FieldElement::ONE);
    Self {
      circuit,
      config,
      arena,
      components: ComponentTable::with_capacity(circuit.component_count),
      fired: 0,
    }
  }

  pub(crate) fn arena(&self) -> &SignalArena { &self.arena }

  pub(crate) fn into_arena(self) -> SignalArena { self.arena }

  pub(crate) fn components(&self) -> &ComponentTable { &self.components }

  pub(crate) fn fired(&self) -> usize { self.fired }

  /// Creates the main component. It runs right away when it declares no inputs.
  pub(crate) fn create_main(&mut self) -> Result<ComponentId, WitnessError> {
    let circuit = self.circuit;
    let template = circuit.main_template()?;
    let id = self.components.allocate(
      circuit.main,
      circuit.main_signal_start,
      None,
      "main".to_string(),
      template.input_count,
      template.child_slots(),
    );
    debug!("created main ({})", template.name);
    if template.input_count == 0 {
      self.run(id)?;
    }
    Ok(id)
  }

  /// Writes one named input of main as a single multi-width write.
  pub(crate) fn supply_main(
    &mut self,
    main: ComponentId,
    info: &SignalInfo,
    values: &[FieldElement],
  ) -> Result<(), WitnessError> {
    if info.size == 0 {
      return Ok(());
    }
    for (slot, value) in info.range().zip(values) {
      self.arena.write(slot, *value);
    }
    trace!("supplied main input {} ({} values)", info.name, info.size);
    self.deliver(main, info.size)
  }

  pub(crate) fn release(&mut self, id: ComponentId) { self.components.release(id) }

  fn deliver(&mut self, id: ComponentId, width: usize) -> Result<(), WitnessError> {
    match self.components.supply_input(id, width)? {
      Readiness::Ready => self.run(id),
      Readiness::Pending(remaining) => {
        trace!("component {id} waits for {remaining} more inputs");
        Ok(())
      },
    }
  }

  fn run(&mut self, id: ComponentId) -> Result<(), WitnessError> {
    let circuit = self.circuit;
    let component = self.components.get(id)?;
    let template = circuit.templates.get(component.template).ok_or_else(|| {
      WitnessError::IndexDefect(format!("component {id} runs unknown template {}", component.template))
    })?;
    debug!("component fired: {} ({})", component.name, template.name);
    self.fired += 1;

    let mut frame = Frame {
      id,
      template,
      signal_start: component.signal_start,
      locals: vec![FieldElement::ZERO; template.local_count],
    };
    self.execute(&mut frame, &template.program)?;

    if self.config.release_components {
      self.components.release_children(id);
    }
    Ok(())
  }

  fn execute(&mut self, frame: &mut Frame<'a>, block: &'a [Instruction]) -> Result<(), WitnessError> {
    for instruction in block {
      match instruction {
        Instruction::Assign { dest, source, line } => match dest {
          Target::Signal(index) => {
            let base = frame.signal_start + self.index(frame, index, *line)?;
            self.write_signals(frame, base, source, *line)?;
          },
          Target::Local(index) => {
            let values = self.source_values(frame, source, *line)?;
            let base = self.index(frame, index, *line)?;
            let end = base + values.len();
            let slots = frame.locals.get_mut(base..end).ok_or_else(|| {
              WitnessError::IndexDefect(format!(
                "{} writes locals {base}..{end} of {}",
                frame.template.name, frame.template.local_count
              ))
            })?;
            slots.copy_from_slice(&values);
          },
        },
        Instruction::Supply { child, signal, source, line } => {
          let id = self.existing_child(frame, child, *line)?;
          let base = self.components.get(id)?.signal_start + self.index(frame, signal, *line)?;
          self.write_signals(frame, base, source, *line)?;
          trace!("{} supplies {} values to child {id}", frame.template.name, source.width());
          self.deliver(id, source.width())?;
        },
        Instruction::Assert { lhs, rhs, line } => {
          let (lhs, rhs) = (self.eval(frame, lhs, *line)?, self.eval(frame, rhs, *line)?);
          if lhs != rhs {
            let diagnostic = self.diagnostic(frame, *line);
            error!("{lhs} != {rhs}: failed assert in {diagnostic}");
            return Err(WitnessError::ConstraintViolation(diagnostic));
          }
        },
        Instruction::Require { condition, line } =>
          if !self.eval(frame, condition, *line)?.is_true() {
            let diagnostic = self.diagnostic(frame, *line);
            error!("failed assert in {diagnostic}");
            return Err(WitnessError::ConstraintViolation(diagnostic));
          },
        Instruction::Create { group, element } => self.create(frame, *group, element.as_ref())?,
        Instruction::Branch { condition, then, otherwise, line } => {
          let taken = if self.eval(frame, condition, *line)?.is_true() { then } else { otherwise };
          self.execute(frame, taken)?;
        },
        Instruction::Loop { condition, body, line } => {
          let mut iterations = 0u64;
          while self.eval(frame, condition, *line)?.is_true() {
            if self.config.loop_limit.is_some_and(|limit| iterations >= limit) {
              return Err(WitnessError::LoopLimit(self.diagnostic(frame, *line)));
            }
            iterations += 1;
            self.execute(frame, body)?;
          }
        },
      }
    }
    Ok(())
  }

  fn create(
    &mut self,
    frame: &Frame<'a>,
    group_index: usize,
    element: Option<&Index>,
  ) -> Result<(), WitnessError> {
    let group = frame.template.children.get(group_index).ok_or_else(|| {
      WitnessError::IndexDefect(format!("{} has no child group {group_index}", frame.template.name))
    })?;
    let circuit = self.circuit;
    let child_template = &circuit.templates[group.template];
    let elements = match element {
      Some(index) => {
        let e = self.index(frame, index, 0)?;
        e..e + 1
      },
      None => 0..group.len(),
    };
    let base = frame.template.slot_base(group_index);
    for e in elements {
      if self.components.child(frame.id, base + e)?.is_some() {
        continue;
      }
      let signal_start = frame.signal_start + group.signal_offset + e * child_template.signal_count;
      let id = self.components.allocate(
        group.template,
        signal_start,
        Some(frame.id),
        group.element_name(e),
        child_template.input_count,
        child_template.child_slots(),
      );
      self.components.set_child(frame.id, base + e, id)?;
      debug!("created {} ({}) at signal {signal_start}", group.element_name(e), child_template.name);
      if child_template.input_count == 0 {
        self.run(id)?;
      }
    }
    Ok(())
  }

  fn existing_child(
    &self,
    frame: &Frame<'a>,
    child: &ChildRef,
    line: u32,
  ) -> Result<ComponentId, WitnessError> {
    let slot = frame.template.slot_base(child.group) + self.index(frame, &child.element, line)?;
    self.components.child(frame.id, slot)?.ok_or_else(|| {
      WitnessError::IndexDefect(format!(
        "{} uses child slot {slot} before creating it",
        frame.template.name
      ))
    })
  }

  /// Writes `source` to the arena starting at `base`. Copies between signals move the block in
  /// place.
  fn write_signals(
    &mut self,
    frame: &Frame<'a>,
    base: usize,
    source: &Source,
    line: u32,
  ) -> Result<(), WitnessError> {
    if let Source::Copy { from, width } = source {
      if let Some(start) = self.signal_slot(frame, from, line)? {
        self.arena.copy_within(start, base, *width);
        return Ok(());
      }
    }
    for (k, value) in self.source_values(frame, source, line)?.into_iter().enumerate() {
      self.arena.write(base + k, value);
    }
    Ok(())
  }

  /// Arena slot of a signal place, `None` for locals.
  fn signal_slot(
    &self,
    frame: &Frame<'a>,
    place: &Place,
    line: u32,
  ) -> Result<Option<usize>, WitnessError> {
    Ok(match place {
      Place::Signal(index) => Some(frame.signal_start + self.index(frame, index, line)?),
      Place::Local(_) => None,
      Place::Child { child, signal } => {
        let id = self.existing_child(frame, child, line)?;
        Some(self.components.get(id)?.signal_start + self.index(frame, signal, line)?)
      },
    })
  }

  fn source_values(
    &self,
    frame: &Frame<'a>,
    source: &Source,
    line: u32,
  ) -> Result<Vec<FieldElement>, WitnessError> {
    match source {
      Source::Value(expr) => Ok(vec![self.eval(frame, expr, line)?]),
      Source::Copy { from, width } =>
        (0..*width).map(|k| self.load(frame, from, k, line)).collect(),
    }
  }

  /// Reads `place` shifted by `shift` slots.
  fn load(
    &self,
    frame: &Frame<'a>,
    place: &Place,
    shift: usize,
    line: u32,
  ) -> Result<FieldElement, WitnessError> {
    match place {
      Place::Signal(index) =>
        Ok(self.arena.read(frame.signal_start + self.index(frame, index, line)? + shift)),
      Place::Local(index) => {
        let slot = self.index(frame, index, line)? + shift;
        frame.locals.get(slot).copied().ok_or_else(|| {
          WitnessError::IndexDefect(format!("{} reads local {slot}", frame.template.name))
        })
      },
      Place::Child { child, signal } => {
        let id = self.existing_child(frame, child, line)?;
        let start = self.components.get(id)?.signal_start;
        Ok(self.arena.read(start + self.index(frame, signal, line)? + shift))
      },
    }
  }

  fn index(&self, frame: &Frame<'a>, index: &Index, line: u32) -> Result<usize, WitnessError> {
    index.terms.iter().try_fold(index.offset, |acc, (stride, expr)| {
      Ok(acc + stride * self.eval(frame, expr, line)?.to_usize())
    })
  }

  fn eval(&self, frame: &Frame<'a>, expr: &Expr, line: u32) -> Result<FieldElement, WitnessError> {
    Ok(match expr {
      Expr::Constant(index) => self.circuit.constants[*index],
      Expr::Load(place) => self.load(frame, place, 0, line)?,
      Expr::Unary(op, operand) => {
        let value = self.eval(frame, operand, line)?;
        match op {
          UnaryOp::Neg => -value,
          UnaryOp::Not => value.not(),
          UnaryOp::BitNot => value.bnot(),
        }
      },
      Expr::Binary(op, lhs, rhs) => {
        let (a, b) = (self.eval(frame, lhs, line)?, self.eval(frame, rhs, line)?);
        match op {
          BinaryOp::Add => a + b,
          BinaryOp::Sub => a - b,
          BinaryOp::Mul => a * b,
          BinaryOp::Div => a.div(b).map_err(|e| self.field_error(frame, line, e))?,
          BinaryOp::Pow => a.pow(b.to_u64()),
          BinaryOp::Eq => a.equals(b),
          BinaryOp::Neq => a.not_equals(b),
          BinaryOp::Lt => a.less_than(b),
          BinaryOp::Gt => a.greater_than(b),
          BinaryOp::Leq => a.less_eq(b),
          BinaryOp::Geq => a.greater_eq(b),
          BinaryOp::Shr => a.shr(b),
          BinaryOp::Shl => a.shl(b),
          BinaryOp::BitAnd => a.band(b),
          BinaryOp::BitOr => a.bor(b),
          BinaryOp::BitXor => a.bxor(b),
          BinaryOp::And => a.and(b),
          BinaryOp::Or => a.or(b),
        }
      },
    })
  }

  fn field_error(&self, frame: &Frame<'a>, line: u32, err: FieldError) -> WitnessError {
    match err {
      FieldError::DivisionByZero => {
        let diagnostic = self.diagnostic(frame, line);
        error!("division by zero in {diagnostic}");
        WitnessError::DivisionByZero(diagnostic)
      },
      other => WitnessError::Field(other),
    }
  }

  fn diagnostic(&self, frame: &Frame<'a>, line: u32) -> Diagnostic {
    Diagnostic {
      template: frame.template.name.clone(),
      line,
      trace: self.components.trace(frame.id),
    }
  }
}

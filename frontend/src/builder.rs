//! Typed construction of circuit artifacts.
//!
//! [`CircuitBuilder`] interns constants and templates. Templates are defined through a
//! [`TemplateBuilder`], which lays signals out the way compiled circuits do (outputs, then inputs,
//! then intermediates, then child blocks in declaration order) and records statements in program
//! order. Every statement gets its own identifier, reported as the "line" of a failed assertion.
//!
//! ```ignore
//! let id = builder.template("Square", "Square", |t| {
//!   let out = t.output("out")?;
//!   let x = t.input("x")?;
//!   t.assign(&out, x.get() * x.get());
//!   Ok(())
//! })?;
//! ```

use std::collections::HashMap;

use edge_witness::{
  circuit::{Circuit, SignalInfo},
  constants::ConstantTable,
  template::{
    ChildGroup, ChildRef, Expr, Index, Instruction, Place, Source, Target, Template, TemplateId,
  },
  FieldElement,
};
use itertools::Itertools;
use tracing::{debug, trace};

use crate::error::FrontendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignalKind {
  Output,
  Input,
  Intermediate,
}

/// A named signal of a template, `offset` relative to the component's signal start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDecl {
  pub name:   String,
  pub kind:   SignalKind,
  pub offset: usize,
  pub dims:   Vec<usize>,
}

impl SignalDecl {
  pub fn width(&self) -> usize { self.dims.iter().product() }
}

/// An array subscript, fixed at build time or computed by the program.
#[derive(Debug, Clone)]
pub enum Subscript {
  Fixed(usize),
  Dynamic(Expr),
}

impl From<usize> for Subscript {
  fn from(value: usize) -> Self { Subscript::Fixed(value) }
}

impl From<Expr> for Subscript {
  fn from(value: Expr) -> Self { Subscript::Dynamic(value) }
}

impl From<&Var> for Subscript {
  fn from(value: &Var) -> Self { Subscript::Dynamic(value.get()) }
}

/// Selects one element along the outermost dimension.
///
/// # Panics
///
/// When `dims` is empty. Subscripting a scalar is a bug in the gadget being built, not a layout
/// the circuit could declare, so it is not reported as a [`FrontendError`].
fn subscript(index: &Index, dims: &[usize], at: Subscript) -> (Index, Vec<usize>) {
  assert!(!dims.is_empty(), "cannot subscript a scalar");
  let stride: usize = dims[1..].iter().product();
  let index = match at {
    Subscript::Fixed(k) => Index { offset: index.offset + k * stride, terms: index.terms.clone() },
    Subscript::Dynamic(expr) => index.clone().plus(stride, expr),
  };
  (index, dims[1..].to_vec())
}

/// A signal (or signal array) of the template being built.
#[derive(Debug, Clone)]
pub struct Sig {
  index: Index,
  dims:  Vec<usize>,
}

impl Sig {
  /// Element `i` of this array. Panics on a scalar.
  pub fn at(&self, i: impl Into<Subscript>) -> Sig {
    let (index, dims) = subscript(&self.index, &self.dims, i.into());
    Sig { index, dims }
  }

  pub fn get(&self) -> Expr { Expr::signal(self.index.clone()) }

  pub fn width(&self) -> usize { self.dims.iter().product() }

  pub fn place(&self) -> Place { Place::Signal(self.index.clone()) }
}

/// A local variable (or local array), including template parameters.
#[derive(Debug, Clone)]
pub struct Var {
  index: Index,
  dims:  Vec<usize>,
}

impl Var {
  /// Element `i` of this array. Panics on a scalar.
  pub fn at(&self, i: impl Into<Subscript>) -> Var {
    let (index, dims) = subscript(&self.index, &self.dims, i.into());
    Var { index, dims }
  }

  pub fn get(&self) -> Expr { Expr::local(self.index.clone()) }

  pub fn width(&self) -> usize { self.dims.iter().product() }

  pub fn place(&self) -> Place { Place::Local(self.index.clone()) }
}

/// A child component, or an array of them.
#[derive(Debug, Clone)]
pub struct Comp {
  group:    usize,
  template: TemplateId,
  element:  Index,
  dims:     Vec<usize>,
}

impl Comp {
  /// Element `i` of this array. Panics on a scalar.
  pub fn at(&self, i: impl Into<Subscript>) -> Comp {
    let (element, dims) = subscript(&self.element, &self.dims, i.into());
    Comp { element, dims, ..self.clone() }
  }

  fn child_ref(&self) -> ChildRef { ChildRef { group: self.group, element: self.element.clone() } }
}

/// A signal of a child component.
#[derive(Debug, Clone)]
pub struct Port {
  child:  ChildRef,
  signal: Index,
  dims:   Vec<usize>,
}

impl Port {
  /// Element `i` of this array. Panics on a scalar.
  pub fn at(&self, i: impl Into<Subscript>) -> Port {
    let (signal, dims) = subscript(&self.signal, &self.dims, i.into());
    Port { child: self.child.clone(), signal, dims }
  }

  pub fn get(&self) -> Expr { Expr::child(self.child.clone(), self.signal.clone()) }

  pub fn width(&self) -> usize { self.dims.iter().product() }

  pub fn place(&self) -> Place { Place::Child { child: self.child.clone(), signal: self.signal.clone() } }
}

#[derive(Debug, Default)]
pub struct CircuitBuilder {
  constants:    Vec<FieldElement>,
  constant_ids: HashMap<FieldElement, usize>,
  templates:    Vec<Template>,
  layouts:      Vec<Vec<SignalDecl>>,
  keys:         HashMap<String, TemplateId>,
}

impl CircuitBuilder {
  pub fn new() -> Self { Self::default() }

  /// Interns `value` in the constant table.
  pub fn constant(&mut self, value: FieldElement) -> Expr {
    let next = self.constants.len();
    let id = *self.constant_ids.entry(value).or_insert(next);
    if id == next {
      self.constants.push(value);
    }
    Expr::Constant(id)
  }

  /// Defines a template once per `key`. Later calls with the same key return the first id, so
  /// parameterised gadgets are shared by every instance with the same parameters.
  pub fn template<F>(
    &mut self,
    key: impl Into<String>,
    name: &str,
    body: F,
  ) -> Result<TemplateId, FrontendError>
  where
    F: FnOnce(&mut TemplateBuilder<'_>) -> Result<(), FrontendError>,
  {
    let key = key.into();
    if let Some(id) = self.keys.get(&key) {
      return Ok(*id);
    }
    let mut builder = TemplateBuilder::new(self, name);
    body(&mut builder)?;
    let (template, layout) = builder.finish()?;
    let id = self.templates.len();
    debug!(
      "defined template {key} as {id}: {} signals, {} inputs, {} children",
      template.signal_count,
      template.input_count,
      template.child_slots()
    );
    self.templates.push(template);
    self.layouts.push(layout);
    self.keys.insert(key, id);
    Ok(id)
  }

  pub fn get(&self, id: TemplateId) -> Option<&Template> { self.templates.get(id) }

  pub fn layout(&self, id: TemplateId) -> &[SignalDecl] {
    self.layouts.get(id).map(Vec::as_slice).unwrap_or_default()
  }

  fn components(&self, id: TemplateId) -> usize {
    1 + self.templates[id]
      .children
      .iter()
      .map(|group| group.len() * self.components(group.template))
      .sum::<usize>()
  }

  /// Finishes the circuit with `main` as the root template. Main's signal block starts at 1,
  /// right after the constant-one slot.
  pub fn build(self, main: TemplateId) -> Result<Circuit, FrontendError> {
    let template = self
      .templates
      .get(main)
      .ok_or_else(|| FrontendError::Other(format!("main template {main} is not defined")))?;
    let signal_count = 1 + template.signal_count;
    let component_count = self.components(main);
    let io = |kind: SignalKind| {
      self.layouts[main]
        .iter()
        .filter(|decl| decl.kind == kind)
        .map(|decl| SignalInfo { name: decl.name.clone(), offset: 1 + decl.offset, size: decl.width() })
        .collect_vec()
    };
    let (inputs, outputs) = (io(SignalKind::Input), io(SignalKind::Output));

    let circuit = Circuit {
      signal_count,
      component_count,
      main,
      main_signal_start: 1,
      constants: ConstantTable::new(self.constants),
      templates: self.templates,
      inputs,
      outputs,
      witness_map: None,
    };
    circuit.validate()?;
    debug!(
      "built circuit: {} templates, {} components, {} signals, {} constants",
      circuit.templates.len(),
      circuit.component_count,
      circuit.signal_count,
      circuit.constants.len()
    );
    Ok(circuit)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
  Output,
  Input,
  Intermediate,
  Children,
}

/// Records one template's layout and program.
pub struct TemplateBuilder<'c> {
  circuit:     &'c mut CircuitBuilder,
  name:        String,
  signals:     Vec<SignalDecl>,
  children:    Vec<ChildGroup>,
  phase:       Phase,
  next_signal: usize,
  next_local:  usize,
  blocks:      Vec<Vec<Instruction>>,
  line:        u32,
}

impl<'c> TemplateBuilder<'c> {
  fn new(circuit: &'c mut CircuitBuilder, name: &str) -> Self {
    Self {
      circuit,
      name: name.to_string(),
      signals: Vec::new(),
      children: Vec::new(),
      phase: Phase::Output,
      next_signal: 0,
      next_local: 0,
      blocks: vec![Vec::new()],
      line: 0,
    }
  }

  /// The enclosing circuit, for defining the templates of children.
  pub fn circuit(&mut self) -> &mut CircuitBuilder { &mut *self.circuit }

  pub fn name(&self) -> &str { &self.name }

  fn enter(&mut self, phase: Phase, name: &str) -> Result<(), FrontendError> {
    let layout = |reason: String| FrontendError::Layout { template: self.name.clone(), reason };
    if phase < self.phase {
      return Err(layout(format!("{name} declared as {phase:?} after {:?} declarations", self.phase)));
    }
    if self.signals.iter().any(|s| s.name == name) || self.children.iter().any(|c| c.name == name) {
      return Err(layout(format!("{name} declared twice")));
    }
    self.phase = phase;
    Ok(())
  }

  fn declare(&mut self, name: &str, kind: SignalKind, dims: &[usize]) -> Result<Sig, FrontendError> {
    let phase = match kind {
      SignalKind::Output => Phase::Output,
      SignalKind::Input => Phase::Input,
      SignalKind::Intermediate => Phase::Intermediate,
    };
    self.enter(phase, name)?;
    let decl = SignalDecl { name: name.to_string(), kind, offset: self.next_signal, dims: dims.to_vec() };
    self.next_signal += decl.width();
    let sig = Sig { index: Index::at(decl.offset), dims: decl.dims.clone() };
    self.signals.push(decl);
    Ok(sig)
  }

  pub fn output(&mut self, name: &str) -> Result<Sig, FrontendError> {
    self.declare(name, SignalKind::Output, &[])
  }

  pub fn output_array(&mut self, name: &str, dims: &[usize]) -> Result<Sig, FrontendError> {
    self.declare(name, SignalKind::Output, dims)
  }

  pub fn input(&mut self, name: &str) -> Result<Sig, FrontendError> {
    self.declare(name, SignalKind::Input, &[])
  }

  pub fn input_array(&mut self, name: &str, dims: &[usize]) -> Result<Sig, FrontendError> {
    self.declare(name, SignalKind::Input, dims)
  }

  pub fn signal(&mut self, name: &str) -> Result<Sig, FrontendError> {
    self.declare(name, SignalKind::Intermediate, &[])
  }

  pub fn signal_array(&mut self, name: &str, dims: &[usize]) -> Result<Sig, FrontendError> {
    self.declare(name, SignalKind::Intermediate, dims)
  }

  pub fn child(&mut self, name: &str, template: TemplateId) -> Result<Comp, FrontendError> {
    self.child_array(name, template, &[])
  }

  /// Declares a group of children. Their signal blocks follow this template's own signals.
  pub fn child_array(
    &mut self,
    name: &str,
    template: TemplateId,
    dims: &[usize],
  ) -> Result<Comp, FrontendError> {
    self.enter(Phase::Children, name)?;
    let child_signals = self
      .circuit
      .get(template)
      .map(|t| t.signal_count)
      .ok_or_else(|| FrontendError::Other(format!("{name}: template {template} is not defined")))?;
    let group = ChildGroup {
      name:          name.to_string(),
      template,
      dims:          dims.to_vec(),
      signal_offset: self.next_signal,
    };
    self.next_signal += group.len() * child_signals;
    self.children.push(group);
    Ok(Comp { group: self.children.len() - 1, template, element: Index::at(0), dims: dims.to_vec() })
  }

  /// A named signal of a child.
  pub fn port(&self, comp: &Comp, name: &str) -> Result<Port, FrontendError> {
    let decl = self.circuit.layout(comp.template).iter().find(|s| s.name == name).ok_or_else(|| {
      FrontendError::UnknownSignal {
        template: self.circuit.get(comp.template).map(|t| t.name.clone()).unwrap_or_default(),
        signal:   name.to_string(),
      }
    })?;
    Ok(Port { child: comp.child_ref(), signal: Index::at(decl.offset), dims: decl.dims.clone() })
  }

  pub fn lit(&mut self, value: u64) -> Expr { self.circuit.constant(FieldElement::from(value)) }

  pub fn constant(&mut self, value: FieldElement) -> Expr { self.circuit.constant(value) }

  fn local(&mut self, width: usize) -> Var {
    let var = Var { index: Index::at(self.next_local), dims: vec![] };
    self.next_local += width;
    var
  }

  /// A local initialised to `init`.
  pub fn var(&mut self, init: Expr) -> Var {
    let var = self.local(1);
    self.set(&var, init);
    var
  }

  /// A local array with every element initialised to `init`.
  pub fn var_array(&mut self, len: usize, init: Expr) -> Var {
    let mut var = self.local(len);
    var.dims = vec![len];
    for k in 0..len {
      self.set(&var.at(k), init.clone());
    }
    var
  }

  /// A template parameter, held in a local like any variable.
  pub fn param(&mut self, value: u64) -> Var {
    let init = self.lit(value);
    self.var(init)
  }

  fn next_line(&mut self) -> u32 {
    self.line += 1;
    self.line
  }

  fn emit(&mut self, instruction: Instruction) {
    trace!("{}: {:?}", self.name, instruction);
    if let Some(block) = self.blocks.last_mut() {
      block.push(instruction);
    }
  }

  /// `dest <-- value`
  pub fn assign(&mut self, dest: &Sig, value: Expr) {
    let line = self.next_line();
    let dest = Target::Signal(dest.index.clone());
    self.emit(Instruction::Assign { dest, source: Source::Value(value), line });
  }

  /// Whole-array assignment from another location of the same width.
  pub fn assign_from(&mut self, dest: &Sig, from: Place) {
    let line = self.next_line();
    let source = Source::Copy { from, width: dest.width() };
    self.emit(Instruction::Assign { dest: Target::Signal(dest.index.clone()), source, line });
  }

  pub fn set(&mut self, var: &Var, value: Expr) {
    let line = self.next_line();
    let dest = Target::Local(var.index.clone());
    self.emit(Instruction::Assign { dest, source: Source::Value(value), line });
  }

  /// `lhs === rhs`
  pub fn constrain(&mut self, lhs: Expr, rhs: Expr) {
    let line = self.next_line();
    self.emit(Instruction::Assert { lhs, rhs, line });
  }

  /// `assert(condition)`
  pub fn require(&mut self, condition: Expr) {
    let line = self.next_line();
    self.emit(Instruction::Require { condition, line });
  }

  /// Instantiates every element of a child group.
  pub fn create_all(&mut self, comp: &Comp) {
    self.emit(Instruction::Create { group: comp.group, element: None });
  }

  /// Instantiates one element of a child group.
  pub fn create(&mut self, comp: &Comp) {
    self.emit(Instruction::Create { group: comp.group, element: Some(comp.element.clone()) });
  }

  pub fn supply(&mut self, port: &Port, value: Expr) {
    let line = self.next_line();
    let (child, signal) = (port.child.clone(), port.signal.clone());
    self.emit(Instruction::Supply { child, signal, source: Source::Value(value), line });
  }

  /// Supplies a whole input array of a child in one write.
  pub fn supply_from(&mut self, port: &Port, from: Place) {
    let line = self.next_line();
    let (child, signal) = (port.child.clone(), port.signal.clone());
    let source = Source::Copy { from, width: port.width() };
    self.emit(Instruction::Supply { child, signal, source, line });
  }

  fn block(
    &mut self,
    body: impl FnOnce(&mut Self) -> Result<(), FrontendError>,
  ) -> Result<Vec<Instruction>, FrontendError> {
    self.blocks.push(Vec::new());
    body(self)?;
    self.blocks.pop().ok_or_else(|| FrontendError::Other("unbalanced statement blocks".into()))
  }

  pub fn branch(
    &mut self,
    condition: Expr,
    then: impl FnOnce(&mut Self) -> Result<(), FrontendError>,
    otherwise: impl FnOnce(&mut Self) -> Result<(), FrontendError>,
  ) -> Result<(), FrontendError> {
    let line = self.next_line();
    let then = self.block(then)?;
    let otherwise = self.block(otherwise)?;
    self.emit(Instruction::Branch { condition, then, otherwise, line });
    Ok(())
  }

  pub fn while_loop(
    &mut self,
    condition: Expr,
    body: impl FnOnce(&mut Self) -> Result<(), FrontendError>,
  ) -> Result<(), FrontendError> {
    let line = self.next_line();
    let body = self.block(body)?;
    self.emit(Instruction::Loop { condition, body, line });
    Ok(())
  }

  /// `for (var i = 0; i < end; i++) body`
  pub fn for_range(
    &mut self,
    end: Expr,
    body: impl FnOnce(&mut Self, &Var) -> Result<(), FrontendError>,
  ) -> Result<(), FrontendError> {
    let zero = self.lit(0);
    let one = self.lit(1);
    let i = self.var(zero);
    let condition = i.get().less_than(end);
    self.while_loop(condition, |t| {
      body(t, &i)?;
      t.set(&i, i.get() + one);
      Ok(())
    })
  }

  fn finish(mut self) -> Result<(Template, Vec<SignalDecl>), FrontendError> {
    let program = match (self.blocks.pop(), self.blocks.is_empty()) {
      (Some(program), true) => program,
      _ => return Err(FrontendError::Other(format!("{}: unbalanced statement blocks", self.name))),
    };
    let input_count =
      self.signals.iter().filter(|s| s.kind == SignalKind::Input).map(SignalDecl::width).sum();
    let template = Template {
      name: self.name,
      signal_count: self.next_signal,
      input_count,
      local_count: self.next_local,
      children: self.children,
      program,
    };
    Ok((template, self.signals))
  }
}

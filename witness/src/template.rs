//! The compiled form of a template: signal layout, child groups and a statement program.
//!
//! Programs address memory through three kinds of [`Place`]: the component's own signals, its
//! local scratch variables and the signals of one of its children. Every address is an [`Index`]
//! of the form `offset + Σ stride * toInt(expr)`, which is exactly the shape of indexing a
//! compiled circuit produces for nested array accesses inside loops.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

pub type TemplateId = usize;

/// An affine address: `offset + Σ stride * toInt(expr)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
  pub offset: usize,
  #[serde(default)]
  pub terms:  Vec<(usize, Expr)>,
}

impl Index {
  pub fn at(offset: usize) -> Self { Self { offset, terms: Vec::new() } }

  /// Adds `stride * toInt(expr)` to the address.
  pub fn plus(mut self, stride: usize, expr: Expr) -> Self {
    self.terms.push((stride, expr));
    self
  }

  pub fn is_static(&self) -> bool { self.terms.is_empty() }
}

impl From<usize> for Index {
  fn from(offset: usize) -> Self { Self::at(offset) }
}

/// One element of a child group, e.g. `eq[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
  pub group:   usize,
  pub element: Index,
}

/// A readable location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Place {
  Signal(Index),
  Local(Index),
  Child { child: ChildRef, signal: Index },
}

/// A writable location inside the running component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
  Signal(Index),
  Local(Index),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
  Neg,
  Not,
  BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Pow,
  Eq,
  Neq,
  Lt,
  Gt,
  Leq,
  Geq,
  Shr,
  Shl,
  BitAnd,
  BitOr,
  BitXor,
  And,
  Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
  /// Entry of the circuit's constant table
  Constant(usize),
  Load(Place),
  Unary(UnaryOp, Box<Expr>),
  Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
  pub fn signal(index: impl Into<Index>) -> Self { Self::Load(Place::Signal(index.into())) }

  pub fn local(index: impl Into<Index>) -> Self { Self::Load(Place::Local(index.into())) }

  pub fn child(child: ChildRef, signal: impl Into<Index>) -> Self {
    Self::Load(Place::Child { child, signal: signal.into() })
  }

  pub fn unary(op: UnaryOp, operand: Expr) -> Self { Self::Unary(op, Box::new(operand)) }

  pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
    Self::Binary(op, Box::new(lhs), Box::new(rhs))
  }

  pub fn div(self, rhs: Expr) -> Self { Self::binary(BinaryOp::Div, self, rhs) }

  pub fn pow(self, rhs: Expr) -> Self { Self::binary(BinaryOp::Pow, self, rhs) }

  pub fn equals(self, rhs: Expr) -> Self { Self::binary(BinaryOp::Eq, self, rhs) }

  pub fn not_equals(self, rhs: Expr) -> Self { Self::binary(BinaryOp::Neq, self, rhs) }

  pub fn less_than(self, rhs: Expr) -> Self { Self::binary(BinaryOp::Lt, self, rhs) }

  pub fn greater_than(self, rhs: Expr) -> Self { Self::binary(BinaryOp::Gt, self, rhs) }

  pub fn less_eq(self, rhs: Expr) -> Self { Self::binary(BinaryOp::Leq, self, rhs) }

  pub fn greater_eq(self, rhs: Expr) -> Self { Self::binary(BinaryOp::Geq, self, rhs) }

  pub fn shr(self, rhs: Expr) -> Self { Self::binary(BinaryOp::Shr, self, rhs) }

  pub fn shl(self, rhs: Expr) -> Self { Self::binary(BinaryOp::Shl, self, rhs) }

  pub fn bit_and(self, rhs: Expr) -> Self { Self::binary(BinaryOp::BitAnd, self, rhs) }

  pub fn bit_or(self, rhs: Expr) -> Self { Self::binary(BinaryOp::BitOr, self, rhs) }

  pub fn bit_xor(self, rhs: Expr) -> Self { Self::binary(BinaryOp::BitXor, self, rhs) }

  pub fn and(self, rhs: Expr) -> Self { Self::binary(BinaryOp::And, self, rhs) }

  pub fn or(self, rhs: Expr) -> Self { Self::binary(BinaryOp::Or, self, rhs) }

  pub fn not(self) -> Self { Self::unary(UnaryOp::Not, self) }

  /// Visits this expression and every sub-expression, index expressions included.
  pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
    f(self);
    match self {
      Self::Constant(_) => {},
      Self::Load(place) => place.walk(f),
      Self::Unary(_, operand) => operand.walk(f),
      Self::Binary(_, lhs, rhs) => {
        lhs.walk(f);
        rhs.walk(f);
      },
    }
  }
}

impl Place {
  fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
    let indices: Vec<&Index> = match self {
      Place::Signal(index) | Place::Local(index) => vec![index],
      Place::Child { child, signal } => vec![&child.element, signal],
    };
    for (_, expr) in indices.into_iter().flat_map(|index| index.terms.iter()) {
      expr.walk(f);
    }
  }
}

impl Add for Expr {
  type Output = Expr;

  fn add(self, rhs: Expr) -> Expr { Expr::binary(BinaryOp::Add, self, rhs) }
}

impl Sub for Expr {
  type Output = Expr;

  fn sub(self, rhs: Expr) -> Expr { Expr::binary(BinaryOp::Sub, self, rhs) }
}

impl Mul for Expr {
  type Output = Expr;

  fn mul(self, rhs: Expr) -> Expr { Expr::binary(BinaryOp::Mul, self, rhs) }
}

impl Neg for Expr {
  type Output = Expr;

  fn neg(self) -> Expr { Expr::unary(UnaryOp::Neg, self) }
}

/// Where a stored value comes from. `Copy` moves `width` consecutive values at once, the way
/// whole-array assignments compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
  Value(Expr),
  Copy { from: Place, width: usize },
}

impl Source {
  pub fn width(&self) -> usize {
    match self {
      Source::Value(_) => 1,
      Source::Copy { width, .. } => *width,
    }
  }
}

impl From<Expr> for Source {
  fn from(expr: Expr) -> Self { Source::Value(expr) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
  /// Store into one of the component's own signals or locals.
  Assign { dest: Target, source: Source, line: u32 },
  /// Write an input signal of a child. The child's pending counter drops by the source width and
  /// the child runs as soon as it reaches zero.
  Supply { child: ChildRef, signal: Index, source: Source, line: u32 },
  /// `lhs === rhs`
  Assert { lhs: Expr, rhs: Expr, line: u32 },
  /// `assert(condition)` over template parameters or values
  Require { condition: Expr, line: u32 },
  /// Instantiate one element of a child group, or the whole group when `element` is `None`.
  /// Already created elements are left untouched.
  Create { group: usize, element: Option<Index> },
  Branch { condition: Expr, then: Vec<Instruction>, otherwise: Vec<Instruction>, line: u32 },
  Loop { condition: Expr, body: Vec<Instruction>, line: u32 },
}

impl Instruction {
  /// Visits this instruction and every nested one, depth first.
  pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Instruction)) {
    f(self);
    match self {
      Instruction::Branch { then, otherwise, .. } =>
        then.iter().chain(otherwise.iter()).for_each(|i| i.walk(f)),
      Instruction::Loop { body, .. } => body.iter().for_each(|i| i.walk(f)),
      _ => {},
    }
  }
}

/// An array of sub-components of one template, laid out back to back inside the parent's block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildGroup {
  pub name:          String,
  pub template:      TemplateId,
  /// Array dimensions, empty for a single component.
  #[serde(default)]
  pub dims:          Vec<usize>,
  /// Offset of the first element's signals from the parent's signal start.
  pub signal_offset: usize,
}

impl ChildGroup {
  pub fn len(&self) -> usize { self.dims.iter().product() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Diagnostic name of one element: `eq` for scalars, `eq[2]` or `eq[1][0]` for arrays.
  pub fn element_name(&self, element: usize) -> String {
    let mut suffix = String::new();
    let mut rest = element;
    for (pos, _) in self.dims.iter().enumerate() {
      let stride: usize = self.dims[pos + 1..].iter().product();
      suffix.push_str(&format!("[{}]", rest / stride));
      rest %= stride;
    }
    format!("{}{}", self.name, suffix)
  }
}

/// Static descriptor shared by every instance of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
  pub name:         String,
  /// Size of the component's whole block, including the blocks of its children.
  pub signal_count: usize,
  /// Number of input signal slots that must be written before the program runs.
  pub input_count:  usize,
  pub local_count:  usize,
  #[serde(default)]
  pub children:     Vec<ChildGroup>,
  pub program:      Vec<Instruction>,
}

impl Template {
  /// Number of child slots an instance carries, over all groups.
  pub fn child_slots(&self) -> usize { self.children.iter().map(ChildGroup::len).sum() }

  /// Slot of the first element of `group`.
  pub fn slot_base(&self, group: usize) -> usize {
    self.children[..group].iter().map(ChildGroup::len).sum()
  }

  pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
    let mut all = Vec::new();
    self.program.iter().for_each(|i| i.walk(&mut |n| all.push(n)));
    all.into_iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn element_names() {
    let group = |dims: Vec<usize>| ChildGroup {
      name: "eq".into(),
      template: 0,
      dims,
      signal_offset: 0,
    };
    assert_eq!(group(vec![]).element_name(0), "eq");
    assert_eq!(group(vec![4]).element_name(2), "eq[2]");
    assert_eq!(group(vec![2, 3]).element_name(4), "eq[1][1]");
    assert_eq!(group(vec![2, 3]).len(), 6);
    assert_eq!(group(vec![]).len(), 1);
  }

  #[test]
  fn slots_follow_group_order() {
    let template = Template {
      name:         "T".into(),
      signal_count: 0,
      input_count:  0,
      local_count:  0,
      children:     vec![
        ChildGroup { name: "a".into(), template: 0, dims: vec![3], signal_offset: 0 },
        ChildGroup { name: "b".into(), template: 0, dims: vec![], signal_offset: 0 },
      ],
      program:      vec![],
    };
    assert_eq!(template.child_slots(), 4);
    assert_eq!(template.slot_base(1), 3);
  }

  #[test]
  fn walks_nested_programs() {
    let assign = Instruction::Assign {
      dest:   Target::Local(Index::at(0)),
      source: Source::Value(Expr::Constant(0)),
      line:   1,
    };
    let program = Instruction::Loop {
      condition: Expr::local(0).less_than(Expr::Constant(1)),
      body:      vec![Instruction::Branch {
        condition: Expr::Constant(0),
        then:      vec![assign.clone()],
        otherwise: vec![assign],
        line:      2,
      }],
      line:      3,
    };
    let mut count = 0;
    program.walk(&mut |_| count += 1);
    assert_eq!(count, 4);

    let mut constants = Vec::new();
    Expr::signal(Index::at(1).plus(2, Expr::Constant(5))).walk(&mut |e| {
      if let Expr::Constant(c) = e {
        constants.push(*c)
      }
    });
    assert_eq!(constants, vec![5]);
  }
}

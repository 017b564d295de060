//! Bookkeeping for live component instances.
//!
//! A component owns the children it creates: its `children` list is the only reference to them.
//! Metadata is released after the owner's program finishes. Signal values live in the
//! [`crate::arena::SignalArena`] and outlive it.

use crate::{error::WitnessError, template::TemplateId};

pub type ComponentId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
  pub template:       TemplateId,
  pub signal_start:   usize,
  /// Input slots still to be written before the program may run.
  pub pending_inputs: usize,
  /// Owner, used only to build diagnostic traces.
  pub parent:         Option<ComponentId>,
  /// One entry per child slot, `None` while not created or once released.
  pub children:       Vec<Option<ComponentId>>,
  pub name:           String,
}

/// Outcome of writing an input to a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
  /// The last input arrived, the component must run now.
  Ready,
  /// This many input slots are still missing.
  Pending(usize),
}

#[derive(Debug, Default)]
pub struct ComponentTable {
  slots: Vec<Option<Component>>,
  live:  usize,
}

impl ComponentTable {
  pub fn with_capacity(capacity: usize) -> Self {
    Self { slots: Vec::with_capacity(capacity), live: 0 }
  }

  pub fn allocate(
    &mut self,
    template: TemplateId,
    signal_start: usize,
    parent: Option<ComponentId>,
    name: String,
    input_count: usize,
    child_slots: usize,
  ) -> ComponentId {
    let id = self.slots.len();
    self.slots.push(Some(Component {
      template,
      signal_start,
      pending_inputs: input_count,
      parent,
      children: vec![None; child_slots],
      name,
    }));
    self.live += 1;
    id
  }

  pub fn get(&self, id: ComponentId) -> Result<&Component, WitnessError> {
    self
      .slots
      .get(id)
      .and_then(Option::as_ref)
      .ok_or_else(|| WitnessError::IndexDefect(format!("component {id} is not live")))
  }

  fn get_mut(&mut self, id: ComponentId) -> Result<&mut Component, WitnessError> {
    self
      .slots
      .get_mut(id)
      .and_then(Option::as_mut)
      .ok_or_else(|| WitnessError::IndexDefect(format!("component {id} is not live")))
  }

  /// Records that `width` input slots of `id` were written. A component with no pending inputs has
  /// already run, so writing to it again is a defect.
  pub fn supply_input(&mut self, id: ComponentId, width: usize) -> Result<Readiness, WitnessError> {
    let component = self.get_mut(id)?;
    if component.pending_inputs == 0 {
      return Err(WitnessError::IndexDefect(format!(
        "component {} received {width} inputs after it ran",
        component.name
      )));
    }
    let Some(remaining) = component.pending_inputs.checked_sub(width) else {
      return Err(WitnessError::IndexDefect(format!(
        "component {} received {width} inputs with {} pending",
        component.name, component.pending_inputs
      )));
    };
    component.pending_inputs = remaining;
    Ok(match component.pending_inputs {
      0 => Readiness::Ready,
      n => Readiness::Pending(n),
    })
  }

  pub fn child(&self, parent: ComponentId, slot: usize) -> Result<Option<ComponentId>, WitnessError> {
    let component = self.get(parent)?;
    component.children.get(slot).copied().ok_or_else(|| {
      WitnessError::IndexDefect(format!("component {} has no child slot {slot}", component.name))
    })
  }

  pub fn set_child(
    &mut self,
    parent: ComponentId,
    slot: usize,
    child: ComponentId,
  ) -> Result<(), WitnessError> {
    let component = self.get_mut(parent)?;
    let name = component.name.clone();
    let entry = component
      .children
      .get_mut(slot)
      .ok_or_else(|| WitnessError::IndexDefect(format!("component {name} has no child slot {slot}")))?;
    *entry = Some(child);
    Ok(())
  }

  /// Names from the root down to `id`.
  pub fn trace(&self, id: ComponentId) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = Some(id);
    while let Some(current) = cursor {
      match self.slots.get(current).and_then(Option::as_ref) {
        Some(component) => {
          names.push(component.name.clone());
          cursor = component.parent;
        },
        None => break,
      }
    }
    names.reverse();
    names
  }

  /// Drops the metadata of `id` and, first, of every child it still holds.
  pub fn release(&mut self, id: ComponentId) {
    self.release_children(id);
    if let Some(slot) = self.slots.get_mut(id) {
      if slot.take().is_some() {
        self.live -= 1;
      }
    }
  }

  pub fn release_children(&mut self, id: ComponentId) {
    let children = match self.slots.get_mut(id).and_then(Option::as_mut) {
      Some(component) => std::mem::take(&mut component.children),
      None => return,
    };
    let slots = children.len();
    for child in children.into_iter().flatten() {
      self.release(child);
    }
    if let Some(component) = self.slots.get_mut(id).and_then(Option::as_mut) {
      component.children = vec![None; slots];
    }
  }

  /// Number of components whose metadata is still held.
  pub fn live(&self) -> usize { self.live }

  /// Number of components allocated so far, released ones included.
  pub fn allocated(&self) -> usize { self.slots.len() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table_with_tree() -> (ComponentTable, ComponentId, ComponentId, ComponentId) {
    let mut table = ComponentTable::default();
    let main = table.allocate(0, 1, None, "main".into(), 2, 1);
    let child = table.allocate(1, 5, Some(main), "lt".into(), 2, 1);
    table.set_child(main, 0, child).unwrap();
    let grandchild = table.allocate(2, 8, Some(child), "n2b".into(), 1, 0);
    table.set_child(child, 0, grandchild).unwrap();
    (table, main, child, grandchild)
  }

  #[test]
  fn supply_counts_down_to_ready() {
    let (mut table, _, child, _) = table_with_tree();
    assert_eq!(table.supply_input(child, 1).unwrap(), Readiness::Pending(1));
    assert_eq!(table.supply_input(child, 1).unwrap(), Readiness::Ready);
  }

  #[test]
  fn multi_width_supply() {
    let (mut table, main, ..) = table_with_tree();
    assert_eq!(table.supply_input(main, 2).unwrap(), Readiness::Ready);
  }

  #[test]
  fn underflow_is_a_defect() {
    let (mut table, _, _, grandchild) = table_with_tree();
    assert!(matches!(table.supply_input(grandchild, 2), Err(WitnessError::IndexDefect(_))));
  }

  #[test]
  fn supply_after_run_is_a_defect() {
    let (mut table, _, _, grandchild) = table_with_tree();
    assert_eq!(table.supply_input(grandchild, 1).unwrap(), Readiness::Ready);
    assert!(matches!(table.supply_input(grandchild, 0), Err(WitnessError::IndexDefect(_))));
    assert!(matches!(table.supply_input(grandchild, 1), Err(WitnessError::IndexDefect(_))));

    let zero_inputs = table.allocate(3, 9, None, "tick".into(), 0, 0);
    assert!(matches!(table.supply_input(zero_inputs, 1), Err(WitnessError::IndexDefect(_))));
  }

  #[test]
  fn trace_is_root_first() {
    let (table, _, _, grandchild) = table_with_tree();
    assert_eq!(table.trace(grandchild), vec!["main", "lt", "n2b"]);
  }

  #[test]
  fn release_is_recursive() {
    let (mut table, main, child, grandchild) = table_with_tree();
    assert_eq!(table.live(), 3);
    table.release_children(main);
    assert_eq!(table.live(), 1);
    assert!(table.get(child).is_err());
    assert!(table.get(grandchild).is_err());
    assert_eq!(table.child(main, 0).unwrap(), None);
    table.release(main);
    assert_eq!(table.live(), 0);
    assert_eq!(table.allocated(), 3);
  }

  #[test]
  fn unknown_slot_is_a_defect() {
    let (table, main, ..) = table_with_tree();
    assert!(matches!(table.child(main, 3), Err(WitnessError::IndexDefect(_))));
  }
}

//! Runtime scope chain.
//!
//! Frames are reference-counted and interior-mutable: a frame lives as long
//! as the active call stack or any closure still points at it, and every
//! holder sees the same slots. Locals live in an append-only slot vector
//! indexed by the resolver's addresses; only the root frame carries the
//! name-keyed global table.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::runtime::value::Value;

pub type FrameRef = Rc<RefCell<Frame>>;

/// `None` marks a variable declared without an initializer.
pub type Slot = Option<Value>;

/// Why a by-name global lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unbound {
    Undefined,
    Uninitialized,
}

#[derive(Debug, Default)]
pub struct Frame {
    enclosing: Option<FrameRef>,
    slots: Vec<Slot>,
    /// Present only on the root frame.
    globals: Option<FxHashMap<String, Slot>>,
}

impl Frame {
    /// The root frame, holding the global table.
    pub fn global() -> FrameRef {
        Rc::new(RefCell::new(Frame { enclosing: None, slots: Vec::new(), globals: Some(FxHashMap::default()) }))
    }

    pub fn child(enclosing: &FrameRef) -> FrameRef {
        Rc::new(RefCell::new(Frame { enclosing: Some(Rc::clone(enclosing)), slots: Vec::new(), globals: None }))
    }

    /// Bind `name` in this frame: into the global table at the root, or as
    /// the next slot anywhere else (the name is then only informational).
    pub fn define(&mut self, name: &str, value: Slot) {
        match &mut self.globals {
            Some(globals) => { globals.insert(name.to_string(), value); }
            None => self.slots.push(value),
        }
    }

    /// By-name read from the global table.
    pub fn get(&self, name: &str) -> Result<Value, Unbound> {
        match self.globals.as_ref().and_then(|g| g.get(name)) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None)        => Err(Unbound::Uninitialized),
            None              => Err(Unbound::Undefined),
        }
    }

    /// By-name write to an existing global. Never creates one.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), Unbound> {
        match self.globals.as_mut().and_then(|g| g.get_mut(name)) {
            Some(slot) => { *slot = Some(value); Ok(()) }
            None => Err(Unbound::Undefined),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

/// Follow exactly `distance` enclosing links.
///
/// # Panics
/// If the chain is shorter than `distance`; resolver addresses never are.
pub fn ancestor(frame: &FrameRef, distance: usize) -> FrameRef {
    let mut current = Rc::clone(frame);
    for _ in 0..distance {
        let next = current.borrow().enclosing.clone()
            .unwrap_or_else(|| panic!("scope chain shorter than resolved distance {distance}"));
        current = next;
    }
    current
}

/// Indexed read. `None` means the slot exists but was never initialized.
///
/// # Panics
/// If the address is out of range; resolver addresses never are.
pub fn get_at(frame: &FrameRef, distance: usize, slot: usize) -> Slot {
    let target = ancestor(frame, distance);
    let target = target.borrow();
    match target.slots.get(slot) {
        Some(value) => value.clone(),
        None => panic!("no slot {slot} at distance {distance}"),
    }
}

/// Indexed write.
///
/// # Panics
/// If the address is out of range; resolver addresses never are.
pub fn assign_at(frame: &FrameRef, distance: usize, slot: usize, value: Value) {
    let target = ancestor(frame, distance);
    let mut target = target.borrow_mut();
    match target.slots.get_mut(slot) {
        Some(cell) => *cell = Some(value),
        None => panic!("no slot {slot} at distance {distance}"),
    }
}

//! Action Queue
//!
//! The per-goal queue of boxed actions. The front element is the
//! current action; everything behind it is upcoming work. Pushes
//! arriving while the current action is non-interruptible are parked
//! and applied once the front changes.

use std::collections::VecDeque;
use std::fmt;

use crate::actions::Action;

#[derive(Default)]
pub struct ActionQueue {
    actions: VecDeque<Box<dyn Action>>,
    /// Front-insertions deferred while the current action refused
    /// interruption.
    deferred_front: Vec<Box<dyn Action>>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, action: Box<dyn Action>) {
        self.actions.push_back(action);
    }

    /// Inserts ahead of the current action, making it current.
    pub fn push_front(&mut self, action: Box<dyn Action>) {
        self.actions.push_front(action);
    }

    /// Parks a front-insertion until [`ActionQueue::apply_deferred`].
    pub fn defer_front(&mut self, action: Box<dyn Action>) {
        self.deferred_front.push(action);
    }

    /// Applies parked front-insertions, earliest ending up at the front.
    pub fn apply_deferred(&mut self) {
        for action in self.deferred_front.drain(..).rev() {
            self.actions.push_front(action);
        }
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred_front.is_empty()
    }

    pub fn current(&self) -> Option<&dyn Action> {
        self.actions.front().map(AsRef::as_ref)
    }

    pub fn current_mut(&mut self) -> Option<&mut Box<dyn Action>> {
        self.actions.front_mut()
    }

    /// Removes and returns the current action.
    pub fn pop_current(&mut self) -> Option<Box<dyn Action>> {
        self.actions.pop_front()
    }

    /// Drops everything behind the current action.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.deferred_front.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Action> {
        self.actions.iter().map(AsRef::as_ref)
    }
}

impl fmt::Debug for ActionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.actions.iter().map(|a| a.name()).collect();
        f.debug_struct("ActionQueue")
            .field("actions", &names)
            .field("deferred", &self.deferred_front.len())
            .finish()
    }
}

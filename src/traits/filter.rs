// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::traits::{Task, TaskHandle, TaskId};

/// A boolean-valued task.
///
/// Filters compute their value during `process` (or lazily in
/// `is_expression_true`) and are attached to other tasks to gate them.
pub trait Filter: Task {
    fn is_expression_true(&self) -> bool;

    fn is_inverted(&self) -> bool;

    fn set_inverted(&mut self, inverted: bool);

    fn is_condition_true(&self) -> bool {
        self.is_expression_true() ^ self.is_inverted()
    }

    /// Human-readable form of the condition.
    fn rule(&self) -> String {
        if self.is_inverted() {
            format!("!{}", self.name())
        } else {
            self.name().to_string()
        }
    }
}

/// Shared reference to a filter, usable both as a gate and as a list entry.
///
/// Both views point at the same cell.
#[derive(Clone)]
pub struct FilterHandle {
    id: TaskId,
    task: Rc<RefCell<dyn Task>>,
    filter: Rc<RefCell<dyn Filter>>,
}

impl FilterHandle {
    pub fn new<F: Filter + 'static>(filter: F) -> Self {
        Self::from_rc(Rc::new(RefCell::new(filter)))
    }

    pub fn from_rc<F: Filter + 'static>(rc: Rc<RefCell<F>>) -> Self {
        let id = rc.borrow().id();
        let task: Rc<RefCell<dyn Task>> = rc.clone();
        Self {
            id,
            task,
            filter: rc,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// `None` when the filter is currently borrowed mutably, i.e. it is being
    /// evaluated further up the call stack.
    pub fn is_condition_true(&self) -> Option<bool> {
        self.filter
            .try_borrow()
            .ok()
            .map(|filter| filter.is_condition_true())
    }

    pub fn name(&self) -> Option<String> {
        self.filter
            .try_borrow()
            .ok()
            .map(|filter| filter.name().to_string())
    }

    pub fn rule(&self) -> Option<String> {
        self.filter.try_borrow().ok().map(|filter| filter.rule())
    }

    /// Panics if the filter is mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, dyn Filter> {
        self.filter.borrow()
    }

    /// Panics if the filter is already borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, dyn Filter> {
        self.filter.borrow_mut()
    }

    pub fn try_borrow(&self) -> Option<Ref<'_, dyn Filter>> {
        self.filter.try_borrow().ok()
    }

    pub fn try_borrow_mut(&self) -> Option<RefMut<'_, dyn Filter>> {
        self.filter.try_borrow_mut().ok()
    }

    pub fn task_handle(&self) -> TaskHandle {
        TaskHandle::from_parts(self.id, self.task.clone())
    }
}

impl fmt::Debug for FilterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule() {
            Some(rule) => write!(f, "FilterHandle({} {})", self.id, rule),
            None => write!(f, "FilterHandle({} <busy>)", self.id),
        }
    }
}

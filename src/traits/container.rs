// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// A named piece of shared state held in the parameter registry.
pub trait Container: fmt::Debug + 'static {
    fn kind(&self) -> &'static str;

    /// Clear transient per-event state. Called once per event by the
    /// outermost task list unless it runs with `DONT_RESET`.
    fn reset(&mut self) {}

    fn is_ready_to_save(&self) -> bool {
        false
    }

    fn set_ready_to_save(&mut self, _ready: bool) {}
}

/// Containers the registry can construct on demand.
pub trait ContainerKind: Container + Default {
    const KIND: &'static str;
}

/// Shared reference to a registry container.
///
/// Keeps a `dyn Container` view for the registry's own bookkeeping and a
/// `dyn Any` view of the same allocation for typed access.
#[derive(Clone)]
pub struct ContainerHandle {
    kind: &'static str,
    cell: Rc<RefCell<dyn Container>>,
    any: Rc<dyn Any>,
}

impl ContainerHandle {
    pub fn new<T: Container + 'static>(container: T) -> Self {
        Self::from_rc(Rc::new(RefCell::new(container)))
    }

    pub fn from_rc<T: Container + 'static>(rc: Rc<RefCell<T>>) -> Self {
        let kind = rc.borrow().kind();
        let cell: Rc<RefCell<dyn Container>> = rc.clone();
        Self {
            kind,
            cell,
            any: rc,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn downcast<T: Container + 'static>(&self) -> Option<Rc<RefCell<T>>> {
        self.any.clone().downcast::<RefCell<T>>().ok()
    }

    pub fn borrow(&self) -> Ref<'_, dyn Container> {
        self.cell.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, dyn Container> {
        self.cell.borrow_mut()
    }

    pub fn try_borrow(&self) -> Option<Ref<'_, dyn Container>> {
        self.cell.try_borrow().ok()
    }

    pub fn try_borrow_mut(&self) -> Option<RefMut<'_, dyn Container>> {
        self.cell.try_borrow_mut().ok()
    }

    pub fn ptr_eq(&self, other: &ContainerHandle) -> bool {
        Rc::ptr_eq(&self.any, &other.any)
    }
}

impl fmt::Debug for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_borrow() {
            Some(container) => write!(f, "{:?}", &*container),
            None => write!(f, "ContainerHandle({} <busy>)", self.kind),
        }
    }
}

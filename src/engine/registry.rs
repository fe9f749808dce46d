// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Name-keyed store of the containers tasks share.
//!
//! Insertion order is preserved so resets and dumps are deterministic.
//! Containers are either added by the application or created on demand by
//! [`ParameterRegistry::find_or_create`] through a [`ContainerFactory`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::errors::RegistryError;
use crate::observability::messages::registry::{
    ContainerAutoCreated, ContainerKindMismatch, ContainerReplaced, UnknownContainerKind,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{ContainerHandle, ContainerKind};

/// Reentrancy guards shared by nested task lists.
///
/// Only the outermost list that finds a guard free acquires it, and only that
/// list performs the guarded side effects (registry reset, ready-to-save
/// bookkeeping).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryGuard {
    DoNotReset,
    IsProcessing,
}

type Constructor = Box<dyn Fn() -> ContainerHandle>;

/// Maps kind tags to default constructors.
pub struct ContainerFactory {
    constructors: HashMap<&'static str, Constructor>,
}

impl ContainerFactory {
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    pub fn register<T: ContainerKind>(&mut self) {
        self.constructors
            .insert(T::KIND, Box::new(|| ContainerHandle::new(T::default())));
    }

    pub fn create(&self, kind: &str) -> Option<ContainerHandle> {
        self.constructors.get(kind).map(|constructor| constructor())
    }

    pub fn is_kind_available(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    pub fn list_available_kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.constructors.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

impl Default for ContainerFactory {
    /// No kinds; backends register their own.
    fn default() -> Self {
        Self::empty()
    }
}

struct RegistryEntry {
    handle: ContainerHandle,
    auto_created: bool,
}

pub struct ParameterRegistry {
    entries: IndexMap<String, RegistryEntry>,
    factory: ContainerFactory,
    owner: bool,
    ready_to_save: bool,
    do_not_reset: bool,
    is_processing: bool,
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::with_factory(ContainerFactory::default())
    }

    pub fn with_factory(factory: ContainerFactory) -> Self {
        Self {
            entries: IndexMap::new(),
            factory,
            owner: false,
            ready_to_save: false,
            do_not_reset: false,
            is_processing: false,
        }
    }

    /// When set, the registry keeps every container it displaces or removes
    /// instead of handing it back to the caller.
    pub fn set_owner(&mut self, owner: bool) {
        self.owner = owner;
    }

    pub fn is_owner(&self) -> bool {
        self.owner
    }

    pub fn factory(&self) -> &ContainerFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut ContainerFactory {
        &mut self.factory
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn find(&self, name: &str) -> Option<ContainerHandle> {
        self.entries.get(name).map(|entry| entry.handle.clone())
    }

    pub fn find_as<T: ContainerKind>(&self, name: &str) -> Option<Rc<RefCell<T>>> {
        self.entries
            .get(name)
            .and_then(|entry| entry.handle.downcast::<T>())
    }

    /// Register a container. Adding the very same container again is a no-op.
    pub fn add(&mut self, name: &str, handle: ContainerHandle) -> Result<(), RegistryError> {
        if let Some(existing) = self.entries.get(name) {
            if existing.handle.ptr_eq(&handle) {
                return Ok(());
            }
            return Err(RegistryError::DuplicateName {
                name: name.to_string(),
            });
        }
        self.entries.insert(
            name.to_string(),
            RegistryEntry {
                handle,
                auto_created: false,
            },
        );
        Ok(())
    }

    /// Look up `name`, creating a default container of `kind` if absent.
    pub fn find_or_create(&mut self, kind: &str, name: &str) -> Result<ContainerHandle, RegistryError> {
        if let Some(entry) = self.entries.get(name) {
            if entry.handle.kind() != kind {
                let error = RegistryError::KindMismatch {
                    name: name.to_string(),
                    expected: kind.to_string(),
                    found: entry.handle.kind().to_string(),
                };
                ContainerKindMismatch {
                    name,
                    expected: kind,
                    found: entry.handle.kind(),
                }
                .log();
                return Err(error);
            }
            return Ok(entry.handle.clone());
        }

        let Some(handle) = self.factory.create(kind) else {
            UnknownContainerKind { name, kind }.log();
            return Err(RegistryError::UnknownKind {
                kind: kind.to_string(),
                name: name.to_string(),
            });
        };

        ContainerAutoCreated { name, kind }.log();
        self.entries.insert(
            name.to_string(),
            RegistryEntry {
                handle: handle.clone(),
                auto_created: true,
            },
        );
        Ok(handle)
    }

    /// Typed variant of [`find_or_create`](Self::find_or_create).
    pub fn find_or_create_as<T: ContainerKind>(&mut self, name: &str) -> Result<Rc<RefCell<T>>, RegistryError> {
        if let Some(entry) = self.entries.get(name) {
            return entry.handle.downcast::<T>().ok_or_else(|| {
                ContainerKindMismatch {
                    name,
                    expected: T::KIND,
                    found: entry.handle.kind(),
                }
                .log();
                RegistryError::KindMismatch {
                    name: name.to_string(),
                    expected: T::KIND.to_string(),
                    found: entry.handle.kind().to_string(),
                }
            });
        }

        let rc = Rc::new(RefCell::new(T::default()));
        ContainerAutoCreated { name, kind: T::KIND }.log();
        self.entries.insert(
            name.to_string(),
            RegistryEntry {
                handle: ContainerHandle::from_rc(rc.clone()),
                auto_created: true,
            },
        );
        Ok(rc)
    }

    /// Swap the container registered as `name` in place, or add it when the
    /// name is free.
    ///
    /// Returns the displaced container unless the registry owns it (it was
    /// auto-created, or the registry is the owner).
    pub fn replace(&mut self, name: &str, handle: ContainerHandle) -> Option<ContainerHandle> {
        let Some(entry) = self.entries.get_mut(name) else {
            self.entries.insert(
                name.to_string(),
                RegistryEntry {
                    handle,
                    auto_created: false,
                },
            );
            return None;
        };

        if entry.handle.ptr_eq(&handle) {
            return None;
        }

        ContainerReplaced {
            name,
            old_kind: entry.handle.kind(),
            new_kind: handle.kind(),
        }
        .log();
        let displaced = std::mem::replace(
            entry,
            RegistryEntry {
                handle,
                auto_created: false,
            },
        );
        self.hand_back(displaced)
    }

    /// Remove `name`, with the same hand-back rule as [`replace`](Self::replace).
    pub fn remove(&mut self, name: &str) -> Option<ContainerHandle> {
        let displaced = self.entries.shift_remove(name)?;
        self.hand_back(displaced)
    }

    fn hand_back(&self, entry: RegistryEntry) -> Option<ContainerHandle> {
        if self.owner || entry.auto_created {
            None
        } else {
            Some(entry.handle)
        }
    }

    /// Clear the transient state of every container.
    pub fn reset(&mut self) {
        for entry in self.entries.values() {
            if let Some(mut container) = entry.handle.try_borrow_mut() {
                container.reset();
            }
        }
    }

    pub fn set_ready_to_save(&mut self, ready: bool) {
        self.ready_to_save = ready;
        for entry in self.entries.values() {
            if let Some(mut container) = entry.handle.try_borrow_mut() {
                container.set_ready_to_save(ready);
            }
        }
    }

    pub fn is_ready_to_save(&self) -> bool {
        self.ready_to_save
    }

    /// Acquire `guard` if nobody holds it. Returns whether this caller now
    /// holds it.
    pub fn try_acquire(&mut self, guard: RegistryGuard) -> bool {
        let flag = self.guard_flag(guard);
        if *flag {
            return false;
        }
        *flag = true;
        true
    }

    pub fn release(&mut self, guard: RegistryGuard) {
        *self.guard_flag(guard) = false;
    }

    pub fn is_held(&self, guard: RegistryGuard) -> bool {
        match guard {
            RegistryGuard::DoNotReset => self.do_not_reset,
            RegistryGuard::IsProcessing => self.is_processing,
        }
    }

    fn guard_flag(&mut self, guard: RegistryGuard) -> &mut bool {
        match guard {
            RegistryGuard::DoNotReset => &mut self.do_not_reset,
            RegistryGuard::IsProcessing => &mut self.is_processing,
        }
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::traits::{FilterHandle, Task, TaskHandle, TaskId};

/// A slot in a task list.
///
/// `Owned` tasks live and die with the list. `Shared` tasks are also
/// reachable from elsewhere, typically filters attached to other tasks.
pub enum TaskEntry {
    Owned(Box<dyn Task>),
    Shared(TaskHandle),
}

impl TaskEntry {
    pub fn owned<T: Task + 'static>(task: T) -> Self {
        TaskEntry::Owned(Box::new(task))
    }

    pub fn id(&self) -> TaskId {
        match self {
            TaskEntry::Owned(task) => task.id(),
            TaskEntry::Shared(handle) => handle.id(),
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, TaskEntry::Shared(_))
    }

    /// `None` when a shared task is currently mutably borrowed.
    pub fn with_task<R>(&self, f: impl FnOnce(&dyn Task) -> R) -> Option<R> {
        match self {
            TaskEntry::Owned(task) => Some(f(&**task)),
            TaskEntry::Shared(handle) => handle.try_borrow().map(|task| f(&*task)),
        }
    }

    /// `None` when a shared task is currently borrowed.
    pub fn with_task_mut<R>(&mut self, f: impl FnOnce(&mut dyn Task) -> R) -> Option<R> {
        match self {
            TaskEntry::Owned(task) => Some(f(&mut **task)),
            TaskEntry::Shared(handle) => handle.try_borrow_mut().map(|mut task| f(&mut *task)),
        }
    }

    pub fn name(&self) -> Option<String> {
        self.with_task(|task| task.name().to_string())
    }

    /// The task's stream tag, `"?"` while it is borrowed.
    pub fn stream_id(&self) -> String {
        self.with_task(|task| task.stream_id().to_string())
            .unwrap_or_else(|| "?".to_string())
    }

    pub fn descriptor(&self) -> String {
        self.with_task(|task| task.descriptor())
            .unwrap_or_else(|| format!("task {}", self.id()))
    }
}

impl From<Box<dyn Task>> for TaskEntry {
    fn from(task: Box<dyn Task>) -> Self {
        TaskEntry::Owned(task)
    }
}

impl From<TaskHandle> for TaskEntry {
    fn from(handle: TaskHandle) -> Self {
        TaskEntry::Shared(handle)
    }
}

impl From<FilterHandle> for TaskEntry {
    fn from(handle: FilterHandle) -> Self {
        TaskEntry::Shared(handle.task_handle())
    }
}

impl From<&FilterHandle> for TaskEntry {
    fn from(handle: &FilterHandle) -> Self {
        TaskEntry::Shared(handle.task_handle())
    }
}

impl fmt::Debug for TaskEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ownership = if self.is_shared() { "shared" } else { "owned" };
        write!(f, "TaskEntry({}, {} {})", ownership, self.id(), self.descriptor())
    }
}

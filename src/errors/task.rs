// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::RegistryError;
use crate::traits::TaskId;

/// Failure reported by a task from `pre_process`, `post_process` or `re_init`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error("{task}: {reason}")]
    Failed { task: String, reason: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("task {id} is already in use (re-entrant call or aliased list)")]
    Busy { id: TaskId },
}

impl TaskError {
    pub fn failed(task: impl Into<String>, reason: impl Into<String>) -> Self {
        TaskError::Failed {
            task: task.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while composing task and filter lists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskListError {
    #[error("'{list}' cannot be added to itself")]
    SelfInsertion { list: String },

    #[error("adding '{task}' to '{list}' would make the list contain itself")]
    Cycle { list: String, task: String },

    #[error("anchor task {anchor} not found in '{list}'")]
    AnchorNotFound { list: String, anchor: TaskId },

    #[error("task {id} is in use and cannot be inspected")]
    TaskBusy { id: TaskId },
}

/// A filter operator string that matches none of the known spellings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown filter operator '{0}' (expected one of &, |, ^, &&, ||, and, or, xor, land, lor)")]
pub struct UnknownFilterOperator(pub String);

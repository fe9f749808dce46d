// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::TaskListError;

/// Errors raised while building tasks from configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskFactoryError {
    #[error("task '{task}' has unknown kind '{kind}'")]
    UnknownKind { task: String, kind: String },

    #[error("task '{task}': invalid option '{option}': {reason}")]
    InvalidOption {
        task: String,
        option: String,
        reason: String,
    },

    #[error("task '{task}' references unknown filter '{filter}'")]
    UnresolvedFilter { task: String, filter: String },

    #[error("task '{task}' of kind '{kind}' cannot be used as a filter")]
    NotAFilter { task: String, kind: String },

    #[error(transparent)]
    List(#[from] TaskListError),
}

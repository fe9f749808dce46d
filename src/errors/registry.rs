// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised by the parameter registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("container '{name}' is a '{found}', expected '{expected}'")]
    KindMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("cannot create container '{name}': no constructor for kind '{kind}'")]
    UnknownKind { kind: String, name: String },

    #[error("container '{name}' not found")]
    NotFound { name: String },

    #[error("a different container is already registered as '{name}'")]
    DuplicateName { name: String },
}

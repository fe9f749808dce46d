// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the parameter registry.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A container was created on demand.
///
/// # Log Level
/// `debug!` - Expected on the first lookup of each name
pub struct ContainerAutoCreated<'a> {
    pub name: &'a str,
    pub kind: &'a str,
}

impl Display for ContainerAutoCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Created container '{}' of kind {}", self.name, self.kind)
    }
}

impl StructuredLog for ContainerAutoCreated<'_> {
    fn log(&self) {
        tracing::debug!(container = self.name, kind = self.kind, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("container_created", span_name = name, container = self.name, kind = self.kind)
    }
}

/// A lookup found a container of another kind under the requested name.
///
/// # Log Level
/// `error!` - The lookup fails
pub struct ContainerKindMismatch<'a> {
    pub name: &'a str,
    pub expected: &'a str,
    pub found: &'a str,
}

impl Display for ContainerKindMismatch<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Container '{}' is a {}, expected {}",
            self.name, self.found, self.expected
        )
    }
}

impl StructuredLog for ContainerKindMismatch<'_> {
    fn log(&self) {
        tracing::error!(
            container = self.name,
            expected = self.expected,
            found = self.found,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "container_kind_mismatch",
            span_name = name,
            container = self.name,
            expected = self.expected,
            found = self.found
        )
    }
}

/// No constructor is registered for the requested kind.
///
/// # Log Level
/// `error!` - The lookup fails
pub struct UnknownContainerKind<'a> {
    pub name: &'a str,
    pub kind: &'a str,
}

impl Display for UnknownContainerKind<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cannot create container '{}': unknown kind {}", self.name, self.kind)
    }
}

impl StructuredLog for UnknownContainerKind<'_> {
    fn log(&self) {
        tracing::error!(container = self.name, kind = self.kind, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("unknown_container_kind", span_name = name, container = self.name, kind = self.kind)
    }
}

/// A registered container was swapped for another one.
///
/// # Log Level
/// `info!` - Composition change
pub struct ContainerReplaced<'a> {
    pub name: &'a str,
    pub old_kind: &'a str,
    pub new_kind: &'a str,
}

impl Display for ContainerReplaced<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Replaced container '{}' ({} -> {})",
            self.name, self.old_kind, self.new_kind
        )
    }
}

impl StructuredLog for ContainerReplaced<'_> {
    fn log(&self) {
        tracing::info!(
            container = self.name,
            old_kind = self.old_kind,
            new_kind = self.new_kind,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "container_replaced",
            span_name = name,
            container = self.name,
            old_kind = self.old_kind,
            new_kind = self.new_kind
        )
    }
}

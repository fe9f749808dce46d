// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for filter lists.

use crate::errors::TaskError;
use crate::observability::messages::StructuredLog;
use crate::traits::TaskId;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A filter joined a filter list.
///
/// # Log Level
/// `debug!` - Composition detail
pub struct FilterAdded<'a> {
    pub filter: &'a str,
    pub list: &'a str,
    pub operator: &'a str,
}

impl Display for FilterAdded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Added {} to {} with '{}'", self.filter, self.list, self.operator)
    }
}

impl StructuredLog for FilterAdded<'_> {
    fn log(&self) {
        tracing::debug!(
            filter = self.filter,
            list = self.list,
            operator = self.operator,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "filter_added",
            span_name = name,
            filter = self.filter,
            list = self.list,
            operator = self.operator
        )
    }
}

/// The very same filter is already a member; the add is ignored.
///
/// # Log Level
/// `warn!` - Suspicious composition
pub struct FilterAlreadyInList<'a> {
    pub filter: &'a str,
    pub list: &'a str,
}

impl Display for FilterAlreadyInList<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} is already in {}, not added again", self.filter, self.list)
    }
}

impl StructuredLog for FilterAlreadyInList<'_> {
    fn log(&self) {
        tracing::warn!(filter = self.filter, list = self.list, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("filter_already_in_list", span_name = name, filter = self.filter, list = self.list)
    }
}

/// A member could not be evaluated because it is in use; it counts as false.
///
/// # Log Level
/// `warn!` - Degraded result
pub struct FilterBusy<'a> {
    pub filter: TaskId,
    pub list: &'a str,
}

impl Display for FilterBusy<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Filter {} in {} is in use, treated as false", self.filter, self.list)
    }
}

impl StructuredLog for FilterBusy<'_> {
    fn log(&self) {
        tracing::warn!(filter = self.filter.value(), list = self.list, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("filter_busy", span_name = name, filter = self.filter.value(), list = self.list)
    }
}

/// A member failed one of its once-per-run phases.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct FilterPhaseFailed<'a> {
    pub filter: &'a str,
    pub list: &'a str,
    pub phase: &'a str,
    pub error: &'a TaskError,
}

impl Display for FilterPhaseFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}: {} of {} failed: {}", self.list, self.phase, self.filter, self.error)
    }
}

impl StructuredLog for FilterPhaseFailed<'_> {
    fn log(&self) {
        tracing::error!(
            filter = self.filter,
            list = self.list,
            phase = self.phase,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "filter_phase_failed",
            span_name = name,
            filter = self.filter,
            list = self.list,
            phase = self.phase
        )
    }
}

/// A member skipped registration and left the filter list.
///
/// # Log Level
/// `info!` - Changes the combined condition
pub struct FilterRemovedFromList<'a> {
    pub filter: &'a str,
    pub list: &'a str,
}

impl Display for FilterRemovedFromList<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} removed from {}", self.filter, self.list)
    }
}

impl StructuredLog for FilterRemovedFromList<'_> {
    fn log(&self) {
        tracing::info!(filter = self.filter, list = self.list, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("filter_removed", span_name = name, filter = self.filter, list = self.list)
    }
}

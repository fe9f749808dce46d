// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the event loop lifecycle.
//!
//! This module contains message types for logging events related to:
//! * Run start and completion
//! * Runs aborted in one of the phases
//! * Re-initialization requests

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// The event loop is starting.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use iact_pipeline::observability::messages::event_loop::RunStarted;
///
/// let msg = RunStarted {
///     list: "MainList",
///     max_events: Some(100),
///     stream: "All",
/// };
///
/// assert_eq!(msg.to_string(), "Starting event loop over MainList (max 100 events, stream All)");
/// ```
pub struct RunStarted<'a> {
    pub list: &'a str,
    pub max_events: Option<u64>,
    pub stream: &'a str,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.max_events {
            Some(max) => write!(
                f,
                "Starting event loop over {} (max {} events, stream {})",
                self.list, max, self.stream
            ),
            None => write!(
                f,
                "Starting event loop over {} (until stopped, stream {})",
                self.list, self.stream
            ),
        }
    }
}

impl StructuredLog for RunStarted<'_> {
    fn log(&self) {
        tracing::info!(
            list = self.list,
            max_events = self.max_events,
            stream = self.stream,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "event_loop",
            span_name = name,
            list = self.list,
            max_events = self.max_events,
            stream = self.stream,
        )
    }
}

/// The event loop finished and post-processing succeeded.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunCompleted<'a> {
    pub list: &'a str,
    pub events: u64,
    pub continued_events: u64,
    pub outcome: &'a str,
    pub duration: Duration,
}

impl Display for RunCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Event loop over {} finished ({}): {} events, {} skipped, in {:?}",
            self.list, self.outcome, self.events, self.continued_events, self.duration
        )
    }
}

impl StructuredLog for RunCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            list = self.list,
            events = self.events,
            continued_events = self.continued_events,
            outcome = self.outcome,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "event_loop_completed",
            span_name = name,
            list = self.list,
            events = self.events,
            outcome = self.outcome,
            duration = ?self.duration,
        )
    }
}

/// The event loop was aborted.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct RunAborted<'a> {
    pub list: &'a str,
    pub phase: &'a str,
    pub events: u64,
    pub reason: &'a str,
}

impl Display for RunAborted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Event loop over {} aborted in {} after {} events: {}",
            self.list, self.phase, self.events, self.reason
        )
    }
}

impl StructuredLog for RunAborted<'_> {
    fn log(&self) {
        tracing::error!(
            list = self.list,
            phase = self.phase,
            events = self.events,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "event_loop_aborted",
            span_name = name,
            list = self.list,
            phase = self.phase,
            events = self.events,
        )
    }
}

/// The loop stopped because it reached its event limit.
///
/// # Log Level
/// `info!` - Normal end of a bounded run
pub struct MaxEventsReached {
    pub max_events: u64,
}

impl Display for MaxEventsReached {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Maximum number of events reached ({})", self.max_events)
    }
}

impl StructuredLog for MaxEventsReached {
    fn log(&self) {
        tracing::info!(max_events = self.max_events, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("max_events_reached", span_name = name, max_events = self.max_events)
    }
}

/// Tasks are re-initialized for new input.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ReInitRequested<'a> {
    pub list: &'a str,
}

impl Display for ReInitRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Reinitializing tasks of {}", self.list)
    }
}

impl StructuredLog for ReInitRequested<'_> {
    fn log(&self) {
        tracing::info!(list = self.list, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("re_init", span_name = name, list = self.list)
    }
}

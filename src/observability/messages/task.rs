// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the lifecycle of a single task.

use crate::observability::messages::StructuredLog;
use crate::traits::TaskId;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A task is about to be pre-processed.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct TaskPreProcessing<'a> {
    pub task: &'a str,
    pub stream: &'a str,
}

impl Display for TaskPreProcessing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Preprocessing {} (stream {})", self.task, self.stream)
    }
}

impl StructuredLog for TaskPreProcessing<'_> {
    fn log(&self) {
        tracing::debug!(task = self.task, stream = self.stream, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("pre_process", span_name = name, task = self.task, stream = self.stream)
    }
}

/// A task is about to be post-processed.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct TaskPostProcessing<'a> {
    pub task: &'a str,
    pub executions: u64,
}

impl Display for TaskPostProcessing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Postprocessing {} after {} executions", self.task, self.executions)
    }
}

impl StructuredLog for TaskPostProcessing<'_> {
    fn log(&self) {
        tracing::debug!(task = self.task, executions = self.executions, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "post_process",
            span_name = name,
            task = self.task,
            executions = self.executions
        )
    }
}

/// A task is being re-initialized for new input.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct TaskReInitializing<'a> {
    pub task: &'a str,
}

impl Display for TaskReInitializing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Reinitializing {}", self.task)
    }
}

impl StructuredLog for TaskReInitializing<'_> {
    fn log(&self) {
        tracing::debug!(task = self.task, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("re_init", span_name = name, task = self.task)
    }
}

/// The filter gating a task could not be evaluated because it is in use.
///
/// # Log Level
/// `error!` - The event is aborted
pub struct FilterUnavailable<'a> {
    pub task: &'a str,
    pub filter: TaskId,
}

impl Display for FilterUnavailable<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Filter {} gating {} is in use and cannot be evaluated",
            self.filter, self.task
        )
    }
}

impl StructuredLog for FilterUnavailable<'_> {
    fn log(&self) {
        tracing::error!(task = self.task, filter = self.filter.value(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "filter_unavailable",
            span_name = name,
            task = self.task,
            filter = self.filter.value()
        )
    }
}

/// A task whose only job is to evaluate a condition has none.
///
/// # Log Level
/// `warn!` - The task removes itself
pub struct TaskWithoutCondition<'a> {
    pub task: &'a str,
}

impl Display for TaskWithoutCondition<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} has no condition and is removed", self.task)
    }
}

impl StructuredLog for TaskWithoutCondition<'_> {
    fn log(&self) {
        tracing::warn!(task = self.task, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("task_without_condition", span_name = name, task = self.task)
    }
}

/// An optional container is not in the registry.
///
/// # Log Level
/// `info!` - The task removes itself
pub struct ContainerMissing<'a> {
    pub task: &'a str,
    pub container: &'a str,
}

impl Display for ContainerMissing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}: container '{}' not found, task removed",
            self.task, self.container
        )
    }
}

impl StructuredLog for ContainerMissing<'_> {
    fn log(&self) {
        tracing::info!(task = self.task, container = self.container, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "container_missing",
            span_name = name,
            task = self.task,
            container = self.container
        )
    }
}

/// Contents of a container, printed once per event.
///
/// # Log Level
/// `info!` - Requested output
pub struct ContainerContents<'a> {
    pub container: &'a str,
    pub contents: &'a str,
}

impl Display for ContainerContents<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}: {}", self.container, self.contents)
    }
}

impl StructuredLog for ContainerContents<'_> {
    fn log(&self) {
        tracing::info!(container = self.container, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("container_contents", span_name = name, container = self.container)
    }
}

/// A reader has delivered all of its events.
///
/// # Log Level
/// `info!` - Normal end of input
pub struct InputExhausted<'a> {
    pub task: &'a str,
    pub events: u64,
}

impl Display for InputExhausted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}: end of input after {} events", self.task, self.events)
    }
}

impl StructuredLog for InputExhausted<'_> {
    fn log(&self) {
        tracing::info!(task = self.task, events = self.events, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("input_exhausted", span_name = name, task = self.task, events = self.events)
    }
}

/// Share of events a filter let through during a run.
///
/// # Log Level
/// `info!` - End-of-run summary
pub struct SelectionSummary<'a> {
    pub filter: &'a str,
    pub selected: u64,
    pub evaluated: u64,
}

impl Display for SelectionSummary<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let percent = if self.evaluated == 0 {
            0.0
        } else {
            self.selected as f64 / self.evaluated as f64 * 100.0
        };
        write!(
            f,
            "{}: {} of {} events selected ({:.1}%)",
            self.filter, self.selected, self.evaluated, percent
        )
    }
}

impl StructuredLog for SelectionSummary<'_> {
    fn log(&self) {
        tracing::info!(
            filter = self.filter,
            selected = self.selected,
            evaluated = self.evaluated,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "selection_summary",
            span_name = name,
            filter = self.filter,
            selected = self.selected,
            evaluated = self.evaluated
        )
    }
}

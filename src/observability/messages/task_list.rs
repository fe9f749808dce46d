// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for task list composition and scheduling.
//!
//! This module contains message types for logging events related to:
//! * Adding, replacing and removing tasks
//! * The pre-process and post-process phases of a list
//! * Control codes returned while processing an event
//! * The execution statistics table

use crate::errors::TaskError;
use crate::observability::messages::StructuredLog;
use crate::traits::{ReturnCode, TaskId};
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A task was added to a list.
///
/// # Log Level
/// `debug!` - Composition detail
///
/// # Example
/// ```
/// use iact_pipeline::observability::messages::task_list::TaskAdded;
///
/// let msg = TaskAdded {
///     task: "Selected [Counter]",
///     list: "MainList",
///     stream: "Events",
/// };
///
/// assert_eq!(msg.to_string(), "Added Selected [Counter] to MainList (stream Events)");
/// ```
pub struct TaskAdded<'a> {
    pub task: &'a str,
    pub list: &'a str,
    pub stream: &'a str,
}

impl Display for TaskAdded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Added {} to {} (stream {})", self.task, self.list, self.stream)
    }
}

impl StructuredLog for TaskAdded<'_> {
    fn log(&self) {
        tracing::debug!(task = self.task, list = self.list, stream = self.stream, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "task_added",
            span_name = name,
            task = self.task,
            list = self.list,
            stream = self.stream
        )
    }
}

/// The very same task is already in the list; the add is ignored.
///
/// # Log Level
/// `warn!` - Suspicious composition
pub struct TaskAlreadyInList<'a> {
    pub task: &'a str,
    pub list: &'a str,
}

impl Display for TaskAlreadyInList<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} is already in {}, not added again", self.task, self.list)
    }
}

impl StructuredLog for TaskAlreadyInList<'_> {
    fn log(&self) {
        tracing::warn!(task = self.task, list = self.list, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("task_already_in_list", span_name = name, task = self.task, list = self.list)
    }
}

/// A different task with the same name is already in the list.
///
/// # Log Level
/// `warn!` - Allowed, but lookups by name will find the first one
pub struct DuplicateTaskName<'a> {
    pub task: &'a str,
    pub list: &'a str,
}

impl Display for DuplicateTaskName<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} already contains a task named '{}'", self.list, self.task)
    }
}

impl StructuredLog for DuplicateTaskName<'_> {
    fn log(&self) {
        tracing::warn!(task = self.task, list = self.list, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("duplicate_task_name", span_name = name, task = self.task, list = self.list)
    }
}

/// A list was asked to contain itself.
///
/// # Log Level
/// `error!` - Rejected
pub struct SelfInsertionRejected<'a> {
    pub list: &'a str,
}

impl Display for SelfInsertionRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} cannot be added to itself", self.list)
    }
}

impl StructuredLog for SelfInsertionRejected<'_> {
    fn log(&self) {
        tracing::error!(list = self.list, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("self_insertion", span_name = name, list = self.list)
    }
}

/// Adding a task would make a list reachable from itself.
///
/// # Log Level
/// `error!` - Rejected
pub struct CycleRejected<'a> {
    pub task: &'a str,
    pub list: &'a str,
}

impl Display for CycleRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Adding '{}' to {} would create a cycle", self.task, self.list)
    }
}

impl StructuredLog for CycleRejected<'_> {
    fn log(&self) {
        tracing::error!(task = self.task, list = self.list, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("cycle_rejected", span_name = name, task = self.task, list = self.list)
    }
}

/// Positional insertion named an anchor that is not in the list.
///
/// # Log Level
/// `error!` - Rejected
pub struct AnchorNotFound<'a> {
    pub anchor: TaskId,
    pub task: &'a str,
    pub list: &'a str,
}

impl Display for AnchorNotFound<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cannot insert '{}': anchor {} is not in {}",
            self.task, self.anchor, self.list
        )
    }
}

impl StructuredLog for AnchorNotFound<'_> {
    fn log(&self) {
        tracing::error!(anchor = self.anchor.value(), task = self.task, list = self.list, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "anchor_not_found",
            span_name = name,
            anchor = self.anchor.value(),
            task = self.task,
            list = self.list
        )
    }
}

/// A shared task could not be borrowed because it is already running.
///
/// # Log Level
/// `error!` - Usually a task list that contains one of its ancestors
pub struct TaskBusy<'a> {
    pub task: TaskId,
    pub list: &'a str,
}

impl Display for TaskBusy<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Task {} in {} is already in use", self.task, self.list)
    }
}

impl StructuredLog for TaskBusy<'_> {
    fn log(&self) {
        tracing::error!(task = self.task.value(), list = self.list, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("task_busy", span_name = name, task = self.task.value(), list = self.list)
    }
}

/// A list enters one of its once-per-run phases.
///
/// # Log Level
/// `info!` - Important operational event
pub struct TaskListPhase<'a> {
    pub list: &'a str,
    pub phase: &'a str,
    pub tasks: usize,
}

impl Display for TaskListPhase<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}: {} of {} tasks", self.list, self.phase, self.tasks)
    }
}

impl StructuredLog for TaskListPhase<'_> {
    fn log(&self) {
        tracing::info!(list = self.list, phase = self.phase, tasks = self.tasks, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "task_list_phase",
            span_name = name,
            list = self.list,
            phase = self.phase,
            tasks = self.tasks
        )
    }
}

/// A task asked to skip registration and was dropped from its list.
///
/// # Log Level
/// `info!` - Normal, but changes the shape of the run
pub struct TaskRemovedFromList<'a> {
    pub task: &'a str,
    pub list: &'a str,
}

impl Display for TaskRemovedFromList<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} removed from {}", self.task, self.list)
    }
}

impl StructuredLog for TaskRemovedFromList<'_> {
    fn log(&self) {
        tracing::info!(task = self.task, list = self.list, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("task_removed", span_name = name, task = self.task, list = self.list)
    }
}

/// Pre-processing of a task failed; the list aborts.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct PreProcessFailed<'a> {
    pub task: &'a str,
    pub id: TaskId,
    pub stream: &'a str,
    pub list: &'a str,
    pub error: &'a TaskError,
}

impl Display for PreProcessFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}: error in pre-processing of {}: {}", self.list, self.task, self.error)
    }
}

impl StructuredLog for PreProcessFailed<'_> {
    fn log(&self) {
        tracing::error!(
            task = self.task,
            id = self.id.value(),
            stream = self.stream,
            list = self.list,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "pre_process_failed",
            span_name = name,
            task = self.task,
            id = self.id.value(),
            stream = self.stream,
            list = self.list,
            error = %self.error
        )
    }
}

/// No task of the list participates in processing.
///
/// # Log Level
/// `warn!` - The list stops the loop
pub struct NoTasksForProcessing<'a> {
    pub list: &'a str,
}

impl Display for NoTasksForProcessing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}: no tasks for processing", self.list)
    }
}

impl StructuredLog for NoTasksForProcessing<'_> {
    fn log(&self) {
        tracing::warn!(list = self.list, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("no_tasks_for_processing", span_name = name, list = self.list)
    }
}

/// A task requested the end of the event loop.
///
/// # Log Level
/// `info!` - Normal end of input
pub struct ProcessStopped<'a> {
    pub task: &'a str,
    pub id: TaskId,
    pub stream: &'a str,
    pub list: &'a str,
}

impl Display for ProcessStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}: stop requested by {}", self.list, self.task)
    }
}

impl StructuredLog for ProcessStopped<'_> {
    fn log(&self) {
        tracing::info!(
            task = self.task,
            id = self.id.value(),
            stream = self.stream,
            list = self.list,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "process_stopped",
            span_name = name,
            task = self.task,
            id = self.id.value(),
            stream = self.stream,
            list = self.list
        )
    }
}

/// A task failed while processing an event.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ProcessFailed<'a> {
    pub task: &'a str,
    pub id: TaskId,
    /// The task's own stream tag.
    pub stream: &'a str,
    pub list: &'a str,
    /// The stream the event was processed in.
    pub event_stream: &'a str,
}

impl Display for ProcessFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}: error in processing of {} (stream {})",
            self.list, self.task, self.event_stream
        )
    }
}

impl StructuredLog for ProcessFailed<'_> {
    fn log(&self) {
        tracing::error!(
            task = self.task,
            id = self.id.value(),
            stream = self.stream,
            list = self.list,
            event_stream = self.event_stream,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "process_failed",
            span_name = name,
            task = self.task,
            id = self.id.value(),
            stream = self.stream,
            list = self.list,
            event_stream = self.event_stream
        )
    }
}

/// A task returned a code that has no meaning while processing.
///
/// # Log Level
/// `error!` - Treated as a failure
pub struct UnexpectedReturnCode<'a> {
    pub task: &'a str,
    pub id: TaskId,
    pub stream: &'a str,
    pub list: &'a str,
    pub code: ReturnCode,
}

impl Display for UnexpectedReturnCode<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}: unexpected return code '{}' from {}",
            self.list, self.code, self.task
        )
    }
}

impl StructuredLog for UnexpectedReturnCode<'_> {
    fn log(&self) {
        tracing::error!(
            task = self.task,
            id = self.id.value(),
            stream = self.stream,
            list = self.list,
            code = self.code.as_str(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "unexpected_return_code",
            span_name = name,
            task = self.task,
            id = self.id.value(),
            stream = self.stream,
            list = self.list,
            code = self.code.as_str()
        )
    }
}

/// Post-processing of a task failed; the list aborts.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct PostProcessFailed<'a> {
    pub task: &'a str,
    pub id: TaskId,
    pub stream: &'a str,
    pub list: &'a str,
    pub error: &'a TaskError,
}

impl Display for PostProcessFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}: error in post-processing of {}: {}", self.list, self.task, self.error)
    }
}

impl StructuredLog for PostProcessFailed<'_> {
    fn log(&self) {
        tracing::error!(
            task = self.task,
            id = self.id.value(),
            stream = self.stream,
            list = self.list,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "post_process_failed",
            span_name = name,
            task = self.task,
            id = self.id.value(),
            stream = self.stream,
            list = self.list,
            error = %self.error
        )
    }
}

/// Re-initialization of a task failed; the list aborts.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ReInitFailed<'a> {
    pub task: &'a str,
    pub id: TaskId,
    pub stream: &'a str,
    pub list: &'a str,
    pub error: &'a TaskError,
}

impl Display for ReInitFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}: error in re-initialization of {}: {}", self.list, self.task, self.error)
    }
}

impl StructuredLog for ReInitFailed<'_> {
    fn log(&self) {
        tracing::error!(
            task = self.task,
            id = self.id.value(),
            stream = self.stream,
            list = self.list,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "re_init_failed",
            span_name = name,
            task = self.task,
            id = self.id.value(),
            stream = self.stream,
            list = self.list,
            error = %self.error
        )
    }
}

/// A task was swapped for another of the same name.
///
/// # Log Level
/// `info!` - Composition change
pub struct TaskReplaced<'a> {
    pub task: &'a str,
    pub list: &'a str,
}

impl Display for TaskReplaced<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Replaced task '{}' in {}", self.task, self.list)
    }
}

impl StructuredLog for TaskReplaced<'_> {
    fn log(&self) {
        tracing::info!(task = self.task, list = self.list, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("task_replaced", span_name = name, task = self.task, list = self.list)
    }
}

/// One row of the execution statistics table.
///
/// # Log Level
/// `info!` - Requested report
pub struct StatisticsLine<'a> {
    pub line: &'a str,
}

impl Display for StatisticsLine<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.line)
    }
}

impl StructuredLog for StatisticsLine<'_> {
    fn log(&self) {
        tracing::info!(target: "iact_pipeline::statistics", "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("statistics", span_name = name)
    }
}

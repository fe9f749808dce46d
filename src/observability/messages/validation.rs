// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration validation.
//!
//! This module contains message types for logging events related to:
//! * Validation start and completion
//! * Individual problems found in a pipeline declaration

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Configuration validation started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use iact_pipeline::observability::messages::validation::ValidationStarted;
///
/// let msg = ValidationStarted { task_count: 5 };
///
/// assert_eq!(msg.to_string(), "Starting configuration validation for 5 tasks");
/// ```
pub struct ValidationStarted {
    pub task_count: usize,
}

impl Display for ValidationStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Starting configuration validation for {} tasks", self.task_count)
    }
}

impl StructuredLog for ValidationStarted {
    fn log(&self) {
        tracing::info!(task_count = self.task_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "validation",
            span_name = name,
            task_count = self.task_count,
        )
    }
}

/// A single problem found during validation.
///
/// # Log Level
/// `error!` - The configuration will be rejected
pub struct ValidationProblem<'a> {
    pub error: &'a ValidationError,
}

impl Display for ValidationProblem<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Invalid configuration: {}", self.error)
    }
}

impl StructuredLog for ValidationProblem<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "validation_problem",
            span_name = name,
            error = %self.error,
        )
    }
}

/// Configuration validation finished.
///
/// # Log Level
/// `info!` when clean, `warn!` when problems were found
pub struct ValidationCompleted {
    pub task_count: usize,
    pub error_count: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.error_count > 0 {
            write!(
                f,
                "Configuration validation found {} problems in {} tasks",
                self.error_count, self.task_count
            )
        } else {
            write!(
                f,
                "Configuration validation completed successfully for {} tasks",
                self.task_count
            )
        }
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        if self.error_count > 0 {
            tracing::warn!(
                task_count = self.task_count,
                error_count = self.error_count,
                "{}", self
            );
        } else {
            tracing::info!(
                task_count = self.task_count,
                error_count = self.error_count,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "validation_completed",
            span_name = name,
            task_count = self.task_count,
            error_count = self.error_count,
        )
    }
}

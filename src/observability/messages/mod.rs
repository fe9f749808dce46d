// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable text and
//! [`StructuredLog`] to emit it at its documented level together with
//! structured fields.
//!
//! # Organization
//!
//! * `task` - pre/post-process and re-init of a single task
//! * `task_list` - list composition, phases and control flow
//! * `filter` - filter list composition and evaluation
//! * `registry` - container lookup and auto-creation
//! * `event_loop` - run lifecycle
//! * `validation` - configuration validation
//!
//! # Usage Pattern
//!
//! ```rust
//! use iact_pipeline::observability::messages::event_loop::RunStarted;
//! use iact_pipeline::observability::messages::StructuredLog;
//!
//! let msg = RunStarted {
//!     list: "MainList",
//!     max_events: Some(1000),
//!     stream: "All",
//! };
//!
//! msg.log();
//! let _span = msg.span("run");
//! ```

use tracing::Span;

pub mod event_loop;
pub mod filter;
pub mod registry;
pub mod task;
pub mod task_list;
pub mod validation;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// A span carrying the message's fields, for work done on its behalf.
    fn span(&self, name: &str) -> Span;
}

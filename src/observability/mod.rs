// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and status reporting.
//!
//! Every operational message is a small struct in [`messages`] that
//! implements `Display` and [`messages::StructuredLog`], so log text lives in
//! one place per subsystem instead of being scattered through the scheduler.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::task` - single task lifecycle
//! * `messages::task_list` - scheduling, composition and statistics
//! * `messages::filter` - filter list composition and evaluation
//! * `messages::registry` - parameter registry lookups and creation
//! * `messages::event_loop` - run start, end and aborts
//! * `messages::validation` - configuration validation
//!
//! # Usage
//!
//! ```rust
//! use iact_pipeline::observability::messages::task_list::TaskRemovedFromList;
//! use iact_pipeline::observability::messages::StructuredLog;
//!
//! TaskRemovedFromList {
//!     task: "Reader [EventSource]",
//!     list: "MainList",
//! }
//! .log();
//! ```

mod display;
mod logging;
pub mod messages;

pub use display::{StatusDisplay, TracingStatusDisplay};
pub use logging::init_logging;

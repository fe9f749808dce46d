// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Task pipelines for event processing.
//!
//! A pipeline is a tree of [`traits::Task`]s rooted in an
//! [`engine::TaskList`]. Every task goes through pre-process, a process call
//! per event (once per pass in multi-pass lists) and post-process, sharing
//! data through the [`engine::ParameterRegistry`]. Filters gate tasks and
//! combine through [`engine::FilterList`]; stream tags route events to the
//! tasks that care about them.

pub mod backends;      // built-in task kinds
pub mod config;        // YAML/TOML loading, validation, runtime builder
pub mod engine;        // scheduler, registry, event loop
pub mod errors;
pub mod observability;
pub mod traits;        // Task, Filter and Container abstractions

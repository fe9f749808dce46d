// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Task implementations.
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process tasks, filters and containers built from configuration by
//! [`local::LocalTaskFactory`]:
//! - **Tasks**: event source, counter, print, stream router, continue
//! - **Filters**: random event selection, event number windows, pass selection
//! - **Containers**: the per-event `EventHeader`
//!
//! ## Stub Backend (Test-Only)
//! Scriptable tasks, constant filters and a counting container for exercising
//! the scheduler. Not available in production builds.
//!
//! # Example
//! ```rust
//! use iact_pipeline::backends::local::{FilterScope, LocalTaskFactory};
//! use iact_pipeline::config::TaskConfig;
//!
//! let config: TaskConfig = serde_yaml::from_str("{ kind: counter, name: Events }").unwrap();
//! let entry = LocalTaskFactory::create_task(&config, &mut FilterScope::new()).unwrap();
//!
//! assert_eq!(entry.descriptor(), "Events [Counter]");
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod containers;
pub mod factory;
pub mod filters;
pub mod tasks;

pub use containers::{container_factory, EventHeader};
pub use factory::{FilterScope, LocalTaskFactory};
pub use filters::*;
pub use tasks::*;

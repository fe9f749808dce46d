// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod event_loop;
mod factory;
mod registry;
mod task;

pub use config::{ConfigError, ValidationError};
pub use event_loop::EventLoopError;
pub use factory::TaskFactoryError;
pub use registry::RegistryError;
pub use task::{TaskError, TaskListError, UnknownFilterOperator};

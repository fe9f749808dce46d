// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod container;
pub mod filter;
pub mod task;

pub use container::{Container, ContainerHandle, ContainerKind};
pub use filter::{Filter, FilterHandle};
pub use task::{
    descriptor, Accelerator, AsAny, PreProcessOutcome, ReturnCode, Task, TaskCore, TaskHandle,
    TaskId,
};

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod context;
pub mod entry;
pub mod event_loop;
pub mod filter_list;
pub mod registry;
pub mod statistics;
pub mod task_list;

pub use context::ExecutionContext;
pub use entry::TaskEntry;
pub use event_loop::{EventLoop, LoopOutcome, RunSummary};
pub use filter_list::{FilterEntry, FilterList, FilterOperator, FILTER_LIST_KIND};
pub use registry::{ContainerFactory, ParameterRegistry, RegistryGuard};
pub use statistics::TaskStatistics;
pub use task_list::{TaskList, TASK_LIST_KIND};

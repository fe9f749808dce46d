// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::traits::{Task, TaskCore};

/// The plain task: does nothing per event, so its execution count is the
/// number of events that got past its filter.
pub struct Counter {
    core: TaskCore,
}

impl Counter {
    pub const KIND: &'static str = "Counter";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: TaskCore::new(name),
        }
    }

    /// Events counted since the last pre-process.
    pub fn count(&self) -> u64 {
        self.core.num_executions_since_pre_process()
    }
}

impl Task for Counter {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }
}

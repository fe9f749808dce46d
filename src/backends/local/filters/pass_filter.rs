// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;

use crate::engine::{ExecutionContext, ParameterRegistry};
use crate::errors::TaskError;
use crate::traits::{Filter, PreProcessOutcome, ReturnCode, Task, TaskCore};

/// Selects passes of a multi-pass list: true when `pass % every == offset`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PassFilterConfig {
    #[serde(default = "default_every")]
    pub every: u32,
    #[serde(default)]
    pub offset: u32,
}

impl Default for PassFilterConfig {
    fn default() -> Self {
        Self {
            every: default_every(),
            offset: 0,
        }
    }
}

fn default_every() -> u32 {
    2
}

pub struct PassFilter {
    core: TaskCore,
    config: PassFilterConfig,
    inverted: bool,
    selected: bool,
}

impl PassFilter {
    pub const KIND: &'static str = "PassFilter";

    pub fn new(name: impl Into<String>, config: PassFilterConfig) -> Self {
        Self {
            core: TaskCore::new(name),
            config,
            inverted: false,
            selected: false,
        }
    }
}

impl Task for PassFilter {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn pre_process(
        &mut self,
        _registry: &mut ParameterRegistry,
        _ctx: &ExecutionContext,
    ) -> Result<PreProcessOutcome, TaskError> {
        if self.config.every == 0 || self.config.offset >= self.config.every {
            return Err(TaskError::failed(
                self.descriptor(),
                format!(
                    "offset {} must be below every {}",
                    self.config.offset, self.config.every
                ),
            ));
        }
        Ok(PreProcessOutcome::Ready)
    }

    fn process(&mut self, _registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> ReturnCode {
        self.selected = ctx.pass() % self.config.every == self.config.offset;
        ReturnCode::Success
    }
}

impl Filter for PassFilter {
    fn is_expression_true(&self) -> bool {
        self.selected
    }

    fn is_inverted(&self) -> bool {
        self.inverted
    }

    fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }
}

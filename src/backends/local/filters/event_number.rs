// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;

use crate::backends::local::EventHeader;
use crate::config::consts::DEFAULT_HEADER_NAME;
use crate::engine::{ExecutionContext, ParameterRegistry};
use crate::errors::TaskError;
use crate::traits::{Filter, PreProcessOutcome, ReturnCode, Task, TaskCore};

/// Configuration for the event-number filter.
///
/// # Fields
/// * `first` - First event number accepted (optional)
/// * `last` - Last event number accepted (optional)
/// * `prescale` - Accept every n-th event of the window, counted from `first`
/// * `header` - Registry name of the header container
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventNumberConfig {
    pub first: Option<u64>,
    pub last: Option<u64>,
    #[serde(default = "default_prescale")]
    pub prescale: u64,
    #[serde(default = "default_header")]
    pub header: String,
}

impl Default for EventNumberConfig {
    fn default() -> Self {
        Self {
            first: None,
            last: None,
            prescale: default_prescale(),
            header: default_header(),
        }
    }
}

fn default_prescale() -> u64 {
    1
}

fn default_header() -> String {
    DEFAULT_HEADER_NAME.to_string()
}

/// Accepts events by their number: a window plus an optional prescale.
pub struct EventNumberFilter {
    core: TaskCore,
    config: EventNumberConfig,
    header: Option<Rc<RefCell<EventHeader>>>,
    inverted: bool,
    accepted: bool,
}

impl EventNumberFilter {
    pub const KIND: &'static str = "EventNumber";

    pub fn new(name: impl Into<String>, config: EventNumberConfig) -> Self {
        Self {
            core: TaskCore::new(name),
            config,
            header: None,
            inverted: false,
            accepted: false,
        }
    }

    pub fn accepts(&self, event_number: u64) -> bool {
        let first = self.config.first.unwrap_or(0);
        if event_number < first {
            return false;
        }
        if self.config.last.is_some_and(|last| event_number > last) {
            return false;
        }
        (event_number - first) % self.config.prescale == 0
    }
}

impl Task for EventNumberFilter {
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
        registry: &mut ParameterRegistry,
        _ctx: &ExecutionContext,
    ) -> Result<PreProcessOutcome, TaskError> {
        if self.config.prescale == 0 {
            return Err(TaskError::failed(self.descriptor(), "prescale must be at least 1"));
        }
        self.header = Some(registry.find_or_create_as::<EventHeader>(&self.config.header)?);
        Ok(PreProcessOutcome::Ready)
    }

    fn process(&mut self, _registry: &mut ParameterRegistry, _ctx: &ExecutionContext) -> ReturnCode {
        let Some(header) = &self.header else {
            return ReturnCode::Error;
        };
        let event_number = header.borrow().event_number;
        self.accepted = self.accepts(event_number);
        ReturnCode::Success
    }

    fn post_process(&mut self, _registry: &mut ParameterRegistry, _ctx: &ExecutionContext) -> Result<(), TaskError> {
        self.header = None;
        Ok(())
    }
}

impl Filter for EventNumberFilter {
    fn is_expression_true(&self) -> bool {
        self.accepted
    }

    fn is_inverted(&self) -> bool {
        self.inverted
    }

    fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }
}

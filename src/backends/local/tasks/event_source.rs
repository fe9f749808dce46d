// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;

use crate::backends::local::EventHeader;
use crate::config::consts::{ALL_STREAMS, DEFAULT_HEADER_NAME};
use crate::engine::{ExecutionContext, ParameterRegistry};
use crate::errors::TaskError;
use crate::observability::messages::task::InputExhausted;
use crate::observability::messages::StructuredLog;
use crate::traits::{PreProcessOutcome, ReturnCode, Task, TaskCore};

/// Configuration for the synthetic event reader.
///
/// # Fields
/// * `events` - Number of events to deliver (optional, endless otherwise)
/// * `run_number` - Run number written into the header
/// * `streams` - Stream tags assigned round-robin to consecutive events
/// * `header` - Registry name of the header container
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventSourceConfig {
    pub events: Option<u64>,
    #[serde(default = "default_run_number")]
    pub run_number: u32,
    #[serde(default)]
    pub streams: Vec<String>,
    #[serde(default = "default_header")]
    pub header: String,
}

impl Default for EventSourceConfig {
    fn default() -> Self {
        Self {
            events: None,
            run_number: default_run_number(),
            streams: Vec::new(),
            header: default_header(),
        }
    }
}

fn default_run_number() -> u32 {
    1
}

fn default_header() -> String {
    DEFAULT_HEADER_NAME.to_string()
}

/// Reader stand-in: numbers events, tags them with a stream and returns
/// `Stop` once its input is exhausted.
pub struct EventSource {
    core: TaskCore,
    config: EventSourceConfig,
    run_number: u32,
    delivered: u64,
    header: Option<Rc<RefCell<EventHeader>>>,
}

impl EventSource {
    pub const KIND: &'static str = "EventSource";

    pub fn new(name: impl Into<String>, config: EventSourceConfig) -> Self {
        Self {
            core: TaskCore::new(name),
            run_number: config.run_number,
            config,
            delivered: 0,
            header: None,
        }
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn run_number(&self) -> u32 {
        self.run_number
    }

    fn stream_of(&self, event_number: u64) -> &str {
        if self.config.streams.is_empty() {
            return ALL_STREAMS;
        }
        let index = (event_number - 1) % self.config.streams.len() as u64;
        &self.config.streams[index as usize]
    }
}

impl Task for EventSource {
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
        self.header = Some(registry.find_or_create_as::<EventHeader>(&self.config.header)?);
        self.delivered = 0;
        Ok(PreProcessOutcome::Ready)
    }

    fn process(&mut self, _registry: &mut ParameterRegistry, _ctx: &ExecutionContext) -> ReturnCode {
        if self.config.events.is_some_and(|events| self.delivered >= events) {
            InputExhausted {
                task: &self.descriptor(),
                events: self.delivered,
            }
            .log();
            return ReturnCode::Stop;
        }
        let Some(header) = &self.header else {
            return ReturnCode::Error;
        };

        self.delivered += 1;
        let stream = self.stream_of(self.delivered).to_string();
        let mut header = header.borrow_mut();
        header.event_number = self.delivered;
        header.run_number = self.run_number;
        header.stream = stream;
        ReturnCode::Success
    }

    fn post_process(&mut self, _registry: &mut ParameterRegistry, _ctx: &ExecutionContext) -> Result<(), TaskError> {
        self.header = None;
        Ok(())
    }

    /// A new run starts; numbering continues.
    fn re_init(&mut self, _registry: &mut ParameterRegistry, _ctx: &ExecutionContext) -> Result<(), TaskError> {
        self.run_number += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::Tally;
    use crate::errors::RegistryError;
    use crate::traits::ContainerHandle;

    fn source(events: u64, streams: &[&str]) -> EventSource {
        EventSource::new(
            "Reader",
            EventSourceConfig {
                events: Some(events),
                streams: streams.iter().map(|s| s.to_string()).collect(),
                ..EventSourceConfig::default()
            },
        )
    }

    #[test]
    fn test_fills_header_and_stops_at_end_of_input() {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        let mut reader = source(3, &["Events", "Pedestals"]);
        reader.call_pre_process(&mut registry, &ctx).unwrap();
        let header = registry.find_as::<EventHeader>("EventHeader").unwrap();

        let mut seen = Vec::new();
        while reader.call_process(&mut registry, &ctx) == ReturnCode::Success {
            let header = header.borrow();
            seen.push((header.event_number, header.stream.clone()));
        }

        assert_eq!(
            seen,
            vec![
                (1, "Events".to_string()),
                (2, "Pedestals".to_string()),
                (3, "Events".to_string()),
            ]
        );
        assert_eq!(reader.delivered(), 3);
        assert_eq!(header.borrow().run_number, 1);
    }

    #[test]
    fn test_without_streams_events_go_to_all() {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        let mut reader = source(1, &[]);
        reader.call_pre_process(&mut registry, &ctx).unwrap();

        reader.call_process(&mut registry, &ctx);

        let header = registry.find_as::<EventHeader>("EventHeader").unwrap();
        assert_eq!(header.borrow().stream, "All");
    }

    #[test]
    fn test_header_name_clash_fails_pre_process() {
        let mut registry = ParameterRegistry::new();
        registry
            .add("EventHeader", ContainerHandle::new(Tally::default()))
            .unwrap();
        let mut reader = source(1, &[]);

        let error = reader
            .call_pre_process(&mut registry, &ExecutionContext::default())
            .unwrap_err();

        assert!(matches!(error, TaskError::Registry(RegistryError::KindMismatch { .. })));
    }

    #[test]
    fn test_re_init_starts_a_new_run() {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        let mut reader = source(5, &[]);
        reader.call_pre_process(&mut registry, &ctx).unwrap();

        reader.call_re_init(&mut registry, &ctx).unwrap();
        reader.call_process(&mut registry, &ctx);

        let header = registry.find_as::<EventHeader>("EventHeader").unwrap();
        assert_eq!(reader.run_number(), 2);
        assert_eq!(header.borrow().run_number, 2);
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Drives a root task list through a whole run:
//!
//! ```text
//! pre_process -> process until Stop / Error / max_events -> post_process
//! ```
//!
//! Post-processing always happens once pre-processing was attempted, so
//! tasks that did get prepared can release what they acquired.

use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::consts::ALL_STREAMS;
use crate::engine::{ExecutionContext, ParameterRegistry, TaskList, TaskStatistics};
use crate::errors::EventLoopError;
use crate::observability::messages::event_loop::{
    MaxEventsReached, ReInitRequested, RunAborted, RunCompleted, RunStarted,
};
use crate::observability::messages::StructuredLog;
use crate::observability::StatusDisplay;
use crate::traits::{ReturnCode, Task};

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopOutcome {
    /// A task returned `Stop`, typically the reader at end of input.
    Stopped,
    MaxEventsReached,
}

impl LoopOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopOutcome::Stopped => "stopped",
            LoopOutcome::MaxEventsReached => "max_events_reached",
        }
    }
}

/// What a successful run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Events fully or partially processed.
    pub events: u64,
    /// Events cut short by `ContinueEvent`.
    pub continued_events: u64,
    pub outcome: LoopOutcome,
    #[serde(rename = "duration_seconds", serialize_with = "as_seconds")]
    pub duration: Duration,
    pub statistics: TaskStatistics,
}

fn as_seconds<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

pub struct EventLoop {
    tasks: TaskList,
    registry: ParameterRegistry,
    max_events: Option<u64>,
    stream: String,
    display: Option<Rc<dyn StatusDisplay>>,
    print_statistics: bool,
}

impl EventLoop {
    pub fn new(tasks: TaskList, registry: ParameterRegistry) -> Self {
        Self {
            tasks,
            registry,
            max_events: None,
            stream: ALL_STREAMS.to_string(),
            display: None,
            print_statistics: false,
        }
    }

    /// Stop after this many events even if no task asks to.
    pub fn with_max_events(mut self, max_events: Option<u64>) -> Self {
        self.max_events = max_events;
        self
    }

    /// Stream tag the root list starts with.
    pub fn with_stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = stream.into();
        self
    }

    pub fn with_display(mut self, display: Rc<dyn StatusDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn with_print_statistics(mut self, print_statistics: bool) -> Self {
        self.print_statistics = print_statistics;
        self
    }

    pub fn max_events(&self) -> Option<u64> {
        self.max_events
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskList {
        &mut self.tasks
    }

    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ParameterRegistry {
        &mut self.registry
    }

    pub fn run(&mut self) -> Result<RunSummary, EventLoopError> {
        let list = self.tasks.descriptor();
        let started_msg = RunStarted {
            list: &list,
            max_events: self.max_events,
            stream: &self.stream,
        };
        started_msg.log();
        let ctx = self.context().with_span(started_msg.span("run"));
        let started = Instant::now();

        if let Err(error) = self.tasks.call_pre_process(&mut self.registry, &ctx) {
            RunAborted {
                list: &list,
                phase: "pre_process",
                events: 0,
                reason: &error.to_string(),
            }
            .log();
            // The list is not marked preprocessed, so bypass the wrapper to let
            // the children that did get prepared clean up.
            if let Err(cleanup) = self.tasks.post_process(&mut self.registry, &ctx) {
                RunAborted {
                    list: &list,
                    phase: "post_process",
                    events: 0,
                    reason: &cleanup.to_string(),
                }
                .log();
            }
            return Err(EventLoopError::PreProcess(error));
        }

        ctx.set_status_line1("Processing...");
        let mut events = 0;
        let mut continued_events = 0;
        let mut failed_event = None;
        let outcome = loop {
            if let Some(max_events) = self.max_events {
                if events >= max_events {
                    MaxEventsReached { max_events }.log();
                    break LoopOutcome::MaxEventsReached;
                }
            }

            match self.tasks.call_process(&mut self.registry, &ctx) {
                ReturnCode::Success => events += 1,
                ReturnCode::ContinueEvent => {
                    events += 1;
                    continued_events += 1;
                }
                ReturnCode::Stop => break LoopOutcome::Stopped,
                ReturnCode::Error | ReturnCode::SkipRegistration => {
                    failed_event = Some(events + 1);
                    break LoopOutcome::Stopped;
                }
            }
        };

        let post_processed = self.tasks.call_post_process(&mut self.registry, &ctx);
        let statistics = self.tasks.statistics();
        if self.print_statistics {
            statistics.log();
        }

        if let Err(error) = post_processed {
            RunAborted {
                list: &list,
                phase: "post_process",
                events,
                reason: &error.to_string(),
            }
            .log();
            return Err(EventLoopError::PostProcess(error));
        }
        if let Some(event) = failed_event {
            let error = EventLoopError::Process { event };
            RunAborted {
                list: &list,
                phase: "process",
                events,
                reason: &error.to_string(),
            }
            .log();
            return Err(error);
        }

        let duration = started.elapsed();
        RunCompleted {
            list: &list,
            events,
            continued_events,
            outcome: outcome.as_str(),
            duration,
        }
        .log();

        Ok(RunSummary {
            events,
            continued_events,
            outcome,
            duration,
            statistics,
        })
    }

    /// Forward a re-initialization (new run, new input file) to every task.
    pub fn re_init(&mut self) -> Result<(), EventLoopError> {
        ReInitRequested {
            list: &self.tasks.descriptor(),
        }
        .log();
        let ctx = self.context();
        self.tasks
            .call_re_init(&mut self.registry, &ctx)
            .map_err(EventLoopError::ReInit)
    }

    fn context(&self) -> ExecutionContext {
        let ctx = ExecutionContext::new().with_stream(&self.stream);
        match &self.display {
            Some(display) => ctx.with_display(display.clone()),
            None => ctx,
        }
    }
}

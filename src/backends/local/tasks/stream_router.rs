// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Routes every event to the tasks of the stream it belongs to.
//!
//! The router owns a task list and, once per event, runs it with the
//! stream tag read from the event header. Children tagged with another
//! stream are skipped by the list itself.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;

use crate::backends::local::EventHeader;
use crate::config::consts::DEFAULT_HEADER_NAME;
use crate::engine::{ExecutionContext, ParameterRegistry, TaskList, TaskStatistics};
use crate::errors::TaskError;
use crate::traits::{Accelerator, PreProcessOutcome, ReturnCode, Task, TaskCore, TaskId};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamRouterConfig {
    #[serde(default = "default_header")]
    pub header: String,
}

impl Default for StreamRouterConfig {
    fn default() -> Self {
        Self {
            header: default_header(),
        }
    }
}

fn default_header() -> String {
    DEFAULT_HEADER_NAME.to_string()
}

pub struct StreamRouter {
    core: TaskCore,
    config: StreamRouterConfig,
    tasks: TaskList,
    header: Option<Rc<RefCell<EventHeader>>>,
}

impl StreamRouter {
    pub const KIND: &'static str = "StreamRouter";

    pub fn new(name: impl Into<String>, config: StreamRouterConfig) -> Self {
        let core = TaskCore::new(name);
        let tasks = TaskList::new(core.name());
        Self {
            core,
            config,
            tasks,
            header: None,
        }
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskList {
        &mut self.tasks
    }
}

impl Task for StreamRouter {
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
        ctx: &ExecutionContext,
    ) -> Result<PreProcessOutcome, TaskError> {
        self.header = Some(registry.find_or_create_as::<EventHeader>(&self.config.header)?);
        let outcome = self.tasks.call_pre_process(registry, ctx)?;
        // An empty list would stop the whole loop.
        if self.tasks.active_task_ids().is_empty() {
            self.tasks.call_post_process(registry, ctx)?;
            self.header = None;
            return Ok(PreProcessOutcome::SkipRegistration);
        }
        Ok(outcome)
    }

    fn process(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> ReturnCode {
        let Some(header) = &self.header else {
            return ReturnCode::Error;
        };
        let stream = header.borrow().stream.clone();
        self.tasks.call_process(registry, &ctx.clone().with_stream(&stream))
    }

    fn post_process(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> Result<(), TaskError> {
        self.header = None;
        self.tasks.call_post_process(registry, ctx)
    }

    fn re_init(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> Result<(), TaskError> {
        self.tasks.call_re_init(registry, ctx)
    }

    fn set_accelerator(&mut self, accelerator: Accelerator) {
        self.tasks.set_accelerator(accelerator);
        self.core.set_accelerator(accelerator);
    }

    fn set_serial_number(&mut self, serial_number: u8) {
        self.tasks.set_serial_number(serial_number);
        self.core.set_serial_number(serial_number);
    }

    fn contains_task(&self, id: TaskId) -> bool {
        self.tasks.id() == id || self.tasks.contains_task(id)
    }

    fn release_references(&mut self, id: TaskId) {
        self.tasks.release_references(id);
        self.core.release_filter(id);
    }

    fn statistics(&self) -> TaskStatistics {
        TaskStatistics::from_core(self.descriptor(), &self.core, true)
            .with_children(self.tasks.statistics().children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::{EventSource, EventSourceConfig};
    use crate::backends::stub::ScriptedTask;
    use crate::engine::TaskEntry;

    #[test]
    fn test_routes_events_by_header_stream() {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();

        let mut main = TaskList::new("MainList");
        let reader = EventSource::new(
            "Reader",
            EventSourceConfig {
                events: Some(4),
                streams: vec!["Events".to_string(), "Pedestals".to_string()],
                ..EventSourceConfig::default()
            },
        );
        let events = ScriptedTask::new("OnEvents");
        let events_calls = events.call_counts();
        let pedestals = ScriptedTask::new("OnPedestals");
        let pedestals_calls = pedestals.call_counts();
        let everything = ScriptedTask::new("OnAll");
        let everything_calls = everything.call_counts();

        let mut router = StreamRouter::new("Router", StreamRouterConfig::default());
        router.tasks_mut().add_to_list(TaskEntry::owned(events), Some("Events")).unwrap();
        router
            .tasks_mut()
            .add_to_list(TaskEntry::owned(pedestals), Some("Pedestals"))
            .unwrap();
        router.tasks_mut().add_to_list(TaskEntry::owned(everything), None).unwrap();

        main.add_to_list(TaskEntry::owned(reader), None).unwrap();
        main.add_to_list(TaskEntry::owned(router), None).unwrap();

        main.call_pre_process(&mut registry, &ctx).unwrap();
        while main.call_process(&mut registry, &ctx) == ReturnCode::Success {}
        main.call_post_process(&mut registry, &ctx).unwrap();

        assert_eq!(events_calls.get().process, 2);
        assert_eq!(pedestals_calls.get().process, 2);
        assert_eq!(everything_calls.get().process, 4);
        assert_eq!(events_calls.get().post_process, 1);
    }

    #[test]
    fn test_statistics_include_routed_tasks() {
        let mut router = StreamRouter::new("Router", StreamRouterConfig::default());
        let child = ScriptedTask::new("Child");
        let child_id = child.id();
        router.tasks_mut().add_to_list(TaskEntry::owned(child), None).unwrap();

        let stats = router.statistics();

        assert_eq!(stats.descriptor, "Router [StreamRouter]");
        assert_eq!(stats.children.len(), 1);
        assert!(router.contains_task(child_id));
    }

    #[test]
    fn test_empty_router_removes_itself() {
        let mut registry = ParameterRegistry::new();
        let mut router = StreamRouter::new("Router", StreamRouterConfig::default());

        let outcome = router
            .call_pre_process(&mut registry, &ExecutionContext::default())
            .unwrap();

        assert_eq!(outcome, PreProcessOutcome::SkipRegistration);
    }
}

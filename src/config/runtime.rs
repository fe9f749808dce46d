// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::local::{container_factory, FilterScope, LocalTaskFactory};
use crate::config::Config;
use crate::engine::{EventLoop, ParameterRegistry};
use crate::errors::TaskFactoryError;

/// Pipeline runtime builder - turns a configuration into a ready-to-run
/// [`EventLoop`].
///
/// The root task list and all of its children are built through
/// [`LocalTaskFactory`], the parameter registry gets its ownership mode and
/// the loop gets its limits.
///
/// # Examples
///
/// ```
/// use iact_pipeline::config::{Config, RuntimeBuilder};
///
/// let cfg: Config = serde_yaml::from_str(r#"
/// event_loop: { max_events: 5 }
/// task_list:
///   name: MainList
///   tasks:
///     - { kind: counter, name: Events }
/// "#).unwrap();
///
/// let mut event_loop = RuntimeBuilder::from_config(&cfg).unwrap();
/// let summary = event_loop.run().unwrap();
///
/// assert_eq!(summary.events, 5);
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build the event loop for a configuration.
    ///
    /// Run [`validate_config`](crate::config::validate_config) first to get
    /// every problem at once; building stops at the first one.
    pub fn from_config(cfg: &Config) -> Result<EventLoop, TaskFactoryError> {
        let mut scope = FilterScope::new();
        let tasks = LocalTaskFactory::create_task_list(&cfg.task_list, &mut scope)?;

        let mut registry = ParameterRegistry::with_factory(container_factory());
        registry.set_owner(cfg.registry.owner);

        Ok(EventLoop::new(tasks, registry)
            .with_max_events(cfg.event_loop.max_events)
            .with_stream(cfg.event_loop.stream.clone())
            .with_print_statistics(cfg.event_loop.print_statistics))
    }
}

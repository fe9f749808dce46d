// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::filters::*;
use super::tasks::*;
use crate::config::TaskConfig;
use crate::engine::{FilterList, TaskEntry, TaskList};
use crate::errors::TaskFactoryError;
use crate::traits::{FilterHandle, Task};

/// Filters declared so far while building a pipeline, by name.
///
/// A filter is declared once it is fully configured, so it can only gate
/// tasks built after it.
#[derive(Debug, Default)]
pub struct FilterScope {
    filters: HashMap<String, FilterHandle>,
}

impl FilterScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `handle` resolvable as `name`. A later declaration shadows an
    /// earlier one.
    pub fn declare(&mut self, name: impl Into<String>, handle: FilterHandle) {
        self.filters.insert(name.into(), handle);
    }

    pub fn resolve(&self, name: &str) -> Option<FilterHandle> {
        self.filters.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Kinds that build a filter and can gate other tasks.
const FILTER_KINDS: &[&str] = &["event_number", "event_selector", "filter_list", "pass_filter"];

/// Kinds that take children in `tasks`.
const COMPOSITE_KINDS: &[&str] = &["continue", "filter_list", "stream_router", "task_list"];

const TASK_KINDS: &[&str] = &["counter", "event_source", "print"];

/// Kinds that accept no options at all.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoOptions {}

/// Factory for the built-in tasks and filters.
///
/// The `kind` field of a [`TaskConfig`] selects the implementation:
/// - "task_list" -> TaskList (children in `tasks`, `num_passes`)
/// - "filter_list" -> FilterList (filter children, `operator`)
/// - "stream_router" -> StreamRouter (children routed by the header stream)
/// - "continue" -> Continue (optionally one private filter child)
/// - "counter" -> Counter
/// - "event_source" -> EventSource
/// - "print" -> Print
/// - "event_selector" -> EventSelector
/// - "event_number" -> EventNumberFilter
/// - "pass_filter" -> PassFilter
pub struct LocalTaskFactory;

impl LocalTaskFactory {
    /// Create a task (or filter) and, for composites, its whole subtree.
    ///
    /// Filters are returned as shared entries and declared in `scope`.
    pub fn create_task(config: &TaskConfig, scope: &mut FilterScope) -> Result<TaskEntry, TaskFactoryError> {
        if Self::is_filter_kind(&config.kind) {
            return Ok(TaskEntry::from(Self::create_filter(config, scope)?));
        }

        let mut task: Box<dyn Task> = match config.kind.as_str() {
            "task_list" => Box::new(Self::build_task_list(config, scope)?),
            "stream_router" => {
                let mut router = StreamRouter::new(&config.name, Self::options(config)?);
                for child in &config.tasks {
                    router.tasks_mut().add_to_list(Self::create_task(child, scope)?, None)?;
                }
                Box::new(router)
            }
            "continue" => Box::new(Self::build_continue(config, scope)?),
            "counter" => {
                Self::options::<NoOptions>(config)?;
                Box::new(Counter::new(&config.name))
            }
            "event_source" => Box::new(EventSource::new(&config.name, Self::options(config)?)),
            "print" => Box::new(Print::new(&config.name, Self::options(config)?)),
            _ => {
                return Err(TaskFactoryError::UnknownKind {
                    task: config.name.clone(),
                    kind: config.kind.clone(),
                })
            }
        };

        Self::configure(task.as_mut(), config, scope)?;
        Ok(TaskEntry::Owned(task))
    }

    /// Create the root list of a pipeline.
    pub fn create_task_list(config: &TaskConfig, scope: &mut FilterScope) -> Result<TaskList, TaskFactoryError> {
        if config.kind != "task_list" {
            return Err(TaskFactoryError::UnknownKind {
                task: config.name.clone(),
                kind: config.kind.clone(),
            });
        }
        let mut list = Self::build_task_list(config, scope)?;
        Self::configure(&mut list, config, scope)?;
        Ok(list)
    }

    /// Create a filter and declare it in `scope` under its name.
    pub fn create_filter(config: &TaskConfig, scope: &mut FilterScope) -> Result<FilterHandle, TaskFactoryError> {
        let handle = match config.kind.as_str() {
            "event_selector" => FilterHandle::new(EventSelector::new(&config.name, Self::options(config)?)),
            "event_number" => FilterHandle::new(EventNumberFilter::new(&config.name, Self::options(config)?)),
            "pass_filter" => FilterHandle::new(PassFilter::new(&config.name, Self::options(config)?)),
            "filter_list" => {
                Self::options::<NoOptions>(config)?;
                let mut list = FilterList::new(&config.name, config.operator.unwrap_or_default());
                for child in &config.tasks {
                    if !Self::is_filter_kind(&child.kind) {
                        return Err(TaskFactoryError::NotAFilter {
                            task: child.name.clone(),
                            kind: child.kind.clone(),
                        });
                    }
                    list.add_filter(Self::create_filter(child, scope)?)?;
                }
                FilterHandle::new(list)
            }
            _ if Self::is_kind_available(&config.kind) => {
                return Err(TaskFactoryError::NotAFilter {
                    task: config.name.clone(),
                    kind: config.kind.clone(),
                })
            }
            _ => {
                return Err(TaskFactoryError::UnknownKind {
                    task: config.name.clone(),
                    kind: config.kind.clone(),
                })
            }
        };

        handle.borrow_mut().set_inverted(config.inverted);
        Self::configure(&mut *handle.task_handle().borrow_mut(), config, scope)?;
        scope.declare(&config.name, handle.clone());
        Ok(handle)
    }

    /// List all built-in kinds.
    pub fn list_available_kinds() -> Vec<&'static str> {
        let mut kinds: Vec<&'static str> = TASK_KINDS
            .iter()
            .chain(FILTER_KINDS)
            .chain(COMPOSITE_KINDS)
            .copied()
            .collect();
        kinds.sort_unstable();
        kinds.dedup();
        kinds
    }

    pub fn is_kind_available(kind: &str) -> bool {
        Self::list_available_kinds().contains(&kind)
    }

    pub fn is_filter_kind(kind: &str) -> bool {
        FILTER_KINDS.contains(&kind)
    }

    pub fn is_composite_kind(kind: &str) -> bool {
        COMPOSITE_KINDS.contains(&kind)
    }

    fn build_task_list(config: &TaskConfig, scope: &mut FilterScope) -> Result<TaskList, TaskFactoryError> {
        Self::options::<NoOptions>(config)?;
        let mut list = TaskList::new(&config.name);
        list.set_num_passes(config.num_passes.unwrap_or(0));
        for child in &config.tasks {
            list.add_to_list(Self::create_task(child, scope)?, None)?;
        }
        Ok(list)
    }

    fn build_continue(config: &TaskConfig, scope: &mut FilterScope) -> Result<Continue, TaskFactoryError> {
        let mut task = Continue::new(&config.name, Self::options(config)?);
        match config.tasks.as_slice() {
            [] => {}
            [condition] if Self::is_filter_kind(&condition.kind) => {
                task = task.with_condition(Self::create_filter(condition, scope)?);
            }
            [condition] => {
                return Err(TaskFactoryError::NotAFilter {
                    task: condition.name.clone(),
                    kind: condition.kind.clone(),
                })
            }
            _ => {
                return Err(TaskFactoryError::InvalidOption {
                    task: config.name.clone(),
                    option: "tasks".to_string(),
                    reason: "takes at most one condition".to_string(),
                })
            }
        }
        Ok(task)
    }

    /// Settings shared by every kind.
    fn configure(task: &mut dyn Task, config: &TaskConfig, scope: &FilterScope) -> Result<(), TaskFactoryError> {
        if let Some(title) = &config.title {
            task.core_mut().set_title(title);
        }
        if let Some(stream) = &config.stream {
            task.set_stream_id(stream);
        }
        let accelerator = config.accelerator_bits();
        if !accelerator.is_standard() {
            task.set_accelerator(accelerator);
        }
        if let Some(serial_number) = config.serial_number {
            task.set_serial_number(serial_number);
        }
        if let Some(name) = &config.filter {
            let filter = scope.resolve(name).ok_or_else(|| TaskFactoryError::UnresolvedFilter {
                task: config.name.clone(),
                filter: name.clone(),
            })?;
            task.core_mut().set_filter(Some(filter));
        }
        Ok(())
    }

    fn options<T: DeserializeOwned>(config: &TaskConfig) -> Result<T, TaskFactoryError> {
        let mapping: serde_yaml::Mapping = config
            .options
            .iter()
            .map(|(key, value)| (serde_yaml::Value::String(key.clone()), value.clone()))
            .collect();
        serde_yaml::from_value(serde_yaml::Value::Mapping(mapping)).map_err(|e| {
            TaskFactoryError::InvalidOption {
                task: config.name.clone(),
                option: "options".to_string(),
                reason: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ExecutionContext, ParameterRegistry};
    use crate::traits::{Accelerator, ReturnCode};

    fn task_config(yaml: &str) -> TaskConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_create_every_kind() {
        let test_cases = vec![
            ("counter", "", "Counter"),
            ("event_source", "options: { events: 3 }", "EventSource"),
            ("print", "options: { container: EventHeader }", "Print"),
            ("stream_router", "", "StreamRouter"),
            ("task_list", "", "TaskList"),
            ("event_selector", "options: { ratio: 0.5 }", "EventSelector"),
            ("event_number", "options: { first: 2 }", "EventNumber"),
            ("pass_filter", "", "PassFilter"),
            ("filter_list", "operator: '||'", "FilterList"),
        ];

        for (kind, extra, expected) in test_cases {
            let config = task_config(&format!("kind: {}\nname: Made\n{}", kind, extra));
            let mut scope = FilterScope::new();
            let entry = LocalTaskFactory::create_task(&config, &mut scope)
                .unwrap_or_else(|e| panic!("failed to create {}: {}", kind, e));
            let descriptor = entry.descriptor();
            assert_eq!(descriptor, format!("Made [{}]", expected), "kind {}", kind);
            assert_eq!(entry.is_shared(), LocalTaskFactory::is_filter_kind(kind));
        }
    }

    #[test]
    fn test_continue_needs_its_child_to_be_a_filter() {
        let mut scope = FilterScope::new();
        let ok = task_config(
            "kind: continue\nname: Cut\ntasks:\n  - { kind: event_selector, name: Bad, options: { ratio: 1.0 } }\n",
        );
        assert!(LocalTaskFactory::create_task(&ok, &mut scope).is_ok());
        assert!(scope.resolve("Bad").is_some());

        let bad = task_config("kind: continue\nname: Cut\ntasks:\n  - { kind: counter, name: NotAFilter }\n");
        let error = LocalTaskFactory::create_task(&bad, &mut scope).unwrap_err();
        assert!(matches!(error, TaskFactoryError::NotAFilter { .. }));
    }

    #[test]
    fn test_filter_references_resolve_in_declaration_order() {
        let config = task_config(
            r#"
name: MainList
tasks:
  - { kind: counter, name: Early, filter: Half }
  - { kind: event_selector, name: Half, options: { ratio: 0.5 } }
"#,
        );
        let error = LocalTaskFactory::create_task_list(&config, &mut FilterScope::new()).unwrap_err();
        assert_eq!(
            error,
            TaskFactoryError::UnresolvedFilter {
                task: "Early".to_string(),
                filter: "Half".to_string(),
            }
        );
    }

    #[test]
    fn test_common_settings_are_applied() {
        let config = task_config(
            r#"
name: MainList
num_passes: 2
tasks:
  - { kind: event_selector, name: All, options: { ratio: 1.0, seed: 1 } }
  - kind: counter
    name: Selected
    title: Selected events
    stream: Events
    filter: All
    serial_number: 3
    accelerator: [dont_time]
"#,
        );
        let list = LocalTaskFactory::create_task_list(&config, &mut FilterScope::new()).unwrap();
        assert_eq!(list.num_passes(), 2);

        let counter = list.find_task("Selected").unwrap();
        counter.with_task(|task| {
            assert_eq!(task.descriptor(), "Selected;3 [Counter]");
            assert_eq!(task.core().title(), "Selected events");
            assert_eq!(task.stream_id(), "Events");
            assert!(task.core().accelerator().contains(Accelerator::DONT_TIME));
            assert_eq!(
                task.core().filter().and_then(FilterHandle::name).as_deref(),
                Some("All")
            );
        });
    }

    #[test]
    fn test_invalid_options_are_reported() {
        let test_cases = vec![
            "kind: counter\nname: C\noptions: { typo: 1 }",
            "kind: print\nname: P",
            "kind: event_selector\nname: S\noptions: { ratio: lots }",
        ];

        for yaml in test_cases {
            let error = LocalTaskFactory::create_task(&task_config(yaml), &mut FilterScope::new()).unwrap_err();
            assert!(
                matches!(error, TaskFactoryError::InvalidOption { .. }),
                "{}: {:?}",
                yaml,
                error
            );
        }
    }

    #[test]
    fn test_unknown_kind() {
        let config = task_config("kind: teleport\nname: T");
        let error = LocalTaskFactory::create_task(&config, &mut FilterScope::new()).unwrap_err();
        assert!(matches!(error, TaskFactoryError::UnknownKind { .. }));
        assert!(!LocalTaskFactory::is_kind_available("teleport"));
    }

    #[test]
    fn test_inverted_filter_list() {
        let config = task_config(
            r#"
name: MainList
tasks:
  - kind: filter_list
    name: Neither
    operator: "||"
    inverted: true
    tasks:
      - { kind: event_selector, name: Never, options: { ratio: 0.0 } }
      - { kind: pass_filter, name: Odd, options: { every: 2, offset: 1 } }
  - { kind: counter, name: Counted, filter: Neither }
"#,
        );
        let mut scope = FilterScope::new();
        let mut list = LocalTaskFactory::create_task_list(&config, &mut scope).unwrap();
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();

        list.call_pre_process(&mut registry, &ctx).unwrap();
        assert_eq!(list.call_process(&mut registry, &ctx), ReturnCode::Success);

        let counted = list.find_task("Counted").unwrap();
        assert_eq!(counted.with_task(|task| task.core().num_executions()), Some(1));
        assert_eq!(scope.len(), 3);
    }

    #[test]
    fn test_list_available_kinds() {
        let kinds = LocalTaskFactory::list_available_kinds();
        assert_eq!(kinds.len(), 10);
        assert!(kinds.contains(&"stream_router"));
        assert!(LocalTaskFactory::is_composite_kind("filter_list"));
        assert!(!LocalTaskFactory::is_filter_kind("continue"));
    }
}

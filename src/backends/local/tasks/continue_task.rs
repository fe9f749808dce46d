// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cuts the current event short.
//!
//! A `Continue` returns its configured code (by default `ContinueEvent`)
//! whenever its condition holds, which makes the enclosing list skip the
//! rest of the pass. The condition is either the usual gating filter or a
//! private filter the task owns and processes itself.

use serde::Deserialize;

use crate::engine::{ExecutionContext, ParameterRegistry, TaskStatistics};
use crate::errors::TaskError;
use crate::observability::messages::task::{FilterUnavailable, TaskWithoutCondition};
use crate::observability::messages::StructuredLog;
use crate::traits::{
    Accelerator, FilterHandle, PreProcessOutcome, ReturnCode, Task, TaskCore, TaskId,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContinueConfig {
    #[serde(default = "default_return_code")]
    pub return_code: ReturnCode,
}

impl Default for ContinueConfig {
    fn default() -> Self {
        Self {
            return_code: default_return_code(),
        }
    }
}

fn default_return_code() -> ReturnCode {
    ReturnCode::ContinueEvent
}

pub struct Continue {
    core: TaskCore,
    condition: Option<FilterHandle>,
    return_code: ReturnCode,
}

impl Continue {
    pub const KIND: &'static str = "Continue";

    pub fn new(name: impl Into<String>, config: ContinueConfig) -> Self {
        Self {
            core: TaskCore::new(name),
            condition: None,
            return_code: config.return_code,
        }
    }

    /// Give the task a condition it processes itself, ahead of checking it.
    pub fn with_condition(mut self, condition: FilterHandle) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn condition(&self) -> Option<&FilterHandle> {
        self.condition.as_ref()
    }

    pub fn return_code(&self) -> ReturnCode {
        self.return_code
    }
}

impl Task for Continue {
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
        let Some(condition) = self.condition.clone() else {
            if self.core.filter().is_none() {
                TaskWithoutCondition {
                    task: &self.descriptor(),
                }
                .log();
                return Ok(PreProcessOutcome::SkipRegistration);
            }
            return Ok(PreProcessOutcome::Ready);
        };

        let mut filter = condition
            .try_borrow_mut()
            .ok_or(TaskError::Busy { id: condition.id() })?;
        match filter.call_pre_process(registry, ctx)? {
            PreProcessOutcome::Ready => Ok(PreProcessOutcome::Ready),
            // A condition that never holds leaves nothing to cut.
            PreProcessOutcome::SkipRegistration => {
                drop(filter);
                self.condition = None;
                if self.core.filter().is_some() {
                    Ok(PreProcessOutcome::Ready)
                } else {
                    Ok(PreProcessOutcome::SkipRegistration)
                }
            }
        }
    }

    fn process(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> ReturnCode {
        let Some(condition) = &self.condition else {
            return self.return_code;
        };

        let holds = match condition.try_borrow_mut() {
            Some(mut filter) => match filter.call_process(registry, ctx) {
                ReturnCode::Success => Some(filter.is_condition_true()),
                other => return other,
            },
            None => None,
        };

        match holds {
            Some(true) => self.return_code,
            Some(false) => ReturnCode::Success,
            None => {
                FilterUnavailable {
                    task: &self.descriptor(),
                    filter: condition.id(),
                }
                .log();
                ReturnCode::Error
            }
        }
    }

    fn post_process(
        &mut self,
        registry: &mut ParameterRegistry,
        ctx: &ExecutionContext,
    ) -> Result<(), TaskError> {
        let Some(condition) = &self.condition else {
            return Ok(());
        };
        let mut filter = condition
            .try_borrow_mut()
            .ok_or(TaskError::Busy { id: condition.id() })?;
        filter.call_post_process(registry, ctx)
    }

    fn re_init(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> Result<(), TaskError> {
        let Some(condition) = &self.condition else {
            return Ok(());
        };
        let mut filter = condition
            .try_borrow_mut()
            .ok_or(TaskError::Busy { id: condition.id() })?;
        filter.call_re_init(registry, ctx)
    }

    fn set_accelerator(&mut self, accelerator: Accelerator) {
        if let Some(mut filter) = self.condition.as_ref().and_then(FilterHandle::try_borrow_mut) {
            filter.set_accelerator(accelerator);
        }
        self.core.set_accelerator(accelerator);
    }

    fn contains_task(&self, id: TaskId) -> bool {
        match &self.condition {
            Some(condition) => {
                condition.id() == id
                    || condition
                        .try_borrow()
                        .map(|filter| filter.contains_task(id))
                        .unwrap_or(true)
            }
            None => false,
        }
    }

    fn release_references(&mut self, id: TaskId) {
        if self.condition.as_ref().map(FilterHandle::id) == Some(id) {
            self.condition = None;
        }
        self.core.release_filter(id);
    }

    fn statistics(&self) -> TaskStatistics {
        let children = self
            .condition
            .as_ref()
            .and_then(FilterHandle::try_borrow)
            .map(|filter| vec![filter.statistics()])
            .unwrap_or_default();
        TaskStatistics::from_core(self.descriptor(), &self.core, true).with_children(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::FixedFilter;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn run(task: &mut Continue, events: usize) -> Vec<ReturnCode> {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        task.call_pre_process(&mut registry, &ctx).unwrap();
        (0..events)
            .map(|_| task.call_process(&mut registry, &ctx))
            .collect()
    }

    #[test]
    fn test_without_any_condition_skips_registration() {
        let mut registry = ParameterRegistry::new();
        let mut task = Continue::new("Cut", ContinueConfig::default());

        let outcome = task
            .call_pre_process(&mut registry, &ExecutionContext::default())
            .unwrap();

        assert_eq!(outcome, PreProcessOutcome::SkipRegistration);
    }

    #[test]
    fn test_private_condition_decides_the_return_code() {
        let rc = Rc::new(RefCell::new(FixedFilter::new("Bad", true)));
        let mut task = Continue::new("Cut", ContinueConfig::default())
            .with_condition(FilterHandle::from_rc(rc.clone()));

        assert_eq!(run(&mut task, 1), vec![ReturnCode::ContinueEvent]);

        rc.borrow_mut().set_value(false);
        let mut registry = ParameterRegistry::new();
        let rc_after = task.call_process(&mut registry, &ExecutionContext::default());
        assert_eq!(rc_after, ReturnCode::Success);
        assert_eq!(rc.borrow().evaluations(), 2);
    }

    #[test]
    fn test_gating_filter_acts_as_condition() {
        let gate = FilterHandle::new(FixedFilter::new("Gate", true));
        let config = ContinueConfig {
            return_code: ReturnCode::Stop,
        };
        let mut task = Continue::new("Halt", config);
        task.core_mut().set_filter(Some(gate.clone()));

        assert_eq!(run(&mut task, 1), vec![ReturnCode::Stop]);
    }

    #[test]
    fn test_condition_appears_in_statistics() {
        let mut task = Continue::new("Cut", ContinueConfig::default())
            .with_condition(FilterHandle::new(FixedFilter::new("Bad", false)));
        run(&mut task, 3);

        let stats = task.statistics();
        assert_eq!(stats.executions, 3);
        assert_eq!(stats.children.len(), 1);
        assert_eq!(stats.children[0].name, "Bad");
        assert_eq!(stats.children[0].executions, 3);
    }

    #[test]
    fn test_contains_its_condition() {
        let condition = FilterHandle::new(FixedFilter::new("Bad", true));
        let id = condition.id();
        let task = Continue::new("Cut", ContinueConfig::default()).with_condition(condition);

        assert!(task.contains_task(id));
        assert!(!task.contains_task(TaskCore::new("other").id()));
    }

    #[test]
    fn test_return_code_from_yaml() {
        let config: ContinueConfig = serde_yaml::from_str("return_code: stop").unwrap();
        assert_eq!(config.return_code, ReturnCode::Stop);
        assert!(serde_yaml::from_str::<ContinueConfig>("code: stop").is_err());
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;

use crate::engine::{ExecutionContext, ParameterRegistry};
use crate::errors::{RegistryError, TaskError};
use crate::observability::messages::task::{ContainerContents, ContainerMissing};
use crate::observability::messages::StructuredLog;
use crate::traits::{ContainerHandle, PreProcessOutcome, ReturnCode, Task, TaskCore};

/// Configuration for the Print task.
///
/// An `optional` container that is missing removes the task instead of
/// failing the run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrintConfig {
    pub container: String,
    #[serde(default)]
    pub optional: bool,
}

/// Logs the contents of a registry container once per event.
pub struct Print {
    core: TaskCore,
    config: PrintConfig,
    container: Option<ContainerHandle>,
}

impl Print {
    pub const KIND: &'static str = "Print";

    pub fn new(name: impl Into<String>, config: PrintConfig) -> Self {
        Self {
            core: TaskCore::new(name),
            config,
            container: None,
        }
    }
}

impl Task for Print {
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
        match registry.find(&self.config.container) {
            Some(container) => {
                self.container = Some(container);
                Ok(PreProcessOutcome::Ready)
            }
            None if self.config.optional => {
                ContainerMissing {
                    task: &self.descriptor(),
                    container: &self.config.container,
                }
                .log();
                Ok(PreProcessOutcome::SkipRegistration)
            }
            None => Err(RegistryError::NotFound {
                name: self.config.container.clone(),
            }
            .into()),
        }
    }

    fn process(&mut self, _registry: &mut ParameterRegistry, _ctx: &ExecutionContext) -> ReturnCode {
        let Some(container) = &self.container else {
            return ReturnCode::Error;
        };
        ContainerContents {
            container: &self.config.container,
            contents: &format!("{:?}", container),
        }
        .log();
        ReturnCode::Success
    }

    fn post_process(&mut self, _registry: &mut ParameterRegistry, _ctx: &ExecutionContext) -> Result<(), TaskError> {
        self.container = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::EventHeader;

    fn print(container: &str, optional: bool) -> Print {
        Print::new(
            "Dump",
            PrintConfig {
                container: container.to_string(),
                optional,
            },
        )
    }

    #[test]
    fn test_missing_container_handling() {
        let test_cases = vec![
            (true, Ok(PreProcessOutcome::SkipRegistration)),
            (
                false,
                Err(TaskError::Registry(RegistryError::NotFound {
                    name: "Missing".to_string(),
                })),
            ),
        ];

        for (optional, expected) in test_cases {
            let mut registry = ParameterRegistry::new();
            let mut task = print("Missing", optional);
            let outcome = task.call_pre_process(&mut registry, &ExecutionContext::default());
            assert_eq!(outcome, expected, "optional = {}", optional);
        }
    }

    #[test]
    fn test_prints_existing_container() {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        registry.find_or_create_as::<EventHeader>("EventHeader").unwrap();
        let mut task = print("EventHeader", false);

        task.call_pre_process(&mut registry, &ctx).unwrap();

        assert_eq!(task.call_process(&mut registry, &ctx), ReturnCode::Success);
        assert_eq!(task.core().num_executions(), 1);
    }
}

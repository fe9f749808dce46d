// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation for pipeline declarations.
//!
//! Catches everything that would make [`RuntimeBuilder`](crate::config::RuntimeBuilder)
//! fail, and a few declarations it would silently accept, before any task
//! is built.
//!
//! # Validation Pipeline
//!
//! 1. **Root Validation**: the top-level entry must be a `task_list`
//! 2. **Declaration Validation**: every task has a name, a known kind, only
//!    the fields its kind understands, and children its kind accepts
//! 3. **Reference Validation**: every `filter` reference names a filter
//!    declared *before* the referencing task, in build order
//!
//! Build order is depth-first with a composite's children built before the
//! composite itself is configured, so a list may be gated by a filter it
//! contains but a task may not be gated by a filter declared after it.
//!
//! # Error Accumulation
//!
//! All checks run on the whole tree and every problem is reported, so a
//! configuration can be fixed in one go.
//!
//! # Example
//! ```rust
//! use iact_pipeline::config::{validate_config, Config};
//!
//! let cfg: Config = serde_yaml::from_str(
//!     "task_list:\n  name: MainList\n  tasks:\n    - { kind: counter, name: C, filter: Missing }\n",
//! )
//! .unwrap();
//!
//! let errors = validate_config(&cfg).unwrap_err();
//! assert_eq!(errors.len(), 1);
//! ```

use std::collections::HashMap;

use crate::backends::local::LocalTaskFactory;
use crate::config::consts::ROOT_KIND;
use crate::config::{Config, TaskConfig};
use crate::errors::ValidationError;
use crate::observability::messages::validation::{
    ValidationCompleted, ValidationProblem, ValidationStarted,
};
use crate::observability::messages::StructuredLog;

/// Validates a whole pipeline configuration.
///
/// # Returns
///
/// * `Ok(())` - The pipeline can be built
/// * `Err(Vec<ValidationError>)` - Every problem found, in tree order
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let root = &config.task_list;
    let task_count = root.count();
    ValidationStarted { task_count }.log();

    let mut errors = Vec::new();
    if root.kind != ROOT_KIND {
        errors.push(ValidationError::RootNotTaskList {
            kind: root.kind.clone(),
        });
    }
    validate_declarations(root, &mut errors);
    FilterReferences::default().check(root, &mut errors);

    for error in &errors {
        ValidationProblem { error }.log();
    }
    ValidationCompleted {
        task_count,
        error_count: errors.len(),
    }
    .log();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_declarations(task: &TaskConfig, errors: &mut Vec<ValidationError>) {
    if task.name.trim().is_empty() {
        errors.push(ValidationError::EmptyTaskName {
            kind: task.kind.clone(),
        });
    }

    if !LocalTaskFactory::is_kind_available(&task.kind) {
        errors.push(ValidationError::UnknownKind {
            task: task.name.clone(),
            kind: task.kind.clone(),
        });
    } else {
        validate_fields(task, errors);
        validate_children(task, errors);
    }

    for child in &task.tasks {
        validate_declarations(child, errors);
    }
}

fn validate_fields(task: &TaskConfig, errors: &mut Vec<ValidationError>) {
    let kind = task.kind.as_str();
    let unsupported = [
        ("num_passes", task.num_passes.is_some() && kind != "task_list"),
        ("operator", task.operator.is_some() && kind != "filter_list"),
        (
            "tasks",
            !task.tasks.is_empty() && !LocalTaskFactory::is_composite_kind(kind),
        ),
        ("inverted", task.inverted && !LocalTaskFactory::is_filter_kind(kind)),
    ];

    for (field, is_set) in unsupported {
        if is_set {
            errors.push(ValidationError::UnsupportedField {
                task: task.name.clone(),
                kind: task.kind.clone(),
                field,
            });
        }
    }
}

fn validate_children(task: &TaskConfig, errors: &mut Vec<ValidationError>) {
    let filters_only = match task.kind.as_str() {
        "filter_list" => true,
        "continue" => {
            if task.tasks.len() > 1 {
                errors.push(ValidationError::TooManyChildren {
                    task: task.name.clone(),
                    kind: task.kind.clone(),
                    max: 1,
                });
            }
            true
        }
        _ => false,
    };
    if !filters_only {
        return;
    }

    for child in &task.tasks {
        if LocalTaskFactory::is_kind_available(&child.kind)
            && !LocalTaskFactory::is_filter_kind(&child.kind)
        {
            errors.push(ValidationError::NonFilterChild {
                parent: task.name.clone(),
                child: child.name.clone(),
                kind: child.kind.clone(),
            });
        }
    }
}

/// Names seen so far in build order, mapped to their kind.
#[derive(Default)]
struct FilterReferences {
    declared: HashMap<String, String>,
}

impl FilterReferences {
    fn check(&mut self, task: &TaskConfig, errors: &mut Vec<ValidationError>) {
        for child in &task.tasks {
            self.check(child, errors);
        }

        let is_filter = LocalTaskFactory::is_filter_kind(&task.kind);
        if let Some(reference) = &task.filter {
            self.check_reference(task, reference, is_filter, errors);
        }

        if is_filter {
            let previous = self.declared.insert(task.name.clone(), task.kind.clone());
            if previous.is_some_and(|kind| LocalTaskFactory::is_filter_kind(&kind)) {
                errors.push(ValidationError::DuplicateFilterName {
                    name: task.name.clone(),
                });
            }
        } else {
            // A filter of the same name keeps the reference resolvable.
            self.declared
                .entry(task.name.clone())
                .or_insert_with(|| task.kind.clone());
        }
    }

    fn check_reference(
        &self,
        task: &TaskConfig,
        reference: &str,
        is_filter: bool,
        errors: &mut Vec<ValidationError>,
    ) {
        if is_filter && reference == task.name {
            errors.push(ValidationError::SelfGatingFilter {
                filter: task.name.clone(),
            });
            return;
        }

        match self.declared.get(reference) {
            Some(kind) if LocalTaskFactory::is_filter_kind(kind) => {}
            Some(kind) => errors.push(ValidationError::NotAFilter {
                task: task.name.clone(),
                reference: reference.to_string(),
                kind: kind.clone(),
            }),
            None => errors.push(ValidationError::UnresolvedFilter {
                task: task.name.clone(),
                filter: reference.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn errors_of(yaml: &str) -> Vec<ValidationError> {
        validate_config(&config(yaml)).err().unwrap_or_default()
    }

    #[test]
    fn test_valid_pipeline() {
        let yaml = r#"
task_list:
  name: MainList
  num_passes: 2
  tasks:
    - { kind: event_source, name: Reader, options: { events: 10 } }
    - { kind: event_selector, name: Half, options: { ratio: 0.5 } }
    - { kind: counter, name: Selected, filter: Half }
    - kind: filter_list
      name: Both
      operator: "&&"
      inverted: true
      tasks:
        - { kind: pass_filter, name: Even }
        - { kind: event_number, name: Early, options: { last: 5 } }
    - { kind: counter, name: Rest, filter: Both }
    - kind: continue
      name: Cut
      tasks:
        - { kind: event_selector, name: Third, options: { ratio: 0.33 } }
"#;
        assert_eq!(errors_of(yaml), vec![]);
    }

    #[test]
    fn test_root_must_be_a_task_list() {
        let errors = errors_of("task_list:\n  kind: counter\n  name: Lonely\n");
        assert_eq!(
            errors,
            vec![ValidationError::RootNotTaskList {
                kind: "counter".to_string()
            }]
        );
    }

    #[test]
    fn test_reference_problems() {
        let yaml = r#"
task_list:
  name: MainList
  tasks:
    - { kind: counter, name: TooEarly, filter: Half }
    - { kind: event_selector, name: Half, options: { ratio: 0.5 } }
    - { kind: counter, name: Plain }
    - { kind: counter, name: Gated, filter: Plain }
    - { kind: pass_filter, name: Loop, filter: Loop }
    - { kind: event_selector, name: Half, options: { ratio: 0.1 } }
"#;
        assert_eq!(
            errors_of(yaml),
            vec![
                ValidationError::UnresolvedFilter {
                    task: "TooEarly".to_string(),
                    filter: "Half".to_string(),
                },
                ValidationError::NotAFilter {
                    task: "Gated".to_string(),
                    reference: "Plain".to_string(),
                    kind: "counter".to_string(),
                },
                ValidationError::SelfGatingFilter {
                    filter: "Loop".to_string(),
                },
                ValidationError::DuplicateFilterName {
                    name: "Half".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_list_may_be_gated_by_its_own_child() {
        let yaml = r#"
task_list:
  name: MainList
  tasks:
    - kind: task_list
      name: Inner
      filter: Half
      tasks:
        - { kind: event_selector, name: Half, options: { ratio: 0.5 } }
"#;
        assert_eq!(errors_of(yaml), vec![]);
    }

    #[test]
    fn test_declaration_problems() {
        let yaml = r#"
task_list:
  name: MainList
  tasks:
    - { kind: teleport, name: Beam }
    - { kind: counter, name: "" }
    - { kind: counter, name: Passes, num_passes: 3, inverted: true }
    - { kind: task_list, name: Op, operator: "||" }
    - kind: event_source
      name: Parent
      tasks:
        - { kind: counter, name: Child }
"#;
        assert_eq!(
            errors_of(yaml),
            vec![
                ValidationError::UnknownKind {
                    task: "Beam".to_string(),
                    kind: "teleport".to_string(),
                },
                ValidationError::EmptyTaskName {
                    kind: "counter".to_string(),
                },
                ValidationError::UnsupportedField {
                    task: "Passes".to_string(),
                    kind: "counter".to_string(),
                    field: "num_passes",
                },
                ValidationError::UnsupportedField {
                    task: "Passes".to_string(),
                    kind: "counter".to_string(),
                    field: "inverted",
                },
                ValidationError::UnsupportedField {
                    task: "Op".to_string(),
                    kind: "task_list".to_string(),
                    field: "operator",
                },
                ValidationError::UnsupportedField {
                    task: "Parent".to_string(),
                    kind: "event_source".to_string(),
                    field: "tasks",
                },
            ]
        );
    }

    #[test]
    fn test_children_that_must_be_filters() {
        let yaml = r#"
task_list:
  name: MainList
  tasks:
    - kind: filter_list
      name: Mixed
      tasks:
        - { kind: counter, name: NotOne }
    - kind: continue
      name: Greedy
      tasks:
        - { kind: pass_filter, name: A }
        - { kind: pass_filter, name: B }
"#;
        assert_eq!(
            errors_of(yaml),
            vec![
                ValidationError::NonFilterChild {
                    parent: "Mixed".to_string(),
                    child: "NotOne".to_string(),
                    kind: "counter".to_string(),
                },
                ValidationError::TooManyChildren {
                    task: "Greedy".to_string(),
                    kind: "continue".to_string(),
                    max: 1,
                },
            ]
        );
    }
}

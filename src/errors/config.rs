// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use thiserror::Error;

/// Problems found while validating a pipeline configuration.
///
/// Validation collects every problem instead of stopping at the first one.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The top-level entry is not a task list
    RootNotTaskList {
        /// The kind found at the root
        kind: String,
    },
    /// A task declares a kind no factory can build
    UnknownKind {
        /// The task declaring the kind
        task: String,
        /// The unknown kind
        kind: String,
    },
    /// A task has an empty name
    EmptyTaskName {
        /// The kind of the unnamed task
        kind: String,
    },
    /// Two filters share a name, making references ambiguous
    DuplicateFilterName {
        /// The duplicate filter name
        name: String,
    },
    /// A task is gated by a filter that is not declared before it
    UnresolvedFilter {
        /// The gated task
        task: String,
        /// The missing filter
        filter: String,
    },
    /// A task is gated by something that is not a filter
    NotAFilter {
        /// The gated task
        task: String,
        /// The referenced task
        reference: String,
        /// Kind of the referenced task
        kind: String,
    },
    /// A filter is gated by itself
    SelfGatingFilter {
        /// The filter
        filter: String,
    },
    /// A filter list or a continue task has a child that is not a filter
    NonFilterChild {
        /// The parent task
        parent: String,
        /// The offending child
        child: String,
        /// Kind of the child
        kind: String,
    },
    /// A task has more children than its kind accepts
    TooManyChildren {
        /// The parent task
        task: String,
        /// The parent's kind
        kind: String,
        /// Children the kind accepts
        max: usize,
    },
    /// A field is set on a kind that ignores it
    UnsupportedField {
        /// The task carrying the field
        task: String,
        /// The task's kind
        kind: String,
        /// The offending field
        field: &'static str,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::RootNotTaskList { kind } => {
                write!(f, "Top-level task must be a 'task_list', found '{}'", kind)
            }
            ValidationError::UnknownKind { task, kind } => {
                write!(f, "Task '{}' has unknown kind '{}'", task, kind)
            }
            ValidationError::EmptyTaskName { kind } => {
                write!(f, "A task of kind '{}' has an empty name", kind)
            }
            ValidationError::DuplicateFilterName { name } => {
                write!(f, "Duplicate filter name: '{}'", name)
            }
            ValidationError::UnresolvedFilter { task, filter } => {
                write!(
                    f,
                    "Task '{}' is gated by filter '{}' which is not declared before it",
                    task, filter
                )
            }
            ValidationError::NotAFilter {
                task,
                reference,
                kind,
            } => {
                write!(
                    f,
                    "Task '{}' is gated by '{}' which is a '{}', not a filter",
                    task, reference, kind
                )
            }
            ValidationError::SelfGatingFilter { filter } => {
                write!(f, "Filter '{}' cannot gate itself", filter)
            }
            ValidationError::NonFilterChild { parent, child, kind } => {
                write!(
                    f,
                    "Task '{}' only takes filters, but child '{}' is a '{}'",
                    parent, child, kind
                )
            }
            ValidationError::TooManyChildren { task, kind, max } => {
                write!(
                    f,
                    "Task '{}' of kind '{}' takes at most {} child task(s)",
                    task, kind, max
                )
            }
            ValidationError::UnsupportedField { task, kind, field } => {
                write!(
                    f,
                    "Task '{}' of kind '{}' does not support field '{}'",
                    task, kind, field
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("configuration validation failed:\n{}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|error| error.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let test_cases = vec![
            (
                ValidationError::UnresolvedFilter {
                    task: "Selected".to_string(),
                    filter: "Cut".to_string(),
                },
                "Task 'Selected' is gated by filter 'Cut' which is not declared before it",
            ),
            (
                ValidationError::DuplicateFilterName {
                    name: "Cut".to_string(),
                },
                "Duplicate filter name: 'Cut'",
            ),
            (
                ValidationError::UnsupportedField {
                    task: "Reader".to_string(),
                    kind: "event_source".to_string(),
                    field: "num_passes",
                },
                "Task 'Reader' of kind 'event_source' does not support field 'num_passes'",
            ),
        ];

        for (error, expected) in test_cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_invalid_config_lists_every_error() {
        let error = ConfigError::Invalid(vec![
            ValidationError::SelfGatingFilter {
                filter: "a".to_string(),
            },
            ValidationError::RootNotTaskList {
                kind: "counter".to_string(),
            },
        ]);
        let message = error.to_string();
        assert!(message.starts_with("configuration validation failed:"));
        assert!(message.contains("Filter 'a' cannot gate itself"));
        assert!(message.contains("found 'counter'"));
    }
}

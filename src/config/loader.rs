// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{ALL_STREAMS, ROOT_KIND};
use crate::engine::FilterOperator;
use crate::errors::ConfigError;
use crate::traits::Accelerator;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main configuration structure for a pipeline run.
///
/// A pipeline is one root task list, the event loop settings that drive it
/// and the ownership mode of the parameter registry. It is typically loaded
/// from a YAML file; files ending in `.toml` are read as TOML.
///
/// # Example
/// ```yaml
/// event_loop:
///   max_events: 1000
///   print_statistics: true
/// registry:
///   owner: true
/// task_list:
///   name: MainList
///   tasks:
///     - kind: event_source
///       name: Reader
///       options: { events: 100 }
///     - kind: counter
///       name: Events
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub event_loop: EventLoopConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    pub task_list: TaskConfig,
}

/// Settings of the event loop driving the root list.
///
/// # Fields
/// * `max_events` - Stop after this many events (optional, runs until a task stops otherwise)
/// * `stream` - Stream tag the root list starts with (defaults to `All`)
/// * `print_statistics` - Log the execution statistics table after the run
#[derive(Debug, Clone, Deserialize)]
pub struct EventLoopConfig {
    pub max_events: Option<u64>,
    #[serde(default = "default_stream")]
    pub stream: String,
    #[serde(default)]
    pub print_statistics: bool,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            max_events: None,
            stream: default_stream(),
            print_statistics: false,
        }
    }
}

fn default_stream() -> String {
    ALL_STREAMS.to_string()
}

/// Ownership mode of the parameter registry.
///
/// An owning registry keeps containers it displaces instead of handing them
/// back to the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub owner: bool,
}

/// Declaration of a single task.
///
/// Composite kinds (`task_list`, `filter_list`, `stream_router`) carry their
/// children in `tasks`. Kind-specific settings go into `options`.
///
/// # Fields
/// * `kind` - Built-in kind tag, defaults to `task_list`
/// * `name` - Task name, used for filter references and statistics
/// * `title` - Free text shown in statistics (optional)
/// * `stream` - Stream tag the task runs on (optional, inherits `All`)
/// * `filter` - Name of a previously declared filter gating this task (optional)
/// * `inverted` - Invert a filter's condition (filters only)
/// * `accelerator` - Performance hints (`dont_reset`, `dont_time`)
/// * `serial_number` - Serial number appended to the descriptor (optional)
/// * `num_passes` - Passes per event (`task_list` only)
/// * `operator` - Combination operator (`filter_list` only)
/// * `tasks` - Children of composite kinds
/// * `options` - Kind-specific options
///
/// # Example
/// ```yaml
/// kind: event_selector
/// name: Half
/// inverted: false
/// options:
///   ratio: 0.5
///   seed: 7
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    #[serde(default = "default_kind")]
    pub kind: String,
    pub name: String,
    pub title: Option<String>,
    pub stream: Option<String>,
    pub filter: Option<String>,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub accelerator: Vec<AcceleratorFlag>,
    pub serial_number: Option<u8>,
    pub num_passes: Option<u32>,
    pub operator: Option<FilterOperator>,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
    #[serde(default)]
    pub options: HashMap<String, serde_yaml::Value>,
}

fn default_kind() -> String {
    ROOT_KIND.to_string()
}

impl TaskConfig {
    /// Combined accelerator bits of the declared flags.
    pub fn accelerator_bits(&self) -> Accelerator {
        self.accelerator
            .iter()
            .fold(Accelerator::STANDARD, |bits, flag| bits | flag.bits())
    }

    /// Number of declarations in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.tasks.iter().map(TaskConfig::count).sum::<usize>()
    }
}

/// A single accelerator flag as spelled in configuration files.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum AcceleratorFlag {
    DontReset,
    DontTime,
}

impl AcceleratorFlag {
    pub fn bits(&self) -> Accelerator {
        match self {
            AcceleratorFlag::DontReset => Accelerator::DONT_RESET,
            AcceleratorFlag::DontTime => Accelerator::DONT_TIME,
        }
    }
}

/// Load a config from a YAML or TOML file, chosen by extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let is_toml = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("toml"));
    if is_toml {
        Ok(toml::from_str(&content)?)
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Load a config and check it for every problem that would make building
/// the pipeline fail.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}

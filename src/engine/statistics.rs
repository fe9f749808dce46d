// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::observability::messages::task_list::StatisticsLine;
use crate::observability::messages::StructuredLog;
use crate::traits::TaskCore;

/// Execution statistics of a task and, for composites, of its children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatistics {
    pub descriptor: String,
    pub name: String,
    pub title: String,
    pub stream: String,
    /// Executions since the last pre-process.
    pub executions: u64,
    pub total_executions: u64,
    #[serde(rename = "time_seconds", serialize_with = "as_seconds")]
    pub time_spent: Duration,
    pub filter: Option<String>,
    pub participates: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TaskStatistics>,
}

fn as_seconds<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl TaskStatistics {
    pub fn from_core(descriptor: String, core: &TaskCore, participates: bool) -> Self {
        let filter = core
            .filter()
            .map(|filter| filter.rule().unwrap_or_else(|| filter.id().to_string()));
        Self {
            descriptor,
            name: core.name().to_string(),
            title: core.title().to_string(),
            stream: core.stream_id().to_string(),
            executions: core.num_executions_since_pre_process(),
            total_executions: core.num_executions(),
            time_spent: core.time_spent(),
            filter,
            participates,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TaskStatistics>) -> Self {
        self.children = children;
        self
    }

    /// Indented table rows: executions, share of the parent's time,
    /// descriptor, title and filter. Tasks without per-event work are left
    /// out.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.render(0, self.time_spent, &mut lines);
        lines
    }

    pub fn log(&self) {
        for line in self.lines() {
            StatisticsLine { line: &line }.log();
        }
    }

    fn render(&self, depth: usize, parent_time: Duration, lines: &mut Vec<String>) {
        if !self.participates {
            return;
        }

        let share = if parent_time.is_zero() {
            0.0
        } else {
            self.time_spent.as_secs_f64() / parent_time.as_secs_f64() * 100.0
        };
        let mut line = format!(
            "{:indent$}{:>10} {:>5.1}%  {}",
            "",
            self.executions,
            share,
            self.descriptor,
            indent = depth * 2
        );
        if self.title != self.name {
            line.push_str(&format!(" '{}'", self.title));
        }
        if let Some(filter) = &self.filter {
            line.push_str(&format!(" <{}>", filter));
        }
        lines.push(line);

        for child in &self.children {
            child.render(depth + 1, self.time_spent, lines);
        }
    }
}

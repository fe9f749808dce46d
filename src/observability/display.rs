// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Two-line progress display updated by the scheduler.
///
/// Line 1 carries the phase ("PreProcessing...", "Processing..."), line 2
/// the task currently being worked on.
pub trait StatusDisplay {
    fn set_status_line1(&self, text: &str);

    fn set_status_line2(&self, text: &str);
}

/// Status display that forwards every update to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatusDisplay;

impl StatusDisplay for TracingStatusDisplay {
    fn set_status_line1(&self, text: &str) {
        tracing::info!(target: "iact_pipeline::status", line = 1, "{}", text);
    }

    fn set_status_line2(&self, text: &str) {
        tracing::info!(target: "iact_pipeline::status", line = 2, "{}", text);
    }
}

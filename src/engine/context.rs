// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::rc::Rc;

use tracing::Span;

use crate::config::consts::ALL_STREAMS;
use crate::observability::StatusDisplay;

/// Ambient state handed down the task tree on every call.
///
/// Lists derive a child context when they change something (stream or pass)
/// instead of pushing setters into their children.
#[derive(Clone)]
pub struct ExecutionContext {
    stream: Rc<str>,
    pass: u32,
    display: Option<Rc<dyn StatusDisplay>>,
    span: Span,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            stream: Rc::from(ALL_STREAMS),
            pass: 0,
            display: None,
            span: Span::none(),
        }
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stream(mut self, stream: &str) -> Self {
        self.stream = Rc::from(stream);
        self
    }

    pub fn with_pass(mut self, pass: u32) -> Self {
        self.pass = pass;
        self
    }

    pub fn with_display(mut self, display: Rc<dyn StatusDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Stream tag currently being processed.
    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Pass index of the innermost list.
    pub fn pass(&self) -> u32 {
        self.pass
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn set_status_line1(&self, text: &str) {
        if let Some(display) = &self.display {
            display.set_status_line1(text);
        }
    }

    pub fn set_status_line2(&self, text: &str) {
        if let Some(display) = &self.display {
            display.set_status_line2(text);
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("stream", &self.stream)
            .field("pass", &self.pass)
            .field("display", &self.display.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::RecordingDisplay;

    #[test]
    fn test_defaults() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.stream(), "All");
        assert_eq!(ctx.pass(), 0);
    }

    #[test]
    fn test_derived_context_leaves_parent_untouched() {
        let parent = ExecutionContext::new();
        let child = parent.clone().with_stream("Events").with_pass(2);
        assert_eq!(parent.stream(), "All");
        assert_eq!(child.stream(), "Events");
        assert_eq!(child.pass(), 2);
    }

    #[test]
    fn test_status_lines_reach_display() {
        let display = Rc::new(RecordingDisplay::default());
        let ctx = ExecutionContext::new().with_display(display.clone());
        ctx.set_status_line1("Processing...");
        ctx.set_status_line2("Reader [EventSource]");

        assert_eq!(display.line1(), vec!["Processing...".to_string()]);
        assert_eq!(display.line2(), vec!["Reader [EventSource]".to_string()]);
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scriptable tasks, filters and containers for tests.

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use crate::engine::{ExecutionContext, ParameterRegistry};
use crate::errors::TaskError;
use crate::observability::StatusDisplay;
use crate::traits::{Container, ContainerKind, Filter, PreProcessOutcome, ReturnCode, Task, TaskCore};

/// Shared, ordered record of phase calls across several tasks.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn push(&self, phase: &str, task: &str) {
        self.0.borrow_mut().push(format!("{}:{}", phase, task));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub pre_process: u32,
    pub process: u32,
    pub post_process: u32,
    pub re_init: u32,
}

/// Handle on a task's call counts that outlives moving the task into a list.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Rc<Cell<CallCounts>>);

impl CallCounter {
    pub fn get(&self) -> CallCounts {
        self.0.get()
    }

    fn update(&self, f: impl FnOnce(&mut CallCounts)) {
        let mut counts = self.0.get();
        f(&mut counts);
        self.0.set(counts);
    }
}

/// A task whose behavior in every phase is set up front.
pub struct ScriptedTask {
    core: TaskCore,
    log: Option<CallLog>,
    counts: CallCounter,
    fail_pre_process: bool,
    fail_post_process: bool,
    skip_registration: bool,
    participates: bool,
    returning: ReturnCode,
    stop_after: Option<u32>,
}

impl ScriptedTask {
    pub fn new(name: &str) -> Self {
        Self {
            core: TaskCore::new(name),
            log: None,
            counts: CallCounter::default(),
            fail_pre_process: false,
            fail_post_process: false,
            skip_registration: false,
            participates: true,
            returning: ReturnCode::Success,
            stop_after: None,
        }
    }

    pub fn recording(mut self, log: &CallLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    pub fn fail_pre_process(mut self) -> Self {
        self.fail_pre_process = true;
        self
    }

    pub fn fail_post_process(mut self) -> Self {
        self.fail_post_process = true;
        self
    }

    pub fn skip_registration(mut self) -> Self {
        self.skip_registration = true;
        self
    }

    pub fn not_participating(mut self) -> Self {
        self.participates = false;
        self
    }

    pub fn returning(mut self, code: ReturnCode) -> Self {
        self.returning = code;
        self
    }

    /// Return `Stop` once `events` calls to `process` have succeeded.
    pub fn stop_after(mut self, events: u32) -> Self {
        self.stop_after = Some(events);
        self
    }

    pub fn call_counts(&self) -> CallCounter {
        self.counts.clone()
    }

    pub fn calls(&self) -> CallCounts {
        self.counts.get()
    }

    fn record(&self, phase: &str) {
        if let Some(log) = &self.log {
            log.push(phase, self.core.name());
        }
    }
}

impl Task for ScriptedTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "Scripted"
    }

    fn pre_process(
        &mut self,
        _registry: &mut ParameterRegistry,
        _ctx: &ExecutionContext,
    ) -> Result<PreProcessOutcome, TaskError> {
        self.record("pre");
        self.counts.update(|counts| counts.pre_process += 1);
        if self.fail_pre_process {
            return Err(TaskError::failed(self.descriptor(), "scripted pre-process failure"));
        }
        if self.skip_registration {
            return Ok(PreProcessOutcome::SkipRegistration);
        }
        Ok(PreProcessOutcome::Ready)
    }

    fn process(&mut self, _registry: &mut ParameterRegistry, _ctx: &ExecutionContext) -> ReturnCode {
        self.record("process");
        self.counts.update(|counts| counts.process += 1);
        match self.stop_after {
            Some(limit) if self.counts.get().process > limit => ReturnCode::Stop,
            _ => self.returning,
        }
    }

    fn post_process(&mut self, _registry: &mut ParameterRegistry, _ctx: &ExecutionContext) -> Result<(), TaskError> {
        self.record("post");
        self.counts.update(|counts| counts.post_process += 1);
        if self.fail_post_process {
            return Err(TaskError::failed(self.descriptor(), "scripted post-process failure"));
        }
        Ok(())
    }

    fn re_init(&mut self, _registry: &mut ParameterRegistry, _ctx: &ExecutionContext) -> Result<(), TaskError> {
        self.record("re_init");
        self.counts.update(|counts| counts.re_init += 1);
        Ok(())
    }

    fn participates_in_process(&self) -> bool {
        self.participates
    }
}

/// A filter with a constant expression value that counts its evaluations.
pub struct FixedFilter {
    core: TaskCore,
    value: bool,
    inverted: bool,
    skip_registration: bool,
    evaluations: Cell<u32>,
}

impl FixedFilter {
    pub fn new(name: impl Into<String>, value: bool) -> Self {
        Self {
            core: TaskCore::new(name),
            value,
            inverted: false,
            skip_registration: false,
            evaluations: Cell::new(0),
        }
    }

    pub fn skip_registration(mut self) -> Self {
        self.skip_registration = true;
        self
    }

    pub fn set_value(&mut self, value: bool) {
        self.value = value;
    }

    pub fn evaluations(&self) -> u32 {
        self.evaluations.get()
    }
}

impl Task for FixedFilter {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "Fixed"
    }

    fn pre_process(
        &mut self,
        _registry: &mut ParameterRegistry,
        _ctx: &ExecutionContext,
    ) -> Result<PreProcessOutcome, TaskError> {
        if self.skip_registration {
            return Ok(PreProcessOutcome::SkipRegistration);
        }
        Ok(PreProcessOutcome::Ready)
    }
}

impl Filter for FixedFilter {
    fn is_expression_true(&self) -> bool {
        self.evaluations.set(self.evaluations.get() + 1);
        self.value
    }

    fn is_inverted(&self) -> bool {
        self.inverted
    }

    fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }
}

/// Container counting per-event increments and resets.
#[derive(Debug, Default)]
pub struct Tally {
    pub count: u64,
    pub resets: u64,
    pub ready_to_save: bool,
}

impl Container for Tally {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn reset(&mut self) {
        self.count = 0;
        self.resets += 1;
    }

    fn is_ready_to_save(&self) -> bool {
        self.ready_to_save
    }

    fn set_ready_to_save(&mut self, ready: bool) {
        self.ready_to_save = ready;
    }
}

impl ContainerKind for Tally {
    const KIND: &'static str = "Tally";
}

/// Status display that keeps every line it was given.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    line1: RefCell<Vec<String>>,
    line2: RefCell<Vec<String>>,
}

impl RecordingDisplay {
    pub fn line1(&self) -> Vec<String> {
        self.line1.borrow().clone()
    }

    pub fn line2(&self) -> Vec<String> {
        self.line2.borrow().clone()
    }
}

impl StatusDisplay for RecordingDisplay {
    fn set_status_line1(&self, text: &str) {
        self.line1.borrow_mut().push(text.to_string());
    }

    fn set_status_line2(&self, text: &str) {
        self.line2.borrow_mut().push(text.to_string());
    }
}

/// Formatted log output collected while a closure runs.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Run `f` with a thread-local `fmt` subscriber writing into this buffer.
    pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Lines containing `needle`.
    pub fn lines_with(&self, needle: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

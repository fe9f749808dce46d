// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The unit of work driven by the event loop.
//!
//! Every task goes through the same lifecycle:
//!
//! ```text
//! register -> pre_process (once) -> process (per event, per pass) -> post_process (once)
//! ```
//!
//! Implementors override the plain phase methods (`pre_process`, `process`,
//! `post_process`). The scheduler only ever calls the `call_*` wrappers, which
//! add the bookkeeping shared by all tasks: the preprocessed flag, execution
//! counters, timing and filter gating.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::consts::ALL_STREAMS;
use crate::engine::{ExecutionContext, ParameterRegistry, TaskStatistics};
use crate::errors::TaskError;
use crate::observability::messages::task::{
    FilterUnavailable, TaskPostProcessing, TaskPreProcessing, TaskReInitializing,
};
use crate::observability::messages::StructuredLog;
use crate::traits::FilterHandle;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique task identity.
///
/// Identity is what the scheduler uses for duplicate and cycle detection;
/// names are only labels and may repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        Self(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of a single `process` call.
///
/// `SkipRegistration` is only meaningful during pre-processing; a task that
/// returns it from `process` is treated as having failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnCode {
    Success,
    Stop,
    Error,
    ContinueEvent,
    SkipRegistration,
}

impl ReturnCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnCode::Success => "success",
            ReturnCode::Stop => "stop",
            ReturnCode::Error => "error",
            ReturnCode::ContinueEvent => "continue_event",
            ReturnCode::SkipRegistration => "skip_registration",
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful outcome of pre-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreProcessOutcome {
    /// The task is ready to process events.
    Ready,
    /// The task has nothing to do for this run and asks to be dropped from
    /// its list.
    SkipRegistration,
}

/// Performance hints applied to a task and, for composites, to every child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Accelerator(u8);

impl Accelerator {
    pub const STANDARD: Accelerator = Accelerator(0);
    /// Skip the per-event registry reset in the outermost list.
    pub const DONT_RESET: Accelerator = Accelerator(1);
    /// Skip timing of `process` calls.
    pub const DONT_TIME: Accelerator = Accelerator(1 << 1);

    pub fn contains(self, other: Accelerator) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_standard(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Accelerator {
    type Output = Accelerator;

    fn bitor(self, rhs: Accelerator) -> Accelerator {
        Accelerator(self.0 | rhs.0)
    }
}

impl BitOrAssign for Accelerator {
    fn bitor_assign(&mut self, rhs: Accelerator) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_standard() {
            return f.write_str("standard");
        }
        let mut flags = Vec::new();
        if self.contains(Accelerator::DONT_RESET) {
            flags.push("dont_reset");
        }
        if self.contains(Accelerator::DONT_TIME) {
            flags.push("dont_time");
        }
        f.write_str(&flags.join("|"))
    }
}

/// Object-safe access to `Any`, so callers can recover the concrete type
/// behind a `dyn Task`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// State shared by every task.
#[derive(Debug)]
pub struct TaskCore {
    id: TaskId,
    name: String,
    title: String,
    stream_id: String,
    accelerator: Accelerator,
    serial_number: u8,
    filter: Option<FilterHandle>,
    is_preprocessed: bool,
    num_executions: u64,
    num_executions_at_pre_process: u64,
    time_spent: Duration,
}

impl TaskCore {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: TaskId::next(),
            title: name.clone(),
            name,
            stream_id: ALL_STREAMS.to_string(),
            accelerator: Accelerator::STANDARD,
            serial_number: 0,
            filter: None,
            is_preprocessed: false,
            num_executions: 0,
            num_executions_at_pre_process: 0,
            time_spent: Duration::ZERO,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn set_stream_id(&mut self, stream_id: impl Into<String>) {
        self.stream_id = stream_id.into();
    }

    pub fn accelerator(&self) -> Accelerator {
        self.accelerator
    }

    pub fn set_accelerator(&mut self, accelerator: Accelerator) {
        self.accelerator = accelerator;
    }

    pub fn serial_number(&self) -> u8 {
        self.serial_number
    }

    pub fn set_serial_number(&mut self, serial_number: u8) {
        self.serial_number = serial_number;
    }

    pub fn filter(&self) -> Option<&FilterHandle> {
        self.filter.as_ref()
    }

    /// Attach a gating filter; `process` only runs while its condition holds.
    pub fn set_filter(&mut self, filter: Option<FilterHandle>) {
        self.filter = filter;
    }

    pub fn is_preprocessed(&self) -> bool {
        self.is_preprocessed
    }

    pub fn num_executions(&self) -> u64 {
        self.num_executions
    }

    /// Executions since the last successful pre-process.
    pub fn num_executions_since_pre_process(&self) -> u64 {
        self.num_executions - self.num_executions_at_pre_process
    }

    pub fn time_spent(&self) -> Duration {
        self.time_spent
    }

    /// Detach the gating filter if it is the task `id`.
    pub fn release_filter(&mut self, id: TaskId) {
        if self.filter.as_ref().map(FilterHandle::id) == Some(id) {
            self.filter = None;
        }
    }
}

/// `name [Kind]`, or just `Kind` when the task was not renamed. A non-zero
/// serial number is appended to the name as `;n`.
pub fn descriptor(kind: &str, core: &TaskCore) -> String {
    let name = if core.serial_number() == 0 {
        core.name().to_string()
    } else {
        format!("{};{}", core.name(), core.serial_number())
    };
    if core.name() == kind {
        name
    } else {
        format!("{} [{}]", name, kind)
    }
}

pub trait Task: AsAny {
    fn core(&self) -> &TaskCore;

    fn core_mut(&mut self) -> &mut TaskCore;

    /// Type label used in descriptors and statistics.
    fn kind(&self) -> &'static str;

    fn pre_process(
        &mut self,
        _registry: &mut ParameterRegistry,
        _ctx: &ExecutionContext,
    ) -> Result<PreProcessOutcome, TaskError> {
        Ok(PreProcessOutcome::Ready)
    }

    fn process(&mut self, _registry: &mut ParameterRegistry, _ctx: &ExecutionContext) -> ReturnCode {
        ReturnCode::Success
    }

    fn post_process(
        &mut self,
        _registry: &mut ParameterRegistry,
        _ctx: &ExecutionContext,
    ) -> Result<(), TaskError> {
        Ok(())
    }

    /// Called when the input changes mid-run (e.g. a new run header).
    fn re_init(
        &mut self,
        _registry: &mut ParameterRegistry,
        _ctx: &ExecutionContext,
    ) -> Result<(), TaskError> {
        Ok(())
    }

    /// Whether the task has per-event work. Lists only keep participating
    /// tasks in their active subset after pre-processing.
    fn participates_in_process(&self) -> bool {
        true
    }

    fn set_accelerator(&mut self, accelerator: Accelerator) {
        self.core_mut().set_accelerator(accelerator);
    }

    fn set_serial_number(&mut self, serial_number: u8) {
        self.core_mut().set_serial_number(serial_number);
    }

    /// Whether `id` is reachable through this task's children.
    fn contains_task(&self, _id: TaskId) -> bool {
        false
    }

    /// Drop every reference this task holds to the task `id`.
    fn release_references(&mut self, id: TaskId) {
        self.core_mut().release_filter(id);
    }

    fn statistics(&self) -> TaskStatistics {
        TaskStatistics::from_core(self.descriptor(), self.core(), self.participates_in_process())
    }

    fn id(&self) -> TaskId {
        self.core().id()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn stream_id(&self) -> &str {
        self.core().stream_id()
    }

    fn set_stream_id(&mut self, stream_id: &str) {
        self.core_mut().set_stream_id(stream_id);
    }

    fn descriptor(&self) -> String {
        descriptor(self.kind(), self.core())
    }

    fn call_pre_process(
        &mut self,
        registry: &mut ParameterRegistry,
        ctx: &ExecutionContext,
    ) -> Result<PreProcessOutcome, TaskError> {
        if self.core().is_preprocessed {
            return Ok(PreProcessOutcome::Ready);
        }

        let descriptor = self.descriptor();
        TaskPreProcessing {
            task: &descriptor,
            stream: self.stream_id(),
        }
        .log();
        ctx.set_status_line2(&descriptor);

        let core = self.core_mut();
        core.num_executions_at_pre_process = core.num_executions;
        core.time_spent = Duration::ZERO;

        let outcome = self.pre_process(registry, ctx)?;
        if outcome == PreProcessOutcome::Ready {
            self.core_mut().is_preprocessed = true;
        }
        Ok(outcome)
    }

    fn call_process(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> ReturnCode {
        if let Some(filter) = self.core().filter() {
            match filter.is_condition_true() {
                Some(true) => {}
                Some(false) => return ReturnCode::Success,
                None => {
                    FilterUnavailable {
                        task: &self.descriptor(),
                        filter: filter.id(),
                    }
                    .log();
                    return ReturnCode::Error;
                }
            }
        }

        let started = if self.core().accelerator().contains(Accelerator::DONT_TIME) {
            None
        } else {
            Some(Instant::now())
        };

        self.core_mut().num_executions += 1;
        let rc = self.process(registry, ctx);

        if let Some(started) = started {
            self.core_mut().time_spent += started.elapsed();
        }
        rc
    }

    fn call_post_process(
        &mut self,
        registry: &mut ParameterRegistry,
        ctx: &ExecutionContext,
    ) -> Result<(), TaskError> {
        if !self.core().is_preprocessed {
            return Ok(());
        }
        self.core_mut().is_preprocessed = false;

        let descriptor = self.descriptor();
        TaskPostProcessing {
            task: &descriptor,
            executions: self.core().num_executions_since_pre_process(),
        }
        .log();
        ctx.set_status_line2(&descriptor);

        self.post_process(registry, ctx)
    }

    fn call_re_init(
        &mut self,
        registry: &mut ParameterRegistry,
        ctx: &ExecutionContext,
    ) -> Result<(), TaskError> {
        TaskReInitializing {
            task: &self.descriptor(),
        }
        .log();
        self.re_init(registry, ctx)
    }
}

/// Shared, identity-carrying reference to a task.
///
/// The id is cached outside the cell so identity checks never need a borrow.
#[derive(Clone)]
pub struct TaskHandle {
    id: TaskId,
    cell: Rc<RefCell<dyn Task>>,
}

impl TaskHandle {
    pub fn new<T: Task + 'static>(task: T) -> Self {
        Self::from_rc(Rc::new(RefCell::new(task)))
    }

    pub fn from_rc<T: Task + 'static>(rc: Rc<RefCell<T>>) -> Self {
        let id = rc.borrow().id();
        Self { id, cell: rc }
    }

    pub(crate) fn from_parts(id: TaskId, cell: Rc<RefCell<dyn Task>>) -> Self {
        Self { id, cell }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Panics if the task is mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, dyn Task> {
        self.cell.borrow()
    }

    /// Panics if the task is already borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, dyn Task> {
        self.cell.borrow_mut()
    }

    pub fn try_borrow(&self) -> Option<Ref<'_, dyn Task>> {
        self.cell.try_borrow().ok()
    }

    pub fn try_borrow_mut(&self) -> Option<RefMut<'_, dyn Task>> {
        self.cell.try_borrow_mut().ok()
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_borrow() {
            Some(task) => write!(f, "TaskHandle({} {})", self.id, task.descriptor()),
            None => write!(f, "TaskHandle({} <busy>)", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::ScriptedTask;

    #[test]
    fn test_descriptor_formats() {
        let test_cases = vec![
            ("Counter", 0, "Counter"),
            ("Selected", 0, "Selected [Counter]"),
            ("Selected", 2, "Selected;2 [Counter]"),
        ];

        for (name, serial, expected) in test_cases {
            let mut core = TaskCore::new(name);
            core.set_serial_number(serial);
            assert_eq!(descriptor("Counter", &core), expected);
        }
    }

    #[test]
    fn test_task_ids_are_unique() {
        let a = TaskCore::new("same");
        let b = TaskCore::new("same");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_accelerator_flags() {
        let acc = Accelerator::DONT_RESET | Accelerator::DONT_TIME;
        assert!(acc.contains(Accelerator::DONT_RESET));
        assert!(acc.contains(Accelerator::DONT_TIME));
        assert!(!Accelerator::DONT_RESET.contains(Accelerator::DONT_TIME));
        assert!(Accelerator::default().is_standard());
        assert_eq!(acc.to_string(), "dont_reset|dont_time");
        assert_eq!(Accelerator::STANDARD.to_string(), "standard");
    }

    #[test]
    fn test_call_pre_process_is_idempotent() {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        let mut task = ScriptedTask::new("once");

        assert_eq!(
            task.call_pre_process(&mut registry, &ctx).unwrap(),
            PreProcessOutcome::Ready
        );
        assert_eq!(
            task.call_pre_process(&mut registry, &ctx).unwrap(),
            PreProcessOutcome::Ready
        );
        assert_eq!(task.calls().pre_process, 1);
    }

    #[test]
    fn test_call_post_process_requires_pre_process() {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        let mut task = ScriptedTask::new("never_prepared");

        task.call_post_process(&mut registry, &ctx).unwrap();
        assert_eq!(task.calls().post_process, 0);

        task.call_pre_process(&mut registry, &ctx).unwrap();
        task.call_post_process(&mut registry, &ctx).unwrap();
        task.call_post_process(&mut registry, &ctx).unwrap();
        assert_eq!(task.calls().post_process, 1);
        assert!(!task.core().is_preprocessed());
    }

    #[test]
    fn test_skip_registration_does_not_mark_preprocessed() {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        let mut task = ScriptedTask::new("skipper").skip_registration();

        assert_eq!(
            task.call_pre_process(&mut registry, &ctx).unwrap(),
            PreProcessOutcome::SkipRegistration
        );
        assert!(!task.core().is_preprocessed());
    }

    #[test]
    fn test_call_process_counts_executions() {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        let mut task = ScriptedTask::new("counted");
        task.call_pre_process(&mut registry, &ctx).unwrap();

        for _ in 0..3 {
            assert_eq!(task.call_process(&mut registry, &ctx), ReturnCode::Success);
        }
        assert_eq!(task.core().num_executions(), 3);
        assert_eq!(task.core().num_executions_since_pre_process(), 3);
    }

    #[test]
    fn test_false_filter_gates_process_without_counting() {
        use crate::backends::stub::FixedFilter;

        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        let filter = FilterHandle::new(FixedFilter::new("never", false));
        let mut task = ScriptedTask::new("gated");
        task.core_mut().set_filter(Some(filter.clone()));

        assert_eq!(task.call_process(&mut registry, &ctx), ReturnCode::Success);
        assert_eq!(task.calls().process, 0);
        assert_eq!(task.core().num_executions(), 0);

        filter.borrow_mut().set_inverted(true);
        assert_eq!(task.call_process(&mut registry, &ctx), ReturnCode::Success);
        assert_eq!(task.calls().process, 1);
    }

    #[test]
    fn test_release_references_detaches_filter() {
        use crate::backends::stub::FixedFilter;

        let filter = FilterHandle::new(FixedFilter::new("gate", true));
        let mut task = ScriptedTask::new("gated");
        task.core_mut().set_filter(Some(filter.clone()));

        task.release_references(TaskCore::new("other").id());
        assert!(task.core().filter().is_some());

        task.release_references(filter.id());
        assert!(task.core().filter().is_none());
    }
}

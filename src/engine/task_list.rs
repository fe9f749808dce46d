// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The scheduler.
//!
//! A [`TaskList`] is itself a [`Task`], so lists nest. It runs its children in
//! insertion order through every lifecycle phase:
//!
//! * **pre-process** every task; a task asking to skip registration is
//!   removed, the first failure aborts the list
//! * **process** only the active subset (tasks that participate in
//!   processing), once per pass, honoring stream tags and the control codes
//!   `Stop`, `Error` and `ContinueEvent`
//! * **post-process** every task; the first failure aborts the list
//!
//! The outermost list also owns the per-event registry reset, coordinated
//! through the registry's reentrancy guards.

use std::fmt;

use crate::config::consts::ALL_STREAMS;
use crate::engine::{ExecutionContext, ParameterRegistry, RegistryGuard, TaskEntry, TaskStatistics};
use crate::errors::{TaskError, TaskListError};
use crate::observability::messages::task_list::{
    AnchorNotFound, CycleRejected, DuplicateTaskName, NoTasksForProcessing, PostProcessFailed,
    PreProcessFailed, ProcessFailed, ProcessStopped, ReInitFailed, SelfInsertionRejected,
    TaskAdded, TaskAlreadyInList, TaskBusy, TaskListPhase, TaskRemovedFromList, TaskReplaced,
    UnexpectedReturnCode,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{descriptor, Accelerator, PreProcessOutcome, ReturnCode, Task, TaskCore, TaskId};

pub const TASK_LIST_KIND: &str = "TaskList";

#[derive(Debug, Clone, Copy)]
enum Position {
    End,
    Before(TaskId),
    After(TaskId),
    /// After the anchor, which is about to be removed under the same name.
    Replacing(TaskId),
}

pub struct TaskList {
    core: TaskCore,
    tasks: Vec<TaskEntry>,
    /// Indices into `tasks`, rebuilt after every pre-process.
    active: Vec<usize>,
    num_passes: u32,
    num_pass: u32,
}

impl TaskList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: TaskCore::new(name),
            tasks: Vec::new(),
            active: Vec::new(),
            num_passes: 0,
            num_pass: 0,
        }
    }

    pub fn with_title(name: impl Into<String>, title: impl Into<String>) -> Self {
        let mut list = Self::new(name);
        list.core.set_title(title);
        list
    }

    /// Number of times the list is run per event. Zero means a single
    /// implicit pass that lets `ContinueEvent` propagate to the parent.
    pub fn set_num_passes(&mut self, num_passes: u32) {
        self.num_passes = num_passes;
    }

    pub fn num_passes(&self) -> u32 {
        self.num_passes
    }

    /// Index of the pass currently (or last) run.
    pub fn num_pass(&self) -> u32 {
        self.num_pass
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &TaskEntry> {
        self.tasks.iter()
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(TaskEntry::id).collect()
    }

    pub fn active_task_ids(&self) -> Vec<TaskId> {
        self.active.iter().map(|&index| self.tasks[index].id()).collect()
    }

    /// Append a task. An explicit `stream` overrides the task's own tag.
    pub fn add_to_list(&mut self, entry: impl Into<TaskEntry>, stream: Option<&str>) -> Result<(), TaskListError> {
        self.insert_entry(entry.into(), stream, Position::End)
    }

    pub fn add_to_list_before(
        &mut self,
        entry: impl Into<TaskEntry>,
        anchor: TaskId,
        stream: Option<&str>,
    ) -> Result<(), TaskListError> {
        self.insert_entry(entry.into(), stream, Position::Before(anchor))
    }

    pub fn add_to_list_after(
        &mut self,
        entry: impl Into<TaskEntry>,
        anchor: TaskId,
        stream: Option<&str>,
    ) -> Result<(), TaskListError> {
        self.insert_entry(entry.into(), stream, Position::After(anchor))
    }

    /// Append several tasks, stopping at the first rejection.
    pub fn add_all_to_list<I>(&mut self, entries: I, stream: Option<&str>) -> Result<(), TaskListError>
    where
        I: IntoIterator,
        I::Item: Into<TaskEntry>,
    {
        for entry in entries {
            self.add_to_list(entry, stream)?;
        }
        Ok(())
    }

    /// Insert several tasks before `anchor`, keeping their relative order.
    pub fn add_all_before<I>(&mut self, entries: I, anchor: TaskId, stream: Option<&str>) -> Result<(), TaskListError>
    where
        I: IntoIterator,
        I::Item: Into<TaskEntry>,
    {
        for entry in entries {
            self.add_to_list_before(entry, anchor, stream)?;
        }
        Ok(())
    }

    /// Insert several tasks after `anchor`, keeping their relative order.
    pub fn add_all_after<I>(&mut self, entries: I, anchor: TaskId, stream: Option<&str>) -> Result<(), TaskListError>
    where
        I: IntoIterator,
        I::Item: Into<TaskEntry>,
    {
        let mut anchor = anchor;
        for entry in entries {
            let entry = entry.into();
            let id = entry.id();
            self.add_to_list_after(entry, anchor, stream)?;
            anchor = id;
        }
        Ok(())
    }

    /// First task with the given name, searching this list only.
    pub fn find_task(&self, name: &str) -> Option<&TaskEntry> {
        self.tasks
            .iter()
            .find(|entry| entry.name().as_deref() == Some(name))
    }

    pub fn find_task_by_id(&self, id: TaskId) -> Option<&TaskEntry> {
        self.tasks.iter().find(|entry| entry.id() == id)
    }

    /// Id of the list that directly holds a task called `name`, searching
    /// nested lists depth first.
    pub fn find_task_list(&self, name: &str) -> Option<TaskId> {
        if self.find_task(name).is_some() {
            return Some(self.core.id());
        }
        self.tasks.iter().find_map(|entry| {
            entry
                .with_task(|task| {
                    task.as_any()
                        .downcast_ref::<TaskList>()
                        .and_then(|list| list.find_task_list(name))
                })
                .flatten()
        })
    }

    /// Whether `id` is reachable from this list, directly or nested.
    pub fn contains(&self, id: TaskId) -> bool {
        self.contains_task(id)
    }

    pub fn remove_from_list(&mut self, id: TaskId) -> Option<TaskEntry> {
        let index = self.position_of(id)?;
        Some(self.remove_at(index))
    }

    /// Swap the task of the same name for `entry`, keeping the old stream tag
    /// and position. Adds `entry` when no task has its name.
    ///
    /// Returns the displaced entry.
    pub fn replace(&mut self, entry: impl Into<TaskEntry>) -> Result<Option<TaskEntry>, TaskListError> {
        let entry = entry.into();
        let id = entry.id();
        let name = entry.name().ok_or(TaskListError::TaskBusy { id })?;

        let Some(old_id) = self.find_task(&name).map(TaskEntry::id) else {
            self.add_to_list(entry, None)?;
            return Ok(None);
        };
        if old_id == id {
            return Ok(None);
        }

        let old = self
            .find_task_by_id(old_id)
            .and_then(|old| old.with_task(|task| task.stream_id().to_string()));
        let stream = old.ok_or(TaskListError::TaskBusy { id: old_id })?;

        self.insert_entry(entry, Some(&stream), Position::Replacing(old_id))?;
        let displaced = self.remove_from_list(old_id);

        TaskReplaced {
            task: &name,
            list: &self.descriptor(),
        }
        .log();
        Ok(displaced)
    }

    pub fn print_statistics(&self) {
        self.statistics().log();
    }

    fn position_of(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|entry| entry.id() == id)
    }

    fn insert_entry(&mut self, mut entry: TaskEntry, stream: Option<&str>, position: Position) -> Result<(), TaskListError> {
        let id = entry.id();
        let list = self.descriptor();

        if id == self.core.id() {
            SelfInsertionRejected { list: &list }.log();
            return Err(TaskListError::SelfInsertion { list });
        }

        if self.position_of(id).is_some() {
            TaskAlreadyInList {
                task: &entry.descriptor(),
                list: &list,
            }
            .log();
            return Ok(());
        }

        let Some(name) = entry.name() else {
            TaskBusy { task: id, list: &list }.log();
            return Err(TaskListError::TaskBusy { id });
        };

        // A busy entry is currently running, possibly as one of our ancestors.
        let creates_cycle = entry
            .with_task(|task| task.contains_task(self.core.id()))
            .unwrap_or(true);
        if creates_cycle {
            CycleRejected {
                task: &name,
                list: &list,
            }
            .log();
            return Err(TaskListError::Cycle { list, task: name });
        }

        let index = match position {
            Position::End => self.tasks.len(),
            Position::Before(anchor) | Position::After(anchor) | Position::Replacing(anchor) => {
                let Some(anchor_index) = self.position_of(anchor) else {
                    AnchorNotFound {
                        anchor,
                        task: &name,
                        list: &list,
                    }
                    .log();
                    return Err(TaskListError::AnchorNotFound { list, anchor });
                };
                match position {
                    Position::After(_) | Position::Replacing(_) => anchor_index + 1,
                    _ => anchor_index,
                }
            }
        };

        let replacing = matches!(position, Position::Replacing(_));
        if !replacing && self.find_task(&name).is_some() {
            DuplicateTaskName {
                task: &name,
                list: &list,
            }
            .log();
        }

        if let Some(stream) = stream {
            entry.with_task_mut(|task| task.set_stream_id(stream));
        }

        let descriptor = entry.descriptor();
        let stream = entry
            .with_task(|task| task.stream_id().to_string())
            .unwrap_or_else(|| ALL_STREAMS.to_string());

        self.tasks.insert(index, entry);
        for active in self.active.iter_mut() {
            if *active >= index {
                *active += 1;
            }
        }

        TaskAdded {
            task: &descriptor,
            list: &list,
            stream: &stream,
        }
        .log();
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> TaskEntry {
        let entry = self.tasks.remove(index);
        self.active.retain(|&active| active != index);
        for active in self.active.iter_mut() {
            if *active > index {
                *active -= 1;
            }
        }
        entry
    }

    fn rebuild_active(&mut self) {
        self.active = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.with_task(|task| task.participates_in_process()).unwrap_or(true))
            .map(|(index, _)| index)
            .collect();
    }

    fn pre_process_tasks(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> Result<(), TaskError> {
        let mut index = 0;
        while index < self.tasks.len() {
            let entry = &mut self.tasks[index];
            let id = entry.id();
            let outcome = entry
                .with_task_mut(|task| task.call_pre_process(registry, ctx))
                .unwrap_or(Err(TaskError::Busy { id }));

            match outcome {
                Ok(PreProcessOutcome::Ready) => index += 1,
                Ok(PreProcessOutcome::SkipRegistration) => {
                    let removed = self.remove_at(index);
                    TaskRemovedFromList {
                        task: &removed.descriptor(),
                        list: &self.descriptor(),
                    }
                    .log();
                    self.release_references(id);
                }
                Err(error) => {
                    PreProcessFailed {
                        task: &self.tasks[index].descriptor(),
                        id,
                        stream: &self.tasks[index].stream_id(),
                        list: &self.descriptor(),
                        error: &error,
                    }
                    .log();
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// One pass over the active subset.
    fn process_task_list(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> ReturnCode {
        let Self { core, tasks, active, .. } = self;

        for &index in active.iter() {
            let entry = &mut tasks[index];
            let outcome = entry.with_task_mut(|task| {
                let tag = task.stream_id();
                if tag != ctx.stream() && tag != ALL_STREAMS {
                    return None;
                }
                Some(task.call_process(registry, ctx))
            });

            let rc = match outcome {
                Some(Some(rc)) => rc,
                Some(None) => continue,
                None => {
                    TaskBusy {
                        task: entry.id(),
                        list: &descriptor(TASK_LIST_KIND, core),
                    }
                    .log();
                    return ReturnCode::Error;
                }
            };

            match rc {
                ReturnCode::Success => {}
                ReturnCode::ContinueEvent => return ReturnCode::ContinueEvent,
                ReturnCode::Stop => {
                    ProcessStopped {
                        task: &entry.descriptor(),
                        id: entry.id(),
                        stream: &entry.stream_id(),
                        list: &descriptor(TASK_LIST_KIND, core),
                    }
                    .log();
                    return ReturnCode::Stop;
                }
                ReturnCode::Error => {
                    ProcessFailed {
                        task: &entry.descriptor(),
                        id: entry.id(),
                        stream: &entry.stream_id(),
                        list: &descriptor(TASK_LIST_KIND, core),
                        event_stream: ctx.stream(),
                    }
                    .log();
                    return ReturnCode::Error;
                }
                ReturnCode::SkipRegistration => {
                    UnexpectedReturnCode {
                        task: &entry.descriptor(),
                        id: entry.id(),
                        stream: &entry.stream_id(),
                        list: &descriptor(TASK_LIST_KIND, core),
                        code: rc,
                    }
                    .log();
                    return ReturnCode::Error;
                }
            }
        }
        ReturnCode::Success
    }

    fn post_process_tasks(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> Result<(), TaskError> {
        for index in 0..self.tasks.len() {
            let entry = &mut self.tasks[index];
            let id = entry.id();
            let result = entry
                .with_task_mut(|task| task.call_post_process(registry, ctx))
                .unwrap_or(Err(TaskError::Busy { id }));

            if let Err(error) = result {
                PostProcessFailed {
                    task: &self.tasks[index].descriptor(),
                    id,
                    stream: &self.tasks[index].stream_id(),
                    list: &self.descriptor(),
                    error: &error,
                }
                .log();
                return Err(error);
            }
        }
        Ok(())
    }

    fn re_init_tasks(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> Result<(), TaskError> {
        for index in 0..self.tasks.len() {
            let entry = &mut self.tasks[index];
            let id = entry.id();
            let result = entry
                .with_task_mut(|task| task.call_re_init(registry, ctx))
                .unwrap_or(Err(TaskError::Busy { id }));

            if let Err(error) = result {
                ReInitFailed {
                    task: &self.tasks[index].descriptor(),
                    id,
                    stream: &self.tasks[index].stream_id(),
                    list: &self.descriptor(),
                    error: &error,
                }
                .log();
                return Err(error);
            }
        }
        Ok(())
    }

    /// Context for this list's children: the list's own stream tag wins
    /// unless it is the wildcard.
    fn child_context(&self, ctx: &ExecutionContext) -> ExecutionContext {
        let own = self.core.stream_id();
        if own == ALL_STREAMS || own == ctx.stream() {
            ctx.clone()
        } else {
            ctx.clone().with_stream(own)
        }
    }
}

impl fmt::Debug for TaskList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskList")
            .field("name", &self.core.name())
            .field("num_passes", &self.num_passes)
            .field("tasks", &self.tasks)
            .finish()
    }
}

impl Task for TaskList {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        TASK_LIST_KIND
    }

    fn pre_process(
        &mut self,
        registry: &mut ParameterRegistry,
        ctx: &ExecutionContext,
    ) -> Result<PreProcessOutcome, TaskError> {
        let _entered = ctx.span().enter();
        TaskListPhase {
            list: &self.descriptor(),
            phase: "pre_process",
            tasks: self.tasks.len(),
        }
        .log();
        ctx.set_status_line1("PreProcessing...");

        let acquired = registry.try_acquire(RegistryGuard::DoNotReset);
        let child_ctx = self.child_context(ctx);
        let result = self.pre_process_tasks(registry, &child_ctx);
        if acquired {
            registry.set_ready_to_save(false);
            registry.release(RegistryGuard::DoNotReset);
        }
        result?;

        self.rebuild_active();
        Ok(PreProcessOutcome::Ready)
    }

    fn process(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> ReturnCode {
        if self.active.is_empty() {
            NoTasksForProcessing {
                list: &self.descriptor(),
            }
            .log();
            return ReturnCode::Stop;
        }

        let acquired = registry.try_acquire(RegistryGuard::IsProcessing);
        if acquired && !self.core.accelerator().contains(Accelerator::DONT_RESET) {
            registry.reset();
        }

        let child_ctx = self.child_context(ctx);
        let mut rc = ReturnCode::Success;
        for pass in 0..self.num_passes.max(1) {
            self.num_pass = pass;
            let pass_ctx = child_ctx.clone().with_pass(pass);
            rc = self.process_task_list(registry, &pass_ctx);
            if matches!(rc, ReturnCode::Stop | ReturnCode::Error) {
                break;
            }
        }

        if acquired {
            registry.set_ready_to_save(false);
            registry.release(RegistryGuard::IsProcessing);
        }

        match rc {
            ReturnCode::ContinueEvent if self.num_passes == 0 => ReturnCode::ContinueEvent,
            ReturnCode::ContinueEvent => ReturnCode::Success,
            other => other,
        }
    }

    fn post_process(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> Result<(), TaskError> {
        let _entered = ctx.span().enter();
        TaskListPhase {
            list: &self.descriptor(),
            phase: "post_process",
            tasks: self.tasks.len(),
        }
        .log();
        ctx.set_status_line1("PostProcessing...");

        let acquired = registry.try_acquire(RegistryGuard::DoNotReset);
        if acquired {
            registry.reset();
        }
        let child_ctx = self.child_context(ctx);
        let result = self.post_process_tasks(registry, &child_ctx);
        if acquired {
            registry.set_ready_to_save(false);
            registry.release(RegistryGuard::DoNotReset);
        }
        result
    }

    fn re_init(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> Result<(), TaskError> {
        let acquired = registry.try_acquire(RegistryGuard::DoNotReset);
        let child_ctx = self.child_context(ctx);
        let result = self.re_init_tasks(registry, &child_ctx);
        if acquired {
            registry.release(RegistryGuard::DoNotReset);
        }
        result
    }

    fn set_accelerator(&mut self, accelerator: Accelerator) {
        for entry in self.tasks.iter_mut() {
            entry.with_task_mut(|task| task.set_accelerator(accelerator));
        }
        self.core.set_accelerator(accelerator);
    }

    fn set_serial_number(&mut self, serial_number: u8) {
        for entry in self.tasks.iter_mut() {
            entry.with_task_mut(|task| task.set_serial_number(serial_number));
        }
        self.core.set_serial_number(serial_number);
    }

    fn contains_task(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|entry| {
            entry.id() == id || entry.with_task(|task| task.contains_task(id)).unwrap_or(true)
        })
    }

    fn release_references(&mut self, id: TaskId) {
        for entry in self.tasks.iter_mut() {
            entry.with_task_mut(|task| task.release_references(id));
        }
        if self.core.filter().map(|filter| filter.id()) == Some(id) {
            self.core.set_filter(None);
        }
    }

    fn statistics(&self) -> TaskStatistics {
        let children = self
            .tasks
            .iter()
            .filter_map(|entry| entry.with_task(|task| task.statistics()))
            .collect();
        TaskStatistics::from_core(self.descriptor(), &self.core, true).with_children(children)
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Boolean composition of filters.
//!
//! The bitwise operators (`&`, `|`, `^`) evaluate every member; the logical
//! ones (`&&`, `||`) stop at the first member that decides the result. Filters
//! with side effects in their evaluation observe the difference.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::engine::{ExecutionContext, ParameterRegistry, TaskStatistics};
use crate::errors::{TaskError, TaskListError, UnknownFilterOperator};
use crate::observability::messages::filter::{
    FilterAdded, FilterAlreadyInList, FilterBusy, FilterPhaseFailed, FilterRemovedFromList,
};
use crate::observability::messages::task_list::DuplicateTaskName;
use crate::observability::messages::StructuredLog;
use crate::traits::{
    Accelerator, Filter, FilterHandle, PreProcessOutcome, ReturnCode, Task, TaskCore, TaskId,
};

pub const FILTER_LIST_KIND: &str = "FilterList";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum FilterOperator {
    BitAnd,
    BitOr,
    BitXor,
    #[default]
    LogicalAnd,
    LogicalOr,
}

impl FilterOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOperator::BitAnd => "&",
            FilterOperator::BitOr => "|",
            FilterOperator::BitXor => "^",
            FilterOperator::LogicalAnd => "&&",
            FilterOperator::LogicalOr => "||",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for FilterOperator {
    type Err = UnknownFilterOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "and" | "&" => Ok(FilterOperator::BitAnd),
            "or" | "|" => Ok(FilterOperator::BitOr),
            "xor" | "^" => Ok(FilterOperator::BitXor),
            "land" | "&&" => Ok(FilterOperator::LogicalAnd),
            "lor" | "||" => Ok(FilterOperator::LogicalOr),
            _ => Err(UnknownFilterOperator(s.to_string())),
        }
    }
}

impl TryFrom<String> for FilterOperator {
    type Error = UnknownFilterOperator;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A member of a filter list, owned or shared like task list entries.
pub enum FilterEntry {
    Owned(Box<dyn Filter>),
    Shared(FilterHandle),
}

impl FilterEntry {
    pub fn owned<F: Filter + 'static>(filter: F) -> Self {
        FilterEntry::Owned(Box::new(filter))
    }

    pub fn id(&self) -> TaskId {
        match self {
            FilterEntry::Owned(filter) => filter.id(),
            FilterEntry::Shared(handle) => handle.id(),
        }
    }

    pub fn with_filter<R>(&self, f: impl FnOnce(&dyn Filter) -> R) -> Option<R> {
        match self {
            FilterEntry::Owned(filter) => Some(f(&**filter)),
            FilterEntry::Shared(handle) => handle.try_borrow().map(|filter| f(&*filter)),
        }
    }

    pub fn with_filter_mut<R>(&mut self, f: impl FnOnce(&mut dyn Filter) -> R) -> Option<R> {
        match self {
            FilterEntry::Owned(filter) => Some(f(&mut **filter)),
            FilterEntry::Shared(handle) => handle.try_borrow_mut().map(|mut filter| f(&mut *filter)),
        }
    }

    pub fn name(&self) -> Option<String> {
        self.with_filter(|filter| filter.name().to_string())
    }

    pub fn descriptor(&self) -> String {
        self.with_filter(|filter| filter.descriptor())
            .unwrap_or_else(|| format!("filter {}", self.id()))
    }

    /// A member that cannot be borrowed counts as false.
    fn condition(&self, list: &TaskCore) -> bool {
        match self.with_filter(|filter| filter.is_condition_true()) {
            Some(condition) => condition,
            None => {
                FilterBusy {
                    filter: self.id(),
                    list: list.name(),
                }
                .log();
                false
            }
        }
    }
}

impl From<FilterHandle> for FilterEntry {
    fn from(handle: FilterHandle) -> Self {
        FilterEntry::Shared(handle)
    }
}

impl From<&FilterHandle> for FilterEntry {
    fn from(handle: &FilterHandle) -> Self {
        FilterEntry::Shared(handle.clone())
    }
}

impl From<Box<dyn Filter>> for FilterEntry {
    fn from(filter: Box<dyn Filter>) -> Self {
        FilterEntry::Owned(filter)
    }
}

pub struct FilterList {
    core: TaskCore,
    operator: FilterOperator,
    filters: Vec<FilterEntry>,
    inverted: bool,
}

impl FilterList {
    pub fn new(name: impl Into<String>, operator: FilterOperator) -> Self {
        Self {
            core: TaskCore::new(name),
            operator,
            filters: Vec::new(),
            inverted: false,
        }
    }

    /// Build a list from an operator spelling such as `"&&"` or `"xor"`.
    pub fn with_operator_str(name: impl Into<String>, operator: &str) -> Result<Self, UnknownFilterOperator> {
        Ok(Self::new(name, operator.parse()?))
    }

    /// Logical NOT of a single filter.
    pub fn negation(filter: impl Into<FilterEntry>) -> Self {
        let filter = filter.into();
        let name = format!("Not{}", filter.name().unwrap_or_default());
        let mut list = Self::new(name, FilterOperator::LogicalAnd);
        list.filters.push(filter);
        list.inverted = true;
        list
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn set_operator(&mut self, operator: FilterOperator) {
        self.operator = operator;
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn filter_ids(&self) -> Vec<TaskId> {
        self.filters.iter().map(FilterEntry::id).collect()
    }

    pub fn add_filter(&mut self, filter: impl Into<FilterEntry>) -> Result<(), TaskListError> {
        let filter = filter.into();
        let id = filter.id();
        let list = self.descriptor();

        if id == self.core.id() {
            return Err(TaskListError::SelfInsertion { list });
        }
        if self.filters.iter().any(|entry| entry.id() == id) {
            FilterAlreadyInList {
                filter: &filter.descriptor(),
                list: &list,
            }
            .log();
            return Ok(());
        }

        let Some(name) = filter.name() else {
            return Err(TaskListError::TaskBusy { id });
        };
        let creates_cycle = filter
            .with_filter(|member| member.contains_task(self.core.id()))
            .unwrap_or(true);
        if creates_cycle {
            return Err(TaskListError::Cycle { list, task: name });
        }
        if self.filters.iter().any(|entry| entry.name().as_deref() == Some(&name)) {
            DuplicateTaskName {
                task: &name,
                list: &list,
            }
            .log();
        }

        FilterAdded {
            filter: &filter.descriptor(),
            list: &list,
            operator: self.operator.symbol(),
        }
        .log();
        self.filters.push(filter);
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> FilterEntry {
        self.filters.remove(index)
    }
}

impl Filter for FilterList {
    fn is_expression_true(&self) -> bool {
        let mut members = self.filters.iter();
        let Some(first) = members.next() else {
            return true;
        };

        let mut rc = first.condition(&self.core);
        for member in members {
            match self.operator {
                FilterOperator::BitAnd => rc &= member.condition(&self.core),
                FilterOperator::BitOr => rc |= member.condition(&self.core),
                FilterOperator::BitXor => rc ^= member.condition(&self.core),
                FilterOperator::LogicalAnd => rc = rc && member.condition(&self.core),
                FilterOperator::LogicalOr => rc = rc || member.condition(&self.core),
            }
        }
        rc
    }

    fn is_inverted(&self) -> bool {
        self.inverted
    }

    fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    fn rule(&self) -> String {
        let members: Vec<String> = self
            .filters
            .iter()
            .map(|entry| {
                entry
                    .with_filter(|filter| filter.rule())
                    .unwrap_or_else(|| entry.id().to_string())
            })
            .collect();
        let separator = format!(" {} ", self.operator.symbol());
        let body = format!("({})", members.join(&separator));
        if self.inverted {
            format!("!{}", body)
        } else {
            body
        }
    }
}

impl Task for FilterList {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        FILTER_LIST_KIND
    }

    fn pre_process(
        &mut self,
        registry: &mut ParameterRegistry,
        ctx: &ExecutionContext,
    ) -> Result<PreProcessOutcome, TaskError> {
        let accelerator = self.core.accelerator();
        let mut index = 0;
        while index < self.filters.len() {
            let entry = &mut self.filters[index];
            let id = entry.id();
            let outcome = entry
                .with_filter_mut(|filter| {
                    filter.set_accelerator(accelerator);
                    filter.call_pre_process(registry, ctx)
                })
                .unwrap_or(Err(TaskError::Busy { id }));

            match outcome {
                Ok(PreProcessOutcome::Ready) => index += 1,
                Ok(PreProcessOutcome::SkipRegistration) => {
                    let removed = self.remove_at(index);
                    FilterRemovedFromList {
                        filter: &removed.descriptor(),
                        list: self.core.name(),
                    }
                    .log();
                }
                Err(error) => {
                    FilterPhaseFailed {
                        filter: &self.filters[index].descriptor(),
                        list: self.core.name(),
                        phase: "pre_process",
                        error: &error,
                    }
                    .log();
                    return Err(error);
                }
            }
        }
        Ok(PreProcessOutcome::Ready)
    }

    fn process(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> ReturnCode {
        for entry in self.filters.iter_mut() {
            let rc = entry
                .with_filter_mut(|filter| filter.call_process(registry, ctx))
                .unwrap_or(ReturnCode::Error);
            if rc != ReturnCode::Success {
                return rc;
            }
        }
        ReturnCode::Success
    }

    fn post_process(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> Result<(), TaskError> {
        for index in 0..self.filters.len() {
            let entry = &mut self.filters[index];
            let id = entry.id();
            let result = entry
                .with_filter_mut(|filter| filter.call_post_process(registry, ctx))
                .unwrap_or(Err(TaskError::Busy { id }));
            if let Err(error) = result {
                FilterPhaseFailed {
                    filter: &self.filters[index].descriptor(),
                    list: self.core.name(),
                    phase: "post_process",
                    error: &error,
                }
                .log();
                return Err(error);
            }
        }
        Ok(())
    }

    fn re_init(&mut self, registry: &mut ParameterRegistry, ctx: &ExecutionContext) -> Result<(), TaskError> {
        for entry in self.filters.iter_mut() {
            let id = entry.id();
            entry
                .with_filter_mut(|filter| filter.call_re_init(registry, ctx))
                .unwrap_or(Err(TaskError::Busy { id }))?;
        }
        Ok(())
    }

    fn set_accelerator(&mut self, accelerator: Accelerator) {
        for entry in self.filters.iter_mut() {
            entry.with_filter_mut(|filter| filter.set_accelerator(accelerator));
        }
        self.core.set_accelerator(accelerator);
    }

    fn set_serial_number(&mut self, serial_number: u8) {
        for entry in self.filters.iter_mut() {
            entry.with_filter_mut(|filter| filter.set_serial_number(serial_number));
        }
        self.core.set_serial_number(serial_number);
    }

    fn contains_task(&self, id: TaskId) -> bool {
        self.filters.iter().any(|entry| {
            entry.id() == id || entry.with_filter(|filter| filter.contains_task(id)).unwrap_or(true)
        })
    }

    fn release_references(&mut self, id: TaskId) {
        self.filters.retain(|entry| entry.id() != id);
        for entry in self.filters.iter_mut() {
            entry.with_filter_mut(|filter| filter.release_references(id));
        }
        if self.core.filter().map(FilterHandle::id) == Some(id) {
            self.core.set_filter(None);
        }
    }

    fn statistics(&self) -> TaskStatistics {
        let children = self
            .filters
            .iter()
            .filter_map(|entry| entry.with_filter(|filter| filter.statistics()))
            .collect();
        TaskStatistics::from_core(self.descriptor(), &self.core, true).with_children(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::FixedFilter;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn shared(name: &str, value: bool) -> (Rc<RefCell<FixedFilter>>, FilterHandle) {
        let rc = Rc::new(RefCell::new(FixedFilter::new(name, value)));
        let handle = FilterHandle::from_rc(rc.clone());
        (rc, handle)
    }

    fn list_of(operator: FilterOperator, values: &[bool]) -> FilterList {
        let mut list = FilterList::new("List", operator);
        for (index, value) in values.iter().enumerate() {
            list.add_filter(FilterEntry::owned(FixedFilter::new(format!("F{index}"), *value)))
                .unwrap();
        }
        list
    }

    #[test]
    fn test_operator_parsing() {
        let test_cases = vec![
            ("&", FilterOperator::BitAnd),
            ("AND", FilterOperator::BitAnd),
            ("|", FilterOperator::BitOr),
            ("or", FilterOperator::BitOr),
            ("^", FilterOperator::BitXor),
            ("Xor", FilterOperator::BitXor),
            ("&&", FilterOperator::LogicalAnd),
            ("land", FilterOperator::LogicalAnd),
            ("||", FilterOperator::LogicalOr),
            ("LOR", FilterOperator::LogicalOr),
        ];

        for (input, expected) in test_cases {
            assert_eq!(input.parse::<FilterOperator>().unwrap(), expected, "input {input}");
        }
        assert!("nand".parse::<FilterOperator>().is_err());
        assert_eq!(FilterOperator::default(), FilterOperator::LogicalAnd);
    }

    #[test]
    fn test_truth_tables() {
        let test_cases = vec![
            (FilterOperator::BitAnd, vec![true, true], true),
            (FilterOperator::BitAnd, vec![true, false], false),
            (FilterOperator::BitOr, vec![false, false], false),
            (FilterOperator::BitOr, vec![false, true], true),
            (FilterOperator::BitXor, vec![true, true], false),
            (FilterOperator::BitXor, vec![true, false, true], false),
            (FilterOperator::BitXor, vec![true, true, true], true),
            (FilterOperator::LogicalAnd, vec![true, true, false], false),
            (FilterOperator::LogicalOr, vec![false, false, true], true),
            (FilterOperator::LogicalOr, vec![true], true),
            (FilterOperator::LogicalAnd, vec![], true),
            (FilterOperator::BitOr, vec![], true),
        ];

        for (operator, values, expected) in test_cases {
            let list = list_of(operator, &values);
            assert_eq!(list.is_expression_true(), expected, "{operator} {values:?}");
        }
    }

    #[test]
    fn test_logical_and_short_circuits() {
        let (_first, first_handle) = shared("First", false);
        let (second, second_handle) = shared("Second", true);
        let mut list = FilterList::new("List", FilterOperator::LogicalAnd);
        list.add_filter(first_handle).unwrap();
        list.add_filter(second_handle).unwrap();

        assert!(!list.is_condition_true());
        assert_eq!(second.borrow().evaluations(), 0);
    }

    #[test]
    fn test_logical_or_short_circuits() {
        let (_first, first_handle) = shared("First", true);
        let (second, second_handle) = shared("Second", false);
        let mut list = FilterList::new("List", FilterOperator::LogicalOr);
        list.add_filter(first_handle).unwrap();
        list.add_filter(second_handle).unwrap();

        assert!(list.is_condition_true());
        assert_eq!(second.borrow().evaluations(), 0);
    }

    #[test]
    fn test_bitwise_and_evaluates_every_member() {
        let (_first, first_handle) = shared("First", false);
        let (second, second_handle) = shared("Second", true);
        let mut list = FilterList::new("List", FilterOperator::BitAnd);
        list.add_filter(first_handle).unwrap();
        list.add_filter(second_handle).unwrap();

        assert!(!list.is_condition_true());
        assert_eq!(second.borrow().evaluations(), 1);
    }

    #[test]
    fn test_bitwise_or_evaluates_every_member() {
        let (_first, first_handle) = shared("First", true);
        let (second, second_handle) = shared("Second", false);
        let mut list = FilterList::new("List", FilterOperator::BitOr);
        list.add_filter(first_handle).unwrap();
        list.add_filter(second_handle).unwrap();

        assert!(list.is_condition_true());
        assert_eq!(second.borrow().evaluations(), 1);
    }

    #[test]
    fn test_bitwise_xor_evaluates_every_member() {
        let test_cases = vec![
            (false, false, false),
            (true, false, true),
            (false, true, true),
            (true, true, false),
        ];

        for (a, b, expected) in test_cases {
            let (first, first_handle) = shared("First", a);
            let (second, second_handle) = shared("Second", b);
            let mut list = FilterList::new("List", FilterOperator::BitXor);
            list.add_filter(first_handle).unwrap();
            list.add_filter(second_handle).unwrap();

            assert_eq!(list.is_condition_true(), expected, "{} ^ {}", a, b);
            assert_eq!(first.borrow().evaluations(), 1, "{} ^ {}", a, b);
            assert_eq!(second.borrow().evaluations(), 1, "{} ^ {}", a, b);
        }
    }

    #[test]
    fn test_inversion_applies_to_folded_result() {
        let mut list = list_of(FilterOperator::LogicalAnd, &[true, true]);
        list.set_inverted(true);
        assert!(list.is_expression_true());
        assert!(!list.is_condition_true());
    }

    #[test]
    fn test_negation_inverts_single_filter() {
        let (_rc, handle) = shared("Cut", true);
        let not = FilterList::negation(handle);
        assert_eq!(not.name(), "NotCut");
        assert!(!not.is_condition_true());
        assert_eq!(not.rule(), "!(Cut)");
    }

    #[test]
    fn test_rule_nests() {
        let mut inner = list_of(FilterOperator::BitOr, &[true, false]);
        inner.set_inverted(true);
        let mut outer = FilterList::new("Outer", FilterOperator::LogicalAnd);
        outer
            .add_filter(FilterEntry::owned(FixedFilter::new("Size", true)))
            .unwrap();
        outer.add_filter(FilterEntry::owned(inner)).unwrap();

        assert_eq!(outer.rule(), "(Size && !(F0 | F1))");
    }

    #[test]
    fn test_duplicate_identity_is_skipped() {
        let (_rc, handle) = shared("Once", true);
        let mut list = FilterList::new("List", FilterOperator::BitAnd);
        list.add_filter(&handle).unwrap();
        list.add_filter(&handle).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_list_cannot_contain_itself() {
        let rc = Rc::new(RefCell::new(FilterList::new("Loop", FilterOperator::BitOr)));
        let handle = FilterHandle::from_rc(rc.clone());
        let error = rc.borrow_mut().add_filter(handle).unwrap_err();
        assert!(matches!(error, TaskListError::SelfInsertion { .. }));
    }

    #[test]
    fn test_lifecycle_reaches_members() {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        let (member, handle) = shared("Member", true);
        let mut list = FilterList::new("List", FilterOperator::LogicalAnd);
        list.set_accelerator(Accelerator::DONT_TIME);
        list.add_filter(handle).unwrap();

        list.call_pre_process(&mut registry, &ctx).unwrap();
        assert_eq!(list.call_process(&mut registry, &ctx), ReturnCode::Success);
        list.call_post_process(&mut registry, &ctx).unwrap();

        let member = member.borrow();
        assert_eq!(member.core().num_executions(), 1);
        assert_eq!(member.core().accelerator(), Accelerator::DONT_TIME);
        assert!(!member.core().is_preprocessed());
    }

    #[test]
    fn test_skipping_member_is_dropped_at_pre_process() {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        let mut list = FilterList::new("List", FilterOperator::LogicalAnd);
        list.add_filter(FilterEntry::owned(FixedFilter::new("Gone", false).skip_registration()))
            .unwrap();
        list.add_filter(FilterEntry::owned(FixedFilter::new("Kept", true)))
            .unwrap();

        list.call_pre_process(&mut registry, &ctx).unwrap();
        assert_eq!(list.len(), 1);
        assert!(list.is_condition_true());
    }

    #[test]
    fn test_release_references_drops_member() {
        let (_rc, handle) = shared("Member", true);
        let mut list = FilterList::new("List", FilterOperator::LogicalAnd);
        list.add_filter(&handle).unwrap();
        list.release_references(handle.id());
        assert!(list.is_empty());
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::engine::{ExecutionContext, ParameterRegistry};
use crate::errors::TaskError;
use crate::observability::messages::task::SelectionSummary;
use crate::observability::messages::StructuredLog;
use crate::traits::{Filter, PreProcessOutcome, ReturnCode, Task, TaskCore};

/// Configuration for the random event selector.
///
/// # Fields
/// * `ratio` - Probability of selecting an event, in `[0, 1]`
/// * `seed` - Seed for reproducible selections (optional, entropy otherwise)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventSelectorConfig {
    pub ratio: f64,
    pub seed: Option<u64>,
}

/// Selects a random fraction of the events.
pub struct EventSelector {
    core: TaskCore,
    config: EventSelectorConfig,
    rng: StdRng,
    inverted: bool,
    selected: bool,
    num_selected: u64,
}

impl EventSelector {
    pub const KIND: &'static str = "EventSelector";

    pub fn new(name: impl Into<String>, config: EventSelectorConfig) -> Self {
        Self {
            core: TaskCore::new(name),
            rng: Self::rng_for(config.seed),
            config,
            inverted: false,
            selected: false,
            num_selected: 0,
        }
    }

    pub fn ratio(&self) -> f64 {
        self.config.ratio
    }

    pub fn num_selected(&self) -> u64 {
        self.num_selected
    }

    fn rng_for(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Task for EventSelector {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn pre_process(
        &mut self,
        _registry: &mut ParameterRegistry,
        _ctx: &ExecutionContext,
    ) -> Result<PreProcessOutcome, TaskError> {
        if !(0.0..=1.0).contains(&self.config.ratio) {
            return Err(TaskError::failed(
                self.descriptor(),
                format!("ratio {} is outside [0, 1]", self.config.ratio),
            ));
        }
        // Reseed so every run selects the same events.
        self.rng = Self::rng_for(self.config.seed);
        self.num_selected = 0;
        Ok(PreProcessOutcome::Ready)
    }

    fn process(&mut self, _registry: &mut ParameterRegistry, _ctx: &ExecutionContext) -> ReturnCode {
        self.selected = self.rng.gen::<f64>() < self.config.ratio;
        if self.selected {
            self.num_selected += 1;
        }
        ReturnCode::Success
    }

    fn post_process(&mut self, _registry: &mut ParameterRegistry, _ctx: &ExecutionContext) -> Result<(), TaskError> {
        SelectionSummary {
            filter: &self.descriptor(),
            selected: self.num_selected,
            evaluated: self.core.num_executions_since_pre_process(),
        }
        .log();
        Ok(())
    }
}

impl Filter for EventSelector {
    fn is_expression_true(&self) -> bool {
        self.selected
    }

    fn is_inverted(&self) -> bool {
        self.inverted
    }

    fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selections(ratio: f64, seed: u64, events: usize) -> Vec<bool> {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        let mut selector = EventSelector::new("Half", EventSelectorConfig { ratio, seed: Some(seed) });
        selector.call_pre_process(&mut registry, &ctx).unwrap();
        (0..events)
            .map(|_| {
                selector.call_process(&mut registry, &ctx);
                selector.is_condition_true()
            })
            .collect()
    }

    #[test]
    fn test_extreme_ratios() {
        assert!(selections(0.0, 1, 50).iter().all(|selected| !selected));
        assert!(selections(1.0, 1, 50).iter().all(|selected| *selected));
    }

    #[test]
    fn test_same_seed_same_selection() {
        assert_eq!(selections(0.5, 7, 100), selections(0.5, 7, 100));
    }

    #[test]
    fn test_ratio_is_roughly_honored() {
        let selected = selections(0.25, 42, 4000).iter().filter(|s| **s).count();
        assert!((800..1200).contains(&selected), "selected {}", selected);
    }

    #[test]
    fn test_out_of_range_ratio_fails_pre_process() {
        let mut registry = ParameterRegistry::new();
        let mut selector = EventSelector::new("Bad", EventSelectorConfig { ratio: 1.5, seed: None });

        let error = selector
            .call_pre_process(&mut registry, &ExecutionContext::default())
            .unwrap_err();

        assert!(error.to_string().contains("outside [0, 1]"));
    }

    #[test]
    fn test_inversion_selects_the_complement() {
        let mut registry = ParameterRegistry::new();
        let ctx = ExecutionContext::default();
        let mut selector = EventSelector::new("None", EventSelectorConfig { ratio: 0.0, seed: Some(3) });
        selector.set_inverted(true);
        selector.call_pre_process(&mut registry, &ctx).unwrap();

        selector.call_process(&mut registry, &ctx);

        assert!(selector.is_condition_true());
        assert_eq!(selector.num_selected(), 0);
    }
}

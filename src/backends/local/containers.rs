// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::ALL_STREAMS;
use crate::engine::ContainerFactory;
use crate::traits::{Container, ContainerKind};

/// A factory that can create every container kind of this backend.
pub fn container_factory() -> ContainerFactory {
    let mut factory = ContainerFactory::empty();
    factory.register::<EventHeader>();
    factory
}

/// Per-event bookkeeping written by the reader and read by everyone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHeader {
    pub event_number: u64,
    pub run_number: u32,
    /// Stream the current event belongs to.
    pub stream: String,
    ready_to_save: bool,
}

impl Default for EventHeader {
    fn default() -> Self {
        Self {
            event_number: 0,
            run_number: 0,
            stream: ALL_STREAMS.to_string(),
            ready_to_save: false,
        }
    }
}

impl Container for EventHeader {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    /// Clears the per-event fields; the run number survives.
    fn reset(&mut self) {
        self.event_number = 0;
        self.stream = ALL_STREAMS.to_string();
    }

    fn is_ready_to_save(&self) -> bool {
        self.ready_to_save
    }

    fn set_ready_to_save(&mut self, ready: bool) {
        self.ready_to_save = ready;
    }
}

impl ContainerKind for EventHeader {
    const KIND: &'static str = "EventHeader";
}

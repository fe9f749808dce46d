// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod event_number;
pub mod event_selector;
pub mod pass_filter;

pub use event_number::{EventNumberConfig, EventNumberFilter};
pub use event_selector::{EventSelector, EventSelectorConfig};
pub use pass_filter::{PassFilter, PassFilterConfig};

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod continue_task;
pub mod counter;
pub mod event_source;
pub mod print;
pub mod stream_router;

pub use continue_task::{Continue, ContinueConfig};
pub use counter::Counter;
pub use event_source::{EventSource, EventSourceConfig};
pub use print::{Print, PrintConfig};
pub use stream_router::{StreamRouter, StreamRouterConfig};

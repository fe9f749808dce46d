// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::TaskError;

/// Ways a run of the event loop can fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventLoopError {
    #[error("pre-processing failed: {0}")]
    PreProcess(#[source] TaskError),

    #[error("processing failed at event {event}")]
    Process { event: u64 },

    #[error("post-processing failed: {0}")]
    PostProcess(#[source] TaskError),

    #[error("re-initialization failed: {0}")]
    ReInit(#[source] TaskError),
}

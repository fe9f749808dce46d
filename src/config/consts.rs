// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Stream tag matching every stream.
pub const ALL_STREAMS: &str = "All";
/// Registry name of the event header filled by the reader.
pub const DEFAULT_HEADER_NAME: &str = "EventHeader";
/// Log level used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Kind of the root entry of every pipeline.
pub const ROOT_KIND: &str = "task_list";

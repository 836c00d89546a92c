// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! Diagnostics setup for the binary.
//!
//! Logs go to stderr so that stdout only ever carries the outcome line. The
//! filter comes from `RUST_LOG` and falls back to warnings only.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_FILTER: &str = "warn";

/// Builds the filter from `RUST_LOG`, or from [`DEFAULT_FILTER`] when it is
/// unset or unparsable.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .with(env_filter())
        .try_init();
}

// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging Initialisation
//!
//! Configures the global `tracing` subscriber from the environment:
//!
//! - `LOG_FORMAT=json` selects structured JSON output, one object per
//!   record (timestamp, level, target, message); anything else selects
//!   human-readable text.
//! - `RUST_LOG` filters as usual via `EnvFilter`; the default level is
//!   `info`.
//!
//! Initialisation is idempotent so tests can call it freely.

use tracing_subscriber::EnvFilter;

/// Output format selected by the `LOG_FORMAT` environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Resolves the format from an environment value, defaulting to text.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialises the global subscriber; safe to call more than once.
pub fn init_logging() {
    let format = std::env::var("LOG_FORMAT").ok();
    init_logging_with(LogFormat::from_env_value(format.as_deref()));
}

/// Initialises the global subscriber with an explicit format.
pub fn init_logging_with(format: LogFormat) {
    match format {
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .json()
                .with_env_filter(default_filter())
                .with_current_span(false)
                .with_span_list(false)
                .try_init();
        }
        LogFormat::Text => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(default_filter())
                .try_init();
        }
    }
}

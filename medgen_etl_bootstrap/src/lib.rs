// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the enterprise application layers
//! (domain, application, infrastructure) and provides:
//!
//! - **Argument parsing** - CLI parsing with validation (`cli`)
//! - **Logging initialisation** - text or JSON per `LOG_FORMAT` (`logger`)
//! - **Error handling** - process exit-code mapping (`exit_code`)
//!
//! ## Architecture Position
//!
//! Bootstrap can be depended on by the binary's entry point only; the
//! enterprise layers never reach back into it. It knows nothing about the
//! ETL itself - the validated CLI is handed to the application layer, which
//! owns everything after that.
//!
//! ## Cancellation
//!
//! Cancellation is coarse by design: a SIGINT at any suspension point
//! terminates the process, and because every mutating database phase runs
//! inside a single transaction (bulk load, delta apply, rename), the target
//! is never left partially updated. No cooperative shutdown machinery is
//! needed here.

pub mod cli;
pub mod exit_code;
pub mod logger;

// Re-export commonly used types
pub use cli::{parse_and_validate, ModeArg, ParseError, ValidatedCli};
pub use exit_code::{result_to_exit_code, ExitCode};
pub use logger::init_logging;

/// Bootstrap and parse CLI arguments.
///
/// This is the main entry point for the bootstrap layer: clap parsing
/// (including `--help` / `--version` handling) followed by validation.
/// The caller runs the application and maps its result to an exit code
/// with [`result_to_exit_code`].
///
/// # Errors
///
/// Returns `cli::ParseError` if validation fails - most notably when no
/// database DSN was supplied by flag or environment.
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}

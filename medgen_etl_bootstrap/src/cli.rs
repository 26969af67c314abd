// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. Cli::parse()                    │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validate_cli()                  │  Resolve DSN, range checks
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```
//!
//! The surface is subcommand-less: one invocation performs one ETL run.
//! The database DSN may come from `--db-dsn` or the `MEDGEN_DB_DSN`
//! environment variable; a run without either is rejected before any
//! network or database work starts.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use thiserror::Error;

/// CLI parsing and validation errors.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error(
        "Database connection string is required. \
         Please provide it via --db-dsn or MEDGEN_DB_DSN."
    )]
    MissingDsn,

    #[error("Invalid value for --{arg}: {reason}")]
    InvalidValue { arg: String, reason: String },
}

/// The ETL load strategy as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Complete refresh via atomic table swap.
    Full,
    /// Incremental apply of changes since the last load.
    Delta,
}

impl ModeArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeArg::Full => "full",
            ModeArg::Delta => "delta",
        }
    }
}

/// Raw clap surface.
#[derive(Debug, Parser)]
#[command(
    name = "medgen_etl",
    version,
    about = "A CLI tool for loading NCBI MedGen data into a database."
)]
pub struct Cli {
    /// The directory to download the MedGen files to. Defaults to the
    /// current directory.
    #[arg(long, default_value = ".")]
    pub download_dir: PathBuf,

    /// PostgreSQL connection string (DSN). Can also be set via the
    /// MEDGEN_DB_DSN environment variable.
    #[arg(long, env = "MEDGEN_DB_DSN")]
    pub db_dsn: Option<String>,

    /// The ETL load strategy to perform. 'full' performs a complete
    /// refresh. 'delta' applies changes since the last load.
    #[arg(long, value_enum, default_value_t = ModeArg::Full)]
    pub mode: ModeArg,

    /// The maximum number of parsing errors to tolerate before aborting
    /// the ETL process.
    #[arg(long, default_value_t = 100)]
    pub max_parse_errors: u64,

    /// Skip file integrity verification. Use this if the FTP server does
    /// not provide a checksums file.
    #[arg(long)]
    pub no_verify: bool,
}

/// Validated CLI configuration handed to the application layer.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub download_dir: PathBuf,
    pub db_dsn: String,
    pub mode: ModeArg,
    pub max_parse_errors: u64,
    pub verify: bool,
}

/// Parse and validate CLI arguments.
///
/// Clap handles `--help` and `--version` and exits the process itself.
///
/// # Errors
///
/// Returns `ParseError` if any validation fails.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    validate_cli(Cli::parse())
}

/// Validate parsed CLI arguments.
fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let db_dsn = cli.db_dsn.ok_or(ParseError::MissingDsn)?;
    if db_dsn.trim().is_empty() {
        return Err(ParseError::MissingDsn);
    }

    if cli.download_dir.as_os_str().is_empty() {
        return Err(ParseError::InvalidValue {
            arg: "download-dir".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    Ok(ValidatedCli {
        download_dir: cli.download_dir,
        db_dsn,
        mode: cli.mode,
        max_parse_errors: cli.max_parse_errors,
        verify: !cli.no_verify,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("medgen_etl").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["--db-dsn", "postgresql://localhost/medgen"]);
        let validated = validate_cli(cli).unwrap();
        assert_eq!(validated.download_dir, PathBuf::from("."));
        assert_eq!(validated.mode, ModeArg::Full);
        assert_eq!(validated.max_parse_errors, 100);
        assert!(validated.verify);
    }

    #[test]
    fn test_missing_dsn_is_rejected() {
        let cli = Cli {
            download_dir: PathBuf::from("."),
            db_dsn: None,
            mode: ModeArg::Full,
            max_parse_errors: 100,
            no_verify: false,
        };
        assert!(matches!(validate_cli(cli), Err(ParseError::MissingDsn)));
    }

    #[test]
    fn test_blank_dsn_is_rejected() {
        let cli = parse(&["--db-dsn", "   "]);
        assert!(matches!(validate_cli(cli), Err(ParseError::MissingDsn)));
    }

    #[test]
    fn test_mode_and_no_verify_flags() {
        let cli = parse(&[
            "--db-dsn",
            "postgresql://localhost/medgen",
            "--mode",
            "delta",
            "--no-verify",
            "--max-parse-errors",
            "7",
            "--download-dir",
            "/tmp/medgen",
        ]);
        let validated = validate_cli(cli).unwrap();
        assert_eq!(validated.mode, ModeArg::Delta);
        assert!(!validated.verify);
        assert_eq!(validated.max_parse_errors, 7);
        assert_eq!(validated.download_dir, PathBuf::from("/tmp/medgen"));
    }

    #[test]
    fn test_unknown_mode_fails_at_clap_layer() {
        let result = Cli::try_parse_from(["medgen_etl", "--db-dsn", "x", "--mode", "refresh"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_mode_arg_strings() {
        assert_eq!(ModeArg::Full.as_str(), "full");
        assert_eq!(ModeArg::Delta.as_str(), "delta");
    }
}

// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ETL Error Types
//!
//! This module defines the error taxonomy for the MedGen ETL system. Every
//! layer speaks `EtlError`: infrastructure adapters map driver errors
//! (database, FTP, IO) into it at the boundary, and the orchestrator records
//! the formatted chain in the audit log before exiting non-zero.
//!
//! ## Design Principles
//!
//! - **Specific**: Each variant represents one failure mode from the error
//!   taxonomy (checksum family, parse budget, database, configuration)
//! - **Actionable**: Messages carry the file, table, or digest involved
//! - **Cloneable**: String payloads only, so errors can be logged and
//!   persisted to the audit tables without ownership gymnastics

use thiserror::Error;

/// Domain-specific errors for the MedGen ETL system.
///
/// The checksum variants are terminal at the fetcher layer and fire before
/// any database work; `ParseBudgetExceeded` aborts the bulk load of one
/// logical table; the database variants roll the active transaction back
/// server-side and bubble to the orchestrator.
#[derive(Error, Debug, Clone)]
pub enum EtlError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Checksum manifest unavailable: {0}")]
    ChecksumsUnavailable(String),

    #[error("No checksum listed for '{0}' in the manifest")]
    ChecksumMissingForFile(String),

    #[error("Checksum mismatch for '{file}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Exceeded maximum parsing errors ({max_errors}) in {file}. Aborting.")]
    ParseBudgetExceeded { file: String, max_errors: u64 },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Database connection not established")]
    NotConnected,

    #[error("Unsupported database scheme: '{0}'. Supported schemes are: 'postgresql'.")]
    UnsupportedScheme(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl EtlError {
    /// Creates a new configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a new database error
    pub fn database_error(msg: impl Into<String>) -> Self {
        Self::DatabaseError(msg.into())
    }

    /// Creates a new download error
    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    /// Creates a new IO error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    /// Checks if the error is recoverable by retrying the transfer.
    ///
    /// Checksum mismatches are retried with a fresh download (the corrupt
    /// local copy has already been deleted); transport failures resume from
    /// the retained partial file.
    pub fn is_retryable_transfer(&self) -> bool {
        matches!(
            self,
            EtlError::DownloadFailed(_) | EtlError::IoError(_) | EtlError::ChecksumMismatch { .. }
        )
    }
}

impl From<std::io::Error> for EtlError {
    fn from(err: std::io::Error) -> Self {
        EtlError::IoError(err.to_string())
    }
}

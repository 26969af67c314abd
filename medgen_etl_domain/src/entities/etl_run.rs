// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ETL Run Entities
//!
//! Entities describing one execution of the loader: the run context written
//! to the audit log when the run opens, the terminal status, and the counts
//! collected per logical table and per apply phase.
//!
//! ## Accounting rules
//!
//! - `records_extracted` is the staging row count reported by the bulk
//!   channel, per table and aggregated per run.
//! - `records_loaded` aggregates inserted + updated; soft deletes are
//!   reported but never counted as loaded.
//! - A reactivation is always counted as an update, even when the content
//!   is byte-identical, so operators can observe returning rows.

use std::collections::BTreeMap;
use std::fmt;

use uuid::Uuid;

use crate::value_objects::LoadMode;

/// Status of an ETL run as persisted in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    InProgress,
    Succeeded,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::InProgress => write!(f, "In Progress"),
            RunStatus::Succeeded => write!(f, "Succeeded"),
            RunStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Identity and provenance of one ETL run, recorded at `log_run_start`.
///
/// `source_files` maps each downloaded filename to the MD5 digest it was
/// verified against; it is empty when the run was started with verification
/// disabled. `release_version` is whatever the release README declared, or
/// the `"Unknown"` sentinel.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub package_version: String,
    pub mode: LoadMode,
    pub source_files: BTreeMap<String, String>,
    pub release_version: String,
}

impl RunContext {
    pub fn new(mode: LoadMode, package_version: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            package_version: package_version.into(),
            mode,
            source_files: BTreeMap::new(),
            release_version: "Unknown".to_string(),
        }
    }
}

/// Row counts produced by one CDC classification.
///
/// The classification is total and disjoint on business keys: every staging
/// row lands in exactly one of insert / update / unchanged, and every
/// production key absent from staging lands in delete-or-already-inactive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CdcCounts {
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
}

/// Affected-row counts returned by an apply phase (full or delta).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyMetrics {
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
}

impl ApplyMetrics {
    /// Rows that are new or changed in production; the "loaded" aggregate.
    pub fn loaded(&self) -> u64 {
        self.inserted + self.updated
    }
}

/// Per-table metrics persisted as one `etl_run_details` row.
#[derive(Debug, Clone)]
pub struct TableRunMetrics {
    pub table_name: String,
    pub records_extracted: u64,
    pub records_inserted: u64,
    pub records_updated: u64,
    pub records_deleted: u64,
}

impl TableRunMetrics {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            records_extracted: 0,
            records_inserted: 0,
            records_updated: 0,
            records_deleted: 0,
        }
    }

    /// Folds apply-phase counts into this table's row.
    pub fn absorb_apply(&mut self, apply: ApplyMetrics) {
        self.records_inserted = apply.inserted;
        self.records_updated = apply.updated;
        self.records_deleted = apply.deleted;
    }

    pub fn records_loaded(&self) -> u64 {
        self.records_inserted + self.records_updated
    }
}

// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Native Loader Port
//!
//! The capability bundle a database dialect must provide to participate in
//! the ETL: staging management, native bulk ingest, change data capture,
//! apply (full swap or delta merge), cleanup, and the audit-log protocol.
//! The orchestrator drives this trait exclusively; the concrete dialect is
//! chosen by a DSN-scheme factory in the infrastructure layer.
//!
//! ## Session contract
//!
//! One implementation instance owns one database session. The CDC result
//! sets are session-scoped temporary tables, so `execute_cdc` and a
//! subsequent delta `apply_changes` must run on the same instance with no
//! reconnect in between. Exactly one writer per production table per run
//! is assumed; concurrent runs against the same target are undefined.
//!
//! # Architecture Note
//!
//! This port is async because every operation is a database round-trip.
//! It stays free of driver types: byte iterators in, row counts out, and
//! `EtlError` for every failure.

use async_trait::async_trait;

use crate::entities::{ApplyMetrics, CdcCounts, RunContext, RunStatus, TableRunMetrics};
use crate::error::EtlError;
use crate::value_objects::{BusinessKey, LoadMode};

/// Everything an apply phase needs to know about one logical table.
///
/// `production_ddl` and each entry of `index_ddls` are templates carrying a
/// `{table_name}` placeholder so the same DDL can create the production
/// table, its shadow, or a first-run bootstrap. `full_load_select_sql`
/// (with `{new_production_table}` and `{staging_table}` placeholders) is
/// supplied when staging and production column sets differ.
#[derive(Debug, Clone)]
pub struct ApplyRequest<'a> {
    pub mode: LoadMode,
    pub staging_table: &'a str,
    pub production_table: &'a str,
    pub production_ddl: &'a str,
    pub index_ddls: &'a [&'a str],
    pub pk_name: &'a str,
    pub business_key: Option<&'a BusinessKey>,
    pub full_load_select_sql: Option<&'a str>,
}

/// Database capability bundle for one ETL session.
#[async_trait]
pub trait NativeLoader: Send {
    /// Establishes the session and ensures the audit tables exist.
    async fn connect(&mut self) -> Result<(), EtlError>;

    /// Closes the session. Safe to call on an unconnected loader.
    async fn close(&mut self) -> Result<(), EtlError>;

    /// Drops and recreates a staging table from the supplied DDL.
    async fn initialize_staging(&mut self, table_name: &str, ddl: &str) -> Result<(), EtlError>;

    /// Streams encoded lines into `table_name` over the native bulk
    /// channel and returns the server-reported row count. A constraint
    /// violation aborts the copy server-side, leaving the table empty.
    async fn bulk_load(
        &mut self,
        table_name: &str,
        data: &mut (dyn Iterator<Item = Result<Vec<u8>, EtlError>> + Send),
    ) -> Result<u64, EtlError>;

    /// Diffs staging against production on the business key, populating
    /// the session-scoped CDC result sets and returning their sizes.
    async fn execute_cdc(
        &mut self,
        staging_table: &str,
        production_table: &str,
        pk_name: &str,
        business_key: &BusinessKey,
    ) -> Result<CdcCounts, EtlError>;

    /// Applies staged changes to production: atomic swap in full mode,
    /// soft-delete merge of the CDC sets in delta mode.
    async fn apply_changes(&mut self, request: &ApplyRequest<'_>) -> Result<ApplyMetrics, EtlError>;

    /// Drops the backup table, the staging table, and the CDC result sets.
    async fn cleanup(
        &mut self,
        staging_table: &str,
        production_table: &str,
    ) -> Result<(), EtlError>;

    /// Opens the audit record for a run and returns its `log_id`.
    async fn log_run_start(&mut self, run: &RunContext) -> Result<i64, EtlError>;

    /// Records per-table metrics against an open run.
    async fn log_run_detail(
        &mut self,
        log_id: i64,
        metrics: &TableRunMetrics,
    ) -> Result<(), EtlError>;

    /// Closes the audit record with terminal status and aggregates.
    async fn log_run_finish(
        &mut self,
        log_id: i64,
        status: RunStatus,
        records_extracted: u64,
        records_loaded: u64,
        error_message: Option<&str>,
    ) -> Result<(), EtlError>;
}

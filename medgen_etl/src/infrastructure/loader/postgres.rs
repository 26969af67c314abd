// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # PostgreSQL Native Loader
//!
//! Implements the full [`NativeLoader`] capability bundle against one
//! PostgreSQL session:
//!
//! - **Staging**: drop-and-recreate, then stream encoded lines through
//!   `COPY .. FROM STDIN WITH (FORMAT text, NULL '\N')`. A constraint
//!   violation aborts the copy server-side and leaves staging empty.
//! - **CDC**: three temporary result sets (`cdc_deletes(id)` plus
//!   `cdc_inserts` / `cdc_updates` shaped `LIKE` staging) are created
//!   `IF NOT EXISTS` with `ON COMMIT PRESERVE ROWS` and truncated on every
//!   invocation. Temp tables are session-scoped, which is exactly the
//!   lifetime the delta apply needs and keeps concurrent sessions from
//!   colliding. Content comparison hashes `MD5(ROW(..)::TEXT)` over the
//!   staging columns minus `raw_record`, so cosmetic re-whitespacing of a
//!   source line never causes a spurious update. An inactive production
//!   match is always classified as an update (reactivation), even when the
//!   content is identical.
//! - **Full apply**: build `<prod>_new` from the DDL template, populate it
//!   (custom projection SQL or column-matched copy), replicate the live
//!   table's non-PK indexes (or the bootstrap set when production does not
//!   exist yet), then swap `drop _old` / `prod → _old` / `_new → prod`
//!   inside one transaction. The swap is the only linearisation point
//!   readers can observe.
//! - **Delta apply**: updates (with `is_active = true` reactivation and a
//!   fresh `last_updated_at`), soft deletes, and inserts, all inside one
//!   transaction. Production rows are never hard-deleted.
//! - **Audit**: `etl_audit_log` / `etl_run_details` maintenance.
//!
//! All statement text is assembled by pure builder functions at the bottom
//! of this module so the generated SQL is unit-testable without a server.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgConnection;
use sqlx::Connection;
use tracing::{error, info, warn};

use medgen_etl_domain::entities::{ApplyMetrics, CdcCounts, RunContext, RunStatus, TableRunMetrics};
use medgen_etl_domain::error::EtlError;
use medgen_etl_domain::repositories::{ApplyRequest, NativeLoader};
use medgen_etl_domain::value_objects::{BusinessKey, LoadMode};

use crate::infrastructure::sql::ddl::{
    ETL_AUDIT_LOG_DDL, ETL_RUN_DETAILS_DDL, ETL_RUN_DETAILS_INDEX_DDL,
};

/// Bytes buffered before a chunk is pushed into the COPY channel.
const COPY_BUFFER_BYTES: usize = 64 * 1024;

fn db_err(e: sqlx::Error) -> EtlError {
    EtlError::database_error(e.to_string())
}

/// A native loader for PostgreSQL that uses the COPY protocol for
/// high-performance data ingestion. One instance owns one session.
pub struct PostgresNativeLoader {
    dsn: String,
    conn: Option<PgConnection>,
}

impl PostgresNativeLoader {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            conn: None,
        }
    }

    fn conn(&mut self) -> Result<&mut PgConnection, EtlError> {
        self.conn.as_mut().ok_or(EtlError::NotConnected)
    }
}

#[async_trait]
impl NativeLoader for PostgresNativeLoader {
    async fn connect(&mut self) -> Result<(), EtlError> {
        if self.conn.is_none() {
            info!("Connecting to PostgreSQL database...");
            let conn = PgConnection::connect(&self.dsn).await.map_err(|e| {
                error!("Database connection error: {}", e);
                db_err(e)
            })?;
            self.conn = Some(conn);
            info!("Connection successful.");
        }
        initialize_metadata(self.conn()?).await
    }

    async fn close(&mut self) -> Result<(), EtlError> {
        if let Some(conn) = self.conn.take() {
            conn.close().await.map_err(db_err)?;
            info!("Database connection closed.");
        }
        Ok(())
    }

    async fn initialize_staging(&mut self, table_name: &str, ddl: &str) -> Result<(), EtlError> {
        let conn = self.conn()?;
        info!("Initializing staging table: {}", table_name);
        exec(&mut *conn, &format!("DROP TABLE IF EXISTS {table_name} CASCADE")).await?;
        exec(&mut *conn, ddl).await?;
        info!("Staging table {} initialized successfully.", table_name);
        Ok(())
    }

    async fn bulk_load(
        &mut self,
        table_name: &str,
        data: &mut (dyn Iterator<Item = Result<Vec<u8>, EtlError>> + Send),
    ) -> Result<u64, EtlError> {
        let conn = self.conn()?;
        info!("Starting bulk load into '{}'...", table_name);

        let statement = format!("COPY {table_name} FROM STDIN WITH (FORMAT text, NULL '\\N')");
        let mut copy = conn.copy_in_raw(&statement).await.map_err(db_err)?;

        let mut buffer: Vec<u8> = Vec::with_capacity(COPY_BUFFER_BYTES);
        while let Some(chunk) = data.next() {
            match chunk {
                Ok(bytes) => {
                    buffer.extend_from_slice(&bytes);
                    if buffer.len() >= COPY_BUFFER_BYTES {
                        if let Err(e) = copy.send(std::mem::take(&mut buffer)).await {
                            return Err(db_err(e));
                        }
                    }
                }
                Err(e) => {
                    // The record stream failed (parse budget, IO); abandon
                    // the copy so the server rolls the ingest back.
                    let _ = copy.abort("record stream failed").await;
                    return Err(e);
                }
            }
        }
        if !buffer.is_empty() {
            if let Err(e) = copy.send(buffer).await {
                return Err(db_err(e));
            }
        }
        let rowcount = copy.finish().await.map_err(db_err)?;
        info!(
            "Bulk load into '{}' complete. Loaded {} rows.",
            table_name, rowcount
        );
        Ok(rowcount)
    }

    async fn execute_cdc(
        &mut self,
        staging_table: &str,
        production_table: &str,
        pk_name: &str,
        business_key: &BusinessKey,
    ) -> Result<CdcCounts, EtlError> {
        let conn = self.conn()?;
        info!(
            "Executing CDC for {} using key '{}'...",
            production_table,
            business_key.columns().join(", ")
        );

        // The result sets must outlive the statement but stay session
        // private; temp tables with ON COMMIT PRESERVE ROWS give both.
        exec(
            &mut *conn,
            "CREATE TEMP TABLE IF NOT EXISTS cdc_deletes (id BIGINT) ON COMMIT PRESERVE ROWS",
        )
        .await?;
        exec(
            &mut *conn,
            &format!(
                "CREATE TEMP TABLE IF NOT EXISTS cdc_inserts \
                 (LIKE {staging_table} INCLUDING DEFAULTS) ON COMMIT PRESERVE ROWS"
            ),
        )
        .await?;
        exec(
            &mut *conn,
            &format!(
                "CREATE TEMP TABLE IF NOT EXISTS cdc_updates \
                 (LIKE {staging_table} INCLUDING DEFAULTS) ON COMMIT PRESERVE ROWS"
            ),
        )
        .await?;
        exec(&mut *conn, "TRUNCATE TABLE cdc_deletes, cdc_inserts, cdc_updates").await?;

        if !table_exists(conn, production_table).await? {
            info!(
                "Production table {} does not exist. Treating all records as inserts.",
                production_table
            );
            let inserts = exec_count(
                &mut *conn,
                &format!("INSERT INTO cdc_inserts SELECT s.* FROM {staging_table} s"),
            )
            .await?;
            return Ok(CdcCounts {
                inserts,
                updates: 0,
                deletes: 0,
            });
        }

        let hash_columns = table_columns(conn, staging_table, true).await?;

        let deletes = exec_count(
            &mut *conn,
            &build_find_deletes_sql(staging_table, production_table, pk_name, business_key),
        )
        .await?;
        let updates = exec_count(
            &mut *conn,
            &build_find_updates_sql(staging_table, production_table, business_key, &hash_columns),
        )
        .await?;
        let inserts = exec_count(
            &mut *conn,
            &build_find_inserts_sql(staging_table, production_table, pk_name, business_key),
        )
        .await?;

        info!(
            "CDC complete. Inserts: {}, Updates: {}, Deletes: {}",
            inserts, updates, deletes
        );
        Ok(CdcCounts {
            inserts,
            updates,
            deletes,
        })
    }

    async fn apply_changes(&mut self, request: &ApplyRequest<'_>) -> Result<ApplyMetrics, EtlError> {
        let conn = self.conn()?;
        match request.mode {
            LoadMode::Full => apply_full_load(conn, request).await,
            LoadMode::Delta => apply_delta_load(conn, request).await,
        }
    }

    async fn cleanup(
        &mut self,
        staging_table: &str,
        production_table: &str,
    ) -> Result<(), EtlError> {
        let conn = self.conn()?;
        let backup_table = format!("{production_table}_old");
        info!("Performing cleanup for {}...", production_table);

        let mut tx = conn.begin().await.map_err(db_err)?;
        exec(&mut *tx, &format!("DROP TABLE IF EXISTS {backup_table} CASCADE")).await?;
        exec(&mut *tx, &format!("DROP TABLE IF EXISTS {staging_table} CASCADE")).await?;
        exec(
            &mut *tx,
            "DROP TABLE IF EXISTS cdc_deletes; \
             DROP TABLE IF EXISTS cdc_inserts; \
             DROP TABLE IF EXISTS cdc_updates",
        )
        .await?;
        tx.commit().await.map_err(db_err)?;

        info!(
            "Cleanup complete. Dropped tables: {}, {}, cdc_deletes, cdc_inserts, cdc_updates",
            backup_table, staging_table
        );
        Ok(())
    }

    async fn log_run_start(&mut self, run: &RunContext) -> Result<i64, EtlError> {
        let conn = self.conn()?;
        let source_files = serde_json::to_value(&run.source_files)
            .map_err(|e| EtlError::database_error(format!("source manifest to JSON: {e}")))?;
        let log_id: i64 = sqlx::query_scalar(
            "INSERT INTO etl_audit_log \
             (run_id, package_version, load_mode, source_files, medgen_release_version, \
              start_time, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING log_id",
        )
        .bind(run.run_id)
        .bind(&run.package_version)
        .bind(run.mode.as_str())
        .bind(&source_files)
        .bind(&run.release_version)
        .bind(Utc::now())
        .bind(RunStatus::InProgress.to_string())
        .fetch_one(&mut *conn)
        .await
        .map_err(db_err)?;
        info!("ETL run started. Log ID: {}", log_id);
        Ok(log_id)
    }

    async fn log_run_detail(
        &mut self,
        log_id: i64,
        metrics: &TableRunMetrics,
    ) -> Result<(), EtlError> {
        let conn = self.conn()?;
        sqlx::query(
            "INSERT INTO etl_run_details \
             (log_id, table_name, records_extracted, records_inserted, \
              records_deleted, records_updated) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(log_id)
        .bind(&metrics.table_name)
        .bind(metrics.records_extracted as i64)
        .bind(metrics.records_inserted as i64)
        .bind(metrics.records_deleted as i64)
        .bind(metrics.records_updated as i64)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;
        info!("Logged details for table: {}", metrics.table_name);
        Ok(())
    }

    async fn log_run_finish(
        &mut self,
        log_id: i64,
        status: RunStatus,
        records_extracted: u64,
        records_loaded: u64,
        error_message: Option<&str>,
    ) -> Result<(), EtlError> {
        let conn = self.conn()?;
        sqlx::query(
            "UPDATE etl_audit_log SET end_time = $1, status = $2, \
             records_extracted = $3, records_loaded = $4, error_message = $5 \
             WHERE log_id = $6",
        )
        .bind(Utc::now())
        .bind(status.to_string())
        .bind(records_extracted as i64)
        .bind(records_loaded as i64)
        .bind(error_message)
        .bind(log_id)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;
        info!("ETL run finished for Log ID: {}. Status: {}", log_id, status);
        Ok(())
    }
}

// --- Session helpers ---

/// Runs one or more statements over the simple query protocol.
async fn exec(executor: &mut PgConnection, sql: &str) -> Result<(), EtlError> {
    sqlx::raw_sql(sqlx::AssertSqlSafe(sql))
        .execute(executor)
        .await
        .map_err(db_err)?;
    Ok(())
}

/// Like [`exec`] but returns the affected-row count.
async fn exec_count(executor: &mut PgConnection, sql: &str) -> Result<u64, EtlError> {
    Ok(sqlx::raw_sql(sqlx::AssertSqlSafe(sql))
        .execute(executor)
        .await
        .map_err(db_err)?
        .rows_affected())
}

async fn table_exists(conn: &mut PgConnection, table_name: &str) -> Result<bool, EtlError> {
    let regclass: Option<String> = sqlx::query_scalar("SELECT to_regclass($1)::text")
        .bind(table_name)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_err)?;
    Ok(regclass.is_some())
}

/// Column names of `table_name` in declared order, optionally excluding
/// `raw_record` (the change hash deliberately ignores it).
async fn table_columns(
    conn: &mut PgConnection,
    table_name: &str,
    exclude_raw_record: bool,
) -> Result<Vec<String>, EtlError> {
    let sql = if exclude_raw_record {
        "SELECT column_name::text FROM information_schema.columns \
         WHERE table_name = $1 AND column_name != 'raw_record' \
         ORDER BY ordinal_position"
    } else {
        "SELECT column_name::text FROM information_schema.columns \
         WHERE table_name = $1 ORDER BY ordinal_position"
    };
    sqlx::query_scalar(sql)
        .bind(table_name)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_err)
}

/// DDL of every non-primary-key index on `table_name`, as the server
/// would dump it. Empty when the table does not exist.
async fn get_table_indexes(
    conn: &mut PgConnection,
    table_name: &str,
) -> Result<Vec<String>, EtlError> {
    info!("Discovering indexes for table: {}", table_name);
    let index_ddls: Vec<String> = sqlx::query_scalar(
        "SELECT i.indexdef FROM pg_indexes i \
         JOIN pg_class c ON i.indexname = c.relname \
         LEFT JOIN pg_constraint con ON c.oid = con.conindid \
         WHERE i.tablename = $1 AND con.contype IS DISTINCT FROM 'p'",
    )
    .bind(table_name)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    info!(
        "Found {} non-PK indexes for {}.",
        index_ddls.len(),
        table_name
    );
    Ok(index_ddls)
}

async fn initialize_metadata(conn: &mut PgConnection) -> Result<(), EtlError> {
    info!("Initializing metadata tables: etl_audit_log, etl_run_details");
    exec(&mut *conn, ETL_AUDIT_LOG_DDL).await?;
    exec(&mut *conn, ETL_RUN_DETAILS_DDL).await?;
    exec(&mut *conn, ETL_RUN_DETAILS_INDEX_DDL).await?;
    info!("Metadata tables initialized.");
    Ok(())
}

// --- Apply phases ---

/// Full refresh via the atomic-swap protocol.
async fn apply_full_load(
    conn: &mut PgConnection,
    request: &ApplyRequest<'_>,
) -> Result<ApplyMetrics, EtlError> {
    let production_table = request.production_table;
    let staging_table = request.staging_table;
    let new_production_table = format!("{production_table}_new");
    let backup_table = format!("{production_table}_old");

    info!(
        "Applying FULL load for table {} with atomic swap...",
        production_table
    );

    let table_existed = table_exists(conn, production_table).await?;
    let live_index_ddls = if table_existed {
        get_table_indexes(conn, production_table).await?
    } else {
        warn!(
            "Table '{}' does not exist, cannot discover indexes. \
             Falling back to the configured bootstrap set.",
            production_table
        );
        Vec::new()
    };

    exec(
        &mut *conn,
        &render_table_template(request.production_ddl, &new_production_table),
    )
    .await?;

    let inserted = if let Some(projection) = request.full_load_select_sql {
        info!(
            "Loading data into '{}' using custom SQL...",
            new_production_table
        );
        exec_count(
            &mut *conn,
            &render_projection(projection, &new_production_table, staging_table),
        )
        .await?
    } else {
        // Column-matched copy over the intersection of staging and shadow
        // columns, in staging's declared order.
        let staging_columns = table_columns(conn, staging_table, false).await?;
        let new_columns = table_columns(conn, &new_production_table, false).await?;
        let columns: Vec<String> = staging_columns
            .into_iter()
            .filter(|c| new_columns.contains(c))
            .collect();
        info!(
            "Loading data from '{}' into '{}'",
            staging_table, new_production_table
        );
        exec_count(
            &mut *conn,
            &build_full_copy_sql(staging_table, &new_production_table, &columns),
        )
        .await?
    };

    if table_existed {
        info!(
            "Replicating {} indexes on new table {}...",
            live_index_ddls.len(),
            new_production_table
        );
        for index_ddl in &live_index_ddls {
            exec(
                &mut *conn,
                &rewrite_index_target(index_ddl, production_table, &new_production_table),
            )
            .await?;
        }
    } else {
        for index_ddl in request.index_ddls {
            exec(&mut *conn, &render_table_template(index_ddl, &new_production_table)).await?;
        }
    }

    info!("Performing atomic swap in a single transaction...");
    let mut tx = conn.begin().await.map_err(db_err)?;
    exec(&mut *tx, &format!("DROP TABLE IF EXISTS {backup_table} CASCADE")).await?;
    exec(
        &mut *tx,
        &format!("ALTER TABLE IF EXISTS {production_table} RENAME TO {backup_table}"),
    )
    .await?;
    exec(
        &mut *tx,
        &format!("ALTER TABLE {new_production_table} RENAME TO {production_table}"),
    )
    .await?;
    tx.commit().await.map_err(db_err)?;

    info!(
        "Atomic swap complete for {}. Inserted {} records.",
        production_table, inserted
    );
    Ok(ApplyMetrics {
        inserted,
        updated: 0,
        deleted: 0,
    })
}

/// Delta merge of the CDC result sets with soft-delete semantics.
async fn apply_delta_load(
    conn: &mut PgConnection,
    request: &ApplyRequest<'_>,
) -> Result<ApplyMetrics, EtlError> {
    let business_key = request.business_key.ok_or_else(|| {
        EtlError::invalid_config("A 'business_key' is required for delta loads.")
    })?;
    let production_table = request.production_table;
    let pk_name = request.pk_name;

    info!("Applying DELTA load for table {}...", production_table);

    if !table_exists(conn, production_table).await? {
        info!(
            "Production table '{}' does not exist. Creating now...",
            production_table
        );
        exec(&mut *conn, &render_table_template(request.production_ddl, production_table)).await?;
        for index_ddl in request.index_ddls {
            exec(&mut *conn, &render_table_template(index_ddl, production_table)).await?;
        }
        info!("Table '{}' and its indexes created.", production_table);
    }

    let update_columns: Vec<String> = table_columns(conn, "cdc_updates", false)
        .await?
        .into_iter()
        .filter(|c| c != pk_name && !business_key.contains(c))
        .collect();
    let insert_columns: Vec<String> = table_columns(conn, "cdc_inserts", false)
        .await?
        .into_iter()
        .filter(|c| c != pk_name)
        .collect();

    let mut metrics = ApplyMetrics::default();
    let mut tx = conn.begin().await.map_err(db_err)?;

    if !update_columns.is_empty() {
        metrics.updated = exec_count(
            &mut *tx,
            &build_apply_updates_sql(production_table, business_key, &update_columns),
        )
        .await?;
        info!("Applied {} updates.", metrics.updated);
    }

    metrics.deleted = exec_count(&mut *tx, &build_apply_deletes_sql(production_table, pk_name))
        .await?;
    info!("Applied {} soft deletes.", metrics.deleted);

    if !insert_columns.is_empty() {
        metrics.inserted = exec_count(
            &mut *tx,
            &build_apply_inserts_sql(production_table, &insert_columns),
        )
        .await?;
        info!("Applied {} inserts.", metrics.inserted);
    }

    tx.commit().await.map_err(db_err)?;
    info!("Delta load for {} complete.", production_table);
    Ok(metrics)
}

// --- Statement builders (pure, unit-tested) ---

fn quoted_column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| format!(r#""{c}""#))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `MD5(ROW(a."c1", a."c2", ..)::TEXT)` over the given columns.
fn md5_row_expr(alias: &str, columns: &[String]) -> String {
    let list = columns
        .iter()
        .map(|c| format!(r#"{alias}."{c}""#))
        .collect::<Vec<_>>()
        .join(", ");
    format!("MD5(ROW({list})::TEXT)")
}

/// Substitutes the `{table_name}` placeholder of a DDL template.
fn render_table_template(template: &str, table_name: &str) -> String {
    template.replace("{table_name}", table_name)
}

/// Substitutes the projection-SQL placeholders.
fn render_projection(template: &str, new_production_table: &str, staging_table: &str) -> String {
    template
        .replace("{new_production_table}", new_production_table)
        .replace("{staging_table}", staging_table)
}

/// Rewrites a dumped index DDL to target (and be named after) the shadow
/// table. A plain substring replace covers both the `ON <table>` clause -
/// schema-qualified or not - and the index name, which must change too:
/// index names are schema-global and the source table still holds the
/// original until the swap.
fn rewrite_index_target(index_ddl: &str, production_table: &str, new_table: &str) -> String {
    index_ddl.replace(production_table, new_table)
}

/// Production rows whose business key vanished from staging and that are
/// still active: their surrogate keys feed the soft-delete.
fn build_find_deletes_sql(
    staging_table: &str,
    production_table: &str,
    pk_name: &str,
    business_key: &BusinessKey,
) -> String {
    format!(
        "INSERT INTO cdc_deletes (id) SELECT p.{pk_name} \
         FROM {production_table} p LEFT JOIN {staging_table} s ON {join} \
         WHERE {unmatched} AND p.is_active = true",
        join = business_key.join_predicate("p", "s"),
        unmatched = business_key.null_predicate("s"),
    )
}

/// Staging rows that match production and either changed content (active
/// rows, by MD5 over the non-raw columns) or need reactivation (inactive
/// rows, regardless of content).
fn build_find_updates_sql(
    staging_table: &str,
    production_table: &str,
    business_key: &BusinessKey,
    hash_columns: &[String],
) -> String {
    format!(
        "INSERT INTO cdc_updates SELECT s.* FROM {staging_table} s \
         JOIN {production_table} p ON {join} \
         WHERE (p.is_active = true AND {staging_hash} != {production_hash}) \
         OR p.is_active = false",
        join = business_key.join_predicate("p", "s"),
        staging_hash = md5_row_expr("s", hash_columns),
        production_hash = md5_row_expr("p", hash_columns),
    )
}

/// Staging rows with no production match that were not already claimed as
/// updates. The dedup join conjoins every business-key column.
fn build_find_inserts_sql(
    staging_table: &str,
    production_table: &str,
    pk_name: &str,
    business_key: &BusinessKey,
) -> String {
    format!(
        "INSERT INTO cdc_inserts SELECT s.* FROM {staging_table} s \
         LEFT JOIN {production_table} p ON {prod_join} \
         LEFT JOIN cdc_updates u ON {update_join} \
         WHERE p.{pk_name} IS NULL AND {not_updated}",
        prod_join = business_key.join_predicate("p", "s"),
        update_join = business_key.join_predicate("s", "u"),
        not_updated = business_key.null_predicate("u"),
    )
}

/// Content refresh from `cdc_updates`; updating always marks the row
/// active, which covers both normal updates and reactivations.
fn build_apply_updates_sql(
    production_table: &str,
    business_key: &BusinessKey,
    update_columns: &[String],
) -> String {
    let set_clause = update_columns
        .iter()
        .map(|c| format!(r#""{c}" = s."{c}""#))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {production_table} p SET {set_clause}, \
         last_updated_at = NOW(), is_active = true \
         FROM cdc_updates s WHERE {join}",
        join = business_key.join_predicate("p", "s"),
    )
}

fn build_apply_deletes_sql(production_table: &str, pk_name: &str) -> String {
    format!(
        "UPDATE {production_table} SET is_active = false, last_updated_at = NOW() \
         WHERE {pk_name} IN (SELECT id FROM cdc_deletes)"
    )
}

fn build_apply_inserts_sql(production_table: &str, insert_columns: &[String]) -> String {
    let list = quoted_column_list(insert_columns);
    format!("INSERT INTO {production_table} ({list}) SELECT {list} FROM cdc_inserts")
}

fn build_full_copy_sql(staging_table: &str, new_table: &str, columns: &[String]) -> String {
    let list = quoted_column_list(columns);
    format!("INSERT INTO {new_table} ({list}) SELECT {list} FROM {staging_table}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(columns: &[&str]) -> BusinessKey {
        BusinessKey::new(columns).unwrap()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_deletes_sql() {
        let sql = build_find_deletes_sql(
            "staging_medgen_concepts",
            "medgen_concepts",
            "concept_id",
            &key(&["aui"]),
        );
        assert_eq!(
            sql,
            "INSERT INTO cdc_deletes (id) SELECT p.concept_id \
             FROM medgen_concepts p LEFT JOIN staging_medgen_concepts s \
             ON p.\"aui\" = s.\"aui\" \
             WHERE s.\"aui\" IS NULL AND p.is_active = true"
        );
    }

    #[test]
    fn test_find_updates_sql_hashes_both_sides() {
        let sql = build_find_updates_sql(
            "staging_medgen_names",
            "medgen_names",
            &key(&["name"]),
            &cols(&["cui", "name", "source", "suppress"]),
        );
        assert!(sql.contains(
            "MD5(ROW(s.\"cui\", s.\"name\", s.\"source\", s.\"suppress\")::TEXT) \
             != MD5(ROW(p.\"cui\", p.\"name\", p.\"source\", p.\"suppress\")::TEXT)"
        ));
        assert!(sql.contains("OR p.is_active = false"));
        assert!(sql.starts_with("INSERT INTO cdc_updates SELECT s.*"));
    }

    #[test]
    fn test_find_updates_hash_excludes_raw_record_by_contract() {
        // The caller passes hash columns that already exclude raw_record;
        // the builder must not smuggle it back in.
        let sql = build_find_updates_sql(
            "staging_t",
            "prod_t",
            &key(&["k"]),
            &cols(&["k", "v"]),
        );
        assert!(!sql.contains("raw_record"));
    }

    #[test]
    fn test_find_inserts_sql_conjoins_all_key_columns() {
        let sql = build_find_inserts_sql(
            "staging_medgen_hpo_mapping",
            "medgen_hpo_mapping",
            "hpo_mapping_id",
            &key(&["cui", "sdui"]),
        );
        assert!(sql.contains("LEFT JOIN cdc_updates u ON s.\"cui\" = u.\"cui\" AND s.\"sdui\" = u.\"sdui\""));
        assert!(sql.contains("WHERE p.hpo_mapping_id IS NULL AND u.\"cui\" IS NULL AND u.\"sdui\" IS NULL"));
    }

    #[test]
    fn test_apply_updates_sql_reactivates() {
        let sql = build_apply_updates_sql(
            "medgen_concepts",
            &key(&["aui"]),
            &cols(&["cui", "record_str"]),
        );
        assert_eq!(
            sql,
            "UPDATE medgen_concepts p SET \"cui\" = s.\"cui\", \"record_str\" = s.\"record_str\", \
             last_updated_at = NOW(), is_active = true \
             FROM cdc_updates s WHERE p.\"aui\" = s.\"aui\""
        );
    }

    #[test]
    fn test_apply_deletes_sql_is_soft() {
        let sql = build_apply_deletes_sql("medgen_concepts", "concept_id");
        assert!(sql.starts_with("UPDATE medgen_concepts SET is_active = false"));
        assert!(sql.contains("WHERE concept_id IN (SELECT id FROM cdc_deletes)"));
        assert!(!sql.to_lowercase().contains("delete from"));
    }

    #[test]
    fn test_apply_inserts_sql_quotes_columns() {
        let sql = build_apply_inserts_sql("medgen_names", &cols(&["cui", "name", "raw_record"]));
        assert_eq!(
            sql,
            "INSERT INTO medgen_names (\"cui\", \"name\", \"raw_record\") \
             SELECT \"cui\", \"name\", \"raw_record\" FROM cdc_inserts"
        );
    }

    #[test]
    fn test_full_copy_sql() {
        let sql = build_full_copy_sql("staging_medgen_names", "medgen_names_new", &cols(&["cui", "name"]));
        assert_eq!(
            sql,
            "INSERT INTO medgen_names_new (\"cui\", \"name\") \
             SELECT \"cui\", \"name\" FROM staging_medgen_names"
        );
    }

    #[test]
    fn test_render_table_template() {
        assert_eq!(
            render_table_template("CREATE TABLE {table_name} (x INT)", "medgen_concepts_new"),
            "CREATE TABLE medgen_concepts_new (x INT)"
        );
        // Index templates substitute both the name and the target.
        assert_eq!(
            render_table_template(
                "CREATE INDEX IF NOT EXISTS idx_{table_name}_cui ON {table_name} (cui)",
                "medgen_concepts"
            ),
            "CREATE INDEX IF NOT EXISTS idx_medgen_concepts_cui ON medgen_concepts (cui)"
        );
    }

    #[test]
    fn test_render_projection() {
        let sql = render_projection(
            "INSERT INTO {new_production_table} (cui) SELECT cui FROM {staging_table}",
            "medgen_sources_new",
            "staging_medgen_sources",
        );
        assert_eq!(
            sql,
            "INSERT INTO medgen_sources_new (cui) SELECT cui FROM staging_medgen_sources"
        );
    }

    #[test]
    fn test_rewrite_index_target_qualified_and_name() {
        let ddl = "CREATE INDEX idx_medgen_concepts_cui ON public.medgen_concepts USING btree (cui)";
        assert_eq!(
            rewrite_index_target(ddl, "medgen_concepts", "medgen_concepts_new"),
            "CREATE INDEX idx_medgen_concepts_new_cui ON public.medgen_concepts_new USING btree (cui)"
        );
    }

    #[test]
    fn test_rewrite_index_target_unqualified() {
        let ddl = "CREATE UNIQUE INDEX custom_idx ON medgen_names USING btree (name)";
        assert_eq!(
            rewrite_index_target(ddl, "medgen_names", "medgen_names_new"),
            "CREATE UNIQUE INDEX custom_idx ON medgen_names_new USING btree (name)"
        );
    }

    #[test]
    fn test_md5_row_expr() {
        assert_eq!(
            md5_row_expr("s", &cols(&["cui", "name"])),
            "MD5(ROW(s.\"cui\", s.\"name\")::TEXT)"
        );
    }
}

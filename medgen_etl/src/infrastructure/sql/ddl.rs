// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # DDL Catalog
//!
//! Every table the engine creates, in one place:
//!
//! - **Audit tables** (`etl_audit_log`, `etl_run_details`), created
//!   idempotently on every connect.
//! - **Staging tables**, all-TEXT mirrors of the parsed record shapes plus
//!   `raw_record`, with NOT NULL only on natural keys. Fixed names - they
//!   are dropped and recreated per run.
//! - **Production tables**, written as templates with a `{table_name}`
//!   placeholder so one DDL serves the live table, its `_new` shadow, and
//!   a first-run bootstrap. Every production table carries the surrogate
//!   `BIGSERIAL` key, the domain columns, `raw_record`, and the two
//!   lifecycle columns `is_active` / `last_updated_at`.
//! - **Index DDLs**, also `{table_name}` templates; used as the bootstrap
//!   set when a production table is created for the first time. Later full
//!   loads replicate whatever indexes are live instead.
//!
//! Staging column order must match the encoder's field order exactly; the
//! COPY channel is positional.

// --- Audit tables ---

pub const ETL_AUDIT_LOG_DDL: &str = "\
CREATE TABLE IF NOT EXISTS etl_audit_log (
    log_id BIGSERIAL PRIMARY KEY,
    run_id UUID NOT NULL,
    package_version TEXT NOT NULL,
    load_mode TEXT NOT NULL,
    source_files JSONB,
    medgen_release_version TEXT,
    start_time TIMESTAMPTZ NOT NULL,
    end_time TIMESTAMPTZ,
    status TEXT NOT NULL,
    records_extracted BIGINT,
    records_loaded BIGINT,
    error_message TEXT
)";

pub const ETL_RUN_DETAILS_DDL: &str = "\
CREATE TABLE IF NOT EXISTS etl_run_details (
    detail_id BIGSERIAL PRIMARY KEY,
    log_id BIGINT NOT NULL REFERENCES etl_audit_log (log_id),
    table_name TEXT NOT NULL,
    records_extracted BIGINT NOT NULL DEFAULT 0,
    records_inserted BIGINT NOT NULL DEFAULT 0,
    records_updated BIGINT NOT NULL DEFAULT 0,
    records_deleted BIGINT NOT NULL DEFAULT 0,
    logged_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

pub const ETL_RUN_DETAILS_INDEX_DDL: &str =
    "CREATE INDEX IF NOT EXISTS idx_etl_run_details_log_id ON etl_run_details (log_id)";

// --- Concepts (MRCONSO.RRF) ---

pub const STAGING_CONCEPTS_DDL: &str = "\
CREATE TABLE staging_medgen_concepts (
    cui TEXT NOT NULL,
    lat TEXT,
    ts TEXT,
    lui TEXT,
    stt TEXT,
    sui TEXT,
    ispref TEXT,
    aui TEXT NOT NULL,
    saui TEXT,
    scui TEXT,
    sdui TEXT,
    sab TEXT,
    tty TEXT,
    code TEXT,
    record_str TEXT,
    srl TEXT,
    suppress TEXT,
    cvf TEXT,
    raw_record TEXT
)";

pub const PRODUCTION_CONCEPTS_DDL: &str = "\
CREATE TABLE {table_name} (
    concept_id BIGSERIAL PRIMARY KEY,
    cui TEXT NOT NULL,
    lat TEXT,
    ts TEXT,
    lui TEXT,
    stt TEXT,
    sui TEXT,
    ispref TEXT,
    aui TEXT NOT NULL,
    saui TEXT,
    scui TEXT,
    sdui TEXT,
    sab TEXT,
    tty TEXT,
    code TEXT,
    record_str TEXT,
    srl TEXT,
    suppress TEXT,
    cvf TEXT,
    raw_record TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    last_updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

pub const PRODUCTION_CONCEPTS_INDEXES_DDL: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_{table_name}_cui ON {table_name} (cui)",
    "CREATE INDEX IF NOT EXISTS idx_{table_name}_sab ON {table_name} (sab)",
];

// --- Semantic types (MRSTY.RRF) ---

pub const STAGING_SEMANTIC_TYPES_DDL: &str = "\
CREATE TABLE staging_medgen_semantic_types (
    cui TEXT NOT NULL,
    tui TEXT,
    stn TEXT,
    sty TEXT,
    atui TEXT,
    cvf TEXT,
    raw_record TEXT
)";

pub const PRODUCTION_SEMANTIC_TYPES_DDL: &str = "\
CREATE TABLE {table_name} (
    semantic_type_id BIGSERIAL PRIMARY KEY,
    cui TEXT NOT NULL,
    tui TEXT,
    stn TEXT,
    sty TEXT,
    atui TEXT,
    cvf TEXT,
    raw_record TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    last_updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

pub const PRODUCTION_SEMANTIC_TYPES_INDEXES_DDL: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_{table_name}_cui ON {table_name} (cui)",
    "CREATE INDEX IF NOT EXISTS idx_{table_name}_tui ON {table_name} (tui)",
];

// --- Relationships (MRREL.RRF) ---

pub const STAGING_RELATIONSHIPS_DDL: &str = "\
CREATE TABLE staging_medgen_relationships (
    cui1 TEXT NOT NULL,
    aui1 TEXT,
    stype1 TEXT,
    rel TEXT,
    cui2 TEXT NOT NULL,
    aui2 TEXT,
    stype2 TEXT,
    rela TEXT,
    rui TEXT,
    srui TEXT,
    sab TEXT,
    sl TEXT,
    rg TEXT,
    dir TEXT,
    suppress TEXT,
    cvf TEXT,
    raw_record TEXT
)";

pub const PRODUCTION_RELATIONSHIPS_DDL: &str = "\
CREATE TABLE {table_name} (
    relationship_id BIGSERIAL PRIMARY KEY,
    cui1 TEXT NOT NULL,
    aui1 TEXT,
    stype1 TEXT,
    rel TEXT,
    cui2 TEXT NOT NULL,
    aui2 TEXT,
    stype2 TEXT,
    rela TEXT,
    rui TEXT,
    srui TEXT,
    sab TEXT,
    sl TEXT,
    rg TEXT,
    dir TEXT,
    suppress TEXT,
    cvf TEXT,
    raw_record TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    last_updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

pub const PRODUCTION_RELATIONSHIPS_INDEXES_DDL: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_{table_name}_cui1 ON {table_name} (cui1)",
    "CREATE INDEX IF NOT EXISTS idx_{table_name}_cui2 ON {table_name} (cui2)",
];

// --- Source attributes (MRSAT.RRF) ---

pub const STAGING_SOURCES_DDL: &str = "\
CREATE TABLE staging_medgen_sources (
    cui TEXT NOT NULL,
    lui TEXT,
    sui TEXT,
    metaui TEXT,
    stype TEXT,
    code TEXT,
    atui TEXT NOT NULL,
    satui TEXT,
    atn TEXT,
    sab TEXT,
    atv TEXT,
    suppress TEXT,
    cvf TEXT,
    raw_record TEXT
)";

/// Production sources renames the cryptic RRF columns; the column sets of
/// staging and production differ, so full loads go through
/// [`SOURCES_FULL_LOAD_SELECT_SQL`] instead of the column-matched copy.
pub const PRODUCTION_SOURCES_DDL: &str = "\
CREATE TABLE {table_name} (
    source_id BIGSERIAL PRIMARY KEY,
    cui TEXT NOT NULL,
    source_abbreviation TEXT,
    attribute_name TEXT,
    attribute_value TEXT,
    raw_record TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    last_updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

pub const PRODUCTION_SOURCES_INDEXES_DDL: &[&str] =
    &["CREATE INDEX IF NOT EXISTS idx_{table_name}_cui ON {table_name} (cui)"];

pub const SOURCES_FULL_LOAD_SELECT_SQL: &str = "\
INSERT INTO {new_production_table} \
(cui, source_abbreviation, attribute_name, attribute_value, raw_record) \
SELECT cui, sab, atn, atv, raw_record FROM {staging_table}";

// --- Names (NAMES.RRF.gz) ---

pub const STAGING_NAMES_DDL: &str = "\
CREATE TABLE staging_medgen_names (
    cui TEXT NOT NULL,
    name TEXT NOT NULL,
    source TEXT,
    suppress TEXT,
    raw_record TEXT
)";

pub const PRODUCTION_NAMES_DDL: &str = "\
CREATE TABLE {table_name} (
    name_id BIGSERIAL PRIMARY KEY,
    cui TEXT NOT NULL,
    name TEXT NOT NULL,
    source TEXT,
    suppress TEXT,
    raw_record TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    last_updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

pub const PRODUCTION_NAMES_INDEXES_DDL: &[&str] =
    &["CREATE INDEX IF NOT EXISTS idx_{table_name}_cui ON {table_name} (cui)"];

// --- HPO mapping (MedGen_HPO_Mapping.txt.gz) ---

pub const STAGING_HPO_MAPPING_DDL: &str = "\
CREATE TABLE staging_medgen_hpo_mapping (
    cui TEXT NOT NULL,
    sdui TEXT NOT NULL,
    hpo_str TEXT,
    medgen_str TEXT,
    medgen_str_sab TEXT,
    sty TEXT,
    raw_record TEXT
)";

pub const PRODUCTION_HPO_MAPPING_DDL: &str = "\
CREATE TABLE {table_name} (
    hpo_mapping_id BIGSERIAL PRIMARY KEY,
    cui TEXT NOT NULL,
    sdui TEXT NOT NULL,
    hpo_str TEXT,
    medgen_str TEXT,
    medgen_str_sab TEXT,
    sty TEXT,
    raw_record TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    last_updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

pub const PRODUCTION_HPO_MAPPING_INDEXES_DDL: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_{table_name}_cui ON {table_name} (cui)",
    "CREATE INDEX IF NOT EXISTS idx_{table_name}_sdui ON {table_name} (sdui)",
];

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCTION_DDLS: &[&str] = &[
        PRODUCTION_CONCEPTS_DDL,
        PRODUCTION_SEMANTIC_TYPES_DDL,
        PRODUCTION_RELATIONSHIPS_DDL,
        PRODUCTION_SOURCES_DDL,
        PRODUCTION_NAMES_DDL,
        PRODUCTION_HPO_MAPPING_DDL,
    ];

    #[test]
    fn test_production_ddls_are_templates_with_lifecycle_columns() {
        for ddl in PRODUCTION_DDLS {
            assert!(ddl.contains("{table_name}"), "missing placeholder: {ddl}");
            assert!(ddl.contains("is_active BOOLEAN NOT NULL DEFAULT TRUE"));
            assert!(ddl.contains("last_updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()"));
            assert!(ddl.contains("raw_record TEXT"));
            assert!(ddl.contains("BIGSERIAL PRIMARY KEY"));
        }
    }

    #[test]
    fn test_staging_ddls_have_fixed_names_and_raw_record() {
        for (ddl, table) in [
            (STAGING_CONCEPTS_DDL, "staging_medgen_concepts"),
            (STAGING_SEMANTIC_TYPES_DDL, "staging_medgen_semantic_types"),
            (STAGING_RELATIONSHIPS_DDL, "staging_medgen_relationships"),
            (STAGING_SOURCES_DDL, "staging_medgen_sources"),
            (STAGING_NAMES_DDL, "staging_medgen_names"),
            (STAGING_HPO_MAPPING_DDL, "staging_medgen_hpo_mapping"),
        ] {
            assert!(ddl.contains(table), "wrong table name in: {ddl}");
            assert!(!ddl.contains("{table_name}"));
            assert!(ddl.contains("raw_record TEXT"));
        }
    }

    #[test]
    fn test_index_ddls_are_idempotent_templates() {
        for ddls in [
            PRODUCTION_CONCEPTS_INDEXES_DDL,
            PRODUCTION_SEMANTIC_TYPES_INDEXES_DDL,
            PRODUCTION_RELATIONSHIPS_INDEXES_DDL,
            PRODUCTION_SOURCES_INDEXES_DDL,
            PRODUCTION_NAMES_INDEXES_DDL,
            PRODUCTION_HPO_MAPPING_INDEXES_DDL,
        ] {
            for ddl in ddls {
                assert!(ddl.contains("{table_name}"));
                assert!(ddl.starts_with("CREATE INDEX IF NOT EXISTS"));
            }
        }
    }

    #[test]
    fn test_sources_projection_renames_columns() {
        assert!(SOURCES_FULL_LOAD_SELECT_SQL.contains("{new_production_table}"));
        assert!(SOURCES_FULL_LOAD_SELECT_SQL.contains("{staging_table}"));
        assert!(SOURCES_FULL_LOAD_SELECT_SQL.contains("SELECT cui, sab, atn, atv, raw_record"));
    }

    #[test]
    fn test_audit_ddls_are_idempotent() {
        assert!(ETL_AUDIT_LOG_DDL.starts_with("CREATE TABLE IF NOT EXISTS etl_audit_log"));
        assert!(ETL_RUN_DETAILS_DDL.starts_with("CREATE TABLE IF NOT EXISTS etl_run_details"));
        assert!(ETL_RUN_DETAILS_INDEX_DDL.contains("IF NOT EXISTS"));
    }
}

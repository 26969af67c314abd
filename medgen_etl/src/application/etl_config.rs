// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ETL Configuration
//!
//! The static wiring of the six logical tables: source file, parser, DDL,
//! keys, and indexes. Dispatch on file shape is a plain data structure -
//! the orchestrator matches on [`RecordParser`] to build the record
//! stream, everything else flows through as strings.
//!
//! Order matters: entries are processed in declared order within a run.

use crate::infrastructure::sql::ddl;

/// NCBI FTP endpoint for the MedGen release.
pub const NCBI_FTP_HOST: &str = "ftp.ncbi.nlm.nih.gov";
pub const NCBI_FTP_PATH: &str = "/pub/medgen/";

/// Which parser turns this file into records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordParser {
    Concepts,
    SemanticTypes,
    Relationships,
    Sources,
    Names,
    HpoMapping,
}

/// One logical table: everything the orchestrator needs, end to end.
#[derive(Debug, Clone)]
pub struct EtlTableConfig {
    pub file: &'static str,
    pub parser: RecordParser,
    pub staging_table: &'static str,
    pub staging_ddl: &'static str,
    pub prod_table: &'static str,
    pub prod_ddl: &'static str,
    pub prod_pk: &'static str,
    pub business_key: &'static [&'static str],
    pub index_ddls: &'static [&'static str],
    pub full_load_select_sql: Option<&'static str>,
}

/// The file and table mappings, in load order.
pub const ETL_CONFIG: &[EtlTableConfig] = &[
    EtlTableConfig {
        file: "MRCONSO.RRF",
        parser: RecordParser::Concepts,
        staging_table: "staging_medgen_concepts",
        staging_ddl: ddl::STAGING_CONCEPTS_DDL,
        prod_table: "medgen_concepts",
        prod_ddl: ddl::PRODUCTION_CONCEPTS_DDL,
        prod_pk: "concept_id",
        business_key: &["aui"],
        index_ddls: ddl::PRODUCTION_CONCEPTS_INDEXES_DDL,
        full_load_select_sql: None,
    },
    EtlTableConfig {
        file: "MRSTY.RRF",
        parser: RecordParser::SemanticTypes,
        staging_table: "staging_medgen_semantic_types",
        staging_ddl: ddl::STAGING_SEMANTIC_TYPES_DDL,
        prod_table: "medgen_semantic_types",
        prod_ddl: ddl::PRODUCTION_SEMANTIC_TYPES_DDL,
        prod_pk: "semantic_type_id",
        business_key: &["atui"],
        index_ddls: ddl::PRODUCTION_SEMANTIC_TYPES_INDEXES_DDL,
        full_load_select_sql: None,
    },
    EtlTableConfig {
        file: "MRREL.RRF",
        parser: RecordParser::Relationships,
        staging_table: "staging_medgen_relationships",
        staging_ddl: ddl::STAGING_RELATIONSHIPS_DDL,
        prod_table: "medgen_relationships",
        prod_ddl: ddl::PRODUCTION_RELATIONSHIPS_DDL,
        prod_pk: "relationship_id",
        business_key: &["rui"],
        index_ddls: ddl::PRODUCTION_RELATIONSHIPS_INDEXES_DDL,
        full_load_select_sql: None,
    },
    EtlTableConfig {
        file: "MRSAT.RRF",
        parser: RecordParser::Sources,
        staging_table: "staging_medgen_sources",
        staging_ddl: ddl::STAGING_SOURCES_DDL,
        prod_table: "medgen_sources",
        prod_ddl: ddl::PRODUCTION_SOURCES_DDL,
        prod_pk: "source_id",
        business_key: &["atui"],
        index_ddls: ddl::PRODUCTION_SOURCES_INDEXES_DDL,
        // Staging and production column sets differ for this table.
        full_load_select_sql: Some(ddl::SOURCES_FULL_LOAD_SELECT_SQL),
    },
    EtlTableConfig {
        file: "NAMES.RRF.gz",
        parser: RecordParser::Names,
        staging_table: "staging_medgen_names",
        staging_ddl: ddl::STAGING_NAMES_DDL,
        prod_table: "medgen_names",
        prod_ddl: ddl::PRODUCTION_NAMES_DDL,
        prod_pk: "name_id",
        business_key: &["name"],
        index_ddls: ddl::PRODUCTION_NAMES_INDEXES_DDL,
        full_load_select_sql: None,
    },
    EtlTableConfig {
        file: "MedGen_HPO_Mapping.txt.gz",
        parser: RecordParser::HpoMapping,
        staging_table: "staging_medgen_hpo_mapping",
        staging_ddl: ddl::STAGING_HPO_MAPPING_DDL,
        prod_table: "medgen_hpo_mapping",
        prod_ddl: ddl::PRODUCTION_HPO_MAPPING_DDL,
        prod_pk: "hpo_mapping_id",
        business_key: &["sdui"],
        index_ddls: ddl::PRODUCTION_HPO_MAPPING_INDEXES_DDL,
        full_load_select_sql: None,
    },
];

pub fn etl_config() -> &'static [EtlTableConfig] {
    ETL_CONFIG
}

// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! HPO mapping record (MedGen_HPO_Mapping.txt.gz).
//!
//! Tab-delimited, unlike the pipe-delimited RRF files. The header line
//! (`#CUI\tSDUI\t...`) is optional; the parser peeks at the first line and
//! either consumes or replays it.

use super::RrfRecord;

/// A row of the HPO mapping file; `sdui` serves as the business key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HpoMappingRecord {
    pub cui: String,
    pub sdui: String,
    pub hpo_str: String,
    pub medgen_str: String,
    pub medgen_str_sab: String,
    pub sty: String,
    pub raw_record: String,
}

impl RrfRecord for HpoMappingRecord {
    const FILE_NAME: &'static str = "MedGen_HPO_Mapping.txt";

    const SCHEMA: &'static [&'static str] =
        &["cui", "sdui", "hpo_str", "medgen_str", "medgen_str_sab", "sty"];

    fn from_row(row: &[String], raw_record: String) -> Self {
        Self {
            cui: row[0].clone(),
            sdui: row[1].clone(),
            hpo_str: row[2].clone(),
            medgen_str: row[3].clone(),
            medgen_str_sab: row[4].clone(),
            sty: row[5].clone(),
            raw_record,
        }
    }

    fn tsv_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.cui),
            Some(&self.sdui),
            Some(&self.hpo_str),
            Some(&self.medgen_str),
            Some(&self.medgen_str_sab),
            Some(&self.sty),
            Some(&self.raw_record),
        ]
    }

    fn raw_record(&self) -> &str {
        &self.raw_record
    }
}

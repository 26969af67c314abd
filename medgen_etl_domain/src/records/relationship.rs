// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concept relationship record (MRREL.RRF).
//!
//! `rui` is nullable in the source; rows without one never match the CDC
//! business-key join and are reclassified on every delta run.

use super::{optional, RrfRecord};

/// A row of MRREL.RRF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRecord {
    pub cui1: String,
    pub aui1: Option<String>,
    pub stype1: String,
    pub rel: String,
    pub cui2: String,
    pub aui2: Option<String>,
    pub stype2: String,
    pub rela: Option<String>,
    pub rui: Option<String>,
    pub srui: Option<String>,
    pub sab: String,
    pub sl: Option<String>,
    pub rg: Option<String>,
    pub dir: Option<String>,
    pub suppress: String,
    pub cvf: Option<String>,
    pub raw_record: String,
}

impl RrfRecord for RelationshipRecord {
    const FILE_NAME: &'static str = "MRREL.RRF";

    const SCHEMA: &'static [&'static str] = &[
        "cui1", "aui1", "stype1", "rel", "cui2", "aui2", "stype2", "rela", "rui", "srui", "sab",
        "sl", "rg", "dir", "suppress", "cvf",
    ];

    fn from_row(row: &[String], raw_record: String) -> Self {
        Self {
            cui1: row[0].clone(),
            aui1: optional(&row[1]),
            stype1: row[2].clone(),
            rel: row[3].clone(),
            cui2: row[4].clone(),
            aui2: optional(&row[5]),
            stype2: row[6].clone(),
            rela: optional(&row[7]),
            rui: optional(&row[8]),
            srui: optional(&row[9]),
            sab: row[10].clone(),
            sl: optional(&row[11]),
            rg: optional(&row[12]),
            dir: optional(&row[13]),
            suppress: row[14].clone(),
            cvf: optional(&row[15]),
            raw_record,
        }
    }

    fn tsv_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.cui1),
            self.aui1.as_deref(),
            Some(&self.stype1),
            Some(&self.rel),
            Some(&self.cui2),
            self.aui2.as_deref(),
            Some(&self.stype2),
            self.rela.as_deref(),
            self.rui.as_deref(),
            self.srui.as_deref(),
            Some(&self.sab),
            self.sl.as_deref(),
            self.rg.as_deref(),
            self.dir.as_deref(),
            Some(&self.suppress),
            self.cvf.as_deref(),
            Some(&self.raw_record),
        ]
    }

    fn raw_record(&self) -> &str {
        &self.raw_record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row() {
        let row: Vec<String> = [
            "C0000039", "A0016515", "AUI", "RB", "C0000039", "A1317707", "AUI", "", "R12345678",
            "", "MSH", "", "", "", "N", "",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let record = RelationshipRecord::from_row(&row, "raw".to_string());
        assert_eq!(record.rel, "RB");
        assert_eq!(record.rui.as_deref(), Some("R12345678"));
        assert_eq!(record.rela, None);
        assert_eq!(record.dir, None);
    }
}

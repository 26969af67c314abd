// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Concept Record (MRCONSO.RRF)
//!
//! One atom of the concept names-and-sources file. The `AUI` is the stable
//! atom identifier and serves as the business key for change capture; the
//! `STR` column is carried as `record_str` because its name collides with
//! too many SQL keywords and built-ins to be worth quoting everywhere.

use super::{optional, RrfRecord};

/// A row of MRCONSO.RRF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptRecord {
    pub cui: String,
    pub lat: String,
    pub ts: String,
    pub lui: String,
    pub stt: String,
    pub sui: String,
    pub ispref: String,
    pub aui: String,
    pub saui: Option<String>,
    pub scui: Option<String>,
    pub sdui: Option<String>,
    pub sab: String,
    pub tty: String,
    pub code: String,
    pub record_str: String,
    pub srl: String,
    pub suppress: String,
    pub cvf: Option<String>,
    pub raw_record: String,
}

impl RrfRecord for ConceptRecord {
    const FILE_NAME: &'static str = "MRCONSO.RRF";

    const SCHEMA: &'static [&'static str] = &[
        "cui", "lat", "ts", "lui", "stt", "sui", "ispref", "aui", "saui", "scui", "sdui", "sab",
        "tty", "code", "record_str", "srl", "suppress", "cvf",
    ];

    fn from_row(row: &[String], raw_record: String) -> Self {
        Self {
            cui: row[0].clone(),
            lat: row[1].clone(),
            ts: row[2].clone(),
            lui: row[3].clone(),
            stt: row[4].clone(),
            sui: row[5].clone(),
            ispref: row[6].clone(),
            aui: row[7].clone(),
            saui: optional(&row[8]),
            scui: optional(&row[9]),
            sdui: optional(&row[10]),
            sab: row[11].clone(),
            tty: row[12].clone(),
            code: row[13].clone(),
            record_str: row[14].clone(),
            srl: row[15].clone(),
            suppress: row[16].clone(),
            cvf: optional(&row[17]),
            raw_record,
        }
    }

    fn tsv_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.cui),
            Some(&self.lat),
            Some(&self.ts),
            Some(&self.lui),
            Some(&self.stt),
            Some(&self.sui),
            Some(&self.ispref),
            Some(&self.aui),
            self.saui.as_deref(),
            self.scui.as_deref(),
            self.sdui.as_deref(),
            Some(&self.sab),
            Some(&self.tty),
            Some(&self.code),
            Some(&self.record_str),
            Some(&self.srl),
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

    fn sample_row() -> Vec<String> {
        [
            "C0000005", "ENG", "P", "L0000005", "PF", "S0007492", "Y", "A26634265", "", "M0019694",
            "D012711", "MSH", "PEP", "D012711", "(131)I-MAA", "0", "N", "256",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_from_row_maps_optionals() {
        let record = ConceptRecord::from_row(&sample_row(), "raw".to_string());
        assert_eq!(record.aui, "A26634265");
        assert_eq!(record.saui, None);
        assert_eq!(record.scui.as_deref(), Some("M0019694"));
        assert_eq!(record.cvf.as_deref(), Some("256"));
    }

    #[test]
    fn test_tsv_fields_end_with_raw_record() {
        let record = ConceptRecord::from_row(&sample_row(), "the raw line".to_string());
        let fields = record.tsv_fields();
        assert_eq!(fields.len(), ConceptRecord::SCHEMA.len() + 1);
        assert_eq!(fields.last().unwrap(), &Some("the raw line"));
    }
}

// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Semantic type assignment record (MRSTY.RRF).

use super::{optional, RrfRecord};

/// A row of MRSTY.RRF; `atui` is the business key when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticTypeRecord {
    pub cui: String,
    pub tui: String,
    pub stn: String,
    pub sty: String,
    pub atui: Option<String>,
    pub cvf: Option<String>,
    pub raw_record: String,
}

impl RrfRecord for SemanticTypeRecord {
    const FILE_NAME: &'static str = "MRSTY.RRF";

    const SCHEMA: &'static [&'static str] = &["cui", "tui", "stn", "sty", "atui", "cvf"];

    fn from_row(row: &[String], raw_record: String) -> Self {
        Self {
            cui: row[0].clone(),
            tui: row[1].clone(),
            stn: row[2].clone(),
            sty: row[3].clone(),
            atui: optional(&row[4]),
            cvf: optional(&row[5]),
            raw_record,
        }
    }

    fn tsv_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.cui),
            Some(&self.tui),
            Some(&self.stn),
            Some(&self.sty),
            self.atui.as_deref(),
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
        let row: Vec<String> = ["C0000039", "T109", "A1.4.1.2.1", "Organic Chemical", "AT123", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let record = SemanticTypeRecord::from_row(&row, "raw".to_string());
        assert_eq!(record.tui, "T109");
        assert_eq!(record.atui.as_deref(), Some("AT123"));
        assert_eq!(record.cvf, None);
    }
}

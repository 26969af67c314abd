// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Transport Encoder
//!
//! Serialises typed records into the PostgreSQL COPY TEXT wire shape the
//! staging loader feeds to the server: fields joined by TAB, terminated by
//! LF, absent or empty fields emitted as the two-byte null sentinel `\N`,
//! no quoting. TAB and line-ending characters cannot survive inside a field
//! in this format, so they are replaced with a single space before emission
//! (principally relevant to `raw_record`).
//!
//! The staging DDL's column order and NULL sentinel must align with this
//! encoding.

use crate::error::EtlError;
use crate::records::RrfRecord;

/// PostgreSQL COPY TEXT null sentinel.
const NULL_SENTINEL: &str = "\\N";

fn push_scrubbed(line: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\t' | '\n' | '\r' => line.push(' '),
            other => line.push(other),
        }
    }
}

/// Encodes one record as a single COPY TEXT line.
pub fn encode_record<T: RrfRecord>(record: &T) -> Vec<u8> {
    let mut line = String::new();
    for (i, field) in record.tsv_fields().iter().enumerate() {
        if i > 0 {
            line.push('\t');
        }
        match field {
            Some(value) if !value.is_empty() => push_scrubbed(&mut line, value),
            _ => line.push_str(NULL_SENTINEL),
        }
    }
    line.push('\n');
    line.into_bytes()
}

/// Lifts a record stream into the byte stream the bulk channel consumes.
///
/// Lazy: one record is encoded per pull, parser errors pass through
/// untouched.
pub fn stream_tsv<T, I>(records: I) -> impl Iterator<Item = Result<Vec<u8>, EtlError>>
where
    T: RrfRecord,
    I: Iterator<Item = Result<T, EtlError>>,
{
    records.map(|record| record.map(|r| encode_record(&r)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::NameRecord;

    fn name_record(raw: &str) -> NameRecord {
        NameRecord {
            cui: "C0000039".to_string(),
            name: "Name One".to_string(),
            source: "GTR".to_string(),
            suppress: "N".to_string(),
            raw_record: raw.to_string(),
        }
    }

    #[test]
    fn test_encode_joins_with_tabs_and_terminates_with_lf() {
        let bytes = encode_record(&name_record("C0000039|Name One|GTR|N|"));
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "C0000039\tName One\tGTR\tN\tC0000039|Name One|GTR|N|\n"
        );
    }

    #[test]
    fn test_encode_scrubs_tabs_and_newlines_in_fields() {
        let bytes = encode_record(&name_record("a\tb\nc"));
        let line = String::from_utf8(bytes).unwrap();
        assert!(line.ends_with("a b c\n"));
        // The only tabs left are the four field separators.
        assert_eq!(line.matches('\t').count(), 4);
    }

    #[test]
    fn test_encode_maps_none_and_empty_to_null_sentinel() {
        use crate::records::SemanticTypeRecord;
        let record = SemanticTypeRecord {
            cui: "C0000039".to_string(),
            tui: "T109".to_string(),
            stn: String::new(),
            sty: "Organic Chemical".to_string(),
            atui: None,
            cvf: None,
            raw_record: "raw".to_string(),
        };
        let line = String::from_utf8(encode_record(&record)).unwrap();
        assert_eq!(
            line,
            "C0000039\tT109\t\\N\tOrganic Chemical\t\\N\t\\N\traw\n"
        );
    }

    #[test]
    fn test_stream_tsv_passes_errors_through() {
        let records: Vec<Result<NameRecord, EtlError>> = vec![
            Ok(name_record("raw")),
            Err(EtlError::ParseBudgetExceeded {
                file: "NAMES.RRF".to_string(),
                max_errors: 2,
            }),
        ];
        let out: Vec<_> = stream_tsv(records.into_iter()).collect();
        assert!(out[0].is_ok());
        assert!(matches!(
            out[1],
            Err(EtlError::ParseBudgetExceeded { .. })
        ));
    }
}

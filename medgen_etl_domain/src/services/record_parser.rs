// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Record Parsers
//!
//! Lazy, single-pass parsers that turn a buffered byte stream into typed
//! records. Three shapes exist:
//!
//! - [`PipeDelimitedParser`] - the standard RRF files (MRCONSO, MRSTY,
//!   MRREL, MRSAT): positional pipe-delimited columns, no quoting, with
//!   tolerance for trailing empty fields.
//! - [`NamesParser`] - NAMES.RRF: a header line (optionally `#`-prefixed)
//!   declares the columns, which may appear in any order; fields are mapped
//!   by header lookup, so source reordering is transparent.
//! - [`HpoMappingParser`] - the tab-delimited HPO mapping file, whose
//!   header line may or may not be present; the parser peeks at the first
//!   line and either consumes or replays it.
//!
//! All three share one line routine: strip the trailing line ending for the
//! `raw_record` copy, skip entirely blank lines, split on the delimiter
//! with no quote processing, enforce the schema's field count, strip each
//! field, and map empty optional fields to the null sentinel downstream.
//!
//! Malformed lines are counted against a caller-supplied [`ParseBudget`];
//! exceeding it aborts the parse with `EtlError::ParseBudgetExceeded`.
//! Each parser holds exactly one line of state.

use std::io::BufRead;
use std::marker::PhantomData;

use tracing::warn;

use crate::error::EtlError;
use crate::records::RrfRecord;

/// Per-file tolerance for malformed lines.
///
/// Every recorded error is logged with its line number; crossing
/// `max_errors` fails the parse terminally.
#[derive(Debug)]
pub struct ParseBudget {
    file: &'static str,
    max_errors: u64,
    seen: u64,
}

impl ParseBudget {
    pub fn new(file: &'static str, max_errors: u64) -> Self {
        Self {
            file,
            max_errors,
            seen: 0,
        }
    }

    pub fn errors_seen(&self) -> u64 {
        self.seen
    }

    /// Records one malformed line, failing once the budget is exhausted.
    fn record(&mut self, line_num: u64, message: &str) -> Result<(), EtlError> {
        warn!(
            "Skipping malformed row {} in {}: {}",
            line_num, self.file, message
        );
        self.seen += 1;
        if self.seen > self.max_errors {
            Err(EtlError::ParseBudgetExceeded {
                file: self.file.to_string(),
                max_errors: self.max_errors,
            })
        } else {
            Ok(())
        }
    }
}

/// Splits one non-blank line into exactly `num_fields` stripped values.
///
/// With `tolerate_trailing` set, surplus fields are dropped when they are
/// all empty (RRF rows end in a dangling delimiter). A residual count
/// mismatch is reported as `Err(found)` for the caller's budget message.
fn split_into_fields(
    line: &str,
    delimiter: char,
    num_fields: usize,
    tolerate_trailing: bool,
) -> Result<Vec<String>, usize> {
    let mut row: Vec<&str> = line.split(delimiter).collect();
    if tolerate_trailing && row.len() > num_fields && row[num_fields..].iter().all(|f| f.is_empty())
    {
        row.truncate(num_fields);
    }
    if row.len() != num_fields {
        return Err(row.len());
    }
    Ok(row.into_iter().map(|f| f.trim().to_string()).collect())
}

/// Positional parser for pipe-delimited RRF files.
///
/// Yields `Result<T, EtlError>`; the first error terminates the stream.
pub struct PipeDelimitedParser<R: BufRead, T: RrfRecord> {
    lines: std::io::Lines<R>,
    budget: ParseBudget,
    line_num: u64,
    done: bool,
    _record: PhantomData<T>,
}

impl<R: BufRead, T: RrfRecord> PipeDelimitedParser<R, T> {
    pub fn new(reader: R, max_errors: u64) -> Self {
        Self {
            lines: reader.lines(),
            budget: ParseBudget::new(T::FILE_NAME, max_errors),
            line_num: 0,
            done: false,
            _record: PhantomData,
        }
    }
}

impl<R: BufRead, T: RrfRecord> Iterator for PipeDelimitedParser<R, T> {
    type Item = Result<T, EtlError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.lines.next() {
                None => return None,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                Some(Ok(line)) => line,
            };
            self.line_num += 1;

            let processing = line.trim();
            if processing.is_empty() {
                continue;
            }

            match split_into_fields(processing, '|', T::SCHEMA.len(), true) {
                Ok(row) => return Some(Ok(T::from_row(&row, line))),
                Err(found) => {
                    let message =
                        format!("expected {} columns, found {}", T::SCHEMA.len(), found);
                    if let Err(e) = self.budget.record(self.line_num, &message) {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
            }
        }
    }
}

/// Header-driven parser for NAMES.RRF.
///
/// The first line is the header; a leading `#` is stripped and a dangling
/// trailing delimiter is tolerated. Each schema column is located in the
/// header case-insensitively, so arbitrary column reordering in the source
/// is transparent. Rows are reassembled into canonical `SCHEMA` order.
pub struct NamesParser<R: BufRead> {
    lines: std::io::Lines<R>,
    budget: ParseBudget,
    line_num: u64,
    // One slot per schema column: its position in the header, if declared.
    header: Option<Vec<Option<usize>>>,
    header_width: usize,
    done: bool,
}

impl<R: BufRead> NamesParser<R> {
    pub fn new(reader: R, max_errors: u64) -> Self {
        Self {
            lines: reader.lines(),
            budget: ParseBudget::new(crate::records::NameRecord::FILE_NAME, max_errors),
            line_num: 0,
            header: None,
            header_width: 0,
            done: false,
        }
    }

    fn read_header(&mut self) -> Result<Option<()>, EtlError> {
        let line = match self.lines.next() {
            None => return Ok(None),
            Some(line) => line?,
        };
        self.line_num += 1;

        let header = line.trim().strip_prefix('#').unwrap_or(line.trim());
        let fieldnames: Vec<String> = header
            .split('|')
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        self.header_width = fieldnames.len();
        self.header = Some(
            crate::records::NameRecord::SCHEMA
                .iter()
                .map(|col| fieldnames.iter().position(|h| h == col))
                .collect(),
        );
        Ok(Some(()))
    }
}

impl<R: BufRead> Iterator for NamesParser<R> {
    type Item = Result<crate::records::NameRecord, EtlError>;

    fn next(&mut self) -> Option<Self::Item> {
        use crate::records::NameRecord;

        if self.done {
            return None;
        }
        if self.header.is_none() {
            match self.read_header() {
                Ok(Some(())) => {}
                Ok(None) => return None,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        loop {
            let line = match self.lines.next() {
                None => return None,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                Some(Ok(line)) => line,
            };
            self.line_num += 1;

            let processing = line.trim();
            if processing.is_empty() {
                continue;
            }

            let row = match split_into_fields(processing, '|', self.header_width, true) {
                Ok(row) => row,
                Err(found) => {
                    let message = format!(
                        "incorrect number of columns. Expected {}, found {}",
                        self.header_width, found
                    );
                    if let Err(e) = self.budget.record(self.line_num, &message) {
                        self.done = true;
                        return Some(Err(e));
                    }
                    continue;
                }
            };

            let positions = self.header.as_ref().expect("header read above");
            let mut ordered = Vec::with_capacity(NameRecord::SCHEMA.len());
            let mut missing = None;
            for (col, position) in NameRecord::SCHEMA.iter().zip(positions) {
                match position {
                    Some(idx) => ordered.push(row[*idx].clone()),
                    None => {
                        missing = Some(*col);
                        break;
                    }
                }
            }
            if let Some(col) = missing {
                let message = format!("header does not declare required column '{col}'");
                if let Err(e) = self.budget.record(self.line_num, &message) {
                    self.done = true;
                    return Some(Err(e));
                }
                continue;
            }

            return Some(Ok(NameRecord::from_row(&ordered, line)));
        }
    }
}

/// Positional parser for the tab-delimited HPO mapping file.
///
/// The header is optional: the first line is inspected and consumed only
/// when it starts with `cui` / `#cui` (case-insensitive); otherwise it is
/// parsed as data.
pub struct HpoMappingParser<R: BufRead> {
    lines: std::io::Lines<R>,
    budget: ParseBudget,
    line_num: u64,
    started: bool,
    done: bool,
}

impl<R: BufRead> HpoMappingParser<R> {
    pub fn new(reader: R, max_errors: u64) -> Self {
        Self {
            lines: reader.lines(),
            budget: ParseBudget::new(crate::records::HpoMappingRecord::FILE_NAME, max_errors),
            line_num: 0,
            started: false,
            done: false,
        }
    }

    fn is_header(line: &str) -> bool {
        let lower = line.trim_start().to_lowercase();
        lower.starts_with("#cui") || lower.starts_with("cui")
    }
}

impl<R: BufRead> Iterator for HpoMappingParser<R> {
    type Item = Result<crate::records::HpoMappingRecord, EtlError>;

    fn next(&mut self) -> Option<Self::Item> {
        use crate::records::HpoMappingRecord;

        if self.done {
            return None;
        }
        loop {
            let line = match self.lines.next() {
                None => return None,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                Some(Ok(line)) => line,
            };
            self.line_num += 1;

            if !self.started {
                self.started = true;
                if Self::is_header(&line) {
                    continue;
                }
            }

            let processing = line.trim();
            if processing.is_empty() {
                continue;
            }

            match split_into_fields(processing, '\t', HpoMappingRecord::SCHEMA.len(), false) {
                Ok(row) => return Some(Ok(HpoMappingRecord::from_row(&row, line))),
                Err(found) => {
                    let message = format!(
                        "expected {} columns, found {}",
                        HpoMappingRecord::SCHEMA.len(),
                        found
                    );
                    if let Err(e) = self.budget.record(self.line_num, &message) {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{
        ConceptRecord, HpoMappingRecord, NameRecord, RrfRecord, SemanticTypeRecord,
    };
    use std::io::Cursor;

    fn concept_line(aui: &str, text: &str) -> String {
        format!(
            "C0000005|ENG|P|L0000005|PF|S0007492|Y|{aui}||M0019694|D012711|MSH|PEP|D012711|{text}|0|N||"
        )
    }

    fn parse_concepts(input: &str, max_errors: u64) -> Vec<Result<ConceptRecord, EtlError>> {
        PipeDelimitedParser::<_, ConceptRecord>::new(Cursor::new(input.to_string()), max_errors)
            .collect()
    }

    #[test]
    fn test_pipe_parser_happy_path() {
        let input = format!("{}\n{}\n", concept_line("A1", "One"), concept_line("A2", "Two"));
        let records: Vec<_> = parse_concepts(&input, 0)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].aui, "A1");
        assert_eq!(records[1].record_str, "Two");
    }

    #[test]
    fn test_pipe_parser_tolerates_trailing_empty_fields() {
        // Dangling delimiters produce empty surplus columns.
        let input = format!("{}||\n", concept_line("A1", "One"));
        let records: Vec<_> = parse_concepts(&input, 0)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_pipe_parser_rejects_non_trailing_mismatch() {
        let input = "C0000005|ENG|too|few\n";
        let results = parse_concepts(input, 0);
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(EtlError::ParseBudgetExceeded { .. })
        ));
    }

    #[test]
    fn test_pipe_parser_skips_blank_lines() {
        let input = format!("\n   \n{}\n\n", concept_line("A1", "One"));
        let records: Vec<_> = parse_concepts(&input, 0)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_pipe_parser_budget_allows_up_to_max_errors() {
        let bad = "a|b\n";
        let good = concept_line("A1", "One");
        let input = format!("{bad}{bad}{good}\n");
        // Two malformed rows, budget of two: both skipped, record survives.
        let records: Vec<_> = parse_concepts(&input, 2)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_pipe_parser_budget_exceeded_aborts() {
        let bad = "a|b\n";
        let input = format!("{bad}{bad}{bad}");
        let results = parse_concepts(&input, 2);
        // Two skips, then the third error crosses the budget and terminates.
        assert_eq!(results.len(), 1);
        match &results[0] {
            Err(EtlError::ParseBudgetExceeded { file, max_errors }) => {
                assert_eq!(file, "MRCONSO.RRF");
                assert_eq!(*max_errors, 2);
            }
            other => panic!("expected ParseBudgetExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_pipe_parser_preserves_raw_record() {
        let line = concept_line("A1", "One");
        let input = format!("{line}\r\n");
        let records: Vec<_> = parse_concepts(&input, 0)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(records[0].raw_record(), line);
    }

    #[test]
    fn test_pipe_parser_strips_field_whitespace() {
        let input = "C0000039 |T109| A1.4.1.2.1 |Organic Chemical|AT123|\n";
        let records: Vec<SemanticTypeRecord> =
            PipeDelimitedParser::new(Cursor::new(input.to_string()), 0)
                .collect::<Result<Vec<_>, _>>()
                .unwrap();
        assert_eq!(records[0].cui, "C0000039");
        assert_eq!(records[0].stn, "A1.4.1.2.1");
    }

    #[test]
    fn test_names_parser_standard_header() {
        let input = "#CUI|name|source|suppress|\nC0000039|Name One|GTR|N|\n";
        let records: Vec<NameRecord> = NamesParser::new(Cursor::new(input.to_string()), 0)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cui, "C0000039");
        assert_eq!(records[0].name, "Name One");
    }

    #[test]
    fn test_names_parser_reordered_header() {
        let input = "#name|CUI|suppress|source|\nName One|C0000039|N|GTR|\n";
        let records: Vec<NameRecord> = NamesParser::new(Cursor::new(input.to_string()), 0)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(records[0].cui, "C0000039");
        assert_eq!(records[0].name, "Name One");
        assert_eq!(records[0].source, "GTR");
        assert_eq!(records[0].suppress, "N");
    }

    #[test]
    fn test_names_parser_counts_column_mismatches() {
        let input = "#CUI|name|source|suppress|\nC1|only|three\nC2|Good Name|GTR|N|\n";
        let records: Vec<NameRecord> = NamesParser::new(Cursor::new(input.to_string()), 1)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cui, "C2");
    }

    #[test]
    fn test_names_parser_missing_required_column() {
        let input = "#CUI|name|source|\nC1|N1|GTR|\n";
        let results: Vec<_> =
            NamesParser::new(Cursor::new(input.to_string()), 0).collect::<Vec<_>>();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(EtlError::ParseBudgetExceeded { .. })
        ));
    }

    #[test]
    fn test_hpo_parser_consumes_header() {
        let input = "#CUI\tSDUI\tHpoStr\tMedGenStr\tMedGenStr_SAB\tSTY\n\
                     C0000001\tHP:0000001\tAll\tAll\tGTR\tFinding\n";
        let records: Vec<HpoMappingRecord> =
            HpoMappingParser::new(Cursor::new(input.to_string()), 0)
                .collect::<Result<Vec<_>, _>>()
                .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sdui, "HP:0000001");
    }

    #[test]
    fn test_hpo_parser_headerless_input_replays_first_line() {
        let input = "C0000001\tHP:0000001\tAll\tAll\tGTR\tFinding\n\
                     C0000002\tHP:0000002\tTwo\tTwo\tGTR\tFinding\n";
        let records: Vec<HpoMappingRecord> =
            HpoMappingParser::new(Cursor::new(input.to_string()), 0)
                .collect::<Result<Vec<_>, _>>()
                .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cui, "C0000001");
    }

    #[test]
    fn test_hpo_parser_rejects_bad_column_count() {
        let input = "C0000001\tHP:0000001\tmissing\tcolumns\n";
        let results: Vec<_> =
            HpoMappingParser::new(Cursor::new(input.to_string()), 0).collect::<Vec<_>>();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(EtlError::ParseBudgetExceeded { .. })
        ));
    }

    #[test]
    fn test_parse_budget_counts() {
        let mut budget = ParseBudget::new("TEST", 1);
        assert!(budget.record(1, "bad").is_ok());
        assert_eq!(budget.errors_seen(), 1);
        assert!(budget.record(2, "bad again").is_err());
    }
}

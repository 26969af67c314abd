// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end tests of the extract side of the pipeline: typed parsing
//! composed with the COPY TEXT encoder, driven through the public API the
//! orchestrator uses. No database is required; the bulk channel's input
//! contract is asserted on the encoded byte lines themselves.

use std::io::Cursor;

use medgen_etl_domain::error::EtlError;
use medgen_etl_domain::records::{ConceptRecord, NameRecord, RrfRecord};
use medgen_etl_domain::services::tsv_encoder::stream_tsv;
use medgen_etl_domain::services::{NamesParser, PipeDelimitedParser};

fn mrconso_line(aui: &str, record_str: &str) -> String {
    format!(
        "C0000005|ENG|P|L0000005|PF|S0007492|Y|{aui}||M0019694|D012711|MSH|PEP|D012711|{record_str}|0|N||"
    )
}

fn encode_mrconso(input: String, max_errors: u64) -> Vec<Result<Vec<u8>, EtlError>> {
    stream_tsv(PipeDelimitedParser::<_, ConceptRecord>::new(
        Cursor::new(input),
        max_errors,
    ))
    .collect()
}

#[test]
fn full_load_batch_of_three_stages_three_lines() {
    let input = format!(
        "{}\n{}\n{}\n",
        mrconso_line("A1", "Record One"),
        mrconso_line("A2", "Record Two"),
        mrconso_line("A3", "Record Three"),
    );
    let lines: Vec<Vec<u8>> = encode_mrconso(input, 0)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(lines.len(), 3);
    for (line, aui) in lines.iter().zip(["A1", "A2", "A3"]) {
        let text = String::from_utf8(line.clone()).unwrap();
        assert!(text.contains(&format!("\t{aui}\t")));
        assert!(text.ends_with('\n'));
        // 18 schema fields + raw_record = 19 fields, 18 separators.
        assert_eq!(text.trim_end_matches('\n').split('\t').count(), 19);
    }
}

#[test]
fn raw_record_rides_along_byte_identical_modulo_scrubbing() {
    let line = mrconso_line("A1", "Record One");
    let lines: Vec<Vec<u8>> = encode_mrconso(format!("{line}\r\n"), 0)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    let text = String::from_utf8(lines[0].clone()).unwrap();
    let raw_field = text.trim_end_matches('\n').split('\t').last().unwrap();
    // The pipe-delimited original contains no TAB/LF, so it survives
    // exactly, with the line ending stripped.
    assert_eq!(raw_field, line);
}

#[test]
fn optional_empty_fields_become_null_sentinels() {
    let lines: Vec<Vec<u8>> = encode_mrconso(format!("{}\n", mrconso_line("A1", "One")), 0)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    let text = String::from_utf8(lines[0].clone()).unwrap();
    let fields: Vec<&str> = text.trim_end_matches('\n').split('\t').collect();
    // saui (index 8) and cvf (index 17) are empty in the fixture line.
    assert_eq!(fields[8], "\\N");
    assert_eq!(fields[17], "\\N");
}

#[test]
fn trailing_empty_columns_are_tolerated_but_short_rows_are_counted() {
    let good = mrconso_line("A1", "One");
    let input = format!("{good}||\nC1|short|row\n{good}\n");

    // Budget of one: the short row is skipped, both good rows survive.
    let results = encode_mrconso(input.clone(), 1);
    let ok: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
    assert_eq!(ok.len(), 2);

    // Budget of zero: the short row terminates the stream.
    let results = encode_mrconso(input, 0);
    assert!(matches!(
        results.last().unwrap(),
        Err(EtlError::ParseBudgetExceeded { .. })
    ));
}

#[test]
fn names_header_reordering_is_transparent_to_the_encoder() {
    let canonical = "#CUI|name|source|suppress|\nC0000039|Name One|GTR|N|\n";
    let reordered = "#suppress|source|name|CUI|\nN|GTR|Name One|C0000039|\n";

    let encode = |input: &str| -> Vec<String> {
        stream_tsv(NamesParser::new(Cursor::new(input.to_string()), 0))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
            .into_iter()
            .map(|b| String::from_utf8(b).unwrap())
            .collect()
    };

    let canonical_lines = encode(canonical);
    let reordered_lines = encode(reordered);

    // Identical domain fields; only raw_record differs with the layout.
    let strip_raw = |line: &str| {
        line.trim_end_matches('\n')
            .split('\t')
            .take(NameRecord::SCHEMA.len())
            .map(str::to_string)
            .collect::<Vec<_>>()
    };
    assert_eq!(strip_raw(&canonical_lines[0]), strip_raw(&reordered_lines[0]));
    assert_eq!(strip_raw(&canonical_lines[0]), vec!["C0000039", "Name One", "GTR", "N"]);
}

#[test]
fn parse_budget_exceeded_reports_the_file_and_budget() {
    let input = "x|y\nx|y\nx|y\n".to_string();
    let results = encode_mrconso(input, 2);
    match results.last().unwrap() {
        Err(EtlError::ParseBudgetExceeded { file, max_errors }) => {
            assert_eq!(file, ConceptRecord::FILE_NAME);
            assert_eq!(*max_errors, 2);
        }
        other => panic!("expected budget failure, got {other:?}"),
    }
}

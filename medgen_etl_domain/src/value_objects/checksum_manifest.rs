// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Checksum Manifest Value Object
//!
//! The publisher ships an `md5sum.txt`-style manifest of `<hex>  <filename>`
//! lines. This value object parses it, tolerates the `./` prefix some
//! manifests carry on filenames, and answers digest lookups for the
//! downloader. The digest algorithm is MD5 for compatibility with the
//! publisher's manifest, not for security.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::EtlError;

/// Mapping of source filename to expected hex digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChecksumManifest {
    entries: BTreeMap<String, String>,
}

impl ChecksumManifest {
    /// Parses manifest text.
    ///
    /// Lines that do not split into exactly two whitespace-separated parts
    /// are ignored, matching the tolerant behaviour expected of mirrors
    /// that append commentary to the file.
    pub fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in text.lines() {
            let mut parts = line.split_whitespace();
            if let (Some(digest), Some(name), None) = (parts.next(), parts.next(), parts.next()) {
                let name = name.strip_prefix("./").unwrap_or(name);
                entries.insert(name.to_string(), digest.to_ascii_lowercase());
            }
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, file: &str) -> Option<&str> {
        self.entries.get(file).map(String::as_str)
    }

    /// Looks up a digest, failing with `ChecksumMissingForFile` when the
    /// manifest has no entry for `file`.
    pub fn expect(&self, file: &str) -> Result<&str, EtlError> {
        self.get(file)
            .ok_or_else(|| EtlError::ChecksumMissingForFile(file.to_string()))
    }

    /// The manifest restricted to the given filenames, as stored in the
    /// audit log's `source_files` column.
    pub fn subset<'a, I: IntoIterator<Item = &'a str>>(&self, files: I) -> BTreeMap<String, String> {
        files
            .into_iter()
            .filter_map(|f| self.get(f).map(|d| (f.to_string(), d.to_string())))
            .collect()
    }
}

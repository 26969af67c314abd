// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Load Mode Value Object
//!
//! The ETL load strategy: a complete refresh via atomic table swap, or an
//! incremental delta apply with soft-delete semantics.
//!
//! The string forms (`"full"` / `"delta"`) are part of the external surface:
//! they appear on the command line and in the `load_mode` column of the
//! audit log, so `Display` and `FromStr` round-trip exactly.

use std::fmt;
use std::str::FromStr;

use crate::error::EtlError;

/// The ETL load strategy.
///
/// - `Full` replaces the production extent through a shadow table and an
///   atomic two-rename swap; history is not preserved.
/// - `Delta` diffs staging against production on the business key and
///   applies inserts, updates (including reactivations), and soft deletes
///   inside one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    #[default]
    Full,
    Delta,
}

impl LoadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadMode::Full => "full",
            LoadMode::Delta => "delta",
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadMode {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(LoadMode::Full),
            "delta" => Ok(LoadMode::Delta),
            other => Err(EtlError::invalid_config(format!(
                "Unknown load mode: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for mode in [LoadMode::Full, LoadMode::Delta] {
            assert_eq!(mode.to_string().parse::<LoadMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_default_is_full() {
        assert_eq!(LoadMode::default(), LoadMode::Full);
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!("incremental".parse::<LoadMode>().is_err());
        assert!("FULL".parse::<LoadMode>().is_err());
    }
}

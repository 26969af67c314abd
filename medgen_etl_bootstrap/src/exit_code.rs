// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Mapping
//!
//! The process contract is deliberately narrow: 0 on success, 1 on any
//! failure (missing DSN, download failure, parse budget, database error).
//! Whatever detail the failure carried has already been logged and written
//! to the audit log by the time the process exits.

use std::fmt;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Failure,
}

impl ExitCode {
    pub fn code(&self) -> u8 {
        match self {
            ExitCode::Success => 0,
            ExitCode::Failure => 1,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code())
    }
}

/// Classifies an application result as a process-level outcome.
pub fn classify<T, E>(result: &Result<T, E>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::Success,
        Err(_) => ExitCode::Failure,
    }
}

/// Maps an application result to the process exit code.
pub fn result_to_exit_code<T, E>(result: &Result<T, E>) -> std::process::ExitCode {
    classify(result).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Failure.code(), 1);
    }

    #[test]
    fn test_result_classification() {
        let ok: Result<(), String> = Ok(());
        let err: Result<(), String> = Err("boom".to_string());
        assert_eq!(classify(&ok), ExitCode::Success);
        assert_eq!(classify(&err), ExitCode::Failure);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::Failure.to_string(), "1");
    }
}

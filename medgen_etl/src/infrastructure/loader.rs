// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Loader Factory
//!
//! Selects the concrete [`NativeLoader`] implementation from the DSN
//! scheme. One dialect ships today (`postgres`/`postgresql`); anything
//! else is rejected with `UnsupportedScheme` before a connection is
//! attempted. The factory keeps the orchestrator free of dialect types -
//! it only ever sees the capability bundle.

pub mod postgres;

use medgen_etl_domain::error::EtlError;
use medgen_etl_domain::repositories::NativeLoader;

use postgres::PostgresNativeLoader;

/// Instantiates the appropriate native loader for a DSN.
///
/// # Errors
///
/// - `InvalidConfiguration` when the DSN carries no scheme
/// - `UnsupportedScheme` for any scheme other than PostgreSQL's
pub fn create_loader(db_dsn: &str) -> Result<Box<dyn NativeLoader>, EtlError> {
    let scheme = db_dsn
        .split_once("://")
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.is_empty())
        .ok_or_else(|| {
            EtlError::invalid_config("Could not parse database DSN: scheme is missing.")
        })?;

    match scheme {
        "postgres" | "postgresql" => Ok(Box::new(PostgresNativeLoader::new(db_dsn))),
        other => Err(EtlError::UnsupportedScheme(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_schemes_are_accepted() {
        assert!(create_loader("postgresql://user@localhost/medgen").is_ok());
        assert!(create_loader("postgres://user@localhost/medgen").is_ok());
    }

    #[test]
    fn test_unsupported_scheme_is_rejected() {
        let err = match create_loader("mysql://localhost/medgen") {
            Err(e) => e,
            Ok(_) => panic!("expected an error"),
        };
        assert!(matches!(err, EtlError::UnsupportedScheme(s) if s == "mysql"));
    }

    #[test]
    fn test_missing_scheme_is_rejected() {
        assert!(matches!(
            create_loader("localhost/medgen"),
            Err(EtlError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            create_loader("://localhost/medgen"),
            Err(EtlError::InvalidConfiguration(_))
        ));
    }
}

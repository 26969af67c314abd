// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Business Key Value Object
//!
//! One or more columns whose tuple identifies a logical record across loads,
//! distinct from the surrogate primary key. The CDC engine joins staging to
//! production on this tuple, so the value object also owns the predicate
//! fragments those statements are assembled from.
//!
//! Column names are always emitted double-quoted.

use crate::error::EtlError;

/// Validated tuple of business-key column names.
///
/// # Examples
///
/// ```
/// use medgen_etl_domain::value_objects::BusinessKey;
///
/// let key = BusinessKey::new(&["aui"]).unwrap();
/// assert_eq!(key.join_predicate("p", "s"), r#"p."aui" = s."aui""#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessKey {
    columns: Vec<String>,
}

impl BusinessKey {
    /// Creates a business key from column names.
    ///
    /// # Errors
    ///
    /// Returns `EtlError::InvalidConfiguration` when the list is empty or
    /// any column name is blank.
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Result<Self, EtlError> {
        let columns: Vec<String> = columns
            .iter()
            .map(|c| c.as_ref().trim().to_string())
            .collect();
        if columns.is_empty() {
            return Err(EtlError::invalid_config(
                "A business key requires at least one column",
            ));
        }
        if columns.iter().any(|c| c.is_empty()) {
            return Err(EtlError::invalid_config(
                "Business key column names must not be blank",
            ));
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Conjunction of equalities between two table aliases, e.g.
    /// `p."cui" = s."cui" AND p."aui" = s."aui"`.
    pub fn join_predicate(&self, left_alias: &str, right_alias: &str) -> String {
        self.columns
            .iter()
            .map(|c| format!(r#"{left_alias}."{c}" = {right_alias}."{c}""#))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Conjunction of IS NULL tests on one alias, used to detect the
    /// unmatched side of a left join.
    pub fn null_predicate(&self, alias: &str) -> String {
        self.columns
            .iter()
            .map(|c| format!(r#"{alias}."{c}" IS NULL"#))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_column_predicates() {
        let key = BusinessKey::new(&["aui"]).unwrap();
        assert_eq!(key.join_predicate("p", "s"), r#"p."aui" = s."aui""#);
        assert_eq!(key.null_predicate("s"), r#"s."aui" IS NULL"#);
    }

    #[test]
    fn test_composite_key_conjoins_all_columns() {
        let key = BusinessKey::new(&["cui", "sdui"]).unwrap();
        assert_eq!(
            key.join_predicate("s", "u"),
            r#"s."cui" = u."cui" AND s."sdui" = u."sdui""#
        );
        assert_eq!(
            key.null_predicate("s"),
            r#"s."cui" IS NULL AND s."sdui" IS NULL"#
        );
    }

    #[test]
    fn test_trims_whitespace() {
        let key = BusinessKey::new(&[" aui ", "cui"]).unwrap();
        assert_eq!(key.columns(), &["aui".to_string(), "cui".to_string()]);
        assert!(key.contains("aui"));
        assert!(!key.contains("atui"));
    }

    #[test]
    fn test_rejects_empty_and_blank() {
        assert!(BusinessKey::new::<&str>(&[]).is_err());
        assert!(BusinessKey::new(&["aui", "  "]).is_err());
    }
}

//! `OData` filter expressions.
//!
//! Filters are only constructible through [`ODataFilter::equals`], which escapes
//! the value, so caller-supplied text can never terminate the string literal
//! and inject further clauses.

use std::fmt;

use crate::{DirectoryError, DirectoryResult};

/// Escape a value for use inside an `OData` string literal.
///
/// `OData` string literals are enclosed in single quotes; an embedded single
/// quote is written as two single quotes.
#[must_use]
pub fn escape_odata_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// A server-side filter expression (`$filter`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ODataFilter(String);

impl ODataFilter {
    /// `attribute eq 'value'`, with `value` escaped.
    pub fn equals(attribute: &str, value: &str) -> DirectoryResult<Self> {
        validate_attribute(attribute)?;
        Ok(Self(format!(
            "{attribute} eq '{}'",
            escape_odata_string(value)
        )))
    }

    /// Conjunction of two filters.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self(format!("({}) and ({})", self.0, other.0))
    }

    /// The rendered expression, not yet URL-encoded.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ODataFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_attribute(attribute: &str) -> DirectoryResult<()> {
    let valid = !attribute.is_empty()
        && attribute
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '/' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(DirectoryError::InvalidInput(format!(
            "Invalid filter attribute: '{attribute}'"
        )))
    }
}

//! Identifier validation and quoting.
//!
//! Table and column names end up inside generated DDL and DML as quoted
//! identifiers (bind parameters cannot carry identifiers), so this module
//! is the injection barrier: nothing reaches a statement builder without
//! passing these checks first.

use crate::core::{DbError, ID_COLUMN, Result};

pub const MIN_NAME_LEN: usize = 3;
pub const MAX_NAME_LEN: usize = 63;
pub const MAX_FRIENDLY_NAME_LEN: usize = 255;

/// Prefixes reserved for the storage system and for internal tables.
const RESERVED_PREFIXES: [&str; 2] = ["pg_", "app_"];

/// Validates a table name: 3-63 chars of `[a-z0-9_]`, at least one
/// underscore, no reserved prefix.
pub fn validate_table_name(name: &str) -> Result<()> {
    validate_identifier(name)
}

/// Validates a caller-supplied column name. Same rule as table names, plus
/// `id` is reserved for the implicit primary key.
pub fn validate_column_name(name: &str) -> Result<()> {
    if name.eq_ignore_ascii_case(ID_COLUMN) {
        return Err(DbError::NamingViolation(
            name.to_string(),
            "'id' is reserved for the auto-generated primary key".to_string(),
        ));
    }
    validate_identifier(name)
}

/// Friendly names are display-only and never become identifiers; only the
/// length is capped.
pub fn validate_friendly_name(name: &str) -> Result<()> {
    if name.chars().count() > MAX_FRIENDLY_NAME_LEN {
        return Err(DbError::NamingViolation(
            name.chars().take(32).collect(),
            format!("friendly name exceeds {} characters", MAX_FRIENDLY_NAME_LEN),
        ));
    }
    Ok(())
}

fn validate_identifier(name: &str) -> Result<()> {
    if name.len() < MIN_NAME_LEN || name.len() > MAX_NAME_LEN {
        return Err(DbError::NamingViolation(
            name.to_string(),
            format!(
                "must be {} to {} characters long",
                MIN_NAME_LEN, MAX_NAME_LEN
            ),
        ));
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_'))
    {
        return Err(DbError::NamingViolation(
            name.to_string(),
            format!(
                "may only contain lowercase letters, digits and underscores (found '{}')",
                bad
            ),
        ));
    }

    if !name.contains('_') {
        return Err(DbError::NamingViolation(
            name.to_string(),
            "must contain at least one underscore".to_string(),
        ));
    }

    for prefix in RESERVED_PREFIXES {
        if name.starts_with(prefix) {
            return Err(DbError::NamingViolation(
                name.to_string(),
                format!("prefix '{}' is reserved", prefix),
            ));
        }
    }

    Ok(())
}

/// Quotes an identifier for interpolation into SQL, doubling any embedded
/// quote characters.
pub fn quote_ident(ident: &str) -> String {
    let escaped = ident.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

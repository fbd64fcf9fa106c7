use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DbError, Result};

/// Name of the implicit primary-key column every table gets.
pub const ID_COLUMN: &str = "id";

/// The closed set of logical column types callers may use. Each maps to
/// exactly one physical storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Text,
    Integer,
    BigInt,
    Decimal,
    Boolean,
    Date,
    Timestamp,
}

impl ColumnType {
    /// Resolves a caller-supplied type name, case-insensitively.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "TEXT" => Ok(Self::Text),
            "INTEGER" => Ok(Self::Integer),
            "BIGINT" => Ok(Self::BigInt),
            "DECIMAL" => Ok(Self::Decimal),
            "BOOLEAN" => Ok(Self::Boolean),
            "DATE" => Ok(Self::Date),
            "TIMESTAMP" => Ok(Self::Timestamp),
            _ => Err(DbError::UnsupportedType(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Decimal => "DECIMAL",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
        }
    }

    /// Physical storage type for a regular column of this logical type.
    /// The implicit primary key does not use this (it is BIGSERIAL).
    pub fn physical_type(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Decimal => "DECIMAL",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    /// Derived from `column_type` (or BIGSERIAL for the primary key),
    /// never taken from the caller.
    pub physical_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            physical_type: column_type.physical_type().to_string(),
            nullable,
            primary_key: false,
        }
    }

    /// The implicit `id` column: auto-incrementing BIGINT, not null, primary key.
    pub fn primary_key_id() -> Self {
        Self {
            name: ID_COLUMN.to_string(),
            column_type: ColumnType::BigInt,
            physical_type: "BIGSERIAL".to_string(),
            nullable: false,
            primary_key: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    pub name: String,
    pub friendly_name: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Definition order is physical column order; `id` is always first.
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn new(
        name: impl Into<String>,
        friendly_name: Option<String>,
        columns: Vec<ColumnDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            friendly_name,
            created_at: Utc::now(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns a caller may write to, in definition order (everything but
    /// the primary key).
    pub fn data_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| !c.primary_key)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            name: self.name.clone(),
            friendly_name: self.friendly_name.clone(),
            column_count: self.columns.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub name: String,
    pub friendly_name: Option<String>,
    pub column_count: usize,
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid name '{0}': {1}")]
    NamingViolation(String, String),

    #[error("Unsupported column type: {0}")]
    UnsupportedType(String),

    #[error("Table '{0}' already exists")]
    DuplicateTable(String),

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Row with id {1} not found in table '{0}'")]
    RowNotFound(String, i64),

    #[error("Column '{0}' does not exist in table '{1}'")]
    UnknownColumn(String, String),

    #[error("Column '{0}' is required and cannot be null")]
    RequiredColumnMissing(String),

    #[error("Type mismatch for column '{0}': expected {1}, got {2}")]
    TypeMismatch(String, String, String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl DbError {
    /// True for the kinds caused by bad caller input rather than engine state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NamingViolation(..)
                | Self::UnsupportedType(..)
                | Self::DuplicateColumn(..)
                | Self::UnknownColumn(..)
                | Self::RequiredColumnMissing(..)
                | Self::TypeMismatch(..)
        )
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

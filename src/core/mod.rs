pub mod error;
pub mod types;
pub mod value;

pub use error::{DbError, Result};
pub use types::{ColumnDefinition, ColumnType, ID_COLUMN, TableDefinition, TableSummary};
pub use value::Value;

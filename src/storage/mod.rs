//! Storage backend abstraction and the embedded in-memory implementation.
//!
//! The engine talks to physical storage through [`SqlBackend`] only:
//! statements as text with quoted identifiers, values as bound parameters.
//! [`MemoryBackend`] executes the exact statement shapes the engine
//! generates against in-memory tables, which keeps the whole stack
//! runnable without an external database.

mod memory;
mod sql;
mod table;

pub use memory::MemoryBackend;
pub use sql::{SqlCommand, parse_command};
pub use table::{PhysicalType, StoredColumn, StoredTable};

use async_trait::async_trait;

use crate::core::{Result, Value};

/// Rows from a query: column names once, then values per row in the same
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
pub trait SqlBackend: Send + Sync {
    /// Runs a DDL statement. No parameters; DDL carries identifiers only.
    async fn execute_ddl(&self, sql: &str) -> Result<()>;

    /// Runs a mutating statement, returning the number of affected rows.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Runs a row-returning statement. `INSERT ... RETURNING` goes through
    /// here as well.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;
}

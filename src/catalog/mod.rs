//! Schema catalog: the durable record of every runtime-defined table.
//!
//! Physical storage and the catalog must never drift apart; the catalog is
//! the authority on which tables exist and what their columns are.

mod memory;

pub use memory::MemoryCatalog;

use async_trait::async_trait;

use crate::core::{Result, TableDefinition};

#[async_trait]
pub trait TableCatalog: Send + Sync {
    /// Registers a definition and stamps its creation time. The uniqueness
    /// check and the insert are one atomic step: of two concurrent calls
    /// with the same name, exactly one succeeds and the other gets
    /// `DuplicateTable`.
    async fn create(&self, def: TableDefinition) -> Result<TableDefinition>;

    async fn find_by_name(&self, name: &str) -> Result<Option<TableDefinition>>;

    async fn exists_by_name(&self, name: &str) -> Result<bool>;

    async fn find_all(&self) -> Result<Vec<TableDefinition>>;
}

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::TableCatalog;
use crate::core::{DbError, Result, TableDefinition};

/// In-memory catalog. Uniqueness is enforced inside the write section, so
/// it doubles as the constraint that settles concurrent create races.
pub struct MemoryCatalog {
    tables: RwLock<HashMap<String, TableDefinition>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TableCatalog for MemoryCatalog {
    async fn create(&self, mut def: TableDefinition) -> Result<TableDefinition> {
        let mut tables = self.tables.write().await;

        if tables.contains_key(&def.name) {
            return Err(DbError::DuplicateTable(def.name));
        }

        def.created_at = Utc::now();
        tables.insert(def.name.clone(), def.clone());
        Ok(def)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<TableDefinition>> {
        let tables = self.tables.read().await;
        Ok(tables.get(name).cloned())
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.contains_key(name))
    }

    async fn find_all(&self) -> Result<Vec<TableDefinition>> {
        let tables = self.tables.read().await;
        Ok(tables.values().cloned().collect())
    }
}

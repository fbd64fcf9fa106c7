use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::sql::{SqlCommand, parse_command};
use super::table::StoredTable;
use super::{QueryResult, SqlBackend};
use crate::core::{DbError, Result, Value};

/// Embedded storage backend. Each statement runs under one lock section,
/// which gives the single-statement isolation the engine relies on.
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, StoredTable>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_table(name: &str) -> DbError {
    DbError::StorageFailure(format!("relation \"{}\" does not exist", name))
}

#[async_trait]
impl SqlBackend for MemoryBackend {
    async fn execute_ddl(&self, sql: &str) -> Result<()> {
        let SqlCommand::CreateTable {
            table,
            columns,
            if_not_exists,
        } = parse_command(sql, &[])?
        else {
            return Err(DbError::StorageFailure(
                "only CREATE TABLE may run as DDL".to_string(),
            ));
        };

        let mut tables = self.tables.write().await;
        if tables.contains_key(&table) {
            if if_not_exists {
                debug!(table = %table, "table already exists, DDL skipped");
                return Ok(());
            }
            return Err(DbError::StorageFailure(format!(
                "relation \"{}\" already exists",
                table
            )));
        }

        debug!(table = %table, columns = columns.len(), "creating physical table");
        tables.insert(table, StoredTable::new(columns));
        Ok(())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        match parse_command(sql, params)? {
            SqlCommand::Insert {
                table,
                columns,
                values,
                ..
            } => {
                let mut tables = self.tables.write().await;
                let stored = tables.get_mut(&table).ok_or_else(|| missing_table(&table))?;
                stored.insert(&columns, &values)?;
                Ok(1)
            }
            SqlCommand::Update {
                table,
                assignments,
                id,
            } => {
                let mut tables = self.tables.write().await;
                let stored = tables.get_mut(&table).ok_or_else(|| missing_table(&table))?;
                stored.update(&assignments, id)
            }
            SqlCommand::Delete { table, id } => {
                let mut tables = self.tables.write().await;
                let stored = tables.get_mut(&table).ok_or_else(|| missing_table(&table))?;
                Ok(stored.delete(id))
            }
            _ => Err(DbError::StorageFailure(
                "statement does not mutate rows, use query or execute_ddl".to_string(),
            )),
        }
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        match parse_command(sql, params)? {
            SqlCommand::Select {
                table,
                count_only,
                filter_id,
                limit,
                offset,
            } => {
                let tables = self.tables.read().await;
                let stored = tables.get(&table).ok_or_else(|| missing_table(&table))?;

                if count_only {
                    return Ok(QueryResult {
                        columns: vec!["count".to_string()],
                        rows: vec![vec![Value::Integer(stored.row_count() as i64)]],
                    });
                }

                let rows = match filter_id {
                    Some(id) => stored.get(id).cloned().into_iter().collect(),
                    None => stored.scan(limit, offset),
                };
                Ok(QueryResult {
                    columns: stored.column_names(),
                    rows,
                })
            }
            SqlCommand::Insert {
                table,
                columns,
                values,
                returning_id,
            } => {
                if !returning_id {
                    return Err(DbError::StorageFailure(
                        "INSERT without RETURNING must run via execute".to_string(),
                    ));
                }
                let mut tables = self.tables.write().await;
                let stored = tables.get_mut(&table).ok_or_else(|| missing_table(&table))?;
                let id = stored.insert(&columns, &values)?;
                Ok(QueryResult {
                    columns: vec!["id".to_string()],
                    rows: vec![vec![Value::Integer(id)]],
                })
            }
            _ => Err(DbError::StorageFailure(
                "statement returns no rows, use execute".to_string(),
            )),
        }
    }
}

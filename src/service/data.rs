//! Generic data engine: CRUD against any catalog-registered table.
//!
//! Every operation resolves the table definition from the catalog before
//! any SQL runs, so a name that is not registered can never reach the
//! backend. Values are validated against the definition and then bound as
//! parameters; the statement text never contains caller data.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::debug;

use super::convert;
use super::page::{DEFAULT_MAX_PAGE_SIZE, RowPage};
use crate::catalog::TableCatalog;
use crate::core::{DbError, ID_COLUMN, Result, TableDefinition, Value};
use crate::sqlgen::{
    DeleteStatementBuilder, InsertStatementBuilder, UpdateStatementBuilder, select_by_id,
    select_count, select_page,
};
use crate::storage::{QueryResult, SqlBackend};

/// A row as callers see it: column name to JSON value, in column order
/// (`id` first) for reads and in caller order for writes.
pub type Row = serde_json::Map<String, JsonValue>;

#[derive(Clone)]
pub struct DataService {
    backend: Arc<dyn SqlBackend>,
    catalog: Arc<dyn TableCatalog>,
    max_page_size: u64,
}

impl DataService {
    pub fn new(backend: Arc<dyn SqlBackend>, catalog: Arc<dyn TableCatalog>) -> Self {
        Self::with_max_page_size(backend, catalog, DEFAULT_MAX_PAGE_SIZE)
    }

    pub fn with_max_page_size(
        backend: Arc<dyn SqlBackend>,
        catalog: Arc<dyn TableCatalog>,
        max_page_size: u64,
    ) -> Self {
        Self {
            backend,
            catalog,
            max_page_size,
        }
    }

    async fn resolve(&self, table_name: &str) -> Result<TableDefinition> {
        self.catalog
            .find_by_name(table_name)
            .await?
            .ok_or_else(|| DbError::TableNotFound(table_name.to_string()))
    }

    /// Inserts one row. Supplied keys must name writable columns; every
    /// non-nullable column needs a non-null value. Returns the generated
    /// id followed by the supplied values, in supplied order.
    pub async fn insert(&self, table_name: &str, values: Row) -> Result<Row> {
        let def = self.resolve(table_name).await?;

        bind_required(&def, &values)?;
        let bound = bind_provided(&def, &values)?;

        let columns: Vec<String> = bound.iter().map(|(name, _)| name.clone()).collect();
        let params: Vec<Value> = bound.into_iter().map(|(_, value)| value).collect();

        let sql = InsertStatementBuilder::new(&def.name)
            .columns(columns)
            .build();
        let result = self.backend.query(&sql, &params).await?;
        let id = generated_id(&result)?;

        debug!(table = %def.name, id, "row inserted");

        let mut row = Row::new();
        row.insert(ID_COLUMN.to_string(), JsonValue::from(id));
        row.extend(values);
        Ok(row)
    }

    /// One page of rows in id order. The size is silently capped at the
    /// configured maximum and raised to at least one.
    pub async fn get_paginated(&self, table_name: &str, page: u64, size: u64) -> Result<RowPage> {
        let def = self.resolve(table_name).await?;

        let clamped = size.clamp(1, self.max_page_size);
        let offset = page.saturating_mul(clamped).min(i64::MAX as u64);

        let result = self
            .backend
            .query(
                &select_page(&def.name),
                &[Value::Integer(clamped as i64), Value::Integer(offset as i64)],
            )
            .await?;

        let count = self.backend.query(&select_count(&def.name), &[]).await?;
        let total = count
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(Value::as_i64)
            .ok_or_else(|| DbError::StorageFailure("COUNT returned no value".to_string()))?;

        let QueryResult { columns, rows } = result;
        let content = rows
            .into_iter()
            .map(|row| to_row_map(&columns, row))
            .collect();

        Ok(RowPage::new(content, page, clamped, total as u64))
    }

    pub async fn get_by_id(&self, table_name: &str, id: i64) -> Result<Row> {
        let def = self.resolve(table_name).await?;
        self.fetch_row(&def, id).await
    }

    /// Partial update by provided keys; omitted columns stay untouched.
    /// An empty body changes nothing and returns the current row.
    pub async fn update(&self, table_name: &str, id: i64, values: Row) -> Result<Row> {
        let def = self.resolve(table_name).await?;

        // Existence first: a missing row is RowNotFound even when the
        // body would also fail validation.
        self.fetch_row(&def, id).await?;

        let bound = bind_provided(&def, &values)?;
        if !bound.is_empty() {
            let columns: Vec<String> = bound.iter().map(|(name, _)| name.clone()).collect();
            let mut params: Vec<Value> = bound.into_iter().map(|(_, value)| value).collect();
            params.push(Value::Integer(id));

            let sql = UpdateStatementBuilder::new(&def.name)
                .columns(columns)
                .build();
            let affected = self.backend.execute(&sql, &params).await?;
            if affected == 0 {
                // Deleted between the check and the update; no transaction
                // spans the two statements.
                return Err(DbError::RowNotFound(def.name.clone(), id));
            }
            debug!(table = %def.name, id, "row updated");
        }

        self.fetch_row(&def, id).await
    }

    pub async fn delete_by_id(&self, table_name: &str, id: i64) -> Result<()> {
        let def = self.resolve(table_name).await?;

        let sql = DeleteStatementBuilder::new(&def.name).build();
        let affected = self.backend.execute(&sql, &[Value::Integer(id)]).await?;
        if affected == 0 {
            return Err(DbError::RowNotFound(def.name.clone(), id));
        }

        debug!(table = %def.name, id, "row deleted");
        Ok(())
    }

    async fn fetch_row(&self, def: &TableDefinition, id: i64) -> Result<Row> {
        let result = self
            .backend
            .query(&select_by_id(&def.name), &[Value::Integer(id)])
            .await?;

        let QueryResult { columns, rows } = result;
        match rows.into_iter().next() {
            Some(row) => Ok(to_row_map(&columns, row)),
            None => Err(DbError::RowNotFound(def.name.clone(), id)),
        }
    }
}

/// Checks every supplied key and value: the key must name a writable
/// column, a null is only allowed where the column is nullable, and the
/// value must match the column's logical type. Returns bind pairs in
/// supplied order.
fn bind_provided(def: &TableDefinition, values: &Row) -> Result<Vec<(String, Value)>> {
    let mut bound = Vec::with_capacity(values.len());

    for (key, json) in values {
        let column = def
            .column(key)
            .filter(|c| !c.primary_key)
            .ok_or_else(|| DbError::UnknownColumn(key.clone(), def.name.clone()))?;

        if json.is_null() {
            if !column.nullable {
                return Err(DbError::RequiredColumnMissing(key.clone()));
            }
            bound.push((key.clone(), Value::Null));
        } else {
            bound.push((key.clone(), convert::coerce(column, json)?));
        }
    }

    Ok(bound)
}

/// Insert-only rule: every non-nullable writable column must be supplied
/// with a non-null value.
fn bind_required(def: &TableDefinition, values: &Row) -> Result<()> {
    for column in def.data_columns() {
        if !column.nullable {
            let missing = match values.get(&column.name) {
                None => true,
                Some(value) => value.is_null(),
            };
            if missing {
                return Err(DbError::RequiredColumnMissing(column.name.clone()));
            }
        }
    }
    Ok(())
}

fn generated_id(result: &QueryResult) -> Result<i64> {
    result
        .rows
        .first()
        .and_then(|row| row.first())
        .and_then(Value::as_i64)
        .ok_or_else(|| DbError::StorageFailure("INSERT returned no generated key".to_string()))
}

fn to_row_map(columns: &[String], row: Vec<Value>) -> Row {
    columns
        .iter()
        .cloned()
        .zip(row.into_iter().map(|value| value.to_json()))
        .collect()
}

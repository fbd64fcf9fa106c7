//! Schema compilation: from caller-supplied table descriptions to physical
//! DDL plus a catalog entry.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info};

use crate::catalog::TableCatalog;
use crate::core::{
    ColumnDefinition, ColumnType, DbError, Result, TableDefinition, TableSummary,
};
use crate::naming;
use crate::sqlgen::CreateTableBuilder;
use crate::storage::SqlBackend;

fn default_nullable() -> bool {
    true
}

/// One column as the caller describes it. The type arrives as a string and
/// is resolved case-insensitively against the supported set.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest {
    pub name: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    pub columns: Vec<ColumnSpec>,
}

#[derive(Clone)]
pub struct SchemaService {
    backend: Arc<dyn SqlBackend>,
    catalog: Arc<dyn TableCatalog>,
}

impl SchemaService {
    pub fn new(backend: Arc<dyn SqlBackend>, catalog: Arc<dyn TableCatalog>) -> Self {
        Self { backend, catalog }
    }

    /// Validates the request, creates the physical table, then registers
    /// the definition in the catalog.
    ///
    /// The two mutations are not one transaction. DDL failure leaves no
    /// catalog entry. If the catalog write fails after the DDL succeeded,
    /// the physical table exists unregistered until a retry; the DDL is
    /// idempotent (`IF NOT EXISTS`), so retrying the same request heals
    /// the gap.
    pub async fn create_table(&self, request: CreateTableRequest) -> Result<TableDefinition> {
        naming::validate_table_name(&request.name)?;
        if let Some(friendly) = &request.friendly_name {
            naming::validate_friendly_name(friendly)?;
        }

        // Fast pre-check; the race with a concurrent create is settled by
        // the catalog's uniqueness constraint below, not here.
        if self.catalog.exists_by_name(&request.name).await? {
            return Err(DbError::DuplicateTable(request.name));
        }

        let columns = compile_columns(&request.name, &request.columns)?;
        let def = TableDefinition::new(request.name, request.friendly_name, columns);

        let ddl = CreateTableBuilder::from_definition(&def).build();
        self.backend.execute_ddl(&ddl).await?;

        let def = match self.catalog.create(def).await {
            Ok(def) => def,
            Err(DbError::DuplicateTable(name)) => {
                // A concurrent create won between our pre-check and the
                // catalog write. The physical DDL was a no-op for it.
                return Err(DbError::DuplicateTable(name));
            }
            Err(err) => {
                error!(
                    error = %err,
                    "catalog registration failed after DDL; physical table \
                     is unregistered until the request is retried"
                );
                return Err(err);
            }
        };

        info!(
            table = %def.name,
            columns = def.column_count(),
            "table created"
        );
        Ok(def)
    }

    pub async fn get_table_schema(&self, name: &str) -> Result<TableDefinition> {
        self.catalog
            .find_by_name(name)
            .await?
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub async fn list_table_summaries(&self) -> Result<Vec<TableSummary>> {
        let defs = self.catalog.find_all().await?;
        Ok(defs.iter().map(TableDefinition::summary).collect())
    }
}

fn compile_columns(table_name: &str, specs: &[ColumnSpec]) -> Result<Vec<ColumnDefinition>> {
    if specs.is_empty() {
        return Err(DbError::NamingViolation(
            table_name.to_string(),
            "a table must define at least one column".to_string(),
        ));
    }

    let mut columns = Vec::with_capacity(specs.len() + 1);
    columns.push(ColumnDefinition::primary_key_id());

    let mut seen: HashSet<&str> = HashSet::new();
    for spec in specs {
        naming::validate_column_name(&spec.name)?;
        let column_type = ColumnType::parse(&spec.column_type)?;
        if !seen.insert(spec.name.as_str()) {
            return Err(DbError::DuplicateColumn(spec.name.clone()));
        }
        columns.push(ColumnDefinition::new(&spec.name, column_type, spec.nullable));
    }

    Ok(columns)
}

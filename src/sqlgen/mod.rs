//! SQL statement builders.
//!
//! Every statement the engine runs is produced here. Identifiers are
//! validated upstream and interpolated as quoted identifiers; values never
//! appear in statement text, only as `$n` placeholders bound at execution.

use crate::core::{ID_COLUMN, TableDefinition};
use crate::naming::quote_ident;

/// Builder for CREATE TABLE DDL.
pub struct CreateTableBuilder {
    table_name: String,
    columns: Vec<(String, String, bool, bool)>, // (name, physical type, nullable, primary key)
}

impl CreateTableBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    pub fn add_column(
        mut self,
        name: impl Into<String>,
        physical_type: impl Into<String>,
        nullable: bool,
        primary_key: bool,
    ) -> Self {
        self.columns
            .push((name.into(), physical_type.into(), nullable, primary_key));
        self
    }

    pub fn from_definition(def: &TableDefinition) -> Self {
        let mut builder = Self::new(&def.name);
        for column in &def.columns {
            builder = builder.add_column(
                &column.name,
                &column.physical_type,
                column.nullable,
                column.primary_key,
            );
        }
        builder
    }

    /// Emits `CREATE TABLE IF NOT EXISTS`; re-running the same DDL after a
    /// partial create is safe.
    pub fn build(self) -> String {
        let column_defs: Vec<String> = self
            .columns
            .iter()
            .map(|(name, ptype, nullable, pk)| {
                let mut def = format!("{} {}", quote_ident(name), ptype);
                if !nullable {
                    def.push_str(" NOT NULL");
                }
                if *pk {
                    def.push_str(" PRIMARY KEY");
                }
                def
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.table_name),
            column_defs.join(", ")
        )
    }
}

/// Builder for single-row INSERT statements returning the generated id.
pub struct InsertStatementBuilder {
    table_name: String,
    columns: Vec<String>,
}

impl InsertStatementBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn build(self) -> String {
        if self.columns.is_empty() {
            // Every caller column is nullable and none was supplied.
            return format!(
                "INSERT INTO {} DEFAULT VALUES RETURNING {}",
                quote_ident(&self.table_name),
                quote_ident(ID_COLUMN)
            );
        }

        let cols: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        let placeholders: Vec<String> =
            (1..=self.columns.len()).map(|i| format!("${}", i)).collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quote_ident(&self.table_name),
            cols.join(", "),
            placeholders.join(", "),
            quote_ident(ID_COLUMN)
        )
    }
}

/// Builder for UPDATE-by-id statements. The id placeholder comes last,
/// after one placeholder per updated column.
pub struct UpdateStatementBuilder {
    table_name: String,
    columns: Vec<String>,
}

impl UpdateStatementBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn build(self) -> String {
        let set_parts: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{} = ${}", quote_ident(col), i + 1))
            .collect();

        format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            quote_ident(&self.table_name),
            set_parts.join(", "),
            quote_ident(ID_COLUMN),
            self.columns.len() + 1
        )
    }
}

/// Builder for DELETE-by-id statements.
pub struct DeleteStatementBuilder {
    table_name: String,
}

impl DeleteStatementBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }

    pub fn build(self) -> String {
        format!(
            "DELETE FROM {} WHERE {} = $1",
            quote_ident(&self.table_name),
            quote_ident(ID_COLUMN)
        )
    }
}

/// `SELECT * ... ORDER BY "id" ASC LIMIT $1 OFFSET $2` for one page.
pub fn select_page(table_name: &str) -> String {
    format!(
        "SELECT * FROM {} ORDER BY {} ASC LIMIT $1 OFFSET $2",
        quote_ident(table_name),
        quote_ident(ID_COLUMN)
    )
}

pub fn select_count(table_name: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_ident(table_name))
}

pub fn select_by_id(table_name: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} = $1",
        quote_ident(table_name),
        quote_ident(ID_COLUMN)
    )
}

use std::collections::BTreeMap;

use crate::core::{DbError, Result, Value};

/// Physical column types the backend understands. These are the storage
/// equivalents of the logical types the engine compiles, plus the
/// auto-incrementing key type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalType {
    Text,
    Integer,
    BigInt,
    BigSerial,
    Decimal,
    Boolean,
    Date,
    Timestamp,
}

impl PhysicalType {
    /// Compatibility at the storage level. Null is governed by the
    /// NOT NULL constraint, not here.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Text | Self::Date | Self::Timestamp, Value::Text(_)) => true,
            (Self::Integer | Self::BigInt | Self::BigSerial, Value::Integer(_)) => true,
            (Self::Decimal, Value::Integer(_) | Value::Float(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::BigSerial => "BIGSERIAL",
            Self::Decimal => "DECIMAL",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredColumn {
    pub name: String,
    pub physical: PhysicalType,
    pub nullable: bool,
    pub primary_key: bool,
}

/// One physical table: fixed columns, rows keyed by the generated id.
/// BTreeMap keeps scans in id order, which is the only ordering the
/// engine ever asks for.
#[derive(Debug, Clone)]
pub struct StoredTable {
    columns: Vec<StoredColumn>,
    rows: BTreeMap<i64, Vec<Value>>,
    next_id: i64,
}

impl StoredTable {
    pub fn new(columns: Vec<StoredColumn>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn columns(&self) -> &[StoredColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| {
                DbError::StorageFailure(format!("column \"{}\" does not exist", name))
            })
    }

    fn check_constraints(&self, column: &StoredColumn, value: &Value) -> Result<()> {
        if value.is_null() {
            if !column.nullable {
                return Err(DbError::StorageFailure(format!(
                    "null value in column \"{}\" violates not-null constraint",
                    column.name
                )));
            }
            return Ok(());
        }
        if !column.physical.accepts(value) {
            return Err(DbError::StorageFailure(format!(
                "column \"{}\" is of type {} but expression is of type {}",
                column.name,
                column.physical.as_str(),
                value.type_name()
            )));
        }
        Ok(())
    }

    /// Inserts one row from `(column, value)` pairs; omitted columns are
    /// null. The serial key is assigned here and returned.
    pub fn insert(&mut self, columns: &[String], values: &[Value]) -> Result<i64> {
        let mut row: Vec<Value> = vec![Value::Null; self.columns.len()];

        for (name, value) in columns.iter().zip(values.iter()) {
            let idx = self.column_index(name)?;
            self.check_constraints(&self.columns[idx], value)?;
            row[idx] = value.clone();
        }

        let id = self.next_id;
        self.next_id += 1;

        for (idx, column) in self.columns.iter().enumerate() {
            if column.primary_key {
                row[idx] = Value::Integer(id);
            } else if row[idx].is_null() && !column.nullable {
                return Err(DbError::StorageFailure(format!(
                    "null value in column \"{}\" violates not-null constraint",
                    column.name
                )));
            }
        }

        self.rows.insert(id, row);
        Ok(id)
    }

    pub fn get(&self, id: i64) -> Option<&Vec<Value>> {
        self.rows.get(&id)
    }

    /// Rows in id order, honoring an optional window.
    pub fn scan(&self, limit: Option<u64>, offset: Option<u64>) -> Vec<Vec<Value>> {
        let offset = offset.unwrap_or(0) as usize;
        let limit = limit.map(|l| l as usize).unwrap_or(usize::MAX);
        self.rows
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Applies assignments to the row with the given id. Returns the
    /// affected-row count (0 when the id is absent).
    pub fn update(&mut self, assignments: &[(String, Value)], id: i64) -> Result<u64> {
        let mut staged = Vec::with_capacity(assignments.len());
        for (name, value) in assignments {
            let idx = self.column_index(name)?;
            self.check_constraints(&self.columns[idx], value)?;
            staged.push((idx, value.clone()));
        }

        match self.rows.get_mut(&id) {
            Some(row) => {
                for (idx, value) in staged {
                    row[idx] = value;
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    pub fn delete(&mut self, id: i64) -> u64 {
        if self.rows.remove(&id).is_some() { 1 } else { 0 }
    }
}

//! flexdb: a dynamic-schema engine.
//!
//! Tables are defined at runtime from caller-supplied column specs. The
//! engine validates the definition, generates the DDL, registers the
//! schema in a catalog, and serves generic CRUD against any registered
//! table with fully parameterized SQL. An HTTP layer exposes the same
//! operations as a JSON API.

pub mod catalog;
pub mod config;
pub mod core;
pub mod naming;
pub mod service;
pub mod sqlgen;
pub mod storage;
pub mod web;

pub use catalog::{MemoryCatalog, TableCatalog};
pub use config::AppConfig;
pub use core::{ColumnDefinition, ColumnType, DbError, Result, TableDefinition, TableSummary};
pub use service::{DataService, Row, RowPage, SchemaService};
pub use storage::{MemoryBackend, SqlBackend};
pub use web::{AppState, build_router};

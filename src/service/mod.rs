//! Schema and data services: the operations the HTTP layer exposes.

pub mod convert;
pub mod data;
pub mod page;
pub mod schema;

pub use data::{DataService, Row};
pub use page::{DEFAULT_MAX_PAGE_SIZE, RowPage};
pub use schema::{ColumnSpec, CreateTableRequest, SchemaService};

//! HTTP surface: routing, handlers, and error rendering over the schema
//! and data services.

mod error;
mod handlers;

pub use error::{ApiError, ErrorBody};
pub use handlers::PageParams;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::service::{DataService, SchemaService};

#[derive(Clone)]
pub struct AppState {
    pub schema: SchemaService,
    pub data: DataService,
}

impl AppState {
    pub fn new(schema: SchemaService, data: DataService) -> Self {
        Self { schema, data }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/tables",
            post(handlers::create_table).get(handlers::list_tables),
        )
        .route("/api/tables/:table/schema", get(handlers::get_table_schema))
        .route(
            "/api/tables/:table/rows",
            post(handlers::insert_row).get(handlers::list_rows),
        )
        .route(
            "/api/tables/:table/rows/:id",
            get(handlers::get_row)
                .put(handlers::update_row)
                .delete(handlers::delete_row),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

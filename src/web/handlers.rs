use axum::Json;
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::core::{TableDefinition, TableSummary};
use crate::naming::MAX_FRIENDLY_NAME_LEN;
use crate::service::{CreateTableRequest, Row, RowPage};

use super::AppState;
use super::error::ApiError;

type HandlerResult<T> = Result<T, ApiError>;

fn default_page_size() -> u64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
}

pub async fn create_table(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(payload): Json<CreateTableRequest>,
) -> HandlerResult<(StatusCode, Json<TableDefinition>)> {
    validate_create_request(&payload).map_err(|reason| ApiError::bad_request(reason, uri.path()))?;

    let def = state
        .schema
        .create_table(payload)
        .await
        .map_err(|err| ApiError::new(err, uri.path()))?;

    Ok((StatusCode::CREATED, Json(def)))
}

pub async fn list_tables(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> HandlerResult<Json<Vec<TableSummary>>> {
    let summaries = state
        .schema
        .list_table_summaries()
        .await
        .map_err(|err| ApiError::new(err, uri.path()))?;

    Ok(Json(summaries))
}

pub async fn get_table_schema(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(table): Path<String>,
) -> HandlerResult<Json<TableDefinition>> {
    let def = state
        .schema
        .get_table_schema(&table)
        .await
        .map_err(|err| ApiError::new(err, uri.path()))?;

    Ok(Json(def))
}

pub async fn insert_row(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(table): Path<String>,
    Json(values): Json<Row>,
) -> HandlerResult<(StatusCode, Json<Row>)> {
    let row = state
        .data
        .insert(&table, values)
        .await
        .map_err(|err| ApiError::new(err, uri.path()))?;

    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn list_rows(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(table): Path<String>,
    Query(params): Query<PageParams>,
) -> HandlerResult<Json<RowPage>> {
    let page = state
        .data
        .get_paginated(&table, params.page, params.size)
        .await
        .map_err(|err| ApiError::new(err, uri.path()))?;

    Ok(Json(page))
}

pub async fn get_row(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path((table, id)): Path<(String, i64)>,
) -> HandlerResult<Json<Row>> {
    let row = state
        .data
        .get_by_id(&table, id)
        .await
        .map_err(|err| ApiError::new(err, uri.path()))?;

    Ok(Json(row))
}

pub async fn update_row(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path((table, id)): Path<(String, i64)>,
    Json(values): Json<Row>,
) -> HandlerResult<Json<Row>> {
    let row = state
        .data
        .update(&table, id, values)
        .await
        .map_err(|err| ApiError::new(err, uri.path()))?;

    Ok(Json(row))
}

pub async fn delete_row(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path((table, id)): Path<(String, i64)>,
) -> HandlerResult<StatusCode> {
    state
        .data
        .delete_by_id(&table, id)
        .await
        .map_err(|err| ApiError::new(err, uri.path()))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Structural checks on the request body before the service layer sees
/// it. Semantic rules (charset, reserved names, supported types) live in
/// the services.
fn validate_create_request(payload: &CreateTableRequest) -> Result<(), String> {
    if payload.name.trim().is_empty() {
        return Err("table name must not be blank".to_string());
    }
    if let Some(friendly) = &payload.friendly_name
        && friendly.chars().count() > MAX_FRIENDLY_NAME_LEN
    {
        return Err(format!(
            "friendlyName must be at most {MAX_FRIENDLY_NAME_LEN} characters"
        ));
    }
    if payload.columns.is_empty() {
        return Err("at least one column is required".to_string());
    }
    for column in &payload.columns {
        if column.name.trim().is_empty() {
            return Err("column name must not be blank".to_string());
        }
        if column.column_type.trim().is_empty() {
            return Err("column type must not be blank".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ColumnSpec;

    fn request(name: &str, columns: Vec<ColumnSpec>) -> CreateTableRequest {
        CreateTableRequest {
            name: name.to_string(),
            friendly_name: None,
            columns,
        }
    }

    fn column(name: &str) -> ColumnSpec {
        ColumnSpec {
            name: name.to_string(),
            column_type: "TEXT".to_string(),
            nullable: true,
        }
    }

    #[test]
    fn test_rejects_blank_fields() {
        let err = validate_create_request(&request("  ", vec![column("note_x")])).unwrap_err();
        assert_eq!(err, "table name must not be blank");

        let err = validate_create_request(&request("t_demo", vec![])).unwrap_err();
        assert_eq!(err, "at least one column is required");

        let err = validate_create_request(&request("t_demo", vec![column(" ")])).unwrap_err();
        assert_eq!(err, "column name must not be blank");
    }

    #[test]
    fn test_rejects_oversize_friendly_name() {
        let mut payload = request("t_demo", vec![column("note_x")]);
        payload.friendly_name = Some("x".repeat(MAX_FRIENDLY_NAME_LEN + 1));
        let err = validate_create_request(&payload).unwrap_err();
        assert!(err.contains("at most"));

        payload.friendly_name = Some("x".repeat(MAX_FRIENDLY_NAME_LEN));
        validate_create_request(&payload).unwrap();
    }
}

//! Saved session handlers
//!
//! A saved session can be reopened and rendered again: the table (sorted,
//! filtered and paginated), exports of the current table view, the
//! highlighted text and the count chart.
//!
//! Author: hephaex@gmail.com

use crate::error::{ApiError, AppError};
use crate::extractors::{ApiPath, ApiQuery};
use crate::sessions::SessionSummary;
use crate::state::AppState;
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use entilens_core::{count_labels, LabelSelection, SessionSnapshot};
use entilens_render::{
    render_bar_chart, render_document, ChartOptions, EntityRow, EntityTable, ExportFormat,
    SortColumn, SortOrder, TableQuery, DEFAULT_PAGE_SIZE, HIGHLIGHT_FILE_NAME,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Largest page a client may request
const MAX_PAGE_SIZE: usize = 500;

/// Table view parameters shared by the table and export endpoints
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ViewParams {
    /// Sort column: text, start, end or label
    pub sort: Option<String>,

    /// Sort direction: asc or desc
    pub order: Option<String>,

    /// Case-insensitive text matched against every column
    pub filter: Option<String>,

    /// Comma separated labels to keep
    pub labels: Option<String>,

    /// Page number (1-indexed)
    #[param(default = 1)]
    pub page: Option<usize>,

    /// Rows per page
    #[param(default = 10)]
    pub page_size: Option<usize>,

    /// Export format: csv or json
    pub format: Option<String>,
}

impl ViewParams {
    fn to_query(&self) -> Result<TableQuery, AppError> {
        let sort = self
            .sort
            .as_deref()
            .map(str::parse::<SortColumn>)
            .transpose()?;
        let order = match self.order.as_deref().map(|o| o.trim().to_ascii_lowercase()) {
            None => SortOrder::Asc,
            Some(o) if o == "asc" => SortOrder::Asc,
            Some(o) if o == "desc" => SortOrder::Desc,
            Some(o) => return Err(AppError::BadRequest(format!("Unknown sort order: {o}"))),
        };
        let labels = match self.labels.as_deref() {
            Some(list) => LabelSelection::parse_list(list)
                .map_err(entilens_core::EntilensError::from)?
                .labels()
                .to_vec(),
            None => Vec::new(),
        };

        Ok(TableQuery {
            sort,
            order,
            quick_filter: self.filter.clone(),
            labels,
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        })
    }
}

/// One page of a session's entity table
#[derive(Debug, Serialize, ToSchema)]
pub struct TableResponse {
    pub session_id: Uuid,
    #[schema(example = 1)]
    pub page: usize,
    #[schema(example = 10)]
    pub page_size: usize,
    /// Rows in the filtered view
    pub total_rows: usize,
    pub total_pages: usize,
    /// Rows with keys Text, Start, End and Label
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<EntityRow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearSessionsResponse {
    pub cleared: usize,
}

async fn load_session(state: &AppState, id: Uuid) -> Result<SessionSnapshot, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound("Session".to_string()))
}

fn attachment(file_name: &str) -> String {
    format!("attachment; filename=\"{file_name}\"")
}

/// List saved sessions, most recent first
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "sessions",
    responses(
        (status = 200, description = "Saved sessions", body = Vec<SessionSummary>)
    )
)]
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.sessions.list().await)
}

/// Remove every saved session
#[utoipa::path(
    delete,
    path = "/api/v1/sessions",
    tag = "sessions",
    responses(
        (status = 200, description = "Sessions removed", body = ClearSessionsResponse)
    )
)]
pub async fn clear_sessions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cleared = state.sessions.clear().await;
    tracing::info!(cleared, "Cleared saved sessions");
    Json(ClearSessionsResponse { cleared })
}

/// Load a saved session
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session snapshot", body = SessionSnapshot),
        (status = 404, description = "Session not found", body = ApiError)
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(load_session(&state, id).await?))
}

/// Sorted, filtered and paginated entity table
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/table",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session id"), ViewParams),
    responses(
        (status = 200, description = "Table page", body = TableResponse),
        (status = 400, description = "Invalid view parameters", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError)
    )
)]
pub async fn session_table(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<ViewParams>,
) -> Result<impl IntoResponse, AppError> {
    let session = load_session(&state, id).await?;
    let query = params.to_query()?;

    let view = EntityTable::from_entities(&session.entities).view(&query);
    let page = view.page(query.page, query.page_size);

    Ok(Json(TableResponse {
        session_id: id,
        page: page.page,
        page_size: page.page_size,
        total_rows: page.total_rows,
        total_pages: page.total_pages,
        rows: page.rows,
    }))
}

/// Download the current table view
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/export",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session id"), ViewParams),
    responses(
        (status = 200, description = "entities_view.csv or entities_view.json", body = String),
        (status = 400, description = "Invalid view parameters", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError)
    )
)]
pub async fn export_session(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<ViewParams>,
) -> Result<impl IntoResponse, AppError> {
    let session = load_session(&state, id).await?;
    let format: ExportFormat = match params.format.as_deref() {
        Some(format) => format.parse()?,
        None => ExportFormat::Csv,
    };
    let query = params.to_query()?;

    let view = EntityTable::from_entities(&session.entities).view(&query);
    let body = view.export(format)?;

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, attachment(format.file_name())),
        ],
        body,
    ))
}

/// Download the highlighted text as a standalone HTML page
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/highlight",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "highlighted_entities.html", content_type = "text/html", body = String),
        (status = 404, description = "Session not found", body = ApiError)
    )
)]
pub async fn session_highlight(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = load_session(&state, id).await?;
    let html = render_document(&session.text, &session.entities);

    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, attachment(HIGHLIGHT_FILE_NAME)),
        ],
        html,
    ))
}

/// Entity count chart as SVG
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/chart",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Bar chart", content_type = "image/svg+xml", body = String),
        (status = 404, description = "Session not found", body = ApiError)
    )
)]
pub async fn session_chart(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = load_session(&state, id).await?;
    let svg = render_bar_chart(&count_labels(&session.entities), &ChartOptions::default());

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use entilens_core::EntityLabel;

    #[test]
    fn test_view_params_defaults() {
        let query = ViewParams::default().to_query().unwrap();
        assert_eq!(query, TableQuery::default());
    }

    #[test]
    fn test_view_params_parsing() {
        let params = ViewParams {
            sort: Some("Label".to_string()),
            order: Some("DESC".to_string()),
            filter: Some("ber".to_string()),
            labels: Some("gpe,person".to_string()),
            page: Some(2),
            page_size: Some(10_000),
            format: None,
        };
        let query = params.to_query().unwrap();

        assert_eq!(query.sort, Some(SortColumn::Label));
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.labels, vec![EntityLabel::Gpe, EntityLabel::Person]);
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_view_params_rejects_unknown_values() {
        let bad_sort = ViewParams {
            sort: Some("size".to_string()),
            ..ViewParams::default()
        };
        assert!(matches!(bad_sort.to_query(), Err(AppError::BadRequest(_))));

        let bad_order = ViewParams {
            order: Some("sideways".to_string()),
            ..ViewParams::default()
        };
        assert!(matches!(bad_order.to_query(), Err(AppError::BadRequest(_))));
    }
}

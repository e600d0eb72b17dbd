use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{InspectionDraft, InspectionEdit, InspectionId, InspectionStatus, ViolationSet};
use super::import::{DeclaredScorePolicy, ImportOptions, InspectionImportError};
use super::report::DateRange;
use super::repository::{InspectionRepository, RepositoryError};
use super::service::{InspectionService, InspectionServiceError};

/// Router builder exposing inspection scoring, storage, import, and reporting.
pub fn inspection_router<R>(service: Arc<InspectionService<R>>) -> Router
where
    R: InspectionRepository + 'static,
{
    Router::new()
        .route("/api/v1/inspections/score", post(score_handler::<R>))
        .route(
            "/api/v1/inspections",
            post(record_handler::<R>).get(list_handler::<R>),
        )
        .route("/api/v1/inspections/import", post(import_handler::<R>))
        .route("/api/v1/inspections/report", get(report_handler::<R>))
        .route("/api/v1/inspections/export", get(export_handler::<R>))
        .route(
            "/api/v1/inspections/:inspection_id",
            get(get_handler::<R>)
                .put(edit_handler::<R>)
                .delete(delete_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    #[serde(default)]
    regular_violations: ViolationSet,
    #[serde(default)]
    auto_failure_violations: ViolationSet,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    score: u32,
    status: InspectionStatus,
    is_passing: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImportRequest {
    csv: String,
    #[serde(default)]
    skip_duplicates: Option<bool>,
    #[serde(default)]
    strict_validation: Option<bool>,
    #[serde(default)]
    declared_score: Option<DeclaredScorePolicy>,
}

impl ImportRequest {
    fn options(&self) -> ImportOptions {
        let defaults = ImportOptions::default();
        ImportOptions {
            skip_duplicates: self.skip_duplicates.unwrap_or(defaults.skip_duplicates),
            strict_validation: self.strict_validation.unwrap_or(defaults.strict_validation),
            declared_score: self.declared_score.unwrap_or(defaults.declared_score),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReportQuery {
    #[serde(default)]
    range: Option<DateRange>,
    #[serde(default)]
    today: Option<NaiveDate>,
}

pub(crate) async fn score_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    axum::Json(request): axum::Json<ScoreRequest>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    let evaluation = service.evaluate(&request.regular_violations, &request.auto_failure_violations);
    let payload = ScoreResponse {
        score: evaluation.score,
        status: evaluation.status,
        is_passing: evaluation.is_passing(),
    };
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn record_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    axum::Json(draft): axum::Json<InspectionDraft>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    match service.record(draft) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R>(State(service): State<Arc<InspectionService<R>>>) -> Response
where
    R: InspectionRepository + 'static,
{
    match service.list() {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Path(inspection_id): Path<String>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    match service.get(&InspectionId(inspection_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn edit_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Path(inspection_id): Path<String>,
    axum::Json(edit): axum::Json<InspectionEdit>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    match service.edit(&InspectionId(inspection_id), edit) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Path(inspection_id): Path<String>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    match service.delete(&InspectionId(inspection_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn import_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    axum::Json(request): axum::Json<ImportRequest>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    let options = request.options();
    match service.import_csv(&request.csv, options) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    let range = query.range.unwrap_or_default();
    let today = query.today.unwrap_or_else(|| Local::now().date_naive());
    match service.report(range, today) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn export_handler<R>(State(service): State<Arc<InspectionService<R>>>) -> Response
where
    R: InspectionRepository + 'static,
{
    match service.export_csv() {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            csv,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: InspectionServiceError) -> Response {
    let status = match &error {
        InspectionServiceError::Validation(_) | InspectionServiceError::UnknownViolations(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        InspectionServiceError::Import(InspectionImportError::NoDataRows) => StatusCode::BAD_REQUEST,
        InspectionServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        InspectionServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        InspectionServiceError::Import(_)
        | InspectionServiceError::Repository(_)
        | InspectionServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

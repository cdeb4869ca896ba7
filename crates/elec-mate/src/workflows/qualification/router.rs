use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::loader::{QualificationError, QualificationTreeLoader};
use super::progress::ProgressSummary;
use super::repository::QualificationRepository;
use super::search::filter_units;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TreeQuery {
    #[serde(default)]
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressRequest {
    #[serde(default)]
    completed: Vec<String>,
}

/// Router exposing tree lookups and progress calculation.
pub fn qualification_router<R>(loader: Arc<QualificationTreeLoader<R>>) -> Router
where
    R: QualificationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/qualifications/:code/tree",
            get(tree_handler::<R>),
        )
        .route(
            "/api/v1/qualifications/:code/progress",
            post(progress_handler::<R>),
        )
        .with_state(loader)
}

pub(crate) async fn tree_handler<R>(
    State(loader): State<Arc<QualificationTreeLoader<R>>>,
    Path(code): Path<String>,
    Query(query): Query<TreeQuery>,
) -> Response
where
    R: QualificationRepository + 'static,
{
    match loader.load(Some(&code)) {
        Ok(mut view) => {
            if let Some(q) = query.q.as_deref() {
                view.units = filter_units(&view.units, q);
            }
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn progress_handler<R>(
    State(loader): State<Arc<QualificationTreeLoader<R>>>,
    Path(code): Path<String>,
    axum::Json(request): axum::Json<ProgressRequest>,
) -> Response
where
    R: QualificationRepository + 'static,
{
    match loader.load(Some(&code)) {
        Ok(view) => {
            let summary = ProgressSummary::for_units(&view.units, &request.completed);
            (StatusCode::OK, axum::Json(summary)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: QualificationError) -> Response {
    let status = match error {
        QualificationError::UnknownQualification(_) => StatusCode::NOT_FOUND,
        QualificationError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

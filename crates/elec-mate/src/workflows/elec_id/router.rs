use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::domain::{
    Certification, HeldQualification, ProfileItem, Skill, TrainingRecord, WorkHistoryEntry,
};
use super::repository::{ElecIdRepository, RepositoryError};
use super::service::{ElecIdService, ElecIdServiceError, NewElecId};

const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExpiringQuery {
    #[serde(default)]
    days: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BulkRequest {
    /// Restricts the batch, e.g. to the failed subset of an earlier run.
    #[serde(default)]
    employee_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    verified_by: String,
}

/// Router for Elec-ID issuing, verification and profile edits.
pub fn elec_id_router<R>(service: Arc<ElecIdService<R>>) -> Router
where
    R: ElecIdRepository + 'static,
{
    Router::new()
        .route("/api/v1/elec-id", post(create_handler::<R>))
        .route("/api/v1/elec-id/bulk", post(bulk_handler::<R>))
        .route("/api/v1/elec-id/expiring", get(expiring_handler::<R>))
        .route("/api/v1/elec-id/unverified", get(unverified_handler::<R>))
        .route(
            "/api/v1/elec-id/without-profile",
            get(without_profile_handler::<R>),
        )
        .route("/api/v1/elec-id/:employee_id", get(profile_handler::<R>))
        .route(
            "/api/v1/elec-id/:employee_id/verify",
            post(verify_handler::<R>),
        )
        .route(
            "/api/v1/elec-id/:employee_id/skills",
            post(add_entry_handler::<R, Skill>),
        )
        .route(
            "/api/v1/elec-id/:employee_id/training",
            post(add_entry_handler::<R, TrainingRecord>),
        )
        .route(
            "/api/v1/elec-id/:employee_id/certifications",
            post(add_entry_handler::<R, Certification>),
        )
        .route(
            "/api/v1/elec-id/:employee_id/qualifications",
            post(add_entry_handler::<R, HeldQualification>),
        )
        .route(
            "/api/v1/elec-id/:employee_id/work-history",
            post(add_entry_handler::<R, WorkHistoryEntry>),
        )
        .route(
            "/api/v1/elec-id/:employee_id/entries/:entry_id",
            delete(remove_entry_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<ElecIdService<R>>>,
    axum::Json(request): axum::Json<NewElecId>,
) -> Response
where
    R: ElecIdRepository + 'static,
{
    match service.create_for_employee(request, Utc::now()) {
        Ok(profile) => (StatusCode::CREATED, axum::Json(profile)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bulk_handler<R>(
    State(service): State<Arc<ElecIdService<R>>>,
    body: Option<axum::Json<BulkRequest>>,
) -> Response
where
    R: ElecIdRepository + 'static,
{
    let request = body.map(|axum::Json(request)| request).unwrap_or_default();
    let now = Utc::now();
    let report = match request.employee_ids {
        Some(employee_ids) => Ok(service.create_for_employees(&employee_ids, now)),
        None => service.create_for_all(now),
    };

    match report {
        Ok(report) => {
            let payload = json!({
                "created": report.created(),
                "skipped": report.skipped(),
                "failed": report.failed(),
                "failed_employee_ids": report.failed_employee_ids(),
                "results": report.results,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn profile_handler<R>(
    State(service): State<Arc<ElecIdService<R>>>,
    Path(employee_id): Path<String>,
) -> Response
where
    R: ElecIdRepository + 'static,
{
    match service.profile_view(&employee_id, Utc::now()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn verify_handler<R>(
    State(service): State<Arc<ElecIdService<R>>>,
    Path(employee_id): Path<String>,
    axum::Json(request): axum::Json<VerifyRequest>,
) -> Response
where
    R: ElecIdRepository + 'static,
{
    match service.verify(&employee_id, &request.verified_by, Utc::now()) {
        Ok(profile) => (StatusCode::OK, axum::Json(profile)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn add_entry_handler<R, T>(
    State(service): State<Arc<ElecIdService<R>>>,
    Path(employee_id): Path<String>,
    axum::Json(item): axum::Json<T>,
) -> Response
where
    R: ElecIdRepository + 'static,
    T: ProfileItem,
{
    match service.add_entry(&employee_id, item) {
        Ok(entry) => (StatusCode::CREATED, axum::Json(entry)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_entry_handler<R>(
    State(service): State<Arc<ElecIdService<R>>>,
    Path((employee_id, entry_id)): Path<(String, Uuid)>,
) -> Response
where
    R: ElecIdRepository + 'static,
{
    match service.remove_entry(&employee_id, entry_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn expiring_handler<R>(
    State(service): State<Arc<ElecIdService<R>>>,
    Query(query): Query<ExpiringQuery>,
) -> Response
where
    R: ElecIdRepository + 'static,
{
    let days = query.days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);
    match service.expiring_within(days, Utc::now()) {
        Ok(expiring) => (StatusCode::OK, axum::Json(expiring)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn unverified_handler<R>(
    State(service): State<Arc<ElecIdService<R>>>,
) -> Response
where
    R: ElecIdRepository + 'static,
{
    match service.unverified() {
        Ok(profiles) => (StatusCode::OK, axum::Json(profiles)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn without_profile_handler<R>(
    State(service): State<Arc<ElecIdService<R>>>,
) -> Response
where
    R: ElecIdRepository + 'static,
{
    match service.employees_without_elec_id() {
        Ok(employees) => (StatusCode::OK, axum::Json(employees)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: ElecIdServiceError) -> Response {
    let status = match &error {
        ElecIdServiceError::UnknownEmployee(_)
        | ElecIdServiceError::ProfileNotFound(_)
        | ElecIdServiceError::EntryNotFound(_)
        | ElecIdServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ElecIdServiceError::AlreadyExists { .. }
        | ElecIdServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ElecIdServiceError::InvalidEntry(_)
        | ElecIdServiceError::MissingVerifier
        | ElecIdServiceError::Roster(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ElecIdServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

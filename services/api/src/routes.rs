use crate::infra::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use elec_mate::workflows::elec_id::{elec_id_router, ElecIdRepository, ElecIdService};
use elec_mate::workflows::evidence::{
    evidence_router, EvidenceAnalyzer, EvidenceCaptureService, EvidenceRepository,
    EvidenceStorage,
};
use elec_mate::workflows::qualification::{
    qualification_router, ProgressSummary, QualificationError, QualificationRepository,
    QualificationTreeLoader,
};
use serde_json::json;
use std::sync::Arc;

/// Tree loader plus the evidence service whose saved records decide what is evidenced.
pub(crate) struct UserProgressState<Q, S, A, R> {
    pub(crate) loader: Arc<QualificationTreeLoader<Q>>,
    pub(crate) evidence: Arc<EvidenceCaptureService<S, A, R>>,
}

pub(crate) fn build_router<Q, S, A, R, E>(
    loader: Arc<QualificationTreeLoader<Q>>,
    evidence: Arc<EvidenceCaptureService<S, A, R>>,
    elec_id: Arc<ElecIdService<E>>,
) -> Router
where
    Q: QualificationRepository + 'static,
    S: EvidenceStorage + 'static,
    A: EvidenceAnalyzer + 'static,
    R: EvidenceRepository + 'static,
    E: ElecIdRepository + 'static,
{
    let progress = Router::new()
        .route(
            "/api/v1/users/:user_id/qualifications/:code/progress",
            get(user_progress_endpoint::<Q, S, A, R>),
        )
        .with_state(Arc::new(UserProgressState {
            loader: loader.clone(),
            evidence: evidence.clone(),
        }));

    qualification_router(loader)
        .merge(evidence_router(evidence))
        .merge(elec_id_router(elec_id))
        .merge(progress)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Progress of one learner, counting criteria met by their saved evidence.
pub(crate) async fn user_progress_endpoint<Q, S, A, R>(
    State(state): State<Arc<UserProgressState<Q, S, A, R>>>,
    Path((user_id, code)): Path<(String, String)>,
) -> Response
where
    Q: QualificationRepository + 'static,
    S: EvidenceStorage + 'static,
    A: EvidenceAnalyzer + 'static,
    R: EvidenceRepository + 'static,
{
    let completed = match state.evidence.completed_refs(&user_id) {
        Ok(completed) => completed,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
        }
    };

    match state.loader.load(Some(&code)) {
        Ok(view) => {
            let summary = ProgressSummary::for_units(&view.units, &completed);
            let payload = json!({
                "user_id": user_id,
                "qualification": view.qualification,
                "progress": summary,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => {
            let status = match error {
                QualificationError::UnknownQualification(_) => StatusCode::NOT_FOUND,
                QualificationError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let payload = json!({ "error": error.to_string() });
            (status, Json(payload)).into_response()
        }
    }
}

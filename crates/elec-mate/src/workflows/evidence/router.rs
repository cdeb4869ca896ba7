use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::analyzer::EvidenceAnalyzer;
use super::repository::{EvidenceRepository, RepositoryError};
use super::service::{EvidenceCaptureService, EvidenceServiceError};
use super::upload::{EvidenceStorage, EvidenceUpload, StorageError, UploadError};
use super::wizard::{EvidenceWizard, WizardError, WizardEvent, WizardSnapshot, WizardStep};

#[derive(Debug, Deserialize)]
pub(crate) struct UploadQuery {
    user_id: String,
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeRequest {
    wizard: WizardSnapshot,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TextEvidenceRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum SelectionAction {
    AcceptKsb { code: String },
    RejectKsb { code: String },
    AcceptTag { tag: String },
    RejectTag { tag: String },
    AcceptAll,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SelectionRequest {
    wizard: WizardSnapshot,
    #[serde(flatten)]
    action: SelectionAction,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveRequest {
    user_id: String,
    wizard: WizardSnapshot,
}

/// Router for the capture wizard. The client holds the wizard snapshot between calls.
pub fn evidence_router<S, A, R>(service: Arc<EvidenceCaptureService<S, A, R>>) -> Router
where
    S: EvidenceStorage + 'static,
    A: EvidenceAnalyzer + 'static,
    R: EvidenceRepository + 'static,
{
    // Bodies past the cap are refused by the extractor itself with 413.
    let body_limit = usize::try_from(service.max_upload_bytes().saturating_add(1))
        .unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/api/v1/evidence/uploads",
            post(upload_handler::<S, A, R>).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/v1/evidence/text", post(text_handler::<S, A, R>))
        .route("/api/v1/evidence/analyze", post(analyze_handler::<S, A, R>))
        .route(
            "/api/v1/evidence/selection",
            post(selection_handler::<S, A, R>),
        )
        .route("/api/v1/evidence", post(save_handler::<S, A, R>))
        .route("/api/v1/evidence/:user_id", get(list_handler::<S, A, R>))
        .with_state(service)
}

pub(crate) async fn upload_handler<S, A, R>(
    State(service): State<Arc<EvidenceCaptureService<S, A, R>>>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: EvidenceStorage + 'static,
    A: EvidenceAnalyzer + 'static,
    R: EvidenceRepository + 'static,
{
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let upload = EvidenceUpload {
        file_name: query.file_name.unwrap_or_default(),
        content_type,
        bytes: body.to_vec(),
    };

    let mut wizard = service.start();
    match service.upload(&mut wizard, &query.user_id, upload).await {
        Ok(uploaded) => {
            let payload = json!({
                "upload": uploaded,
                "wizard": wizard.snapshot(),
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn text_handler<S, A, R>(
    State(service): State<Arc<EvidenceCaptureService<S, A, R>>>,
    axum::Json(request): axum::Json<TextEvidenceRequest>,
) -> Response
where
    S: EvidenceStorage + 'static,
    A: EvidenceAnalyzer + 'static,
    R: EvidenceRepository + 'static,
{
    let outcome = service.start_text().and_then(|mut wizard| {
        wizard.apply(WizardEvent::DetailsEdited {
            title: request.title,
            description: request.description,
        })?;
        Ok(wizard)
    });

    match outcome {
        Ok(wizard) => (StatusCode::CREATED, axum::Json(wizard.snapshot())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn analyze_handler<S, A, R>(
    State(service): State<Arc<EvidenceCaptureService<S, A, R>>>,
    axum::Json(request): axum::Json<AnalyzeRequest>,
) -> Response
where
    S: EvidenceStorage + 'static,
    A: EvidenceAnalyzer + 'static,
    R: EvidenceRepository + 'static,
{
    let mut wizard = match resume_with_details(&service, request) {
        Ok(wizard) => wizard,
        Err(error) => return error_response(error.into()),
    };

    match service.analyze(&mut wizard).await {
        Ok(_) => (StatusCode::OK, axum::Json(wizard.snapshot())).into_response(),
        Err(error) => error_response(error),
    }
}

fn resume_with_details<S, A, R>(
    service: &EvidenceCaptureService<S, A, R>,
    request: AnalyzeRequest,
) -> Result<EvidenceWizard, WizardError>
where
    S: EvidenceStorage + 'static,
    A: EvidenceAnalyzer + 'static,
    R: EvidenceRepository + 'static,
{
    let mut wizard = service.resume(request.wizard)?;
    if request.title.is_some() || request.description.is_some() {
        if wizard.step() == WizardStep::Review {
            wizard.apply(WizardEvent::EditDetails)?;
        }
        let current = wizard.data();
        let title = request.title.unwrap_or_else(|| current.title.clone());
        let description = request
            .description
            .unwrap_or_else(|| current.description.clone());
        wizard.apply(WizardEvent::DetailsEdited { title, description })?;
    }
    Ok(wizard)
}

pub(crate) async fn selection_handler<S, A, R>(
    State(service): State<Arc<EvidenceCaptureService<S, A, R>>>,
    axum::Json(request): axum::Json<SelectionRequest>,
) -> Response
where
    S: EvidenceStorage + 'static,
    A: EvidenceAnalyzer + 'static,
    R: EvidenceRepository + 'static,
{
    let outcome = service.resume(request.wizard).and_then(|mut wizard| {
        let changed = match &request.action {
            SelectionAction::AcceptKsb { code } => wizard.accept_ksb(code)?,
            SelectionAction::RejectKsb { code } => wizard.reject_ksb(code)?,
            SelectionAction::AcceptTag { tag } => wizard.accept_tag(tag)?,
            SelectionAction::RejectTag { tag } => wizard.reject_tag(tag)?,
            SelectionAction::AcceptAll => wizard.accept_all()?,
        };
        Ok((changed, wizard))
    });

    match outcome {
        Ok((changed, wizard)) => {
            let payload = json!({
                "changed": changed,
                "wizard": wizard.snapshot(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn save_handler<S, A, R>(
    State(service): State<Arc<EvidenceCaptureService<S, A, R>>>,
    axum::Json(request): axum::Json<SaveRequest>,
) -> Response
where
    S: EvidenceStorage + 'static,
    A: EvidenceAnalyzer + 'static,
    R: EvidenceRepository + 'static,
{
    let saved = service
        .resume(request.wizard)
        .map_err(EvidenceServiceError::from)
        .and_then(|wizard| service.save(&wizard, &request.user_id));

    match saved {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<S, A, R>(
    State(service): State<Arc<EvidenceCaptureService<S, A, R>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: EvidenceStorage + 'static,
    A: EvidenceAnalyzer + 'static,
    R: EvidenceRepository + 'static,
{
    match service.list_for_user(&user_id) {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: EvidenceServiceError) -> Response {
    let status = match &error {
        EvidenceServiceError::Upload(UploadError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        EvidenceServiceError::Upload(UploadError::Storage(StorageError::Rejected(_)))
        | EvidenceServiceError::Upload(UploadError::Storage(StorageError::Unavailable(_))) => {
            StatusCode::BAD_GATEWAY
        }
        EvidenceServiceError::Upload(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EvidenceServiceError::Wizard(WizardError::InconsistentSnapshot(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EvidenceServiceError::Wizard(_) => StatusCode::CONFLICT,
        EvidenceServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EvidenceServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::history;
use crate::matching::session::SessionSnapshot;
use crate::matching::workflow::{
    accept_candidate, discard_candidate, request_improvement, run_analysis, AcceptOutcome,
    AnalyzeOutcome, DiscardOutcome, ImproveOutcome,
};
use crate::models::analysis::AnalysisResult;
use crate::models::document::DocumentHandle;
use crate::models::plan::UsagePlan;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PutDocumentRequest {
    pub content_base64: String,
    pub media_type: String,
    pub file_name: String,
}

#[derive(Deserialize)]
pub struct PutJobDescriptionRequest {
    pub jd_text: String,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalyzeReport {
    Completed {
        result: AnalysisResult,
        plan: UsagePlan,
    },
    Failed {
        message: String,
    },
}

#[derive(Serialize)]
pub struct AcceptResponse {
    pub document_name: String,
    pub reanalysis: AnalyzeReport,
}

/// PUT /api/v1/sessions/:identity/document
pub async fn handle_put_document(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    Json(req): Json<PutDocumentRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    if req.file_name.trim().is_empty() {
        return Err(AppError::Validation("file_name must not be empty".to_string()));
    }
    if req.media_type.trim().is_empty() {
        return Err(AppError::Validation("media_type must not be empty".to_string()));
    }
    let content = base64::engine::general_purpose::STANDARD
        .decode(req.content_base64.as_bytes())
        .map_err(|_| AppError::Validation("content_base64 is not valid base64".to_string()))?;

    let document = DocumentHandle::new(content, req.media_type, req.file_name);
    let session = state.sessions.get_or_create(&identity).await;
    let mut s = session.lock().await;
    s.put_document(document)?;
    Ok(Json(s.snapshot()))
}

/// PUT /api/v1/sessions/:identity/job-description
pub async fn handle_put_job_description(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    Json(req): Json<PutJobDescriptionRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = state.sessions.get_or_create(&identity).await;
    let mut s = session.lock().await;
    s.put_job_description(req.jd_text)?;
    Ok(Json(s.snapshot()))
}

/// GET /api/v1/sessions/:identity
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = state.sessions.get_or_create(&identity).await;
    let s = session.lock().await;
    Ok(Json(s.snapshot()))
}

/// POST /api/v1/sessions/:identity/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<AnalyzeReport>, AppError> {
    let session = state.sessions.get_or_create(&identity).await;
    let outcome =
        run_analysis(&session, state.engine.as_ref(), state.ledger.as_ref(), &identity).await?;

    match outcome {
        AnalyzeOutcome::Completed { result, plan } => {
            let file_name = {
                let s = session.lock().await;
                s.document
                    .as_ref()
                    .map(|d| d.display_name().to_string())
                    .unwrap_or_default()
            };
            history::record_analysis(&state.db, &identity, &file_name, &result).await?;
            Ok(Json(AnalyzeReport::Completed { result, plan }))
        }
        AnalyzeOutcome::QuotaExceeded => Err(AppError::QuotaExceeded),
        AnalyzeOutcome::Skipped => Err(AppError::NotReady(
            "an analysis is already in progress".to_string(),
        )),
        AnalyzeOutcome::Failed { message } => Err(AppError::Collaborator(message)),
    }
}

/// POST /api/v1/sessions/:identity/improve
pub async fn handle_improve(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = state.sessions.get_or_create(&identity).await;
    let outcome =
        request_improvement(&session, state.engine.as_ref(), state.ledger.as_ref(), &identity)
            .await?;

    match outcome {
        ImproveOutcome::Ready => {
            let s = session.lock().await;
            Ok(Json(s.snapshot()))
        }
        ImproveOutcome::QuotaExceeded => Err(AppError::QuotaExceeded),
        ImproveOutcome::Skipped => Err(AppError::NotReady(
            "an improvement is already in flight or under review".to_string(),
        )),
        ImproveOutcome::Failed { message } => Err(AppError::Collaborator(message)),
    }
}

/// POST /api/v1/sessions/:identity/improve/accept
pub async fn handle_accept(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<AcceptResponse>, AppError> {
    let session = state.sessions.get_or_create(&identity).await;
    let outcome =
        accept_candidate(&session, state.engine.as_ref(), state.ledger.as_ref(), &identity)
            .await?;

    match outcome {
        AcceptOutcome::Accepted {
            document_name,
            reanalysis,
        } => {
            let reanalysis = match *reanalysis {
                AnalyzeOutcome::Completed { result, plan } => {
                    history::record_analysis(&state.db, &identity, &document_name, &result).await?;
                    AnalyzeReport::Completed { result, plan }
                }
                AnalyzeOutcome::QuotaExceeded => AnalyzeReport::Failed {
                    message: "plan credit limit reached before re-analysis".to_string(),
                },
                AnalyzeOutcome::Skipped => AnalyzeReport::Failed {
                    message: "another analysis was already in progress".to_string(),
                },
                AnalyzeOutcome::Failed { message } => AnalyzeReport::Failed { message },
            };
            Ok(Json(AcceptResponse {
                document_name,
                reanalysis,
            }))
        }
        AcceptOutcome::Skipped => Err(AppError::NotReady(
            "no improvement under review".to_string(),
        )),
    }
}

/// POST /api/v1/sessions/:identity/improve/discard
pub async fn handle_discard(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = state.sessions.get_or_create(&identity).await;
    match discard_candidate(&session).await {
        DiscardOutcome::Discarded => {
            let s = session.lock().await;
            Ok(Json(s.snapshot()))
        }
        DiscardOutcome::Skipped => Err(AppError::NotReady(
            "no improvement under review".to_string(),
        )),
    }
}

/// GET /api/v1/sessions/:identity/candidate
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Html<String>, AppError> {
    let session = state.sessions.get_or_create(&identity).await;
    let s = session.lock().await;
    s.candidate
        .clone()
        .map(Html)
        .ok_or_else(|| AppError::NotFound("no candidate under review".to_string()))
}

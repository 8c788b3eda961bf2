//! Analysis Session — per-identity mutable state for the matching flow.
//!
//! A session carries the current upload, the current job description, the
//! latest verdict, and the improvement-review state. Handlers fetch the
//! session from the registry and hand it to `workflow` functions, which
//! own the locking discipline around collaborator calls.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::models::analysis::AnalysisResult;
use crate::models::document::DocumentHandle;

/// Where the session stands with respect to the analysis collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisPhase {
    /// No verdict for the current inputs.
    Idle,
    /// A collaborator call is in flight. Mutations are rejected.
    Analyzing,
    /// `result` holds the verdict for the current inputs.
    Complete,
    /// The last attempt failed; `last_error` says why.
    Failed,
}

/// Where the session stands in the improvement review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    /// No rewrite pending.
    NoCandidate,
    /// A rewrite call is in flight.
    Requesting,
    /// A candidate awaits an accept or discard decision.
    Reviewing,
}

#[derive(Debug)]
pub struct AnalysisSession {
    pub document: Option<DocumentHandle>,
    pub jd_text: Option<String>,
    pub result: Option<AnalysisResult>,
    pub phase: AnalysisPhase,
    pub workflow: WorkflowState,
    pub candidate: Option<String>,
    pub last_error: Option<String>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            document: None,
            jd_text: None,
            result: None,
            phase: AnalysisPhase::Idle,
            workflow: WorkflowState::NoCandidate,
            candidate: None,
            last_error: None,
        }
    }

    /// Replaces the upload. Any prior verdict is for the old document, so the
    /// session drops back to `Idle`.
    pub fn put_document(&mut self, document: DocumentHandle) -> Result<(), AppError> {
        if self.phase == AnalysisPhase::Analyzing {
            return Err(AppError::NotReady(
                "analysis in progress; try again when it finishes".to_string(),
            ));
        }
        if self.workflow != WorkflowState::NoCandidate {
            return Err(AppError::NotReady(
                "an improvement is under review; accept or discard it first".to_string(),
            ));
        }
        if document.content().is_empty() {
            return Err(AppError::Validation("document is empty".to_string()));
        }

        self.document = Some(document);
        self.result = None;
        self.phase = AnalysisPhase::Idle;
        self.last_error = None;
        Ok(())
    }

    /// Replaces the job description. Same staleness rule as `put_document`.
    pub fn put_job_description(&mut self, jd_text: String) -> Result<(), AppError> {
        if jd_text.trim().is_empty() {
            return Err(AppError::Validation(
                "job description must not be empty".to_string(),
            ));
        }
        if self.phase == AnalysisPhase::Analyzing {
            return Err(AppError::NotReady(
                "analysis in progress; try again when it finishes".to_string(),
            ));
        }
        if self.workflow != WorkflowState::NoCandidate {
            return Err(AppError::NotReady(
                "an improvement is under review; accept or discard it first".to_string(),
            ));
        }

        self.jd_text = Some(jd_text);
        self.result = None;
        self.phase = AnalysisPhase::Idle;
        self.last_error = None;
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            document_name: self.document.as_ref().map(|d| d.display_name().to_string()),
            has_job_description: self.jd_text.is_some(),
            phase: self.phase,
            workflow: self.workflow,
            has_candidate: self.candidate.is_some(),
            result: self.result.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a session, as returned to clients.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub document_name: Option<String>,
    pub has_job_description: bool,
    pub phase: AnalysisPhase,
    pub workflow: WorkflowState,
    pub has_candidate: bool,
    pub result: Option<AnalysisResult>,
    pub last_error: Option<String>,
}

pub type SharedSession = Arc<Mutex<AnalysisSession>>;

/// All live sessions, keyed by identity. Sessions are created on first touch
/// and live for the process lifetime.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_create(&self, identity: &str) -> SharedSession {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(identity.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(AnalysisSession::new())))
            .clone()
    }
}

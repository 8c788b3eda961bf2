//! Match Engine — pluggable, trait-based collaborator that scores a resume
//! against a job description and drafts an improved rendition.
//!
//! Default: `ClaudeMatchEngine` (Anthropic Messages API via `LlmClient`).
//! Tests swap in scripted engines.
//!
//! `AppState` holds an `Arc<dyn MatchEngine>`, wired at startup.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::llm_client::{DocumentAttachment, LlmClient};
use crate::matching::prompts::{
    ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_SYSTEM, REWRITE_PROMPT_TEMPLATE, REWRITE_SYSTEM,
};
use crate::models::analysis::{AnalysisResult, RawAnalysisPayload};
use crate::models::document::DocumentHandle;

/// The match engine trait. Implement this to swap collaborator backends
/// without touching the session, workflow, or handler code.
///
/// Carried in `AppState` as `Arc<dyn MatchEngine>`.
#[async_trait]
pub trait MatchEngine: Send + Sync {
    /// Scores the document against the job description and returns the
    /// structured verdict.
    async fn analyze(
        &self,
        document: &DocumentHandle,
        jd_text: &str,
    ) -> Result<AnalysisResult, AppError>;

    /// Drafts an improved HTML rendition of the document, guided by a prior
    /// analysis. May return an empty string; callers decide what that means.
    async fn rewrite(
        &self,
        document: &DocumentHandle,
        jd_text: &str,
        analysis: &AnalysisResult,
    ) -> Result<String, AppError>;
}

/// Production engine backed by the Claude API.
pub struct ClaudeMatchEngine {
    llm: LlmClient,
}

impl ClaudeMatchEngine {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl MatchEngine for ClaudeMatchEngine {
    async fn analyze(
        &self,
        document: &DocumentHandle,
        jd_text: &str,
    ) -> Result<AnalysisResult, AppError> {
        let prompt = ANALYSIS_PROMPT_TEMPLATE.replace("{jd_text}", jd_text);
        let attachment = DocumentAttachment {
            media_type: document.media_type(),
            data: document.content(),
        };

        let raw: RawAnalysisPayload = self
            .llm
            .call_json_with_document(&attachment, &prompt, ANALYSIS_SYSTEM)
            .await
            .map_err(|e| AppError::Collaborator(e.to_string()))?;

        Ok(AnalysisResult::from_raw(raw))
    }

    async fn rewrite(
        &self,
        document: &DocumentHandle,
        jd_text: &str,
        analysis: &AnalysisResult,
    ) -> Result<String, AppError> {
        let analysis_json =
            serde_json::to_string_pretty(analysis).map_err(anyhow::Error::from)?;
        let prompt = REWRITE_PROMPT_TEMPLATE
            .replace("{analysis_json}", &analysis_json)
            .replace("{jd_text}", jd_text);
        let attachment = DocumentAttachment {
            media_type: document.media_type(),
            data: document.content(),
        };

        self.llm
            .call_markup_with_document(&attachment, &prompt, REWRITE_SYSTEM)
            .await
            .map_err(|e| AppError::Collaborator(e.to_string()))
    }
}

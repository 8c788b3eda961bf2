use serde::{Deserialize, Serialize};

/// Structured verdict on how well a resume matches a job description.
///
/// Produced only by validating a raw collaborator payload, so a constructed
/// value always carries a score in `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score: u8,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub formatting_issues: Vec<String>,
    pub improvement_plan: Vec<String>,
}

/// Payload shape as the collaborator actually returns it.
///
/// The score arrives as a plain JSON number and is not trusted to stay in
/// range; `AnalysisResult::from_raw` clamps it.
#[derive(Debug, Deserialize)]
pub struct RawAnalysisPayload {
    pub score: i64,
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub missing_keywords: Vec<String>,
    #[serde(default)]
    pub formatting_issues: Vec<String>,
    #[serde(default)]
    pub improvement_plan: Vec<String>,
}

impl AnalysisResult {
    /// Converts a raw payload into a validated result, clamping the score
    /// into `0..=100`.
    pub fn from_raw(raw: RawAnalysisPayload) -> Self {
        Self {
            score: raw.score.clamp(0, 100) as u8,
            summary: raw.summary,
            strengths: raw.strengths,
            weaknesses: raw.weaknesses,
            missing_keywords: raw.missing_keywords,
            formatting_issues: raw.formatting_issues,
            improvement_plan: raw.improvement_plan,
        }
    }
}

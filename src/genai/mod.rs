pub mod anthropic;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use anthropic::AnthropicGenerator;

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("generator returned empty content")]
    EmptyContent,

    #[error("no GENAI_API_KEY configured")]
    NotConfigured,
}

pub type GenAiResult<T> = Result<T, GenAiError>;

/// Input for a one-sentence remark about a single assessment answer,
/// shown next to the answer in the HRD review screen.
#[derive(Debug, Clone, Serialize)]
pub struct CommentaryInput {
    pub question: String,
    pub answer: String,
    pub dimension: Option<String>,
}

/// Everything the fit report prompt gets to see about a candidate.
#[derive(Debug, Clone, Serialize)]
pub struct FitReportInput {
    pub position_title: String,
    pub job_description: String,
    pub requirements: serde_json::Value,
    pub candidate_name: String,
    pub candidate_summary: Option<String>,
    pub cv_text: Option<String>,
    pub big_five: Option<serde_json::Value>,
    pub disc_type: Option<String>,
}

/// Multi-section candidate-fit report. The shape is part of the contract
/// with the generator: responses that do not deserialize fail the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    pub summary: String,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchetypeInput {
    pub big_five: serde_json::Value,
    pub disc_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchetypeLabel {
    pub archetype: String,
    pub description: String,
}

/// Generative-text seam. The production implementation calls the Anthropic
/// Messages API; tests substitute a canned fake, mirroring how object
/// storage is faked.
#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    async fn answer_commentary(&self, input: &CommentaryInput) -> GenAiResult<String>;

    async fn fit_report(&self, input: &FitReportInput) -> GenAiResult<FitReport>;

    async fn archetype(&self, input: &ArchetypeInput) -> GenAiResult<ArchetypeLabel>;
}

/// Stand-in used when no API key is configured. Endpoints that need
/// generated text fail with a clear error; everything else keeps working.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn answer_commentary(&self, _input: &CommentaryInput) -> GenAiResult<String> {
        Err(GenAiError::NotConfigured)
    }

    async fn fit_report(&self, _input: &FitReportInput) -> GenAiResult<FitReport> {
        Err(GenAiError::NotConfigured)
    }

    async fn archetype(&self, _input: &ArchetypeInput) -> GenAiResult<ArchetypeLabel> {
        Err(GenAiError::NotConfigured)
    }
}

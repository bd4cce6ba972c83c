//! AI module - Gemini-backed coaching
//!
//! Two single-shot calls against the generative-language API: a free-text
//! performance review and a structured program generation. No retry, no
//! streaming, no cancellation; the caller keeps at most one call in flight.

pub mod prompt;

use std::collections::BTreeMap;
use std::env;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::model::{DayWorkout, Program, WeightUnit, WorkoutKey};

const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const REVIEW_MODEL: &str = "gemini-2.5-flash";
const GENERATION_MODEL: &str = "gemini-2.5-pro";

/// Shown instead of a review when the service cannot be reached at all.
pub const REVIEW_FALLBACK: &str =
    "AI analysis unavailable. Please configure API key or stay focused on your rep ranges.";
/// Shown when the service answers with no text.
const REVIEW_EMPTY: &str = "Analysis complete. Keep up the high intensity.";

/// Lifecycle of one request, as a closed state set.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Idle,
    InFlight,
    Succeeded(T),
    Failed(String),
}

impl<T> RequestState<T> {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }
}

// Request/response shapes for the generateContent endpoint. The API accepts
// snake_case field names.

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Program payload returned by the generation call. Field names follow the
/// JSON format the prompt pins down; serde acts as the schema validator.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedProgram {
    pub name: String,
    #[serde(default)]
    pub goal: Option<String>,
    pub plan: GeneratedPlan,
    #[serde(default)]
    pub history: BTreeMap<WorkoutKey, GeneratedWorkout>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlan {
    pub days_per_week: u32,
    pub max_weeks: u32,
    pub cyclical_reps: Vec<String>,
    pub weight_unit: WeightUnit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedWorkout {
    pub week: u32,
    pub day: u32,
    #[serde(default)]
    pub exercises: Vec<GeneratedExercise>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedExercise {
    pub name: String,
    pub target_reps: String,
}

/// Client for the Gemini generateContent API.
pub struct GeminiClient {
    api_key: String,
    http: Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: Client::new(),
        }
    }

    /// Build a client from `GEMINI_API_KEY`. Construction is the first point
    /// of failure when the key is missing.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var(GEMINI_API_KEY_ENV).map_err(|_| {
            anyhow!("{GEMINI_API_KEY_ENV} is not set; AI features are unavailable")
        })?;
        Ok(Self::new(api_key))
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{API_BASE_URL}/models/{model}:generateContent?key={}",
            self.api_key
        )
    }

    async fn generate(
        &self,
        model: &str,
        prompt: String,
        config: GenerationConfig,
    ) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: Some(config),
        };

        debug!(model, "sending gemini request");
        let response = self
            .http
            .post(self.url(model))
            .json(&request)
            .send()
            .await
            .context("gemini request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read gemini response")?;
        if !status.is_success() {
            bail!("gemini api error ({status}): {}", api_error_message(&body));
        }

        let parsed: GeminiResponse =
            serde_json::from_str(&body).context("failed to parse gemini response")?;
        if let Some(error) = parsed.error {
            bail!("gemini api error: {}", error.message);
        }

        Ok(first_text(&parsed))
    }

    /// Strategic performance review for the viewed workout.
    ///
    /// Never errors: any failure is absorbed into a fixed fallback string so
    /// the caller can render the result unconditionally.
    pub async fn analyze_progress(&self, program: &Program, workout: &DayWorkout) -> String {
        let prompt = prompt::build_review_prompt(program, workout);
        let config = GenerationConfig {
            temperature: Some(0.7),
            response_mime_type: None,
        };
        match self.generate(REVIEW_MODEL, prompt, config).await {
            Ok(text) if text.trim().is_empty() => REVIEW_EMPTY.to_string(),
            Ok(text) => text,
            Err(e) => {
                error!("gemini analysis failed: {e:#}");
                REVIEW_FALLBACK.to_string()
            }
        }
    }

    /// Generate a structured program for a goal/experience/cadence triple.
    ///
    /// Failures propagate: the caller aborts without touching its state.
    pub async fn generate_program(
        &self,
        goal: &str,
        experience: &str,
        days_per_week: u32,
    ) -> Result<GeneratedProgram> {
        let prompt = prompt::build_generation_prompt(goal, experience, days_per_week);
        let config = GenerationConfig {
            temperature: None,
            response_mime_type: Some("application/json".to_string()),
        };
        let text = self.generate(GENERATION_MODEL, prompt, config).await?;
        serde_json::from_str(text.trim()).context("gemini returned a malformed program payload")
    }
}

fn first_text(response: &GeminiResponse) -> String {
    response
        .candidates
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.first())
        .map(|p| p.text.clone())
        .unwrap_or_default()
}

/// Pull the API's error message out of an error body, falling back to the
/// raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<GeminiResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map(|e| e.message)
        .unwrap_or_else(|| body.trim().to_string())
}

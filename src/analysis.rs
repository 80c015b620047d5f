//! Analysis client: one round trip to the hosted model per analysis.

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::schema::{AnalysisMode, AnalysisResult};
use crate::upload::UploadedImage;

/// Seam between the session controller and the external model.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze(&self, mode: AnalysisMode, image: &UploadedImage) -> Result<AnalysisResult>;
}

/// Google Gemini `generateContent` client with a JSON-schema constrained reply.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

/// Request body for one analysis: the image, the mode's instruction and the
/// response schema.
pub fn build_payload(mode: AnalysisMode, image: &UploadedImage) -> Value {
    json!({
        "contents": [{
            "parts": [
                {
                    "inlineData": {
                        "mimeType": image.mime_type,
                        "data": image.payload_base64()
                    }
                },
                { "text": mode.prompt() }
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": mode.response_schema()
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Pull the model's JSON text out of a `generateContent` response body.
pub fn extract_text(body: &str) -> Result<String> {
    let response: GenerateContentResponse = serde_json::from_str(body)?;

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(AppError::RequestError(format!("prompt blocked: {}", reason)));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AppError::ResponseParseError("no candidates in response".into()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AppError::ResponseParseError(format!(
            "no text in response (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(strip_code_fence(&text).to_string())
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
    {
        Some(inner) => inner.trim(),
        None => trimmed,
    }
}

#[async_trait]
impl AnalysisClient for GeminiClient {
    async fn analyze(&self, mode: AnalysisMode, image: &UploadedImage) -> Result<AnalysisResult> {
        if image.payload.is_empty() {
            return Err(AppError::RequestError("image payload is empty".into()));
        }

        let start = Instant::now();
        tracing::info!(
            "Sending {:?} analysis to {} ({} bytes, {})",
            mode,
            self.model,
            image.size_bytes,
            image.mime_type
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&build_payload(mode, image))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                "Model returned {}: {}",
                status,
                preview_text(&body)
            );
            return Err(AppError::RequestError(format!("API error {}", status)));
        }

        let text = extract_text(&body)?;
        let result = mode.parse_result(&text).map_err(|e| {
            tracing::warn!("Unparseable {:?} reply: {}", mode, preview_text(&text));
            e
        })?;

        tracing::info!(
            "{:?} analysis completed in {}ms",
            mode,
            start.elapsed().as_millis()
        );
        Ok(result)
    }
}

/// First 500 characters, for logs.
fn preview_text(text: &str) -> String {
    text.chars().take(500).collect()
}

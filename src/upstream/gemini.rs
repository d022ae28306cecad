use serde::{Deserialize, Serialize};
use sonic_rs::JsonValueTrait;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Transport timeout for upstream calls. No retries are performed here;
/// a timeout surfaces as a network failure for the caller to act on.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// The fixed prompt for the fridge-photo ingredient analysis path.
pub const VISION_PROMPT: &str = "Analyze this image and identify all visible food ingredients and items. \n\
Return ONLY a JSON array of ingredient names as strings, lowercase, singular form.\n\
Example: [\"chicken\", \"tomato\", \"onion\", \"garlic\", \"olive oil\"]\n\
Do not include non-food items. Return ONLY the JSON array.";

/// Sampling configuration forwarded to the generation model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    /// Defaults for recipe generation on the direct path.
    pub fn recipe_direct() -> Self {
        Self {
            temperature: Some(0.8),
            top_k: Some(40),
            top_p: Some(0.95),
            max_output_tokens: Some(2048),
        }
    }

    /// Defaults applied by the proxy when the client sends no config.
    pub fn recipe_proxy() -> Self {
        Self {
            max_output_tokens: Some(4096),
            ..Self::recipe_direct()
        }
    }

    /// Defaults for the image-analysis path.
    pub fn vision() -> Self {
        Self {
            temperature: Some(0.3),
            top_k: None,
            top_p: None,
            max_output_tokens: Some(1024),
        }
    }
}

/// Inline binary data attached to a content part.
#[derive(Debug, Clone, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// One part of a content entry: text or inline data.
#[derive(Debug, Clone, Serialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

/// A content entry in an upstream request.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// The full upstream generation request body.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// A text-only generation request.
    pub fn text(prompt: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
            generation_config: config,
        }
    }

    /// An image-analysis request: the vision prompt plus the inline image.
    pub fn vision(image_base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::text(VISION_PROMPT),
                    Part::inline(mime_type, image_base64),
                ],
            }],
            generation_config: GenerationConfig::vision(),
        }
    }
}

/// A thin client for the upstream generation API.
///
/// The credential travels as a query parameter, which is why it must never
/// appear in logs; only failures are logged, and without the URL.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    /// Creates a new `GeminiClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The upstream endpoint URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Sends a generation request and returns the raw response body.
    ///
    /// # Arguments
    ///
    /// * `api_key` - The upstream credential.
    /// * `request` - The request body.
    ///
    /// # Returns
    ///
    /// The verbatim JSON body on success; a typed `Upstream` error otherwise.
    pub async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<String> {
        let response = self
            .http
            .post(&self.base_url)
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        Ok(body)
    }
}

/// Pulls `candidates[0].content.parts[0].text` out of an upstream response.
pub fn extract_text(body: &str) -> Result<String> {
    let value: sonic_rs::Value = sonic_rs::from_str(body)
        .map_err(|e| AppError::MalformedContent(format!("Invalid upstream JSON: {}", e)))?;

    value
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
        .ok_or_else(|| AppError::MalformedContent("No recipe content received".to_string()))
}

/// Best-effort extraction of `error.message` from an upstream error body.
fn extract_error_message(body: &str) -> String {
    let fallback = || "Failed to generate recipes".to_string();

    let Ok(value) = sonic_rs::from_str::<sonic_rs::Value>(body) else {
        return fallback();
    };

    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
        .unwrap_or_else(fallback)
}

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    state::AppState,
    upstream::gemini::{GenerateContentRequest, GenerationConfig},
    validation::recipe::{validate_image, validate_prompt},
};

/// The request payload for proxied recipe generation.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub generation_config: Option<GenerationConfig>,
}

/// The request payload for proxied image analysis.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageRequest {
    pub image_base64: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Relays an upstream success body verbatim so both client paths see the
/// exact same response shape.
fn relay(body: String) -> Response {
    (
        StatusCode::OK,
        [(http::header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

fn require_upstream_key(state: &AppState) -> Result<&str> {
    state
        .config
        .upstream_api_key
        .as_deref()
        .map(|k| k.as_str())
        .ok_or_else(|| AppError::Configuration("API key not set".to_string()))
}

/// Handles proxied recipe generation.
#[axum::debug_handler]
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Response> {
    validate_prompt(&payload.prompt)?;

    let api_key = require_upstream_key(&state)?;

    let request = GenerateContentRequest::text(
        payload.prompt,
        payload
            .generation_config
            .unwrap_or_else(GenerationConfig::recipe_proxy),
    );

    let body = state.gemini.generate_content(api_key, &request).await?;
    tracing::debug!("Upstream generation relayed");

    Ok(relay(body))
}

/// Handles proxied fridge-image analysis.
#[axum::debug_handler]
pub async fn analyze_image(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeImageRequest>,
) -> Result<Response> {
    validate_image(&payload.image_base64)?;

    let api_key = require_upstream_key(&state)?;

    let mime_type = payload
        .mime_type
        .unwrap_or_else(|| "image/jpeg".to_string());
    let request = GenerateContentRequest::vision(payload.image_base64, mime_type);

    let body = state.gemini.generate_content(api_key, &request).await?;
    tracing::debug!("Upstream image analysis relayed");

    Ok(relay(body))
}

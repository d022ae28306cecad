use async_trait::async_trait;
use serde::Serialize;
use sonic_rs::JsonValueTrait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, DeployMode};
use crate::error::{AppError, Result};
use crate::keystore::store::SessionKeyStore;
use crate::models::recipe::{GeneratedRecipe, RecipeRequest};
use crate::services::normalize;
use crate::upstream::gemini::{self, GeminiClient, GenerateContentRequest, GenerationConfig};

/// One upstream path for generation calls.
///
/// Implementations return the raw model text; the service normalizes it so
/// the caller never knows which path executed.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Runs a text generation and returns the model's raw text output.
    async fn generate(&self, prompt: &str, config: GenerationConfig) -> Result<String>;

    /// Runs an image analysis and returns the model's raw text output.
    async fn analyze_image(&self, image_base64: &str, mime_type: &str) -> Result<String>;
}

/// The development path: this process holds a session credential and talks
/// to the upstream API directly, extending the credential's idle timeout on
/// every successful use.
pub struct DirectBackend {
    gemini: GeminiClient,
    keystore: SessionKeyStore,
}

impl DirectBackend {
    /// Creates a new `DirectBackend`.
    ///
    /// # Arguments
    ///
    /// * `upstream_url` - The upstream endpoint URL.
    /// * `keystore` - The session credential store.
    pub fn new(upstream_url: &str, keystore: SessionKeyStore) -> Self {
        Self {
            gemini: GeminiClient::new(upstream_url),
            keystore,
        }
    }

    async fn require_credential(&self) -> Result<zeroize::Zeroizing<String>> {
        if !self.keystore.has_valid().await {
            return Err(AppError::CredentialExpired);
        }
        self.keystore.get().await.ok_or(AppError::CredentialExpired)
    }

    async fn dispatch(&self, request: &GenerateContentRequest) -> Result<String> {
        let api_key = self.require_credential().await?;
        let body = self.gemini.generate_content(&api_key, request).await?;
        let text = gemini::extract_text(&body)?;
        self.keystore.refresh().await;
        Ok(text)
    }
}

#[async_trait]
impl GenerationBackend for DirectBackend {
    async fn generate(&self, prompt: &str, config: GenerationConfig) -> Result<String> {
        self.dispatch(&GenerateContentRequest::text(prompt, config))
            .await
    }

    async fn analyze_image(&self, image_base64: &str, mime_type: &str) -> Result<String> {
        self.dispatch(&GenerateContentRequest::vision(image_base64, mime_type))
            .await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyGenerateBody<'a> {
    prompt: &'a str,
    generation_config: &'a GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyAnalyzeBody<'a> {
    image_base64: &'a str,
    mime_type: &'a str,
}

/// The production path: calls go to the same-origin gated proxy, which holds
/// the real credential. The session credential store is never consulted.
pub struct ProxyBackend {
    http: reqwest::Client,
    base_url: String,
}

impl ProxyBackend {
    /// Creates a new `ProxyBackend`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The same-origin base URL of the proxy.
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<String> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message: proxy_error_message(&text),
            });
        }

        gemini::extract_text(&text)
    }
}

/// Pulls the human-readable message out of a proxy `{error, message?}` body.
fn proxy_error_message(body: &str) -> String {
    let fallback = || "Failed to generate recipes".to_string();

    let Ok(value) = sonic_rs::from_str::<sonic_rs::Value>(body) else {
        return fallback();
    };

    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
        .unwrap_or_else(fallback)
}

#[async_trait]
impl GenerationBackend for ProxyBackend {
    async fn generate(&self, prompt: &str, config: GenerationConfig) -> Result<String> {
        self.post(
            "/api/generate",
            &ProxyGenerateBody {
                prompt,
                generation_config: &config,
            },
        )
        .await
    }

    async fn analyze_image(&self, image_base64: &str, mime_type: &str) -> Result<String> {
        self.post(
            "/api/analyze-image",
            &ProxyAnalyzeBody {
                image_base64,
                mime_type,
            },
        )
        .await
    }
}

/// The generation request router: validates locally, dispatches to the
/// backend selected at startup, and normalizes the response.
#[derive(Clone)]
pub struct RecipeService {
    backend: Arc<dyn GenerationBackend>,
}

impl RecipeService {
    /// Creates a new `RecipeService` over an explicit backend.
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Selects the backend once from configuration: proxy in production,
    /// direct (with the session credential store) in development.
    ///
    /// # Arguments
    ///
    /// * `config` - The application configuration.
    /// * `keystore` - The session credential store for the direct path.
    /// * `proxy_base_url` - Base URL of the same-origin proxy.
    pub fn from_config(
        config: &Config,
        keystore: SessionKeyStore,
        proxy_base_url: &str,
    ) -> Self {
        let backend: Arc<dyn GenerationBackend> = match config.mode {
            DeployMode::Production => {
                tracing::info!("Recipe generation routed through the same-origin proxy");
                Arc::new(ProxyBackend::new(proxy_base_url))
            }
            DeployMode::Development => {
                tracing::info!("Recipe generation calls the upstream directly");
                Arc::new(DirectBackend::new(&config.upstream_url, keystore))
            }
        };
        Self::new(backend)
    }

    /// Generates recipes for the given request.
    ///
    /// Requests with fewer than 3 or more than 10 ingredients are rejected
    /// locally before any network call.
    ///
    /// # Arguments
    ///
    /// * `request` - The normalized recipe request.
    ///
    /// # Returns
    ///
    /// A `Result` containing the parsed recipe batch.
    pub async fn generate(&self, request: &RecipeRequest) -> Result<Vec<GeneratedRecipe>> {
        request.validate()?;

        let prompt = request.prompt();
        let raw = self
            .backend
            .generate(&prompt, GenerationConfig::recipe_direct())
            .await?;

        let recipes = normalize::parse_recipes(&raw)?;
        tracing::debug!("Generated {} recipes", recipes.len());
        Ok(recipes)
    }

    /// Identifies ingredients in a photographed fridge image.
    ///
    /// # Arguments
    ///
    /// * `image_base64` - The base64-encoded image.
    /// * `mime_type` - The image MIME type.
    ///
    /// # Returns
    ///
    /// A `Result` containing the detected ingredient names.
    pub async fn analyze_image(
        &self,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<Vec<String>> {
        crate::validation::recipe::validate_image(image_base64)?;

        let raw = self.backend.analyze_image(image_base64, mime_type).await?;
        normalize::parse_ingredients(&raw)
    }
}

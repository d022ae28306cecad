use anyhow::{Context, Result};
use std::env;
use zeroize::Zeroizing;

/// The default upstream Gemini endpoint.
pub const DEFAULT_UPSTREAM_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// The deployment mode, selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    /// The browser-equivalent direct path: the caller holds a session
    /// credential and talks to the upstream itself.
    Development,
    /// The proxy path: all calls go through the same-origin gate and the
    /// credential never leaves the server.
    Production,
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The deployment mode (`APP_ENV`).
    pub mode: DeployMode,
    /// The upstream model endpoint.
    pub upstream_url: String,
    /// The server-held upstream credential. Absence is not fatal at startup;
    /// it becomes a 500 on the first proxied request.
    pub upstream_api_key: Option<Zeroizing<String>>,
    /// Extra allowed origin patterns for the gate (localhost is always allowed).
    pub allowed_origins: Vec<String>,
    /// Max generation requests per client per minute.
    pub generate_limit: u32,
    /// Max image analyses per client per minute.
    pub analyze_limit: u32,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let mode = match env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .as_str()
        {
            "production" => DeployMode::Production,
            _ => DeployMode::Development,
        };

        let upstream_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(Zeroizing::new);

        if upstream_api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY not set - proxied requests will fail with 500");
        }

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            mode,
            upstream_url: env::var("UPSTREAM_URL")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string()),
            upstream_api_key,
            allowed_origins,
            generate_limit: env::var("GENERATE_RATE_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid GENERATE_RATE_LIMIT")?,
            analyze_limit: env::var("ANALYZE_RATE_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid ANALYZE_RATE_LIMIT")?,
        })
    }
}

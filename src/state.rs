use crate::config::Config;
use crate::gate::origin::OriginPolicy;
use crate::gate::quota::QuotaTable;
use crate::upstream::gemini::GeminiClient;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// The origin allow-list for the proxy endpoints.
    pub origins: OriginPolicy,
    /// The upstream API client.
    pub gemini: GeminiClient,
    /// Quota table for the generation endpoint.
    pub generate_quota: QuotaTable,
    /// Quota table for the image-analysis endpoint.
    pub analyze_quota: QuotaTable,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    pub fn new(config: &Config) -> Self {
        let origins = OriginPolicy::new(config.allowed_origins.clone());

        let gemini = GeminiClient::new(&config.upstream_url);

        let generate_quota = QuotaTable::new(config.generate_limit);
        let analyze_quota = QuotaTable::new(config.analyze_limit);
        tracing::info!(
            "Quota tables initialized: generate {}/min, analyze {}/min",
            config.generate_limit,
            config.analyze_limit
        );

        AppState {
            config: config.clone(),
            origins,
            gemini,
            generate_quota,
            analyze_quota,
        }
    }
}

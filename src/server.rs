use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::post,
    Router,
};
use http::{header, Method};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{handlers, middleware_layer, state::AppState};

/// Body limit: a 7 MB base64 image payload plus JSON overhead.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Assembles the proxy router with the full gate stack.
///
/// Gate order per endpoint: permissive CORS preflight handling, POST-only
/// routing, origin allow-list, per-client quota, then payload validation in
/// the handler itself.
///
/// # Arguments
///
/// * `state` - The application state.
///
/// # Returns
///
/// The configured `Router`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let generate_routes = Router::new()
        .route("/api/generate", post(handlers::proxy::generate))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::gate::quota_generate,
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::gate::require_allowed_origin,
        ))
        .with_state(state.clone());

    let analyze_routes = Router::new()
        .route("/api/analyze-image", post(handlers::proxy::analyze_image))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::gate::quota_analyze,
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::gate::require_allowed_origin,
        ))
        .with_state(state.clone());

    Router::new()
        .merge(generate_routes)
        .merge(analyze_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .fallback_service(ServeDir::new("public"))
}

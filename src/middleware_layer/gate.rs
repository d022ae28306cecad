use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::net::SocketAddr;

use crate::{error::AppError, state::AppState};

/// Derives the client identity for quota bucketing.
///
/// Forwarding headers are trusted outright, which is only meaningful behind
/// a reverse proxy that sets them honestly; see DESIGN.md.
///
/// # Arguments
///
/// * `req` - The incoming request.
///
/// # Returns
///
/// The client identity string, or "unknown" if none can be derived.
fn extract_client_identity(req: &Request<Body>) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }

    if let Some(real_ip) = req
        .headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return real_ip.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Reads the declared origin, falling back to the referrer.
fn declared_origin(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(http::header::ORIGIN)
        .or_else(|| req.headers().get(http::header::REFERER))
        .and_then(|v| v.to_str().ok())
}

/// A middleware that rejects requests from origins outside the allow-list.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `req` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response`, either the rejection or the inner handler's.
pub async fn require_allowed_origin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = declared_origin(&req);

    if !state.origins.is_allowed(origin) {
        tracing::warn!(
            "Blocked request from unauthorized origin: {}",
            origin.unwrap_or("<none>")
        );
        return AppError::Unauthorized.into_response();
    }

    next.run(req).await
}

/// A middleware that enforces the generation endpoint's quota.
pub async fn quota_generate(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let identity = extract_client_identity(&req);

    if !state.generate_quota.register(&identity, Utc::now()).await {
        tracing::warn!("Generation rate limit exceeded for client: {}", identity);
        return AppError::RateLimitExceeded(
            "Please wait a moment before generating more recipes".to_string(),
        )
        .into_response();
    }

    next.run(req).await
}

/// A middleware that enforces the image-analysis endpoint's quota.
pub async fn quota_analyze(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let identity = extract_client_identity(&req);

    if !state.analyze_quota.register(&identity, Utc::now()).await {
        tracing::warn!("Image analysis rate limit exceeded for client: {}", identity);
        return AppError::RateLimitExceeded(
            "Please wait before analyzing more images".to_string(),
        )
        .into_response();
    }

    next.run(req).await
}

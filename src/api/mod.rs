//! HTTP boundary
//!
//! Translates conditional requests into 304/200/stale responses from
//! the L2 tier. Every response carries an `ETag`, cache-control
//! directives mirroring the TTL/SWR windows, and an `X-Cache`
//! diagnostic header naming the tier that served it.

use crate::aggregator::DEFAULT_KEY;
use crate::cache::CacheEntry;
use crate::runtime::SignalsRuntime;
use crate::telemetry::{record_cache_tier, CacheTier};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

/// Diagnostic header naming the cache tier that served the response
pub const CACHE_TIER_HEADER: &str = "x-cache";

/// Build the API router
pub fn router(runtime: Arc<SignalsRuntime>) -> Router {
    Router::new()
        .route("/signals", get(get_signals))
        .route("/health", get(get_health))
        .with_state(runtime)
}

#[derive(Debug, Deserialize)]
struct SignalsQuery {
    key: Option<String>,
}

async fn get_signals(
    State(runtime): State<Arc<SignalsRuntime>>,
    Query(query): Query<SignalsQuery>,
    request_headers: HeaderMap,
) -> Response {
    let key = query.key.unwrap_or_else(|| DEFAULT_KEY.to_string());
    let now = Utc::now();
    let cache = runtime.config().cache.clone();
    let cache_control = format!(
        "public, max-age={}, stale-while-revalidate={}",
        cache.ttl_secs, cache.swr_secs
    );

    if let Some(entry) = runtime.l2.get_fresh(&key, now).await {
        return respond(entry, CacheTier::Hit, &request_headers, &cache_control);
    }

    if let Some(entry) = runtime.l2.get_stale_but_serveable(&key, now).await {
        // Serve stale immediately; the refresh runs detached and its
        // result is intentionally discarded here
        let background = Arc::clone(&runtime);
        let refresh_key = key.clone();
        tokio::spawn(async move {
            if let Err(e) = background.refresh(&refresh_key).await {
                tracing::warn!(key = %refresh_key, error = %e, "Background refresh failed");
            }
        });
        return respond(entry, CacheTier::Stale, &request_headers, &cache_control);
    }

    // Cold cache: block on the (singleflight) refresh
    let feed = match runtime.refresh(&key).await {
        Ok(feed) => feed,
        Err(e) => {
            // The aggregator refresher is total, but degrade to an
            // empty payload rather than an error either way
            tracing::error!(key = %key, error = %e, "Blocking refresh failed");
            crate::feed::SignalFeed::empty(Utc::now())
        }
    };
    respond(
        CacheEntry::from_feed(feed),
        CacheTier::Miss,
        &request_headers,
        &cache_control,
    )
}

async fn get_health(State(runtime): State<Arc<SignalsRuntime>>) -> Response {
    Json(runtime.breakers.snapshot().await).into_response()
}

fn respond(
    entry: CacheEntry,
    tier: CacheTier,
    request_headers: &HeaderMap,
    cache_control: &str,
) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ETAG,
        HeaderValue::from_str(&entry.etag).unwrap_or(HeaderValue::from_static("\"invalid\"")),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_str(cache_control)
            .unwrap_or(HeaderValue::from_static("public, max-age=180")),
    );

    let if_none_match = request_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());
    if if_none_match == Some(entry.etag.as_str()) {
        record_cache_tier(CacheTier::Hit304);
        headers.insert(
            CACHE_TIER_HEADER,
            HeaderValue::from_static(CacheTier::Hit304.as_str()),
        );
        return (StatusCode::NOT_MODIFIED, headers).into_response();
    }

    record_cache_tier(tier);
    headers.insert(CACHE_TIER_HEADER, HeaderValue::from_static(tier.as_str()));
    (StatusCode::OK, headers, Json(entry.payload)).into_response()
}

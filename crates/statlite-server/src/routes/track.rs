use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use statlite_core::{
    anonymizer::{partial_ip, user_agent_hash},
    bot, device,
    hit::{truncate_field, Hit, TrackPayload},
    referrer,
};

use crate::state::AppState;

/// Proxy headers consulted for the client address, most trusted first.
const IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-real-ip", "x-forwarded-for"];

/// `POST /api/track` — record one anonymized page view.
///
/// The body carries only what the page knows (`path`, `referrer`, `status`);
/// client IP and user agent come from the request itself.
///
/// A hit is silently dropped when:
/// - the path starts with a configured excluded prefix (admin surfaces),
/// - the page rendered a 404,
/// - the user agent is empty or matches the bot denylist.
///
/// The response is `202 {"ok": true}` in every case, including storage
/// failure — tracking must never break page delivery, and whether a hit was
/// kept is not leaked to the client.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn track(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<TrackPayload>,
) -> impl IntoResponse {
    let accepted = (StatusCode::ACCEPTED, Json(json!({ "ok": true })));

    if state
        .config
        .excluded_paths
        .iter()
        .any(|prefix| payload.path.starts_with(prefix.as_str()))
    {
        return accepted;
    }
    if payload.status == Some(404) {
        return accepted;
    }

    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if user_agent.is_empty() || bot::is_bot(user_agent) {
        return accepted;
    }

    let client_ip = extract_client_ip(&headers, peer);
    let anon_ip = partial_ip(&client_ip);
    let info = device::classify(user_agent);

    let hit = Hit {
        visitor_hash: state.anonymizer.visitor_hash(&anon_ip, user_agent),
        page_path: truncate_field(&payload.path).to_string(),
        referrer: payload
            .referrer
            .as_deref()
            .map(truncate_field)
            .and_then(|r| referrer::normalize(r, &state.config.site_host)),
        user_agent_hash: user_agent_hash(user_agent),
        device_type: info.device_type,
        os: info.os,
        hit_date: Utc::now(),
    };

    if let Err(e) = state.db.insert_hits(&[hit]).await {
        tracing::error!(error = %e, "Failed to store hit — dropping");
    }

    accepted
}

/// Client IP resolution: `CF-Connecting-IP`, then `X-Real-IP`, then the
/// first `X-Forwarded-For` entry, then the socket peer. The first candidate
/// that parses as an IP address wins; garbage header values are skipped.
fn extract_client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    for name in IP_HEADERS {
        let Some(value) = headers.get(*name).and_then(|v| v.to_str().ok()) else {
            continue;
        };
        let candidate = value.split(',').next().unwrap_or("").trim();
        if candidate.parse::<std::net::IpAddr>().is_ok() {
            return candidate.to_string();
        }
    }
    peer.ip().to_string()
}

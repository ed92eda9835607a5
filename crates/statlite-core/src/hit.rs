//! The raw hit model and the tracker/heatmap wire payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::{DeviceType, OsFamily};

/// Storage limit for page paths and referrers.
pub const MAX_FIELD_BYTES: usize = 255;

/// The payload the tracking snippet sends to `POST /api/track`.
///
/// IP and user agent come from request headers, not the body.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackPayload {
    /// Page path as seen by the client, e.g. `/blog/post?x=1`.
    pub path: String,
    /// Raw referrer URL, absent for direct navigation.
    pub referrer: Option<String>,
    /// HTTP status the page rendered with; 404s are not tracked.
    pub status: Option<u16>,
}

/// One recorded, anonymized page view. Immutable once created; consumed and
/// deleted in bulk by the aggregator.
#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    pub visitor_hash: String,
    pub page_path: String,
    /// Normalized referrer label; `None` is direct traffic.
    pub referrer: Option<String>,
    pub user_agent_hash: String,
    pub device_type: DeviceType,
    pub os: OsFamily,
    pub hit_date: DateTime<Utc>,
}

/// Viewport class for heatmap cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    Mobile,
    Tablet,
    Desktop,
}

impl Viewport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Viewport::Mobile => "mobile",
            Viewport::Tablet => "tablet",
            Viewport::Desktop => "desktop",
        }
    }

    /// Unknown labels coerce to desktop rather than erroring — the beacon
    /// caller never sees responses, so rejection would only lose data.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw {
            "mobile" => Viewport::Mobile,
            "tablet" => Viewport::Tablet,
            _ => Viewport::Desktop,
        }
    }
}

/// `POST /api/heatmap/click` beacon body.
#[derive(Debug, Clone, Deserialize)]
pub struct HeatmapClick {
    pub page_path: String,
    pub viewport: String,
    /// Horizontal position as a percentage of page width, 0..=100.
    pub x: u32,
    /// Vertical 20px bucket index.
    pub y: u32,
}

/// One aggregated heatmap grid cell, as returned by the read endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapCell {
    pub x: u32,
    pub y: u32,
    pub count: u64,
}

/// Truncate a string to at most [`MAX_FIELD_BYTES`] bytes without splitting
/// a UTF-8 character.
pub fn truncate_field(s: &str) -> &str {
    if s.len() <= MAX_FIELD_BYTES {
        return s;
    }
    let mut end = MAX_FIELD_BYTES;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

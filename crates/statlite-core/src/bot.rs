//! Bot and crawler user-agent detection.

/// Case-insensitive substring denylist: search-engine crawlers, HTTP client
/// libraries, uptime monitors, and generic automation tokens. Order does not
/// matter here — any match classifies the UA as a bot.
///
/// This is a heuristic filter, not a security boundary; false positives and
/// negatives are accepted.
const BOT_PATTERNS: &[&str] = &[
    "googlebot",
    "bingbot",
    "slurp",
    "duckduckbot",
    "baiduspider",
    "yandexbot",
    "sogou",
    "exabot",
    "facebot",
    "ia_archiver",
    "scrapy",
    "python-requests",
    "curl",
    "wget",
    "go-http-client",
    "java/",
    "php/",
    "ruby",
    "node-fetch",
    "axios",
    "okhttp",
    "httpclient",
    "apache-httpclient",
    "libwww-perl",
    "perl",
    "bot",
    "crawler",
    "spider",
    "scraper",
    "feed",
    "rss",
    "validator",
    "check",
    "monitor",
    "uptime",
    "pingdom",
    "newrelic",
    "ping",
    "health",
];

/// Classify a user-agent string as bot traffic.
///
/// An empty user agent is not treated as a bot — the tracker separately
/// drops empty-UA requests, so failing open here cannot silently record
/// nothing.
pub fn is_bot(user_agent: &str) -> bool {
    if user_agent.is_empty() {
        return false;
    }
    let ua = user_agent.to_lowercase();
    BOT_PATTERNS.iter().any(|pattern| ua.contains(pattern))
}

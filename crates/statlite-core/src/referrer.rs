//! Referrer URL normalization into canonical source labels.

/// Ordered substring rules mapping a cleaned referrer host to a source label.
///
/// First match wins and the rules are not mutually exclusive (a host
/// containing both `google.` and `mail.` resolves to `Google` because the
/// search-engine rules come first), so the order is load-bearing.
const SOURCE_RULES: &[(&str, &str)] = &[
    // Social platforms.
    ("t.co", "Twitter"),
    ("twitter.com", "Twitter"),
    ("facebook.com", "Facebook"),
    ("fb.com", "Facebook"),
    ("linkedin.com", "LinkedIn"),
    ("instagram.com", "Instagram"),
    ("pinterest.com", "Pinterest"),
    ("reddit.com", "Reddit"),
    ("youtube.com", "YouTube"),
    ("youtu.be", "YouTube"),
    ("tiktok.com", "TikTok"),
    // Search engines.
    ("google.", "Google"),
    ("bing.com", "Bing"),
    ("yahoo.com", "Yahoo"),
    ("duckduckgo.com", "DuckDuckGo"),
    ("baidu.com", "Baidu"),
    ("yandex.", "Yandex"),
    // Email clients.
    ("mail.", "Email"),
    ("outlook.com", "Email"),
    ("gmail.com", "Email"),
];

/// Map a raw referrer URL to a canonical source label.
///
/// Returns `None` (direct traffic) when the URL is empty or unparseable, or
/// when the referrer host is the current site or one of its subdomains —
/// internal navigation is not a referral. Hosts matching no rule are
/// returned as-is (lowercased, `www.` stripped).
pub fn normalize(referrer: &str, current_host: &str) -> Option<String> {
    if referrer.is_empty() {
        return None;
    }

    let parsed = url::Url::parse(referrer).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host_clean = host.strip_prefix("www.").unwrap_or(&host);

    let current = current_host.to_lowercase();
    let current_clean = current.strip_prefix("www.").unwrap_or(&current);
    if !current_clean.is_empty() {
        if host_clean == current_clean {
            return None;
        }
        if host_clean.ends_with(&format!(".{current_clean}")) {
            return None;
        }
    }

    for (needle, label) in SOURCE_RULES {
        if host_clean.contains(needle) {
            return Some((*label).to_string());
        }
    }

    Some(host_clean.to_string())
}

//! Visitor anonymization: partial IPs, rotating daily salts, salted hashes.
//!
//! No full IP address is ever hashed or stored. The visitor fingerprint is
//! HMAC-SHA256 keyed with a per-day random salt, so the same visitor is
//! unlinkable across calendar days once the salt rotates.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::cache::TtlCache;

type HmacSha256 = Hmac<Sha256>;

const SALT_KEY_PREFIX: &str = "daily_salt_";

/// Salt entropy in bytes before hex encoding.
const SALT_BYTES: usize = 64;

/// Salts live 25 hours so a hash computed just before midnight still
/// verifies against the cache entry just after.
const SALT_TTL: Duration = Duration::from_secs(25 * 60 * 60);

/// Reduce an IP address to its last component.
///
/// IPv4 `a.b.c.d` becomes `"0.0.0.d"`. IPv4-mapped IPv6 addresses are
/// unwrapped first. Plain IPv6 keeps only the last non-empty colon segment,
/// prefixed `"::"`. Anything unparseable maps to `"0.0.0.0"`.
pub fn partial_ip(raw: &str) -> String {
    let ip: IpAddr = match raw.trim().parse() {
        Ok(ip) => ip,
        Err(_) => return "0.0.0.0".to_string(),
    };

    match ip {
        IpAddr::V4(v4) => format!("0.0.0.{}", v4.octets()[3]),
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return format!("0.0.0.{}", v4.octets()[3]);
            }
            // Canonical text form, last non-empty segment. `::1` -> "1".
            let text = v6.to_string();
            let last = text.rsplit(':').find(|seg| !seg.is_empty()).unwrap_or("");
            format!("::{last}")
        }
    }
}

/// Hash a user-agent string with plain SHA-256.
///
/// Deliberately not salted: this is a coarse dedup signal that stays stable
/// across days. The privacy-sensitive identifier is the visitor hash.
pub fn user_agent_hash(user_agent: &str) -> String {
    hex::encode(Sha256::digest(user_agent.as_bytes()))
}

/// Computes salted visitor fingerprints with a lazily generated, rotating
/// per-day salt held in a [`TtlCache`].
pub struct Anonymizer {
    salts: Arc<dyn TtlCache>,
}

impl Anonymizer {
    pub fn new(salts: Arc<dyn TtlCache>) -> Self {
        Self { salts }
    }

    /// Fingerprint for today's salt (site-local calendar date).
    pub fn visitor_hash(&self, partial_ip: &str, user_agent: &str) -> String {
        self.visitor_hash_on(Local::now().date_naive(), partial_ip, user_agent)
    }

    /// Fingerprint keyed by an explicit date. Same inputs and date give the
    /// same hash; a different date rotates the salt and changes the hash.
    pub fn visitor_hash_on(&self, date: NaiveDate, partial_ip: &str, user_agent: &str) -> String {
        let salt = self.daily_salt_for(date);
        let mut mac = HmacSha256::new_from_slice(salt.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(partial_ip.as_bytes());
        mac.update(user_agent.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Fetch the salt for `date`, generating and caching it on first use.
    ///
    /// The salt value must never appear in logs.
    fn daily_salt_for(&self, date: NaiveDate) -> String {
        let key = format!("{SALT_KEY_PREFIX}{}", date.format("%Y-%m-%d"));
        if let Some(salt) = self.salts.get(&key) {
            return salt;
        }
        let mut buf = [0u8; SALT_BYTES];
        rand::thread_rng().fill_bytes(&mut buf);
        let salt = hex::encode(buf);
        self.salts.set(&key, salt.clone(), SALT_TTL);
        salt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryTtlCache;

    fn anonymizer() -> Anonymizer {
        Anonymizer::new(Arc::new(InMemoryTtlCache::new()))
    }

    #[test]
    fn partial_ip_keeps_last_ipv4_octet() {
        assert_eq!(partial_ip("192.168.34.17"), "0.0.0.17");
        assert_eq!(partial_ip("8.8.8.8"), "0.0.0.8");
    }

    #[test]
    fn partial_ip_keeps_last_ipv6_segment() {
        assert_eq!(partial_ip("2001:db8:85a3::8a2e:370:7334"), "::7334");
        assert_eq!(partial_ip("::1"), "::1");
    }

    #[test]
    fn partial_ip_unwraps_mapped_ipv4() {
        assert_eq!(partial_ip("::ffff:10.0.0.42"), "0.0.0.42");
    }

    #[test]
    fn partial_ip_invalid_input_is_zeroed() {
        assert_eq!(partial_ip("not-an-ip"), "0.0.0.0");
        assert_eq!(partial_ip(""), "0.0.0.0");
        assert_eq!(partial_ip("999.1.2.3"), "0.0.0.0");
    }

    #[test]
    fn visitor_hash_is_stable_within_a_day() {
        let anon = anonymizer();
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let a = anon.visitor_hash_on(date, "0.0.0.17", "Mozilla/5.0");
        let b = anon.visitor_hash_on(date, "0.0.0.17", "Mozilla/5.0");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn visitor_hash_rotates_across_days() {
        let anon = anonymizer();
        let day1 = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let a = anon.visitor_hash_on(day1, "0.0.0.17", "Mozilla/5.0");
        let b = anon.visitor_hash_on(day2, "0.0.0.17", "Mozilla/5.0");
        assert_ne!(a, b, "identical inputs must be unlinkable across days");
    }

    #[test]
    fn visitor_hash_differs_per_visitor() {
        let anon = anonymizer();
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let a = anon.visitor_hash_on(date, "0.0.0.17", "Mozilla/5.0");
        let b = anon.visitor_hash_on(date, "0.0.0.18", "Mozilla/5.0");
        assert_ne!(a, b);
    }

    #[test]
    fn user_agent_hash_is_unsalted_sha256() {
        let expected = hex::encode(Sha256::digest(b"curl/8.0"));
        assert_eq!(user_agent_hash("curl/8.0"), expected);
    }
}

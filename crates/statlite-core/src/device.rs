//! Coarse device-type and OS classification from user-agent strings.
//!
//! Classification is an ordered list of substring predicates evaluated
//! first-match-wins. The tablet check runs before the mobile check so
//! Android tablets ("android" without "mobile") are not misclassified.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "Desktop",
            DeviceType::Mobile => "Mobile",
            DeviceType::Tablet => "Tablet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OsFamily {
    Ios,
    Android,
    Windows,
    MacOs,
    Linux,
    Other,
}

impl OsFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Ios => "iOS",
            OsFamily::Android => "Android",
            OsFamily::Windows => "Windows",
            OsFamily::MacOs => "MacOS",
            OsFamily::Linux => "Linux",
            OsFamily::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_type: DeviceType,
    pub os: OsFamily,
}

const TABLET_TOKENS: &[&str] = &["tablet", "ipad", "playbook"];

const MOBILE_TOKENS: &[&str] = &[
    "mobile",
    "android",
    "iphone",
    "ipod",
    "blackberry",
    "phone",
    "opera mini",
    "iemobile",
    "webos",
];

/// Ordered (token, family) pairs; iOS before Android before the desktop OSes.
const OS_RULES: &[(&str, OsFamily)] = &[
    ("iphone", OsFamily::Ios),
    ("ipad", OsFamily::Ios),
    ("ipod", OsFamily::Ios),
    ("android", OsFamily::Android),
    ("windows", OsFamily::Windows),
    ("macintosh", OsFamily::MacOs),
    ("mac os x", OsFamily::MacOs),
    ("linux", OsFamily::Linux),
];

/// Classify a user agent into a device type and OS family.
///
/// Unrecognized or empty input degrades to `Desktop` / `Other` rather than
/// failing.
pub fn classify(user_agent: &str) -> DeviceInfo {
    let ua = user_agent.to_lowercase();
    DeviceInfo {
        device_type: detect_device_type(&ua),
        os: detect_os(&ua),
    }
}

fn detect_device_type(ua: &str) -> DeviceType {
    if TABLET_TOKENS.iter().any(|t| ua.contains(t))
        || (ua.contains("android") && !ua.contains("mobile"))
    {
        return DeviceType::Tablet;
    }
    if MOBILE_TOKENS.iter().any(|t| ua.contains(t)) {
        return DeviceType::Mobile;
    }
    DeviceType::Desktop
}

fn detect_os(ua: &str) -> OsFamily {
    for (token, family) in OS_RULES {
        if ua.contains(token) {
            return *family;
        }
    }
    OsFamily::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipad_is_tablet_on_ios() {
        let info = classify("Mozilla/5.0 (iPad; CPU OS 14_0 like Mac OS X)");
        assert_eq!(info.device_type, DeviceType::Tablet);
        assert_eq!(info.os, OsFamily::Ios);
    }

    #[test]
    fn android_without_mobile_is_tablet() {
        let info = classify("Mozilla/5.0 (Linux; Android 13; SM-X700)");
        assert_eq!(info.device_type, DeviceType::Tablet);
        assert_eq!(info.os, OsFamily::Android);
    }

    #[test]
    fn android_with_mobile_is_mobile() {
        let info = classify("Mozilla/5.0 (Linux; Android 13; Pixel 7) Mobile Safari");
        assert_eq!(info.device_type, DeviceType::Mobile);
        assert_eq!(info.os, OsFamily::Android);
    }

    #[test]
    fn iphone_is_mobile_on_ios() {
        let info = classify("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)");
        assert_eq!(info.device_type, DeviceType::Mobile);
        assert_eq!(info.os, OsFamily::Ios);
    }

    #[test]
    fn mac_desktop() {
        let info = classify("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)");
        assert_eq!(info.device_type, DeviceType::Desktop);
        assert_eq!(info.os, OsFamily::MacOs);
    }

    #[test]
    fn windows_desktop() {
        let info = classify("Mozilla/5.0 (Windows NT 10.0; Win64; x64)");
        assert_eq!(info.device_type, DeviceType::Desktop);
        assert_eq!(info.os, OsFamily::Windows);
    }

    #[test]
    fn unknown_ua_degrades_to_desktop_other() {
        let info = classify("weird/0.0");
        assert_eq!(info.device_type, DeviceType::Desktop);
        assert_eq!(info.os, OsFamily::Other);
    }
}

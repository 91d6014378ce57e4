use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

// Metadados do request gravados junto do refresh token e do audit log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device: Option<String>,
    pub country: Option<String>,
}

/// Extrai IP (cadeia x-forwarded-for / x-real-ip) e User-Agent dos headers.
pub fn extract_metadata(headers: &HeaderMap) -> RequestMetadata {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        });

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let (browser, os, device) = match user_agent.as_deref() {
        Some(ua) => parse_user_agent(ua),
        None => (
            "Unknown".to_string(),
            "Unknown".to_string(),
            "Unknown".to_string(),
        ),
    };

    RequestMetadata {
        ip,
        user_agent,
        browser: Some(browser),
        os: Some(os),
        device: Some(device),
        country: None,
    }
}

/// Classificação grosseira de browser/OS/dispositivo a partir do User-Agent.
pub fn parse_user_agent(user_agent: &str) -> (String, String, String) {
    if user_agent.is_empty() {
        return (
            "Unknown".to_string(),
            "Unknown".to_string(),
            "Unknown".to_string(),
        );
    }

    let ua = user_agent.to_lowercase();

    let os = if ua.contains("windows") {
        "Windows"
    } else if ua.contains("mac os") || ua.contains("macos") {
        "macOS"
    } else if ua.contains("android") {
        "Android"
    } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ios") {
        "iOS"
    } else if ua.contains("linux") {
        "Linux"
    } else {
        "Unknown"
    };

    let browser = if ua.contains("edg") {
        "Edge"
    } else if ua.contains("opr") || ua.contains("opera") {
        "Opera"
    } else if ua.contains("chrome") {
        "Chrome"
    } else if ua.contains("firefox") {
        "Firefox"
    } else if ua.contains("safari") {
        "Safari"
    } else {
        "Unknown"
    };

    let device = if ua.contains("mobile") {
        "Mobile"
    } else if ua.contains("tablet") || ua.contains("ipad") {
        "Tablet"
    } else {
        "Desktop"
    };

    (browser.to_string(), os.to_string(), device.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

    #[test]
    fn forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.1"));
        let meta = extract_metadata(&headers);
        assert_eq!(meta.ip.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn real_ip_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        let meta = extract_metadata(&headers);
        assert_eq!(meta.ip.as_deref(), Some("198.51.100.2"));
    }

    #[test]
    fn chrome_on_windows_desktop() {
        let (browser, os, device) = parse_user_agent(CHROME_WIN);
        assert_eq!(browser, "Chrome");
        assert_eq!(os, "Windows");
        assert_eq!(device, "Desktop");
    }

    #[test]
    fn edge_wins_over_chrome_token() {
        let (browser, _, _) = parse_user_agent("Mozilla/5.0 ... Chrome/120.0 Edg/120.0");
        assert_eq!(browser, "Edge");
    }

    #[test]
    fn android_mobile() {
        let (_, os, device) =
            parse_user_agent("Mozilla/5.0 (Linux; Android 14; Pixel) Mobile Safari/537.36");
        assert_eq!(os, "Android");
        assert_eq!(device, "Mobile");
    }

    #[test]
    fn empty_ua_is_unknown() {
        let (browser, os, device) = parse_user_agent("");
        assert_eq!((browser.as_str(), os.as_str(), device.as_str()), ("Unknown", "Unknown", "Unknown"));
    }
}

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE, ORIGIN, REFERER, USER_AGENT,
};

use super::HttpError;

/// Fixed request identity presented to the points API.
#[derive(Debug, Clone)]
pub struct BrowserProfile {
    /// Host of the API, sent as the `authority` header.
    pub authority: String,
    /// Web front-end origin; the referer is the origin with a trailing slash.
    pub origin: String,
    pub user_agent: String,
}

/// Session state for a run of calls against the points API: the fixed browser
/// header bundle plus whatever cookie the server issued last.
///
/// A new cookie replaces the previous one wholesale and is then attached to
/// every following request until replaced again.
#[derive(Debug, Clone)]
pub struct Session {
    base_headers: HeaderMap,
    cookie: Option<HeaderValue>,
}

impl Session {
    pub fn new(base_headers: HeaderMap) -> Self {
        Self {
            base_headers,
            cookie: None,
        }
    }

    /// Build a session carrying the browser header bundle.
    pub fn browser(profile: &BrowserProfile) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("authority"), header_value(&profile.authority)?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ORIGIN, header_value(&profile.origin)?);
        headers.insert(
            REFERER,
            header_value(&format!("{}/", profile.origin.trim_end_matches('/')))?,
        );
        headers.insert(
            HeaderName::from_static("sec-ch-ua-platform"),
            HeaderValue::from_static("\"Windows\""),
        );
        headers.insert(USER_AGENT, header_value(&profile.user_agent)?);
        headers.insert(HeaderName::from_static("x-lang"), HeaderValue::from_static("english"));
        Ok(Self::new(headers))
    }

    /// Cookie currently attached to outgoing requests.
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_ref().and_then(|v| v.to_str().ok())
    }

    /// Headers for the next request.
    pub fn request_headers(&self) -> HeaderMap {
        let mut headers = self.base_headers.clone();
        if let Some(cookie) = &self.cookie {
            headers.insert(COOKIE, cookie.clone());
        }
        headers
    }

    /// Replace the held cookie with the pairs found in `Set-Cookie` values.
    /// Returns false (and keeps the old cookie) when there was nothing usable.
    pub fn absorb_set_cookies<S: AsRef<str>>(&mut self, set_cookies: &[S]) -> bool {
        let pairs = parse_set_cookie(set_cookies);
        if pairs.is_empty() {
            return false;
        }
        match HeaderValue::from_str(&pairs.join("; ")) {
            Ok(value) => {
                self.cookie = Some(value);
                true
            }
            Err(e) => {
                tracing::warn!("Ignoring unusable set-cookie value: {}", e);
                false
            }
        }
    }

    pub fn clear_cookie(&mut self) {
        self.cookie = None;
    }
}

fn header_value(value: &str) -> Result<HeaderValue, HttpError> {
    HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader(format!("{value:?}: {e}")))
}

/// Extract the `name=value` pair of every cookie in a list of `Set-Cookie`
/// header values, dropping attributes.
pub fn parse_set_cookie<S: AsRef<str>>(set_cookies: &[S]) -> Vec<String> {
    set_cookies
        .iter()
        .flat_map(|value| split_cookie_list(value.as_ref()))
        .filter_map(|cookie| {
            let pair = cookie.split(';').next().unwrap_or("").trim();
            (!pair.is_empty()).then(|| pair.to_string())
        })
        .collect()
}

/// Split a header value that may hold several comma-joined cookies.
/// A comma only separates cookies when the text after it (up to the next `;`)
/// looks like `name=value`, so `Expires=Wed, 21 Oct ...` stays intact.
fn split_cookie_list(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (idx, _) in value.match_indices(',') {
        let next = value[idx + 1..].split([';', ',']).next().unwrap_or("");
        if next.contains('=') {
            parts.push(&value[start..idx]);
            start = idx + 1;
        }
    }
    parts.push(&value[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> BrowserProfile {
        BrowserProfile {
            authority: "points-api.example.xyz".to_string(),
            origin: "https://points.example.xyz".to_string(),
            user_agent: "test-agent/1.0".to_string(),
        }
    }

    #[test]
    fn test_separate_header_values() {
        let pairs = parse_set_cookie(&["a=1; Path=/", "b=2; Path=/; HttpOnly"]);
        assert_eq!(pairs, vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_comma_joined_header_value() {
        let pairs = parse_set_cookie(&["a=1; Path=/, b=2; Path=/"]);
        assert_eq!(pairs, vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_expires_date_is_not_split() {
        let pairs = parse_set_cookie(&[
            "sessionid=abc; Expires=Wed, 21 Oct 2026 07:28:00 GMT; Path=/, csrftoken=xyz; Path=/",
        ]);
        assert_eq!(pairs, vec!["sessionid=abc", "csrftoken=xyz"]);
    }

    #[test]
    fn test_cookie_attached_after_absorb() {
        let mut session = Session::browser(&profile()).unwrap();
        assert!(session.request_headers().get(COOKIE).is_none());

        assert!(session.absorb_set_cookies(&["a=1; Path=/, b=2; Path=/"]));
        assert_eq!(session.cookie(), Some("a=1; b=2"));
        assert_eq!(session.request_headers().get(COOKIE).unwrap(), "a=1; b=2");
    }

    #[test]
    fn test_missing_cookie_keeps_previous() {
        let mut session = Session::browser(&profile()).unwrap();
        session.absorb_set_cookies(&["a=1"]);
        let empty: [&str; 0] = [];
        assert!(!session.absorb_set_cookies(&empty));
        assert_eq!(session.cookie(), Some("a=1"));

        session.absorb_set_cookies(&["c=3; Secure"]);
        assert_eq!(session.cookie(), Some("c=3"));
    }

    #[test]
    fn test_browser_headers() {
        let headers = Session::browser(&profile()).unwrap().request_headers();
        assert_eq!(headers.get("authority").unwrap(), "points-api.example.xyz");
        assert_eq!(headers.get(ORIGIN).unwrap(), "https://points.example.xyz");
        assert_eq!(headers.get(REFERER).unwrap(), "https://points.example.xyz/");
        assert_eq!(headers.get(USER_AGENT).unwrap(), "test-agent/1.0");
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
        assert_eq!(headers.get("x-lang").unwrap(), "english");
    }
}

use axum::http::{header, HeaderMap, HeaderValue};
use cookie::{time::Duration, Cookie, SameSite};

/// Names and flags of the cookies that carry the provider session.
#[derive(Debug, Clone)]
pub struct SessionCookies {
    pub access_name: String,
    pub refresh_name: String,
    pub secure: bool,
}

impl Default for SessionCookies {
    fn default() -> Self {
        Self {
            access_name: "sb-access-token".to_string(),
            refresh_name: "sb-refresh-token".to_string(),
            secure: true,
        }
    }
}

impl SessionCookies {
    /// Bearer header first, then the access-token cookie.
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        bearer_from_header(headers).or_else(|| cookie_value(headers, &self.access_name))
    }

    pub fn issue(&self, access_token: &str, refresh_token: &str, expires_in: i64) -> Vec<HeaderValue> {
        [
            self.build(&self.access_name, access_token, Duration::seconds(expires_in)),
            // Never read here: the frontend client refreshes the session with it.
            // The provider decides when it actually expires.
            self.build(&self.refresh_name, refresh_token, Duration::days(30)),
        ]
        .into_iter()
        .filter_map(|c| HeaderValue::from_str(&c.to_string()).ok())
        .collect()
    }

    pub fn clear(&self) -> Vec<HeaderValue> {
        [&self.access_name, &self.refresh_name]
            .into_iter()
            .filter_map(|name| {
                let mut c = self.build(name, "", Duration::ZERO);
                c.make_removal();
                HeaderValue::from_str(&c.to_string()).ok()
            })
            .collect()
    }

    fn build(&self, name: &str, value: &str, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name.to_string(), value.to_string()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(max_age)
            .build()
    }
}

fn bearer_from_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for part in raw.split(';') {
            if let Ok(parsed) = Cookie::parse(part.trim()) {
                if parsed.name() == name && !parsed.value().is_empty() {
                    return Some(parsed.value().to_string());
                }
            }
        }
    }
    None
}

use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::config::CookieConfig;

/// Session token from the configured cookie, if present and non-empty.
pub fn read_session(jar: &CookieJar, cfg: &CookieConfig) -> Option<String> {
    jar.get(&cfg.name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// `Authorization: Bearer <token>`, accepted when no cookie is sent.
pub fn read_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub fn session_cookie(cfg: &CookieConfig, token: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((cfg.name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cfg.secure)
        .max_age(max_age)
        .build()
}

/// Same attributes as the session cookie so the browser replaces it, expiring immediately.
pub fn clear_cookie(cfg: &CookieConfig) -> Cookie<'static> {
    session_cookie(cfg, String::new(), Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn cfg(secure: bool) -> CookieConfig {
        CookieConfig {
            name: "jwt".into(),
            secure,
        }
    }

    fn jar(cookie_header: &'static str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static(cookie_header));
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn reads_named_cookie_among_others() {
        assert_eq!(
            read_session(&jar("theme=dark; jwt=abc.def.ghi"), &cfg(false)).as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(read_session(&jar("theme=dark"), &cfg(false)), None);
        assert_eq!(read_session(&jar("jwt="), &cfg(false)), None);
    }

    #[test]
    fn reads_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(read_bearer(&headers).as_deref(), Some("tok"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(read_bearer(&headers), None);
    }

    #[test]
    fn session_cookie_attributes() {
        let c = session_cookie(&cfg(false), "tok".into(), Duration::seconds(60));
        assert_eq!(c.name(), "jwt");
        assert_eq!(c.value(), "tok");
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Lax));
        assert_eq!(c.path(), Some("/"));
        assert_eq!(c.max_age(), Some(Duration::seconds(60)));
        assert_eq!(c.secure(), Some(false));

        let secure = session_cookie(&cfg(true), "tok".into(), Duration::seconds(60));
        assert_eq!(secure.secure(), Some(true));
    }

    #[test]
    fn clear_cookie_expires_now() {
        let c = clear_cookie(&cfg(false));
        assert_eq!(c.value(), "");
        assert_eq!(c.max_age(), Some(Duration::ZERO));
        assert!(c.to_string().contains("Max-Age=0"));
    }
}

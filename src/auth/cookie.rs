use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::AppConfig;

/// Name of the session cookie.
pub const COOKIE_NAME: &str = "access_token";

fn same_site_attrs(config: &AppConfig) -> &'static str {
    // Cross-site frontends need SameSite=None, which browsers only accept
    // together with Secure.
    if config.secure_cookies {
        "SameSite=None; Secure"
    } else {
        "SameSite=Lax"
    }
}

/// `Set-Cookie` value carrying a freshly signed session token.
pub fn issue(token: &str, config: &AppConfig) -> HeaderValue {
    format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; {}",
        COOKIE_NAME,
        token,
        config.session_ttl_secs,
        same_site_attrs(config)
    )
    .parse()
    .expect("cookie value is ascii")
}

/// `Set-Cookie` value that deletes the session cookie. Must use the same
/// attribute set as `issue`; browsers silently ignore a deletion whose
/// attributes don't match the cookie being deleted.
pub fn clear(config: &AppConfig) -> HeaderValue {
    format!(
        "{}=; HttpOnly; Path=/; Max-Age=0; {}",
        COOKIE_NAME,
        same_site_attrs(config)
    )
    .parse()
    .expect("cookie value is ascii")
}

/// Pulls the session token out of the request's `Cookie` header(s), if any.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, token)| token)
}

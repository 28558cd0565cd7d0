use serde::Deserialize;
use tracing::warn;

/// Development-only fallback signing key. Forging a session only requires
/// this string, so production deployments must set SECRET_KEY.
pub const DEV_SECRET_KEY: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Signing key for session tokens. Root trust anchor of the service.
    pub secret_key: String,
    /// Token lifetime and cookie Max-Age, in seconds.
    pub session_ttl_secs: i64,
    /// When true the session cookie is issued with `SameSite=None; Secure`,
    /// otherwise `SameSite=Lax` without `Secure`.
    pub secure_cookies: bool,
    /// Shared secret for the admin surface. `None` disables it entirely.
    pub admin_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:taskbox.db".into());

        let secret_key = match std::env::var("SECRET_KEY") {
            Ok(v) if !v.is_empty() => v,
            _ => {
                warn!(
                    "SECRET_KEY is not set; using the insecure development default. \
                     Anyone who knows it can forge sessions."
                );
                DEV_SECRET_KEY.into()
            }
        };

        let session_ttl_secs = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60 * 60 * 24);

        let secure_cookies = std::env::var("SECURE_COOKIES")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let admin_key = std::env::var("ADMIN_KEY").ok().filter(|v| !v.is_empty());

        Ok(Self {
            database_url,
            secret_key,
            session_ttl_secs,
            secure_cookies,
            admin_key,
        })
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            secret_key: "test-secret".into(),
            session_ttl_secs: 3600,
            secure_cookies: false,
            admin_key: None,
        }
    }
}

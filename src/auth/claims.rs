use serde::{Deserialize, Serialize};

/// Session token payload. Never persisted; lives only inside the signed
/// token and is re-derived on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a decimal string.
    pub sub: String,
    /// Issued at (unix seconds).
    pub iat: usize,
    /// Expires at (unix seconds).
    pub exp: usize,
}

impl Claims {
    /// Parses the subject back into a user id. A token whose subject is not
    /// a decimal integer identifies nobody.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

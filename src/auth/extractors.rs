use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use tracing::warn;

use crate::auth::{cookie, tokens::TokenCodec};
use crate::error::ApiError;

/// Resolves the caller's identity from the request headers: read the session
/// cookie, decode it, parse the subject. Pure read; any failure along the
/// way means anonymous, never an error.
pub(crate) fn resolve_user_id(headers: &HeaderMap, codec: &TokenCodec) -> Option<i64> {
    let token = cookie::session_token(headers)?;
    let claims = codec.decode(token)?;
    claims.user_id()
}

/// Extracts the authenticated user id, rejecting anonymous callers with 401
/// before the handler body runs.
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenCodec: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = TokenCodec::from_ref(state);
        match resolve_user_id(&parts.headers, &codec) {
            Some(user_id) => Ok(AuthUser(user_id)),
            None => {
                warn!("request without a valid session");
                Err(ApiError::AuthRequired)
            }
        }
    }
}

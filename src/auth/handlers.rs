use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        cookie,
        dto::{normalize_email, LoginRequest, RegisterRequest, UserOut},
        extractors::AuthUser,
        password::{hash_password, verify_password},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserOut>), ApiError> {
    payload.email = normalize_email(&payload.email);
    payload.validate()?;

    let hash = hash_password(&payload.password)?;

    // Uniqueness is the database's call; a concurrent duplicate loses here
    // and surfaces as EmailTaken.
    let user = state
        .store
        .create_user(payload.name.trim(), &payload.email, &hash)
        .await
        .map_err(|e| {
            warn!(email = %payload.email, error = %e, "registration rejected");
            ApiError::from(e)
        })?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<UserOut>), ApiError> {
    payload.email = normalize_email(&payload.email);

    // Unknown email and wrong password take the same exit so the response
    // does not confirm whether an account exists.
    let user = match state.store.find_user_by_email(&payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login with unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.tokens.encode(user.id)?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie::issue(&token, &state.config));

    info!(user_id = user.id, "user logged in");
    Ok((headers, Json(user.into())))
}

/// Clears the client-side cookie. The token itself stays valid until its
/// natural expiry; there is no server-side revocation.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> (HeaderMap, Json<serde_json::Value>) {
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie::clear(&state.config));
    (headers, Json(serde_json::json!({ "ok": true })))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserOut>, ApiError> {
    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::extractors::resolve_user_id;

    fn register_body(name: &str, email: &str, password: &str) -> Json<RegisterRequest> {
        Json(RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        })
    }

    fn login_body(email: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            email: email.into(),
            password: password.into(),
        })
    }

    fn set_cookie_value(headers: &HeaderMap) -> &str {
        headers
            .get(header::SET_COOKIE)
            .expect("Set-Cookie present")
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn register_login_me_logout_flow() {
        let state = AppState::for_tests().await;

        let (status, Json(user)) = register(
            State(state.clone()),
            register_body("Ann", "ann@x.com", "secret1"),
        )
        .await
        .expect("register");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user.email, "ann@x.com");

        let (headers, Json(logged_in)) = login(
            State(state.clone()),
            login_body("Ann@X.com", "secret1"),
        )
        .await
        .expect("login");
        assert_eq!(logged_in.id, user.id);

        // The cookie round-trips through the resolver back to the user id.
        let cookie_value = set_cookie_value(&headers);
        let token = cookie_value
            .split(';')
            .next()
            .unwrap()
            .strip_prefix("access_token=")
            .unwrap();
        let mut request_headers = HeaderMap::new();
        request_headers.insert(
            header::COOKIE,
            format!("access_token={token}").parse().unwrap(),
        );
        assert_eq!(
            resolve_user_id(&request_headers, &state.tokens),
            Some(user.id)
        );

        let Json(me_out) = me(State(state.clone()), AuthUser(user.id))
            .await
            .expect("me");
        assert_eq!(me_out.email, "ann@x.com");

        let (headers, _) = logout(State(state.clone())).await;
        let cleared = set_cookie_value(&headers);
        assert!(cleared.starts_with("access_token=;"));
        assert!(cleared.contains("Max-Age=0"));

        // Without a cookie the resolver yields anonymous again.
        assert_eq!(resolve_user_id(&HeaderMap::new(), &state.tokens), None);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let state = AppState::for_tests().await;
        register(
            State(state.clone()),
            register_body("Ann", "ann@x.com", "secret1"),
        )
        .await
        .expect("first registration");

        let err = register(
            State(state.clone()),
            register_body("Ann Again", "ANN@x.com", "secret2"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::EmailTaken));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_reject_identically() {
        let state = AppState::for_tests().await;
        register(
            State(state.clone()),
            register_body("Ann", "ann@x.com", "secret1"),
        )
        .await
        .expect("register");

        let wrong_password = login(State(state.clone()), login_body("ann@x.com", "nope-nope"))
            .await
            .unwrap_err();
        let unknown_email = login(State(state.clone()), login_body("bob@x.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(wrong_password, ApiError::InvalidCredentials));
        assert!(matches!(unknown_email, ApiError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn me_after_user_vanished_is_not_found() {
        let state = AppState::for_tests().await;
        let err = me(State(state.clone()), AuthUser(999)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("user")));
    }
}

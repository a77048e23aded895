use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Duration;
use tracing::{info, warn};

use crate::api::{AuthSession, AuthUser, Credential, SignUpOutcome};
use crate::error::FieldcheckError;
use crate::middleware::auth::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, resolve_credential};
use crate::middleware::request::{ApiJson, ApiQuery};
use crate::router::FieldcheckState;

/// Set by the front end before it starts a PKCE redirect.
pub const CODE_VERIFIER_COOKIE: &str = "fc-code-verifier";

const ACCESS_TOKEN_MAX_AGE: Duration = Duration::days(7);
const REFRESH_TOKEN_MAX_AGE: Duration = Duration::days(30);

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user: Option<AuthUser>,
}

fn credentials_from(
    email: Option<String>,
    password: Option<String>,
) -> Result<(String, String), FieldcheckError> {
    let email = email.map(|e| e.trim().to_string()).unwrap_or_default();
    let password = password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(FieldcheckError::Validation(
            "email and password are required".to_string(),
        ));
    }
    Ok((email, password))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<FieldcheckState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Response, FieldcheckError> {
    let (email, password) = credentials_from(req.email, req.password)?;
    let session = state
        .auth
        .sign_in_with_password(&email, &password)
        .await
        .map_err(FieldcheckError::from_auth)?;

    let jar = store_session_cookies(jar, &session, state.config.insecure_cookie);
    Ok((jar, Json(json!({ "user": session.user }))).into_response())
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<FieldcheckState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<SignUpRequest>,
) -> Result<Response, FieldcheckError> {
    let (email, password) = credentials_from(req.email, req.password)?;
    let data = json!({ "full_name": req.full_name });
    let outcome = state.auth.sign_up(&email, &password, data).await?;

    match outcome {
        SignUpOutcome::Session(session) => {
            info!(user_id = %session.user.id, "sign-up confirmed immediately");
            let jar = store_session_cookies(jar, &session, state.config.insecure_cookie);
            Ok((
                jar,
                Json(json!({ "user": session.user, "confirmation_required": false })),
            )
                .into_response())
        }
        SignUpOutcome::Pending(user) => {
            info!(user_id = %user.id, "sign-up awaiting email confirmation");
            Ok(Json(json!({ "user": user, "confirmation_required": true })).into_response())
        }
    }
}

/// GET /auth/callback -> exchanges the authorization code and lands on `next`.
pub async fn callback(
    State(state): State<FieldcheckState>,
    ApiQuery(query): ApiQuery<AuthCallbackQuery>,
    jar: CookieJar,
) -> Response {
    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return respond_with_error(
            jar,
            FieldcheckError::Validation("missing `code` in callback".to_string()),
        );
    };
    let Some(verifier) = jar.get(CODE_VERIFIER_COOKIE).map(|c| c.value().to_owned()) else {
        return respond_with_error(
            jar,
            FieldcheckError::Validation("missing code verifier cookie".to_string()),
        );
    };
    let jar = jar.remove(clear_cookie(CODE_VERIFIER_COOKIE));

    let session = match state.auth.exchange_code_for_session(code, &verifier).await {
        Ok(session) => session,
        Err(err) => return respond_with_error(jar, FieldcheckError::from_auth(err)),
    };

    let jar = store_session_cookies(jar, &session, state.config.insecure_cookie);
    let target = safe_redirect_target(query.next.as_deref());
    info!(user_id = %session.user.id, redirect = target, "auth callback completed");
    (jar, Redirect::to(target)).into_response()
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<FieldcheckState>,
    jar: CookieJar,
) -> Result<Response, FieldcheckError> {
    let Some(refresh_token) = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
    else {
        return Err(FieldcheckError::Unauthorized);
    };

    match state.auth.refresh_session(&refresh_token).await {
        Ok(session) => {
            let jar = store_session_cookies(jar, &session, state.config.insecure_cookie);
            Ok((jar, Json(json!({ "user": session.user }))).into_response())
        }
        Err(err) => {
            // A rejected refresh token is dead; drop both cookies with the 401.
            let err = FieldcheckError::from_auth(err);
            Ok(respond_with_error(clear_session_cookies(jar), err))
        }
    }
}

/// POST /api/auth/logout -> revokes upstream when possible, always clears cookies.
pub async fn logout(
    State(state): State<FieldcheckState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse {
    if let Credential::Bearer(token) = resolve_credential(&headers)
        && let Err(e) = state.auth.sign_out(&token).await
    {
        warn!(error = %e, "upstream sign-out failed; clearing cookies anyway");
    }
    (clear_session_cookies(jar), Json(json!({ "success": true })))
}

/// GET /api/auth/session
pub async fn session(
    State(state): State<FieldcheckState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, FieldcheckError> {
    let Credential::Bearer(token) = resolve_credential(&headers) else {
        return Ok(Json(SessionResponse {
            authenticated: false,
            user: None,
        }));
    };
    match state.auth.get_user(&token).await.map_err(FieldcheckError::from_auth) {
        Ok(user) => Ok(Json(SessionResponse {
            authenticated: true,
            user: Some(user),
        })),
        Err(FieldcheckError::InvalidSession(_)) => Ok(Json(SessionResponse {
            authenticated: false,
            user: None,
        })),
        Err(other) => Err(other),
    }
}

/// Only same-origin absolute paths; anything else lands on `/`.
fn safe_redirect_target(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

pub(crate) fn store_session_cookies(
    jar: CookieJar,
    session: &AuthSession,
    insecure: bool,
) -> CookieJar {
    let jar = jar.add(build_cookie(
        ACCESS_TOKEN_COOKIE,
        session.access_token.clone(),
        ACCESS_TOKEN_MAX_AGE,
        insecure,
    ));
    match session.refresh_token.as_ref() {
        Some(refresh) => jar.add(build_cookie(
            REFRESH_TOKEN_COOKIE,
            refresh.clone(),
            REFRESH_TOKEN_MAX_AGE,
            insecure,
        )),
        None => jar,
    }
}

fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(clear_cookie(ACCESS_TOKEN_COOKIE))
        .remove(clear_cookie(REFRESH_TOKEN_COOKIE))
}

fn build_cookie(name: &str, value: String, max_age: Duration, insecure: bool) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), value))
        .path("/")
        .http_only(true)
        .secure(!insecure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

fn clear_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn respond_with_error(jar: CookieJar, err: FieldcheckError) -> Response {
    (jar, err.into_response()).into_response()
}

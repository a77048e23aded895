use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use axum_extra::extract::cookie::CookieJar;
use headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;

use crate::api::{AuthUser, Credential, DataClient};
use crate::error::FieldcheckError;
use crate::router::FieldcheckState;

pub const ACCESS_TOKEN_COOKIE: &str = "fc-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "fc-refresh-token";

/// Resolve the caller credential for this request.
/// Precedence:
/// - Header: `Authorization: Bearer <token>`
/// - Cookie: `fc-access-token`
/// - otherwise anonymous
///
/// Never fails; blank values count as absent.
pub fn resolve_credential(headers: &HeaderMap) -> Credential {
    // 1) header: Authorization: Bearer <token>
    if let Some(auth) = headers.typed_get::<Authorization<Bearer>>() {
        let token = auth.token().trim();
        if !token.is_empty() {
            return Credential::Bearer(token.to_string());
        }
    }

    // 2) cookie: access token
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        let token = cookie.value().trim();
        if !token.is_empty() {
            return Credential::Bearer(token.to_string());
        }
    }

    Credential::Anonymous
}

/// Data client acting as whoever the request presents, anonymous included.
///
/// Only for routes whose rows are readable under the anonymous policy.
pub struct CallerClient(pub DataClient);

impl FromRequestParts<FieldcheckState> for CallerClient {
    type Rejection = FieldcheckError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &FieldcheckState,
    ) -> Result<Self, Self::Rejection> {
        let credential = resolve_credential(&parts.headers);
        debug!(anonymous = credential.is_anonymous(), "caller client resolved");
        Ok(Self(state.data_client(credential)?))
    }
}

/// A verified caller: the token was presented and the auth service accepted it.
pub struct AuthenticatedCaller {
    pub user: AuthUser,
    pub client: DataClient,
}

impl AuthenticatedCaller {
    pub(crate) async fn verify(
        credential: Credential,
        state: &FieldcheckState,
    ) -> Result<Self, FieldcheckError> {
        let Credential::Bearer(token) = &credential else {
            return Err(FieldcheckError::Unauthorized);
        };
        let user = state
            .auth
            .get_user(token)
            .await
            .map_err(FieldcheckError::from_auth)?;
        debug!(user_id = %user.id, "caller verified");
        Ok(Self {
            user,
            client: state.data_client(credential)?,
        })
    }
}

impl FromRequestParts<FieldcheckState> for AuthenticatedCaller {
    type Rejection = FieldcheckError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &FieldcheckState,
    ) -> Result<Self, Self::Rejection> {
        Self::verify(resolve_credential(&parts.headers), state).await
    }
}

/// Verified caller plus a service-key client that bypasses row-level security.
///
/// Handlers must authorize the caller themselves before using `service`.
pub struct ServiceCaller {
    pub user: AuthUser,
    pub service: DataClient,
}

impl FromRequestParts<FieldcheckState> for ServiceCaller {
    type Rejection = FieldcheckError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &FieldcheckState,
    ) -> Result<Self, Self::Rejection> {
        let caller = AuthenticatedCaller::verify(resolve_credential(&parts.headers), state).await?;
        let service = state.service_client()?.ok_or_else(|| {
            FieldcheckError::Forbidden("service access is not configured".to_string())
        })?;
        Ok(Self {
            user: caller.user,
            service,
        })
    }
}

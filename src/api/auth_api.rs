use crate::error::DataError;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::info;
use url::Url;
use uuid::Uuid;

/// Identity the auth service associates with an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    /// Token subject.
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

/// Token pair issued by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: AuthUser,
}

/// Sign-up either confirms immediately (session) or waits for email confirmation (user only).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    Session(AuthSession),
    Pending(AuthUser),
}

/// Stateless client for the hosted auth endpoints.
#[derive(Clone)]
pub struct AuthApi {
    http: reqwest::Client,
    auth_base: Url,
    anon_key: String,
}

impl AuthApi {
    pub fn new(
        http: reqwest::Client,
        data_url: &Url,
        anon_key: impl Into<String>,
    ) -> Result<Self, DataError> {
        Ok(Self {
            http,
            auth_base: data_url.join("auth/v1/")?,
            anon_key: anon_key.into(),
        })
    }

    fn post(&self, path: &str) -> Result<RequestBuilder, DataError> {
        Ok(self
            .http
            .post(self.auth_base.join(path)?)
            .header("apikey", &self.anon_key))
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, DataError> {
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(DataError::from_body(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<AuthSession, DataError> {
        let builder = self
            .post("token")?
            .query(&[("grant_type", grant_type)])
            .json(&body);
        Self::send(builder).await
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, DataError> {
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        info!(user_id = %session.user.id, "password sign-in succeeded");
        Ok(session)
    }

    /// Exchange an authorization code from an email or OAuth redirect.
    pub async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<AuthSession, DataError> {
        let session = self
            .token_grant(
                "pkce",
                json!({ "auth_code": auth_code, "code_verifier": code_verifier }),
            )
            .await?;
        info!(user_id = %session.user.id, "authorization code exchanged");
        Ok(session)
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, DataError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        data: Value,
    ) -> Result<SignUpOutcome, DataError> {
        let builder = self
            .post("signup")?
            .json(&json!({ "email": email, "password": password, "data": data }));
        Self::send(builder).await
    }

    /// Validate a bearer token and return its identity.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, DataError> {
        let builder = self
            .http
            .get(self.auth_base.join("user")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);
        Self::send(builder).await
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), DataError> {
        let resp = self.post("logout")?.bearer_auth(access_token).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await?;
            return Err(DataError::from_body(status, &body));
        }
        Ok(())
    }
}

use crate::error::DataError;
use reqwest::{
    Method, RequestBuilder,
    header::{ACCEPT, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use tracing::debug;
use url::Url;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Identity under which the data service evaluates row-level security.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Caller's access token.
    Bearer(String),
    /// No caller token; the public key stands in as the bearer.
    Anonymous,
    /// Service key; row-level security does not apply.
    Service(String),
}

impl Credential {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Credential::Anonymous)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Credential::Anonymous => f.write_str("Anonymous"),
            Credential::Service(_) => f.write_str("Service(<redacted>)"),
        }
    }
}

/// Column filter rendered as a PostgREST query parameter (`column=op.value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    column: String,
    expr: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            column: column.into(),
            expr: format!("eq.{value}"),
        }
    }

    fn pair(&self) -> (&str, &str) {
        (self.column.as_str(), self.expr.as_str())
    }
}

/// Options for list queries.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    /// e.g. `created_at.desc`
    pub order: Option<String>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Request-scoped client for the hosted REST data API.
///
/// Every request carries the project key in `apikey` and the resolved
/// [`Credential`] in `Authorization`.
#[derive(Clone)]
pub struct DataClient {
    http: reqwest::Client,
    rest_base: Url,
    api_key: String,
    credential: Credential,
}

impl DataClient {
    pub fn new(
        http: reqwest::Client,
        data_url: &Url,
        api_key: impl Into<String>,
        credential: Credential,
    ) -> Result<Self, DataError> {
        Ok(Self {
            http,
            rest_base: data_url.join("rest/v1/")?,
            api_key: api_key.into(),
            credential,
        })
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    fn bearer(&self) -> &str {
        match &self.credential {
            Credential::Bearer(token) | Credential::Service(token) => token,
            Credential::Anonymous => &self.api_key,
        }
    }

    fn request(&self, method: Method, table: &str) -> Result<RequestBuilder, DataError> {
        let url = self.rest_base.join(table)?;
        debug!(method = %method, table, credential = ?self.credential, "data request");
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer()))
    }

    fn single(builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(ACCEPT, HeaderValue::from_static(SINGLE_OBJECT))
            .header("Prefer", RETURN_REPRESENTATION)
    }

    fn with_filters(builder: RequestBuilder, filters: &[Filter]) -> RequestBuilder {
        builder.query(&filters.iter().map(Filter::pair).collect::<Vec<_>>())
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

    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &ListQuery,
    ) -> Result<Vec<T>, DataError> {
        let mut builder = self.request(Method::GET, table)?.query(&[("select", "*")]);
        builder = Self::with_filters(builder, &query.filters);
        if let Some(order) = query.order.as_deref() {
            builder = builder.query(&[("order", order)]);
        }
        if let Some(limit) = query.limit {
            builder = builder.query(&[("limit", limit)]);
        }
        Self::send(builder).await
    }

    /// Fetch exactly one row; zero rows surfaces as the not-found backend code.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[Filter],
    ) -> Result<T, DataError> {
        let builder = self.request(Method::GET, table)?.query(&[("select", "*")]);
        Self::send(Self::single(Self::with_filters(builder, filters))).await
    }

    pub async fn insert_one<T, B>(&self, table: &str, row: &B) -> Result<T, DataError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, table)?.json(row);
        Self::send(Self::single(builder)).await
    }

    pub async fn update_one<T, B>(
        &self,
        table: &str,
        filters: &[Filter],
        patch: &B,
    ) -> Result<T, DataError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::PATCH, table)?.json(patch);
        Self::send(Self::single(Self::with_filters(builder, filters))).await
    }

    /// Delete exactly one row and return it.
    pub async fn delete_one<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[Filter],
    ) -> Result<T, DataError> {
        let builder = self.request(Method::DELETE, table)?;
        Self::send(Self::single(Self::with_filters(builder, filters))).await
    }
}

//! Body, path and query extractors whose rejections use the API error shape.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::FieldcheckError;

/// JSON request body.
pub struct ApiJson<T>(pub T);

/// Typed path parameters.
pub struct ApiPath<T>(pub T);

/// Typed query string.
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for FieldcheckError {
    fn from(rejection: JsonRejection) -> Self {
        FieldcheckError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for FieldcheckError {
    fn from(rejection: PathRejection) -> Self {
        FieldcheckError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for FieldcheckError {
    fn from(rejection: QueryRejection) -> Self {
        FieldcheckError::Validation(rejection.body_text())
    }
}

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = FieldcheckError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = FieldcheckError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = FieldcheckError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

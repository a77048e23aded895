use axum::{
    Json,
    extract::State,
    http::header::CACHE_CONTROL,
    response::{IntoResponse, Response},
};

use crate::error::FieldcheckError;
use crate::router::FieldcheckState;

pub const STALE_WHILE_REVALIDATE_SECS: u64 = 30;

/// GET /api/metrics -> cached system snapshot with its remaining freshness.
pub async fn metrics_handler(
    State(state): State<FieldcheckState>,
) -> Result<Response, FieldcheckError> {
    let fresh = state.metrics.snapshot().await?;
    let cache_control = format!(
        "public, max-age={}, stale-while-revalidate={}",
        fresh.remaining.as_secs(),
        STALE_WHILE_REVALIDATE_SECS
    );
    Ok(([(CACHE_CONTROL, cache_control)], Json(fresh.value)).into_response())
}

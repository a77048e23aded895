use axum::Json;
use tracing::warn;

use crate::api::{DataClient, Filter, ListQuery};
use crate::error::FieldcheckError;
use crate::middleware::auth::AuthenticatedCaller;
use crate::middleware::request::{ApiJson, ApiQuery};
use crate::types::activity_log::{
    ACTIVITY_LOGS_TABLE, ActivityLog, ActivityLogQuery, CreateActivityLog, NewActivityLog,
};

/// GET /api/activity-logs?project_id=&limit=
pub async fn list_activity_logs(
    caller: AuthenticatedCaller,
    ApiQuery(query): ApiQuery<ActivityLogQuery>,
) -> Result<Json<Vec<ActivityLog>>, FieldcheckError> {
    let mut list = ListQuery::new()
        .order("created_at.desc")
        .limit(query.effective_limit());
    if let Some(project_id) = query.project_id {
        list = list.filter(Filter::eq("project_id", project_id));
    }
    let rows = caller.client.select(ACTIVITY_LOGS_TABLE, &list).await?;
    Ok(Json(rows))
}

/// POST /api/activity-logs
pub async fn create_activity_log(
    caller: AuthenticatedCaller,
    ApiJson(body): ApiJson<CreateActivityLog>,
) -> Result<Json<ActivityLog>, FieldcheckError> {
    let row = body.into_row(caller.user.id)?;
    let created = caller.client.insert_one(ACTIVITY_LOGS_TABLE, &row).await?;
    Ok(Json(created))
}

/// Append to the activity log without failing the surrounding request.
pub(crate) async fn record(client: &DataClient, entry: NewActivityLog) {
    if let Err(e) = client
        .insert_one::<ActivityLog, _>(ACTIVITY_LOGS_TABLE, &entry)
        .await
    {
        warn!(
            action = %entry.action,
            entity_type = ?entry.entity_type,
            entity_id = ?entry.entity_id,
            error = %e,
            "failed to record activity"
        );
    }
}

use axum::{
    Json,
    extract::State,
};
use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use super::activity_logs::record;
use crate::api::{Filter, ListQuery};
use crate::error::FieldcheckError;
use crate::middleware::auth::AuthenticatedCaller;
use crate::middleware::request::{ApiJson, ApiPath, ApiQuery};
use crate::router::FieldcheckState;
use crate::types::activity_log::NewActivityLog;
use crate::types::field_report::{
    CreateFieldReport, FIELD_REPORTS_TABLE, FieldReport, FieldReportQuery, UpdateFieldReport,
};

/// GET /api/field-reports?project_id=&status=&limit=
pub async fn list_field_reports(
    caller: AuthenticatedCaller,
    ApiQuery(query): ApiQuery<FieldReportQuery>,
) -> Result<Json<Vec<FieldReport>>, FieldcheckError> {
    let mut list = ListQuery::new().order("report_date.desc");
    if let Some(project_id) = query.project_id {
        list = list.filter(Filter::eq("project_id", project_id));
    }
    if let Some(status) = query.status.as_deref() {
        list = list.filter(Filter::eq("status", status));
    }
    if let Some(limit) = query.limit {
        list = list.limit(limit);
    }
    Ok(Json(caller.client.select(FIELD_REPORTS_TABLE, &list).await?))
}

/// GET /api/field-reports/{id}
pub async fn get_field_report(
    caller: AuthenticatedCaller,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<FieldReport>, FieldcheckError> {
    let report = caller
        .client
        .select_one(FIELD_REPORTS_TABLE, &[Filter::eq("id", id)])
        .await?;
    Ok(Json(report))
}

/// POST /api/field-reports
pub async fn create_field_report(
    State(state): State<FieldcheckState>,
    caller: AuthenticatedCaller,
    ApiJson(body): ApiJson<CreateFieldReport>,
) -> Result<Json<FieldReport>, FieldcheckError> {
    let row = body.into_row(state.config.default_organization_id, caller.user.id)?;
    let report: FieldReport = caller.client.insert_one(FIELD_REPORTS_TABLE, &row).await?;
    record(
        &caller.client,
        NewActivityLog::entity(
            caller.user.id,
            "field_report.created",
            "field_report",
            report.id,
            Some(report.project_id),
        ),
    )
    .await;
    Ok(Json(report))
}

/// PATCH /api/field-reports/{id}
pub async fn update_field_report(
    caller: AuthenticatedCaller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(mut patch): ApiJson<UpdateFieldReport>,
) -> Result<Json<FieldReport>, FieldcheckError> {
    patch.updated_at = Some(Utc::now());
    let report = caller
        .client
        .update_one(FIELD_REPORTS_TABLE, &[Filter::eq("id", id)], &patch)
        .await?;
    Ok(Json(report))
}

/// DELETE /api/field-reports/{id}
pub async fn delete_field_report(
    caller: AuthenticatedCaller,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, FieldcheckError> {
    let deleted: FieldReport = caller
        .client
        .delete_one(FIELD_REPORTS_TABLE, &[Filter::eq("id", id)])
        .await?;
    record(
        &caller.client,
        NewActivityLog::entity(
            caller.user.id,
            "field_report.deleted",
            "field_report",
            deleted.id,
            Some(deleted.project_id),
        ),
    )
    .await;
    Ok(Json(json!({ "id": deleted.id, "deleted": true })))
}

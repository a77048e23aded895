use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::activity_logs::record;
use crate::api::{Filter, ListQuery};
use crate::error::FieldcheckError;
use crate::middleware::auth::{AuthenticatedCaller, CallerClient};
use crate::middleware::request::{ApiJson, ApiPath, ApiQuery};
use crate::types::activity_log::NewActivityLog;
use crate::types::profile::{AddMember, MEMBERS_TABLE, Member, NewMember};
use crate::types::project::{CreateProject, PROJECTS_TABLE, Project, UpdateProject};

#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    pub status: Option<String>,
    pub project_type: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/projects
///
/// Anonymous callers are allowed; row-level security decides what they see.
pub async fn list_projects(
    CallerClient(client): CallerClient,
    ApiQuery(query): ApiQuery<ProjectQuery>,
) -> Result<Json<Vec<Project>>, FieldcheckError> {
    let mut list = ListQuery::new().order("created_at.desc");
    if let Some(status) = query.status.as_deref() {
        list = list.filter(Filter::eq("status", status));
    }
    if let Some(kind) = query.project_type.as_deref() {
        list = list.filter(Filter::eq("project_type", kind));
    }
    if let Some(limit) = query.limit {
        list = list.limit(limit);
    }
    Ok(Json(client.select(PROJECTS_TABLE, &list).await?))
}

/// GET /api/projects/{id}
pub async fn get_project(
    CallerClient(client): CallerClient,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Project>, FieldcheckError> {
    let project = client
        .select_one(PROJECTS_TABLE, &[Filter::eq("id", id)])
        .await?;
    Ok(Json(project))
}

/// POST /api/projects
pub async fn create_project(
    caller: AuthenticatedCaller,
    ApiJson(body): ApiJson<CreateProject>,
) -> Result<Json<Project>, FieldcheckError> {
    let row = body.into_row(Some(caller.user.id))?;
    let project: Project = caller.client.insert_one(PROJECTS_TABLE, &row).await?;
    record(
        &caller.client,
        NewActivityLog::entity(
            caller.user.id,
            "project.created",
            "project",
            project.id,
            Some(project.id),
        ),
    )
    .await;
    Ok(Json(project))
}

/// PATCH /api/projects/{id}
pub async fn update_project(
    caller: AuthenticatedCaller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(mut patch): ApiJson<UpdateProject>,
) -> Result<Json<Project>, FieldcheckError> {
    if patch.is_empty() {
        return Err(FieldcheckError::Validation("no fields to update".to_string()));
    }
    patch.updated_at = Some(Utc::now());
    let project = caller
        .client
        .update_one(PROJECTS_TABLE, &[Filter::eq("id", id)], &patch)
        .await?;
    Ok(Json(project))
}

/// DELETE /api/projects/{id}
pub async fn delete_project(
    caller: AuthenticatedCaller,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, FieldcheckError> {
    let deleted: Project = caller
        .client
        .delete_one(PROJECTS_TABLE, &[Filter::eq("id", id)])
        .await?;
    record(
        &caller.client,
        NewActivityLog::entity(caller.user.id, "project.deleted", "project", deleted.id, None),
    )
    .await;
    Ok(Json(json!({ "id": deleted.id, "deleted": true })))
}

/// GET /api/projects/{id}/members
pub async fn list_members(
    caller: AuthenticatedCaller,
    ApiPath(project_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Member>>, FieldcheckError> {
    let list = ListQuery::new()
        .filter(Filter::eq("project_id", project_id))
        .order("created_at.asc");
    Ok(Json(caller.client.select(MEMBERS_TABLE, &list).await?))
}

/// POST /api/projects/{id}/members
pub async fn add_member(
    caller: AuthenticatedCaller,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<AddMember>,
) -> Result<Json<Member>, FieldcheckError> {
    let user_id = body
        .user_id
        .ok_or_else(|| FieldcheckError::Validation("user_id is required".to_string()))?;
    let row = NewMember {
        project_id,
        user_id,
        role: body.role.unwrap_or_else(|| "member".to_string()),
    };
    let member: Member = caller.client.insert_one(MEMBERS_TABLE, &row).await?;
    record(
        &caller.client,
        NewActivityLog::entity(
            caller.user.id,
            "member.added",
            "member",
            member.user_id,
            Some(project_id),
        ),
    )
    .await;
    Ok(Json(member))
}

/// DELETE /api/projects/{id}/members/{user_id}
pub async fn remove_member(
    caller: AuthenticatedCaller,
    ApiPath((project_id, user_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<Value>, FieldcheckError> {
    let filters = [
        Filter::eq("project_id", project_id),
        Filter::eq("user_id", user_id),
    ];
    let _removed: Member = caller.client.delete_one(MEMBERS_TABLE, &filters).await?;
    Ok(Json(json!({ "project_id": project_id, "user_id": user_id, "deleted": true })))
}

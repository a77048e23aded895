use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::activity_logs::record;
use crate::api::{DataClient, Filter, ListQuery};
use crate::error::FieldcheckError;
use crate::middleware::auth::AuthenticatedCaller;
use crate::middleware::request::{ApiJson, ApiPath, ApiQuery};
use crate::types::activity_log::NewActivityLog;
use crate::types::project::{PROJECTS_TABLE, Project, UpdateProject};
use crate::types::vba::{CreateVbaProject, UpdateVbaProject, VBA_PROJECTS_TABLE, VbaProject};

#[derive(Debug, Default, Deserialize)]
pub struct VbaProjectQuery {
    pub status: Option<String>,
    pub inspector: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct VbaDeleteResponse {
    pub id: Uuid,
    pub deleted: bool,
    /// Whether a `projects` mirror row existed and was removed.
    pub project_deleted: bool,
}

/// GET /api/vba-projects
pub async fn list_vba_projects(
    caller: AuthenticatedCaller,
    ApiQuery(query): ApiQuery<VbaProjectQuery>,
) -> Result<Json<Vec<VbaProject>>, FieldcheckError> {
    let mut list = ListQuery::new().order("created_at.desc");
    if let Some(status) = query.status.as_deref() {
        list = list.filter(Filter::eq("status", status));
    }
    if let Some(inspector) = query.inspector.as_deref() {
        list = list.filter(Filter::eq("inspector", inspector));
    }
    if let Some(limit) = query.limit {
        list = list.limit(limit);
    }
    Ok(Json(caller.client.select(VBA_PROJECTS_TABLE, &list).await?))
}

/// GET /api/vba-projects/{id}
pub async fn get_vba_project(
    caller: AuthenticatedCaller,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<VbaProject>, FieldcheckError> {
    let row = caller
        .client
        .select_one(VBA_PROJECTS_TABLE, &[Filter::eq("id", id)])
        .await?;
    Ok(Json(row))
}

/// POST /api/vba-projects
///
/// Writes the VBA row, then its `projects` mirror. A failed mirror insert
/// removes the VBA row again before the error is returned.
pub async fn create_vba_project(
    caller: AuthenticatedCaller,
    ApiJson(body): ApiJson<CreateVbaProject>,
) -> Result<Json<VbaProject>, FieldcheckError> {
    let row = body.into_row(Uuid::new_v4(), Some(caller.user.id))?;
    let created: VbaProject = caller.client.insert_one(VBA_PROJECTS_TABLE, &row).await?;

    if let Err(e) = caller
        .client
        .insert_one::<Project, _>(PROJECTS_TABLE, &row.mirror())
        .await
    {
        warn!(id = %created.id, error = %e, "projects mirror insert failed; rolling back VBA row");
        if let Err(undo) = caller
            .client
            .delete_one::<VbaProject>(VBA_PROJECTS_TABLE, &[Filter::eq("id", created.id)])
            .await
        {
            error!(
                id = %created.id,
                error = %undo,
                "rollback of VBA row failed; collections diverge"
            );
        }
        return Err(e.into());
    }

    record(
        &caller.client,
        NewActivityLog::entity(
            caller.user.id,
            "vba_project.created",
            "vba_project",
            created.id,
            Some(created.id),
        ),
    )
    .await;
    Ok(Json(created))
}

/// PATCH /api/vba-projects/{id}
///
/// Name, address and status changes are copied onto the `projects` mirror;
/// mirror failures are logged only.
pub async fn update_vba_project(
    caller: AuthenticatedCaller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(mut patch): ApiJson<UpdateVbaProject>,
) -> Result<Json<VbaProject>, FieldcheckError> {
    let now = Utc::now();
    patch.updated_at = Some(now);
    let updated: VbaProject = caller
        .client
        .update_one(VBA_PROJECTS_TABLE, &[Filter::eq("id", id)], &patch)
        .await?;

    let mirror = UpdateProject {
        name: patch.project_name.clone(),
        address: patch.address.clone(),
        status: patch.status.clone(),
        client_name: patch.client.clone(),
        updated_at: Some(now),
        ..Default::default()
    };
    if !mirror.is_empty() {
        match caller
            .client
            .update_one::<Project, _>(PROJECTS_TABLE, &[Filter::eq("id", id)], &mirror)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_found() => info!(%id, "no projects mirror to update"),
            Err(e) => warn!(%id, error = %e, "projects mirror update failed"),
        }
    }
    Ok(Json(updated))
}

/// DELETE /api/vba-projects/{id}
///
/// Deletes from `vba_projects` and then from `projects`; both are attempted
/// even when the VBA row is already gone, so an orphaned mirror can still be
/// removed. The request is 404 only when neither collection had the row. A
/// mirror failure other than not-found restores the VBA row and fails the
/// request.
pub async fn delete_vba_project(
    caller: AuthenticatedCaller,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<VbaDeleteResponse>, FieldcheckError> {
    let (deleted, project_deleted) = delete_with_mirror(&caller.client, id).await?;
    record(
        &caller.client,
        NewActivityLog::entity(caller.user.id, "vba_project.deleted", "vba_project", id, None),
    )
    .await;
    Ok(Json(VbaDeleteResponse {
        id,
        deleted,
        project_deleted,
    }))
}

/// Returns whether the VBA row and the mirror row were each removed.
async fn delete_with_mirror(
    client: &DataClient,
    id: Uuid,
) -> Result<(bool, bool), FieldcheckError> {
    let by_id = [Filter::eq("id", id)];
    // Kept for compensation if the second phase fails.
    let snapshot = match client.select_one::<VbaProject>(VBA_PROJECTS_TABLE, &by_id).await {
        Ok(row) => Some(row),
        Err(e) if e.is_not_found() => {
            info!(%id, "no VBA row; checking for an orphaned projects mirror");
            None
        }
        Err(e) => return Err(e.into()),
    };
    if snapshot.is_some() {
        let _deleted: VbaProject = client.delete_one(VBA_PROJECTS_TABLE, &by_id).await?;
    }

    match client.delete_one::<Project>(PROJECTS_TABLE, &by_id).await {
        Ok(_) => {
            if snapshot.is_none() {
                warn!(%id, "removed orphaned projects mirror");
            }
            Ok((snapshot.is_some(), true))
        }
        Err(e) if e.is_not_found() => match snapshot {
            Some(_) => {
                info!(%id, "VBA project had no projects mirror");
                Ok((true, false))
            }
            None => Err(FieldcheckError::NotFound("VBA project")),
        },
        Err(e) => {
            if let Some(row) = snapshot {
                warn!(%id, error = %e, "projects mirror delete failed; restoring VBA row");
                if let Err(undo) = client
                    .insert_one::<VbaProject, _>(VBA_PROJECTS_TABLE, &row)
                    .await
                {
                    error!(%id, error = %undo, "restoring VBA row failed; collections diverge");
                }
            }
            Err(e.into())
        }
    }
}

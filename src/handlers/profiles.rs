use axum::Json;
use chrono::Utc;
use tracing::warn;

use crate::api::{Filter, ListQuery};
use crate::error::FieldcheckError;
use crate::middleware::auth::{AuthenticatedCaller, ServiceCaller};
use crate::middleware::request::ApiJson;
use crate::types::profile::{PROFILES_TABLE, Profile, UpdateProfile};

/// GET /api/profile
pub async fn get_profile(caller: AuthenticatedCaller) -> Result<Json<Profile>, FieldcheckError> {
    let profile = caller
        .client
        .select_one(PROFILES_TABLE, &[Filter::eq("id", caller.user.id)])
        .await?;
    Ok(Json(profile))
}

/// PATCH /api/profile
pub async fn update_profile(
    caller: AuthenticatedCaller,
    ApiJson(mut patch): ApiJson<UpdateProfile>,
) -> Result<Json<Profile>, FieldcheckError> {
    patch.updated_at = Some(Utc::now());
    let profile = caller
        .client
        .update_one(PROFILES_TABLE, &[Filter::eq("id", caller.user.id)], &patch)
        .await?;
    Ok(Json(profile))
}

/// GET /api/admin/profiles -> every profile, bypassing row-level security.
pub async fn admin_list_profiles(
    caller: ServiceCaller,
) -> Result<Json<Vec<Profile>>, FieldcheckError> {
    let own: Profile = caller
        .service
        .select_one(PROFILES_TABLE, &[Filter::eq("id", caller.user.id)])
        .await
        .map_err(|e| {
            if e.is_not_found() {
                FieldcheckError::Forbidden("caller has no profile".to_string())
            } else {
                e.into()
            }
        })?;
    if !own.is_admin() {
        warn!(user_id = %caller.user.id, "non-admin attempted admin profile listing");
        return Err(FieldcheckError::Forbidden("admin role required".to_string()));
    }

    let list = ListQuery::new().order("created_at.desc");
    Ok(Json(caller.service.select(PROFILES_TABLE, &list).await?))
}

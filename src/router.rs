use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::api::{AuthApi, Credential, DataClient};
use crate::config::Config;
use crate::error::{DataError, FieldcheckError};
use crate::handlers::{
    activity_logs, auth, field_reports, health, metrics, profiles, projects, vba_projects,
};
use crate::metrics::MetricsService;

#[derive(Clone)]
pub struct FieldcheckState {
    pub http: reqwest::Client,
    pub config: Arc<Config>,
    pub auth: AuthApi,
    pub metrics: Arc<MetricsService>,
}

impl FieldcheckState {
    pub fn new(config: Config, metrics: MetricsService) -> Result<Self, FieldcheckError> {
        let http = config.build_http_client().map_err(DataError::from)?;
        let auth = AuthApi::new(http.clone(), &config.data_url, config.anon_key.clone())?;
        Ok(Self {
            http,
            config: Arc::new(config),
            auth,
            metrics: Arc::new(metrics),
        })
    }

    /// Client that evaluates row-level security as `credential`.
    pub fn data_client(&self, credential: Credential) -> Result<DataClient, FieldcheckError> {
        Ok(DataClient::new(
            self.http.clone(),
            &self.config.data_url,
            self.config.anon_key.clone(),
            credential,
        )?)
    }

    /// Service-key client, or `None` when no service key is configured.
    pub fn service_client(&self) -> Result<Option<DataClient>, FieldcheckError> {
        let Some(key) = self.config.service_role_key.as_deref() else {
            return Ok(None);
        };
        Ok(Some(DataClient::new(
            self.http.clone(),
            &self.config.data_url,
            key.to_string(),
            Credential::Service(key.to_string()),
        )?))
    }
}

pub fn fieldcheck_router(state: FieldcheckState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session));

    let api = Router::new()
        .route("/metrics", get(metrics::metrics_handler))
        .nest("/auth", auth_routes)
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/projects/{id}/members",
            get(projects::list_members).post(projects::add_member),
        )
        .route(
            "/projects/{id}/members/{user_id}",
            delete(projects::remove_member),
        )
        .route(
            "/vba-projects",
            get(vba_projects::list_vba_projects).post(vba_projects::create_vba_project),
        )
        .route(
            "/vba-projects/{id}",
            get(vba_projects::get_vba_project)
                .patch(vba_projects::update_vba_project)
                .delete(vba_projects::delete_vba_project),
        )
        .route(
            "/field-reports",
            get(field_reports::list_field_reports).post(field_reports::create_field_report),
        )
        .route(
            "/field-reports/{id}",
            get(field_reports::get_field_report)
                .patch(field_reports::update_field_report)
                .delete(field_reports::delete_field_report),
        )
        .route(
            "/activity-logs",
            get(activity_logs::list_activity_logs).post(activity_logs::create_activity_log),
        )
        .route(
            "/profile",
            get(profiles::get_profile).patch(profiles::update_profile),
        )
        .route("/admin/profiles", get(profiles::admin_list_profiles));

    Router::new()
        .route("/health", get(health))
        .route("/auth/callback", get(auth::callback))
        .nest("/api", api)
        .with_state(state)
}

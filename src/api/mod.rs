//! Outbound clients for the hosted backend.
//!
//! - `rest_api.rs`: row CRUD against the REST data API, credential-scoped
//! - `auth_api.rs`: token grants and identity lookups against the auth API

pub mod auth_api;
pub mod rest_api;

pub use auth_api::{AuthApi, AuthSession, AuthUser, SignUpOutcome};
pub use rest_api::{Credential, DataClient, Filter, ListQuery};

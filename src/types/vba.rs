use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::project::NewProject;
use super::require_text;
use crate::error::FieldcheckError;

pub const VBA_PROJECTS_TABLE: &str = "vba_projects";
pub const VBA_PROJECT_TYPE: &str = "vba";

/// Inspection project tracked by the VBA module.
///
/// Serializes back to a full row so a deleted record can be restored verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VbaProject {
    pub id: Uuid,
    pub project_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub builder: Option<String>,
    #[serde(default)]
    pub permit_number: Option<String>,
    #[serde(default)]
    pub inspection_type: Option<String>,
    #[serde(default)]
    pub inspection_date: Option<NaiveDate>,
    #[serde(default)]
    pub inspector: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVbaProject {
    pub project_name: Option<String>,
    pub address: Option<String>,
    pub client: Option<String>,
    pub builder: Option<String>,
    pub permit_number: Option<String>,
    pub inspection_type: Option<String>,
    pub inspection_date: Option<NaiveDate>,
    pub inspector: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewVbaProject {
    pub id: Uuid,
    pub project_name: String,
    pub address: String,
    pub client: Option<String>,
    pub builder: Option<String>,
    pub permit_number: Option<String>,
    pub inspection_type: String,
    pub inspection_date: Option<NaiveDate>,
    pub inspector: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

impl CreateVbaProject {
    /// Validate and assign the id shared by the VBA row and its `projects` mirror.
    pub fn into_row(
        self,
        id: Uuid,
        created_by: Option<Uuid>,
    ) -> Result<NewVbaProject, FieldcheckError> {
        Ok(NewVbaProject {
            id,
            project_name: require_text("project_name", self.project_name)?,
            address: require_text("address", self.address)?,
            client: self.client,
            builder: self.builder,
            permit_number: self.permit_number,
            inspection_type: require_text("inspection_type", self.inspection_type)?,
            inspection_date: self.inspection_date,
            inspector: self.inspector,
            status: self.status.unwrap_or_else(|| "scheduled".to_string()),
            notes: self.notes,
            organization_id: self.organization_id,
            created_by,
        })
    }
}

impl NewVbaProject {
    /// The general `projects` row that lists this inspection alongside other work.
    pub fn mirror(&self) -> NewProject {
        NewProject {
            id: Some(self.id),
            name: self.project_name.clone(),
            description: Some(format!("VBA inspection: {}", self.inspection_type)),
            address: Some(self.address.clone()),
            status: self.status.clone(),
            project_type: VBA_PROJECT_TYPE.to_string(),
            client_name: self.client.clone(),
            start_date: self.inspection_date,
            end_date: None,
            organization_id: self.organization_id,
            created_by: self.created_by,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVbaProject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permit_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspection_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspection_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

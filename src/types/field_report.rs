use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::require_text;
use crate::error::FieldcheckError;

pub const FIELD_REPORTS_TABLE: &str = "field_reports";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldReport {
    pub id: Uuid,
    pub project_id: Uuid,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub report_type: Option<String>,
    #[serde(default)]
    pub report_date: Option<NaiveDate>,
    #[serde(default)]
    pub weather: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFieldReport {
    pub project_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub title: Option<String>,
    pub report_type: Option<String>,
    pub report_date: Option<NaiveDate>,
    pub weather: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewFieldReport {
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub report_type: String,
    pub report_date: NaiveDate,
    pub weather: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_by: Uuid,
}

impl CreateFieldReport {
    /// Check required fields and fill `organization_id` with `default_org` when absent.
    pub fn into_row(
        self,
        default_org: Uuid,
        created_by: Uuid,
    ) -> Result<NewFieldReport, FieldcheckError> {
        let project_id = self
            .project_id
            .ok_or_else(|| FieldcheckError::Validation("project_id is required".to_string()))?;
        let report_date = self
            .report_date
            .ok_or_else(|| FieldcheckError::Validation("report_date is required".to_string()))?;
        Ok(NewFieldReport {
            project_id,
            organization_id: self.organization_id.unwrap_or(default_org),
            title: require_text("title", self.title)?,
            report_type: require_text("report_type", self.report_type)?,
            report_date,
            weather: self.weather,
            location: self.location,
            notes: self.notes,
            status: self.status.unwrap_or_else(|| "draft".to_string()),
            created_by,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFieldReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldReportQuery {
    pub project_id: Option<Uuid>,
    pub status: Option<String>,
    pub limit: Option<usize>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::require_text;
use crate::error::FieldcheckError;

pub const ACTIVITY_LOGS_TABLE: &str = "activity_logs";

pub const DEFAULT_ACTIVITY_LIMIT: usize = 50;
pub const MAX_ACTIVITY_LIMIT: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityLog {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    pub action: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub details: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateActivityLog {
    pub action: Option<String>,
    pub project_id: Option<Uuid>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewActivityLog {
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub details: Value,
}

impl NewActivityLog {
    pub fn entity(
        user_id: Uuid,
        action: &str,
        entity_type: &str,
        entity_id: impl ToString,
        project_id: Option<Uuid>,
    ) -> Self {
        Self {
            user_id,
            project_id,
            action: action.to_string(),
            entity_type: Some(entity_type.to_string()),
            entity_id: Some(entity_id.to_string()),
            details: Value::Null,
        }
    }
}

impl CreateActivityLog {
    pub fn into_row(self, user_id: Uuid) -> Result<NewActivityLog, FieldcheckError> {
        Ok(NewActivityLog {
            user_id,
            project_id: self.project_id,
            action: require_text("action", self.action)?,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            details: self.details,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityLogQuery {
    pub project_id: Option<Uuid>,
    pub limit: Option<usize>,
}

impl ActivityLogQuery {
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .clamp(1, MAX_ACTIVITY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(ActivityLogQuery::default().effective_limit(), 50);
        let q = ActivityLogQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(q.effective_limit(), MAX_ACTIVITY_LIMIT);
        let q = ActivityLogQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(q.effective_limit(), 1);
    }
}

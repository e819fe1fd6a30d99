use bluebridge_core::{non_empty, BugReport, BugReportRequest};
use bluebridge_db::repo::BugReportRepo;
use serde_json::Value;

use crate::app::AppState;
use crate::domains::errors::ServiceError;

pub struct BugReportCommand {
    pub name: String,
    pub description: String,
    pub category: String,
    pub extra: Value,
}

impl TryFrom<BugReportRequest> for BugReportCommand {
    type Error = ServiceError;

    fn try_from(request: BugReportRequest) -> Result<Self, Self::Error> {
        let (Some(name), Some(description), Some(category)) = (
            non_empty(request.name.as_deref()),
            non_empty(request.description.as_deref()),
            non_empty(request.category.as_deref()),
        ) else {
            return Err(ServiceError::BadRequest(
                "Missing required fields: name, description, category",
            ));
        };
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            extra: request
                .extra
                .filter(|extra| !extra.is_null())
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        })
    }
}

pub async fn submit(state: &AppState, cmd: BugReportCommand) -> Result<BugReport, ServiceError> {
    let report = BugReportRepo::new(&state.db)
        .create(&cmd.name, &cmd.description, &cmd.category, &cmd.extra)
        .await
        .map_err(|err| {
            tracing::error!(event = "bug_report_failed", error = %err);
            ServiceError::DbError
        })?;
    tracing::info!(
        event = "bug_report_submitted",
        report_id = report.id,
        category = %report.category
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_fields_are_rejected() {
        let request: BugReportRequest =
            serde_json::from_value(json!({"name": "Ada", "description": " ", "category": "ui"}))
                .expect("request");
        let err = BugReportCommand::try_from(request).err().expect("rejected");
        assert_eq!(
            err.message(),
            "Missing required fields: name, description, category"
        );
    }

    #[test]
    fn extra_defaults_to_empty_object() {
        let request: BugReportRequest = serde_json::from_value(
            json!({"name": "Ada", "description": "Map is blank", "category": "ui"}),
        )
        .expect("request");
        let cmd = BugReportCommand::try_from(request).expect("command");
        assert_eq!(cmd.extra, json!({}));
        assert_eq!(cmd.category, "ui");
    }
}

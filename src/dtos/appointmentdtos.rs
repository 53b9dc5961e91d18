use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::appointmentmodel::AppointmentStatus;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateAppointmentDto {
    pub contractor_id: Uuid,

    pub scheduled_at: DateTime<Utc>,

    /// Free-form, e.g. "1 hour" or "half day".
    #[validate(length(max = 50, message = "Duration must be at most 50 characters"))]
    pub duration: Option<String>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateAppointmentStatusDto {
    pub status: AppointmentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_timestamp() {
        let dto: CreateAppointmentDto = serde_json::from_str(
            r#"{"contractor_id":"6f1c2a8e-1b7e-4c1a-9a43-3c0b9f1f2d11","scheduled_at":"2030-05-01T09:30:00Z"}"#,
        )
        .unwrap();
        assert_eq!(dto.scheduled_at.to_rfc3339(), "2030-05-01T09:30:00+00:00");
        assert!(dto.duration.is_none());
    }

    #[test]
    fn status_update_uses_snake_case() {
        let dto: UpdateAppointmentStatusDto = serde_json::from_str(r#"{"status":"cancelled"}"#).unwrap();
        assert_eq!(dto.status, AppointmentStatus::Cancelled);
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Budgets arrive as form strings; blank means "no bound".
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateJobDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description must be between 1 and 5000 characters"))]
    pub description: String,

    pub service_id: Uuid,

    pub budget_min: Option<String>,

    pub budget_max: Option<String>,

    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SubmitBidDto {
    #[validate(length(min = 1, message = "Amount is required"))]
    pub amount: String,

    #[validate(length(max = 5000, message = "Proposal must be at most 5000 characters"))]
    pub proposal: Option<String>,
}

/// Query string for `GET /api/jobs`. Every criterion is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JobSearchQuery {
    pub search: Option<String>,
    pub service_id: Option<String>,
    pub status: Option<String>,
    pub min_budget: Option<String>,
    pub max_budget: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

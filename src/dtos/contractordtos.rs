use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::contractormodel::ContractorProfileUpdate;

/// Query string for `GET /api/contractors`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContractorSearchQuery {
    pub search: Option<String>,
    pub service_id: Option<String>,
    pub location: Option<String>,
    pub min_rating: Option<String>,
    pub min_experience: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct UpdateContractorProfileDto {
    #[validate(length(max = 200, message = "Business name must be at most 200 characters"))]
    pub business_name: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub license_number: Option<String>,

    #[validate(range(min = 0, max = 100, message = "Years of experience must be between 0 and 100"))]
    pub years_experience: i32,

    #[serde(default)]
    pub service_area: Vec<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,

    pub phone: Option<String>,

    #[serde(default)]
    pub service_ids: Vec<Uuid>,
}

impl UpdateContractorProfileDto {
    /// Blank strings are stored as NULL; service-area entries are trimmed and de-blanked.
    pub fn to_update(&self) -> ContractorProfileUpdate {
        ContractorProfileUpdate {
            business_name: non_blank(&self.business_name),
            description: non_blank(&self.description),
            license_number: non_blank(&self.license_number),
            years_experience: self.years_experience,
            service_area: self
                .service_area
                .iter()
                .map(|area| area.trim().to_string())
                .filter(|area| !area.is_empty())
                .collect(),
            website: non_blank(&self.website),
            phone: non_blank(&self.phone),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateReviewDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_update_drops_blanks() {
        let dto = UpdateContractorProfileDto {
            business_name: Some("  Roof Co ".to_string()),
            description: Some("   ".to_string()),
            license_number: None,
            years_experience: 7,
            service_area: vec!["Austin".to_string(), " ".to_string(), " Round Rock".to_string()],
            website: None,
            phone: Some(String::new()),
            service_ids: Vec::new(),
        };
        let update = dto.to_update();
        assert_eq!(update.business_name.as_deref(), Some("Roof Co"));
        assert!(update.description.is_none());
        assert!(update.phone.is_none());
        assert_eq!(update.service_area, vec!["Austin".to_string(), "Round Rock".to_string()]);
    }

    #[test]
    fn test_review_rating_range() {
        let low = CreateReviewDto { rating: 0, comment: None };
        let high = CreateReviewDto { rating: 6, comment: None };
        let ok = CreateReviewDto { rating: 5, comment: Some("Great work".to_string()) };
        assert!(low.validate().is_err());
        assert!(high.validate().is_err());
        assert!(ok.validate().is_ok());
    }
}

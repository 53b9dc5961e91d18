use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 1:1 extension of a contractor user; shares the user's id.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContractorProfile {
    pub id: Uuid,
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub license_number: Option<String>,
    pub years_experience: i32,
    pub service_area: Vec<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub insurance_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a contractor can change from profile settings.
#[derive(Debug, Clone, Default)]
pub struct ContractorProfileUpdate {
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub license_number: Option<String>,
    pub years_experience: i32,
    pub service_area: Vec<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct ServiceSummary {
    pub id: Uuid,
    pub name: String,
}

/// Directory row: contractor profile + owner profile fields + offered services.
/// Services are stitched in after the main query.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContractorListing {
    pub id: Uuid,
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub years_experience: i32,
    pub service_area: Vec<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub insurance_verified: bool,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    #[sqlx(skip)]
    pub services: Vec<ServiceSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub contractor_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewWithAuthor {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub contractor_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub reviewer_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row of the contractor_services join used to stitch services onto listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContractorServiceRow {
    pub contractor_id: Uuid,
    pub id: Uuid,
    pub name: String,
}

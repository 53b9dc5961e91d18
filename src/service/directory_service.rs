// service/directory_service.rs
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{
        catalogdb::CatalogExt,
        contractordb::{ContractorExt, ReviewExt},
        userdb::UserExt,
        MarketplaceStore,
    },
    dtos::contractordtos::{ContractorSearchQuery, CreateReviewDto, UpdateContractorProfileDto},
    models::{contractormodel::*, jobmodel::CatalogService, usermodel::UserRole},
    service::error::ServiceError,
};

/// Unrounded mean; `None` when there are no ratings.
pub fn mean_rating(ratings: &[i32]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    Some(sum as f64 / ratings.len() as f64)
}

/// Mean rating rounded to one decimal place for display; 0.0 when there are none.
pub fn average_rating(ratings: &[i32]) -> f64 {
    mean_rating(ratings)
        .map(|mean| (mean * 10.0).round() / 10.0)
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Default)]
pub struct ContractorFilter {
    pub search: Option<String>,
    pub service_id: Option<Uuid>,
    pub location: Option<String>,
    pub min_rating: Option<f64>,
    pub min_experience: Option<i32>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ContractorFilter {
    pub fn from_query(query: &ContractorSearchQuery) -> Result<Self, ServiceError> {
        let service_id = non_blank(&query.service_id)
            .map(|raw| {
                Uuid::parse_str(raw)
                    .map_err(|_| ServiceError::Validation(format!("Invalid service id: {}", raw)))
            })
            .transpose()?;

        let min_rating = non_blank(&query.min_rating)
            .map(|raw| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| ServiceError::Validation(format!("Invalid minimum rating: {}", raw)))
            })
            .transpose()?;

        let min_experience = non_blank(&query.min_experience)
            .map(|raw| {
                raw.parse::<i32>()
                    .map_err(|_| ServiceError::Validation(format!("Invalid minimum experience: {}", raw)))
            })
            .transpose()?;

        Ok(ContractorFilter {
            search: non_blank(&query.search).map(str::to_lowercase),
            service_id,
            location: non_blank(&query.location).map(str::to_lowercase),
            min_rating,
            min_experience,
        })
    }
}

/// A directory entry as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ContractorCard {
    #[serde(flatten)]
    pub contractor: ContractorListing,
    pub average_rating: f64,
    pub review_count: usize,
}

/// Snapshot of the verified contractors and their reviews.
/// Filtering never mutates it; each call derives a fresh view.
#[derive(Debug, Clone, Default)]
pub struct ContractorDirectory {
    contractors: Vec<ContractorListing>,
    reviews: HashMap<Uuid, Vec<ReviewWithAuthor>>,
}

impl ContractorDirectory {
    /// Reviews keep their fetch order within each contractor.
    pub fn new(contractors: Vec<ContractorListing>, reviews: Vec<ReviewWithAuthor>) -> Self {
        let mut grouped: HashMap<Uuid, Vec<ReviewWithAuthor>> = HashMap::new();
        for review in reviews {
            grouped.entry(review.contractor_id).or_default().push(review);
        }
        Self { contractors, reviews: grouped }
    }

    pub fn reviews_for(&self, contractor_id: Uuid) -> &[ReviewWithAuthor] {
        self.reviews
            .get(&contractor_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn ratings(&self, contractor_id: Uuid) -> Vec<i32> {
        self.reviews_for(contractor_id).iter().map(|r| r.rating).collect()
    }

    pub fn average_rating(&self, contractor_id: Uuid) -> f64 {
        average_rating(&self.ratings(contractor_id))
    }

    fn matches(&self, contractor: &ContractorListing, filter: &ContractorFilter) -> bool {
        if let Some(search) = &filter.search {
            let hit = [
                contractor.business_name.as_deref(),
                contractor.description.as_deref(),
                contractor.full_name.as_deref(),
            ]
            .iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(search));
            if !hit {
                return false;
            }
        }

        if let Some(service_id) = filter.service_id {
            if !contractor.services.iter().any(|s| s.id == service_id) {
                return false;
            }
        }

        if let Some(location) = &filter.location {
            if !contractor
                .service_area
                .iter()
                .any(|area| area.to_lowercase().contains(location))
            {
                return false;
            }
        }

        // The floor applies to the unrounded mean; rounding is for display only.
        if let Some(min_rating) = filter.min_rating {
            match mean_rating(&self.ratings(contractor.id)) {
                Some(mean) if mean >= min_rating => {}
                _ => return false,
            }
        }

        if let Some(min_experience) = filter.min_experience {
            if contractor.years_experience < min_experience {
                return false;
            }
        }

        true
    }

    pub fn filter<'a>(&'a self, filter: &'a ContractorFilter) -> impl Iterator<Item = &'a ContractorListing> + 'a {
        self.contractors.iter().filter(move |c| self.matches(c, filter))
    }

    pub fn cards(&self, filter: &ContractorFilter) -> Vec<ContractorCard> {
        self.filter(filter)
            .map(|contractor| ContractorCard {
                average_rating: self.average_rating(contractor.id),
                review_count: self.reviews_for(contractor.id).len(),
                contractor: contractor.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct ContractorProfileView {
    pub profile: ContractorProfile,
    pub service_ids: Vec<Uuid>,
}

#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn MarketplaceStore>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn MarketplaceStore>) -> Self {
        Self { store }
    }

    pub async fn load_directory(&self) -> Result<ContractorDirectory, ServiceError> {
        let contractors = self.store.get_verified_contractors().await?;
        let reviews = self.store.get_all_reviews().await?;
        Ok(ContractorDirectory::new(contractors, reviews))
    }

    pub async fn search(&self, filter: &ContractorFilter) -> Result<Vec<ContractorCard>, ServiceError> {
        let directory = self.load_directory().await?;
        Ok(directory.cards(filter))
    }

    pub async fn list_services(&self) -> Result<Vec<CatalogService>, ServiceError> {
        Ok(self.store.get_services().await?)
    }

    async fn ensure_contractor(&self, contractor_id: Uuid) -> Result<(), ServiceError> {
        self.store
            .get_user(Some(contractor_id), None, None)
            .await?
            .filter(|user| user.role == UserRole::Contractor)
            .map(|_| ())
            .ok_or(ServiceError::ContractorNotFound(contractor_id))
    }

    pub async fn contractor_reviews(&self, contractor_id: Uuid) -> Result<Vec<ReviewWithAuthor>, ServiceError> {
        self.ensure_contractor(contractor_id).await?;
        Ok(self.store.get_contractor_reviews(contractor_id).await?)
    }

    pub async fn create_review(
        &self,
        customer_id: Uuid,
        contractor_id: Uuid,
        review_data: CreateReviewDto,
    ) -> Result<Review, ServiceError> {
        if !(1..=5).contains(&review_data.rating) {
            return Err(ServiceError::Validation("Rating must be between 1 and 5".to_string()));
        }
        self.ensure_contractor(contractor_id).await?;

        let comment = non_blank(&review_data.comment);
        let review = self
            .store
            .create_review(customer_id, contractor_id, review_data.rating, comment)
            .await?;

        tracing::info!(
            "Customer {} rated contractor {} with {}",
            customer_id,
            contractor_id,
            review.rating
        );
        Ok(review)
    }

    pub async fn get_contractor_profile(&self, contractor_id: Uuid) -> Result<ContractorProfileView, ServiceError> {
        let profile = self
            .store
            .get_contractor_profile(contractor_id)
            .await?
            .ok_or(ServiceError::ContractorNotFound(contractor_id))?;
        let service_ids = self.store.get_contractor_service_ids(contractor_id).await?;
        Ok(ContractorProfileView { profile, service_ids })
    }

    pub async fn update_contractor_profile(
        &self,
        contractor_id: Uuid,
        profile_data: UpdateContractorProfileDto,
    ) -> Result<ContractorProfileView, ServiceError> {
        let mut service_ids = profile_data.service_ids.clone();
        service_ids.sort();
        service_ids.dedup();

        for service_id in &service_ids {
            self.store
                .get_service(*service_id)
                .await?
                .ok_or(ServiceError::ServiceNotFound(*service_id))?;
        }

        let profile = self
            .store
            .upsert_contractor_profile(contractor_id, &profile_data.to_update(), &service_ids)
            .await?;

        tracing::info!(
            "Contractor {} updated profile with {} services",
            contractor_id,
            service_ids.len()
        );
        Ok(ContractorProfileView { profile, service_ids })
    }
}

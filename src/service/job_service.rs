// service/job_service.rs
use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{biddb::BidExt, catalogdb::CatalogExt, jobdb::JobExt, MarketplaceStore},
    dtos::jobdtos::{CreateJobDto, JobSearchQuery, SubmitBidDto},
    models::{jobmodel::*, usermodel::User},
    service::error::ServiceError,
    utils::amount::{parse_optional_amount, parse_positive_amount},
};

/// In-memory job criteria. All present criteria must match.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub search: Option<String>,
    pub service_id: Option<Uuid>,
    pub status: Option<JobStatus>,
    pub min_budget: Option<BigDecimal>,
    pub max_budget: Option<BigDecimal>,
    pub location: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl JobFilter {
    pub fn from_query(query: &JobSearchQuery) -> Result<Self, ServiceError> {
        let service_id = match non_blank(&query.service_id) {
            Some(raw) => Some(
                Uuid::parse_str(raw)
                    .map_err(|_| ServiceError::Validation(format!("Invalid service id: {}", raw)))?,
            ),
            None => None,
        };

        let status = match non_blank(&query.status) {
            Some(raw) => Some(
                JobStatus::parse(raw)
                    .ok_or_else(|| ServiceError::Validation(format!("Unknown job status: {}", raw)))?,
            ),
            None => None,
        };

        let min_budget = parse_optional_amount(query.min_budget.as_deref(), "Minimum budget")
            .map_err(ServiceError::Validation)?;
        let max_budget = parse_optional_amount(query.max_budget.as_deref(), "Maximum budget")
            .map_err(ServiceError::Validation)?;

        Ok(JobFilter {
            search: non_blank(&query.search).map(str::to_lowercase),
            service_id,
            status,
            min_budget,
            max_budget,
            location: non_blank(&query.location).map(str::to_lowercase),
        })
    }

    pub fn matches(&self, job: &JobListing) -> bool {
        if let Some(search) = &self.search {
            let in_title = job.title.to_lowercase().contains(search);
            let in_description = job.description.to_lowercase().contains(search);
            if !in_title && !in_description {
                return false;
            }
        }

        if let Some(service_id) = self.service_id {
            if job.service_id != service_id {
                return false;
            }
        }

        if let Some(status) = self.status {
            if job.status != status {
                return false;
            }
        }

        if self.min_budget.is_some() || self.max_budget.is_some() {
            // A single bound stands in for both ends of the job's range.
            let (low, high) = match (&job.budget_min, &job.budget_max) {
                (Some(lo), Some(hi)) => (lo, hi),
                (Some(only), None) | (None, Some(only)) => (only, only),
                (None, None) => return false,
            };
            if let Some(min) = &self.min_budget {
                if high < min {
                    return false;
                }
            }
            if let Some(max) = &self.max_budget {
                if low > max {
                    return false;
                }
            }
        }

        if let Some(location) = &self.location {
            let matched = job
                .location
                .as_deref()
                .map(|l| l.to_lowercase().contains(location))
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }

        true
    }

    /// Lazily yields the matching jobs; can be re-run over the same slice.
    pub fn apply<'a>(&'a self, jobs: &'a [JobListing]) -> impl Iterator<Item = &'a JobListing> + 'a {
        jobs.iter().filter(move |job| self.matches(job))
    }
}

#[derive(Debug, Serialize)]
pub struct JobDetails {
    pub job: JobListing,
    /// Present only for the job owner and contractors who have bid.
    pub bids: Option<Vec<BidListing>>,
}

#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn MarketplaceStore>,
}

impl JobService {
    pub fn new(store: Arc<dyn MarketplaceStore>) -> Self {
        Self { store }
    }

    pub async fn create_job(&self, customer_id: Uuid, job_data: CreateJobDto) -> Result<Job, ServiceError> {
        let title = job_data.title.trim();
        let description = job_data.description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(ServiceError::Validation(
                "Title and description are required".to_string(),
            ));
        }

        let budget_min = parse_optional_amount(job_data.budget_min.as_deref(), "Minimum budget")
            .map_err(ServiceError::Validation)?;
        let budget_max = parse_optional_amount(job_data.budget_max.as_deref(), "Maximum budget")
            .map_err(ServiceError::Validation)?;
        if let (Some(min), Some(max)) = (&budget_min, &budget_max) {
            if min > max {
                return Err(ServiceError::Validation(
                    "Minimum budget cannot exceed maximum budget".to_string(),
                ));
            }
        }

        self.store
            .get_service(job_data.service_id)
            .await?
            .ok_or(ServiceError::ServiceNotFound(job_data.service_id))?;

        let location = non_blank(&job_data.location);
        let job = self
            .store
            .create_job(
                customer_id,
                job_data.service_id,
                title,
                description,
                budget_min,
                budget_max,
                location,
            )
            .await?;

        tracing::info!("Job {} created by customer {}", job.id, customer_id);
        Ok(job)
    }

    pub async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobListing>, ServiceError> {
        let jobs = self.store.get_job_listings().await?;
        Ok(filter.apply(&jobs).cloned().collect())
    }

    pub async fn customer_jobs(&self, customer_id: Uuid) -> Result<Vec<JobListing>, ServiceError> {
        Ok(self.store.get_customer_jobs(customer_id).await?)
    }

    pub async fn contractor_active_jobs(&self, contractor_id: Uuid) -> Result<Vec<JobListing>, ServiceError> {
        Ok(self.store.get_contractor_active_jobs(contractor_id).await?)
    }

    pub async fn contractor_recent_bids(
        &self,
        contractor_id: Uuid,
        limit: i64,
    ) -> Result<Vec<BidListing>, ServiceError> {
        Ok(self.store.get_contractor_recent_bids(contractor_id, limit).await?)
    }

    pub async fn get_job_details(&self, job_id: Uuid, viewer: &User) -> Result<JobDetails, ServiceError> {
        let job = self
            .store
            .get_job_listing(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        let bids = if self.can_view_bids(&job, viewer.id).await? {
            Some(self.store.get_job_bids(job_id).await?)
        } else {
            None
        };

        Ok(JobDetails { job, bids })
    }

    async fn can_view_bids(&self, job: &JobListing, viewer_id: Uuid) -> Result<bool, ServiceError> {
        if job.customer_id == viewer_id {
            return Ok(true);
        }
        Ok(self.store.has_bid_on_job(job.id, viewer_id).await?)
    }

    pub async fn list_bids(&self, job_id: Uuid, viewer: &User) -> Result<Vec<BidListing>, ServiceError> {
        let job = self
            .store
            .get_job_listing(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if !self.can_view_bids(&job, viewer.id).await? {
            return Err(ServiceError::UnauthorizedJobAccess(viewer.id, job_id));
        }

        Ok(self.store.get_job_bids(job_id).await?)
    }

    pub async fn submit_bid(
        &self,
        job_id: Uuid,
        contractor_id: Uuid,
        bid_data: SubmitBidDto,
    ) -> Result<Bid, ServiceError> {
        let amount = parse_positive_amount(&bid_data.amount, "Amount").map_err(ServiceError::Validation)?;

        let job = self
            .store
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if !job.status.accepts_bids() {
            tracing::warn!(
                "Contractor {} is bidding on job {} with status {}",
                contractor_id,
                job_id,
                job.status.to_str()
            );
        }
        if self.store.has_bid_on_job(job_id, contractor_id).await? {
            tracing::warn!("Contractor {} already has a bid on job {}", contractor_id, job_id);
        }

        let proposal = non_blank(&bid_data.proposal);
        let bid = self.store.create_bid(job_id, contractor_id, amount, proposal).await?;

        tracing::info!("Bid {} submitted on job {} by contractor {}", bid.id, job_id, contractor_id);
        Ok(bid)
    }

    async fn owned_job(&self, job_id: Uuid, customer_id: Uuid) -> Result<Job, ServiceError> {
        let job = self
            .store
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if job.customer_id != customer_id {
            return Err(ServiceError::UnauthorizedJobAccess(customer_id, job_id));
        }
        Ok(job)
    }

    /// Accepts `bid_id` and moves the job to in_progress atomically.
    pub async fn accept_bid(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        customer_id: Uuid,
    ) -> Result<(Job, Bid), ServiceError> {
        self.owned_job(job_id, customer_id).await?;

        match self.store.accept_bid(job_id, bid_id).await? {
            BidDecision::Applied { job, bid } => {
                tracing::info!("Bid {} accepted; job {} is now in progress", bid.id, job.id);
                Ok((job, bid))
            }
            decision => Err(ServiceError::from_bid_decision(
                decision,
                job_id,
                bid_id,
                BidStatus::Accepted,
            )),
        }
    }

    pub async fn reject_bid(&self, bid_id: Uuid, customer_id: Uuid) -> Result<Bid, ServiceError> {
        let bid = self
            .store
            .get_bid_by_id(bid_id)
            .await?
            .ok_or(ServiceError::BidNotFound(bid_id))?;
        self.owned_job(bid.job_id, customer_id).await?;

        match self.store.reject_bid(bid_id).await? {
            BidDecision::Applied { bid, .. } => {
                tracing::info!("Bid {} rejected", bid.id);
                Ok(bid)
            }
            decision => Err(ServiceError::from_bid_decision(
                decision,
                bid.job_id,
                bid_id,
                BidStatus::Rejected,
            )),
        }
    }

    pub async fn complete_job(&self, job_id: Uuid, customer_id: Uuid) -> Result<Job, ServiceError> {
        self.transition_job(job_id, customer_id, JobStatus::Completed).await
    }

    pub async fn cancel_job(&self, job_id: Uuid, customer_id: Uuid) -> Result<Job, ServiceError> {
        self.transition_job(job_id, customer_id, JobStatus::Cancelled).await
    }

    async fn transition_job(
        &self,
        job_id: Uuid,
        customer_id: Uuid,
        to: JobStatus,
    ) -> Result<Job, ServiceError> {
        let job = self.owned_job(job_id, customer_id).await?;

        if !job.status.can_transition_to(to) {
            return Err(ServiceError::InvalidJobTransition {
                job_id,
                from: job.status,
                to,
            });
        }

        match self.store.update_job_status(job_id, job.status, to).await? {
            Some(updated) => {
                tracing::info!("Job {} moved from {} to {}", job_id, job.status.to_str(), to.to_str());
                Ok(updated)
            }
            None => {
                // Lost a race with another status change.
                let current = self
                    .store
                    .get_job_by_id(job_id)
                    .await?
                    .ok_or(ServiceError::JobNotFound(job_id))?;
                Err(ServiceError::InvalidJobTransition {
                    job_id,
                    from: current.status,
                    to,
                })
            }
        }
    }
}

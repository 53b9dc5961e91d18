// db/memory.rs
//! In-memory store used by service tests. Mirrors the SQL in the other
//! db modules closely enough to exercise the lifecycle rules without Postgres.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::types::BigDecimal;
use uuid::Uuid;

use super::{
    appointmentdb::AppointmentExt, biddb::BidExt, catalogdb::CatalogExt,
    contractordb::{ContractorExt, ReviewExt}, jobdb::JobExt, userdb::UserExt,
};
use crate::models::{
    appointmentmodel::*, contractormodel::*, jobmodel::*, usermodel::{User, UserRole},
};

#[derive(Default)]
struct MemoryState {
    clock: Option<DateTime<Utc>>,
    users: Vec<User>,
    services: Vec<CatalogService>,
    jobs: Vec<Job>,
    bids: Vec<Bid>,
    appointments: Vec<Appointment>,
    profiles: Vec<ContractorProfile>,
    contractor_services: Vec<(Uuid, Uuid)>,
    reviews: Vec<Review>,
}

impl MemoryState {
    /// Strictly increasing timestamps so "newest first" is deterministic.
    fn tick(&mut self) -> DateTime<Utc> {
        let next = match self.clock {
            Some(last) => last + Duration::seconds(1),
            None => Utc::now(),
        };
        self.clock = Some(next);
        next
    }

    fn user_name(&self, user_id: Uuid) -> Option<String> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .and_then(|u| u.full_name.clone())
    }

    fn business_name(&self, contractor_id: Uuid) -> Option<String> {
        self.profiles
            .iter()
            .find(|p| p.id == contractor_id)
            .and_then(|p| p.business_name.clone())
    }

    fn job_listing(&self, job: &Job) -> JobListing {
        JobListing {
            id: job.id,
            customer_id: job.customer_id,
            customer_name: self.user_name(job.customer_id),
            service_id: job.service_id,
            service_name: self
                .services
                .iter()
                .find(|s| s.id == job.service_id)
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            title: job.title.clone(),
            description: job.description.clone(),
            budget_min: job.budget_min.clone(),
            budget_max: job.budget_max.clone(),
            location: job.location.clone(),
            status: job.status,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }

    fn bid_listing(&self, bid: &Bid) -> BidListing {
        BidListing {
            id: bid.id,
            job_id: bid.job_id,
            job_title: self
                .jobs
                .iter()
                .find(|j| j.id == bid.job_id)
                .map(|j| j.title.clone())
                .unwrap_or_default(),
            contractor_id: bid.contractor_id,
            business_name: self.business_name(bid.contractor_id),
            contractor_name: self.user_name(bid.contractor_id),
            amount: bid.amount.clone(),
            proposal: bid.proposal.clone(),
            status: bid.status,
            created_at: bid.created_at,
            updated_at: bid.updated_at,
        }
    }

    fn appointment_details(&self, appointment: &Appointment) -> AppointmentDetails {
        AppointmentDetails {
            id: appointment.id,
            customer_id: appointment.customer_id,
            customer_name: self.user_name(appointment.customer_id),
            contractor_id: appointment.contractor_id,
            contractor_business_name: self.business_name(appointment.contractor_id),
            contractor_name: self.user_name(appointment.contractor_id),
            scheduled_at: appointment.scheduled_at,
            duration: appointment.duration.clone(),
            notes: appointment.notes.clone(),
            status: appointment.status,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }

    fn review_with_author(&self, review: &Review) -> ReviewWithAuthor {
        ReviewWithAuthor {
            id: review.id,
            customer_id: review.customer_id,
            contractor_id: review.contractor_id,
            rating: review.rating,
            comment: review.comment.clone(),
            reviewer_name: self.user_name(review.customer_id),
            created_at: review.created_at,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, role: UserRole, full_name: &str) -> User {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let user = User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", full_name.to_lowercase().replace(' ', ".")),
            full_name: Some(full_name.to_string()),
            avatar_url: None,
            role,
            password: String::new(),
            verified: true,
            verification_token: None,
            token_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        if role == UserRole::Contractor {
            state.profiles.push(empty_profile(user.id, now));
        }
        state.users.push(user.clone());
        user
    }

    pub fn add_service(&self, name: &str) -> CatalogService {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let service = CatalogService {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: "general".to_string(),
            created_at: now,
        };
        state.services.push(service.clone());
        service
    }

    pub fn set_insurance_verified(&self, contractor_id: Uuid, verified: bool) {
        let mut state = self.state.lock().unwrap();
        if let Some(profile) = state.profiles.iter_mut().find(|p| p.id == contractor_id) {
            profile.insurance_verified = verified;
        }
    }

    pub fn job(&self, job_id: Uuid) -> Option<Job> {
        let state = self.state.lock().unwrap();
        state.jobs.iter().find(|j| j.id == job_id).cloned()
    }

    pub fn bid(&self, bid_id: Uuid) -> Option<Bid> {
        let state = self.state.lock().unwrap();
        state.bids.iter().find(|b| b.id == bid_id).cloned()
    }

    pub fn bid_count(&self) -> usize {
        self.state.lock().unwrap().bids.len()
    }

    pub fn appointment_count(&self) -> usize {
        self.state.lock().unwrap().appointments.len()
    }
}

fn empty_profile(id: Uuid, now: DateTime<Utc>) -> ContractorProfile {
    ContractorProfile {
        id,
        business_name: None,
        description: None,
        license_number: None,
        years_experience: 0,
        service_area: Vec::new(),
        website: None,
        phone: None,
        insurance_verified: false,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let found = state.users.iter().find(|u| {
            if let Some(id) = user_id {
                u.id == id
            } else if let Some(email) = email {
                u.email.eq_ignore_ascii_case(email)
            } else if let Some(token) = token {
                u.verification_token.as_deref() == Some(token)
            } else {
                false
            }
        });
        Ok(found.cloned())
    }

    async fn save_user(
        &self,
        full_name: Option<&str>,
        email: &str,
        password: &str,
        role: UserRole,
        verification_token: &str,
        token_expires_at: DateTime<Utc>,
    ) -> Result<User, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: full_name.map(str::to_string),
            avatar_url: None,
            role,
            password: password.to_string(),
            verified: false,
            verification_token: Some(verification_token.to_string()),
            token_expires_at: Some(token_expires_at),
            created_at: now,
            updated_at: now,
        };
        if role == UserRole::Contractor {
            state.profiles.push(empty_profile(user.id, now));
        }
        state.users.push(user.clone());
        Ok(user)
    }

    async fn verify_email_token(&self, token: &str) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state
            .users
            .iter_mut()
            .find(|u| u.verification_token.as_deref() == Some(token))
        {
            user.verified = true;
            user.verification_token = None;
            user.token_expires_at = None;
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
        email: &str,
    ) -> Result<User, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        user.full_name = full_name.map(str::to_string);
        user.avatar_url = avatar_url.map(str::to_string);
        user.email = email.to_string();
        user.updated_at = now;
        Ok(user.clone())
    }
}

#[async_trait]
impl JobExt for MemoryStore {
    async fn create_job(
        &self,
        customer_id: Uuid,
        service_id: Uuid,
        title: &str,
        description: &str,
        budget_min: Option<BigDecimal>,
        budget_max: Option<BigDecimal>,
        location: Option<&str>,
    ) -> Result<Job, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let job = Job {
            id: Uuid::new_v4(),
            customer_id,
            service_id,
            title: title.to_string(),
            description: description.to_string(),
            budget_min,
            budget_max,
            location: location.map(str::to_string),
            status: JobStatus::Open,
            created_at: now,
            updated_at: now,
        };
        state.jobs.push(job.clone());
        Ok(job)
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, sqlx::Error> {
        Ok(self.job(job_id))
    }

    async fn get_job_listing(&self, job_id: Uuid) -> Result<Option<JobListing>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .jobs
            .iter()
            .find(|j| j.id == job_id)
            .map(|j| state.job_listing(j)))
    }

    async fn get_job_listings(&self) -> Result<Vec<JobListing>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut listings: Vec<JobListing> = state.jobs.iter().map(|j| state.job_listing(j)).collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    async fn get_customer_jobs(&self, customer_id: Uuid) -> Result<Vec<JobListing>, sqlx::Error> {
        Ok(self
            .get_job_listings()
            .await?
            .into_iter()
            .filter(|j| j.customer_id == customer_id)
            .collect())
    }

    async fn get_contractor_active_jobs(
        &self,
        contractor_id: Uuid,
    ) -> Result<Vec<JobListing>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut listings: Vec<JobListing> = state
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::InProgress)
            .filter(|j| {
                state.bids.iter().any(|b| {
                    b.job_id == j.id
                        && b.contractor_id == contractor_id
                        && b.status == BidStatus::Accepted
                })
            })
            .map(|j| state.job_listing(j))
            .collect();
        listings.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(listings)
    }

    async fn update_job_status(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id && j.status == from);
        Ok(job.map(|job| {
            job.status = to;
            job.updated_at = now;
            job.clone()
        }))
    }
}

#[async_trait]
impl BidExt for MemoryStore {
    async fn create_bid(
        &self,
        job_id: Uuid,
        contractor_id: Uuid,
        amount: BigDecimal,
        proposal: Option<&str>,
    ) -> Result<Bid, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let bid = Bid {
            id: Uuid::new_v4(),
            job_id,
            contractor_id,
            amount,
            proposal: proposal.map(str::to_string),
            status: BidStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.bids.push(bid.clone());
        Ok(bid)
    }

    async fn get_bid_by_id(&self, bid_id: Uuid) -> Result<Option<Bid>, sqlx::Error> {
        Ok(self.bid(bid_id))
    }

    async fn get_job_bids(&self, job_id: Uuid) -> Result<Vec<BidListing>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut bids: Vec<BidListing> = state
            .bids
            .iter()
            .filter(|b| b.job_id == job_id)
            .map(|b| state.bid_listing(b))
            .collect();
        bids.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bids)
    }

    async fn get_contractor_recent_bids(
        &self,
        contractor_id: Uuid,
        limit: i64,
    ) -> Result<Vec<BidListing>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut bids: Vec<BidListing> = state
            .bids
            .iter()
            .filter(|b| b.contractor_id == contractor_id)
            .map(|b| state.bid_listing(b))
            .collect();
        bids.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        bids.truncate(limit.max(0) as usize);
        Ok(bids)
    }

    async fn has_bid_on_job(&self, job_id: Uuid, contractor_id: Uuid) -> Result<bool, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .bids
            .iter()
            .any(|b| b.job_id == job_id && b.contractor_id == contractor_id))
    }

    async fn accept_bid(&self, job_id: Uuid, bid_id: Uuid) -> Result<BidDecision, sqlx::Error> {
        // Holding the lock for the whole decision stands in for the row locks.
        let mut state = self.state.lock().unwrap();
        let job = state.jobs.iter().find(|j| j.id == job_id).cloned();
        let bid = state.bids.iter().find(|b| b.id == bid_id).cloned();
        let accepted_bid = state
            .bids
            .iter()
            .find(|b| b.job_id == job_id && b.status == BidStatus::Accepted && b.id != bid_id)
            .map(|b| b.id);

        if let Some(decision) = BidDecision::check_acceptance(job.as_ref(), bid.as_ref(), accepted_bid) {
            return Ok(decision);
        }

        let now = state.tick();
        let bid = state
            .bids
            .iter_mut()
            .find(|b| b.id == bid_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        bid.status = BidStatus::Accepted;
        bid.updated_at = now;
        let bid = bid.clone();

        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        job.status = JobStatus::InProgress;
        job.updated_at = now;
        let job = job.clone();

        Ok(BidDecision::Applied { job, bid })
    }

    async fn reject_bid(&self, bid_id: Uuid) -> Result<BidDecision, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let bid = state.bids.iter().find(|b| b.id == bid_id).cloned();
        let job = bid
            .as_ref()
            .and_then(|b| state.jobs.iter().find(|j| j.id == b.job_id).cloned());

        if let Some(decision) = BidDecision::check_rejection(job.as_ref(), bid.as_ref()) {
            return Ok(decision);
        }

        let now = state.tick();
        let bid = state
            .bids
            .iter_mut()
            .find(|b| b.id == bid_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        bid.status = BidStatus::Rejected;
        bid.updated_at = now;
        let bid = bid.clone();

        match job {
            Some(job) => Ok(BidDecision::Applied { job, bid }),
            None => Ok(BidDecision::JobNotFound),
        }
    }

    async fn has_accepted_bid_between(
        &self,
        customer_id: Uuid,
        contractor_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.bids.iter().any(|b| {
            b.contractor_id == contractor_id
                && b.status == BidStatus::Accepted
                && state
                    .jobs
                    .iter()
                    .any(|j| j.id == b.job_id && j.customer_id == customer_id)
        }))
    }
}

#[async_trait]
impl AppointmentExt for MemoryStore {
    async fn create_appointment(
        &self,
        customer_id: Uuid,
        contractor_id: Uuid,
        scheduled_at: DateTime<Utc>,
        duration: &str,
        notes: Option<&str>,
    ) -> Result<Appointment, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            customer_id,
            contractor_id,
            scheduled_at,
            duration: Some(duration.to_string()),
            notes: notes.map(str::to_string),
            status: AppointmentStatus::Scheduled,
            created_at: now,
            updated_at: now,
        };
        state.appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn get_appointment_by_id(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .appointments
            .iter()
            .find(|a| a.id == appointment_id)
            .cloned())
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let appointment = state
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment_id && a.status == from);
        Ok(appointment.map(|a| {
            a.status = to;
            a.updated_at = now;
            a.clone()
        }))
    }

    async fn get_user_appointments(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AppointmentDetails>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut appointments: Vec<AppointmentDetails> = state
            .appointments
            .iter()
            .filter(|a| a.involves(user_id))
            .map(|a| state.appointment_details(a))
            .collect();
        appointments.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at));
        Ok(appointments)
    }

    async fn get_upcoming_appointments(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<AppointmentDetails>, sqlx::Error> {
        let mut appointments = self.get_user_appointments(user_id).await?;
        appointments.retain(|a| a.status == AppointmentStatus::Scheduled && a.scheduled_at >= from);
        if let Some(limit) = limit {
            appointments.truncate(limit.max(0) as usize);
        }
        Ok(appointments)
    }
}

#[async_trait]
impl ContractorExt for MemoryStore {
    async fn get_contractor_profile(
        &self,
        contractor_id: Uuid,
    ) -> Result<Option<ContractorProfile>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.profiles.iter().find(|p| p.id == contractor_id).cloned())
    }

    async fn upsert_contractor_profile(
        &self,
        contractor_id: Uuid,
        update: &ContractorProfileUpdate,
        service_ids: &[Uuid],
    ) -> Result<ContractorProfile, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        if !state.profiles.iter().any(|p| p.id == contractor_id) {
            state.profiles.push(empty_profile(contractor_id, now));
        }
        let profile = state
            .profiles
            .iter_mut()
            .find(|p| p.id == contractor_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        profile.business_name = update.business_name.clone();
        profile.description = update.description.clone();
        profile.license_number = update.license_number.clone();
        profile.years_experience = update.years_experience;
        profile.service_area = update.service_area.clone();
        profile.website = update.website.clone();
        profile.phone = update.phone.clone();
        profile.updated_at = now;
        let profile = profile.clone();

        state.contractor_services.retain(|(c, _)| *c != contractor_id);
        state
            .contractor_services
            .extend(service_ids.iter().map(|s| (contractor_id, *s)));

        Ok(profile)
    }

    async fn get_verified_contractors(&self) -> Result<Vec<ContractorListing>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut services_by_id: HashMap<Uuid, &CatalogService> = HashMap::new();
        for service in &state.services {
            services_by_id.insert(service.id, service);
        }

        let listings = state
            .profiles
            .iter()
            .filter(|p| p.insurance_verified)
            .map(|p| {
                let owner = state.users.iter().find(|u| u.id == p.id);
                let services = state
                    .contractor_services
                    .iter()
                    .filter(|(c, _)| *c == p.id)
                    .filter_map(|(_, s)| services_by_id.get(s))
                    .map(|s| ServiceSummary { id: s.id, name: s.name.clone() })
                    .collect();
                ContractorListing {
                    id: p.id,
                    business_name: p.business_name.clone(),
                    description: p.description.clone(),
                    years_experience: p.years_experience,
                    service_area: p.service_area.clone(),
                    website: p.website.clone(),
                    phone: p.phone.clone(),
                    insurance_verified: p.insurance_verified,
                    full_name: owner.and_then(|u| u.full_name.clone()),
                    avatar_url: owner.and_then(|u| u.avatar_url.clone()),
                    services,
                }
            })
            .collect();
        Ok(listings)
    }

    async fn get_contractor_service_ids(&self, contractor_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .contractor_services
            .iter()
            .filter(|(c, _)| *c == contractor_id)
            .map(|(_, s)| *s)
            .collect())
    }
}

#[async_trait]
impl ReviewExt for MemoryStore {
    async fn get_all_reviews(&self) -> Result<Vec<ReviewWithAuthor>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut reviews: Vec<ReviewWithAuthor> =
            state.reviews.iter().map(|r| state.review_with_author(r)).collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn get_contractor_reviews(
        &self,
        contractor_id: Uuid,
    ) -> Result<Vec<ReviewWithAuthor>, sqlx::Error> {
        Ok(self
            .get_all_reviews()
            .await?
            .into_iter()
            .filter(|r| r.contractor_id == contractor_id)
            .collect())
    }

    async fn create_review(
        &self,
        customer_id: Uuid,
        contractor_id: Uuid,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Review, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let review = Review {
            id: Uuid::new_v4(),
            customer_id,
            contractor_id,
            rating,
            comment: comment.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        state.reviews.push(review.clone());
        Ok(review)
    }
}

#[async_trait]
impl CatalogExt for MemoryStore {
    async fn get_services(&self) -> Result<Vec<CatalogService>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut services = state.services.clone();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }

    async fn get_service(&self, service_id: Uuid) -> Result<Option<CatalogService>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.services.iter().find(|s| s.id == service_id).cloned())
    }
}

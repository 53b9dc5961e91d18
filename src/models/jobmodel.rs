use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Open => "open",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<JobStatus> {
        match value.trim() {
            "open" => Some(JobStatus::Open),
            "in_progress" => Some(JobStatus::InProgress),
            "completed" => Some(JobStatus::Completed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }

    /// Status only moves forward: open -> in_progress -> {completed, cancelled}.
    /// An open job may also be withdrawn straight to cancelled.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Open, JobStatus::InProgress)
                | (JobStatus::Open, JobStatus::Cancelled)
                | (JobStatus::InProgress, JobStatus::Completed)
                | (JobStatus::InProgress, JobStatus::Cancelled)
        )
    }

    pub fn accepts_bids(self) -> bool {
        self == JobStatus::Open
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "bid_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Pending,
    Accepted,
    Rejected,
}

impl BidStatus {
    pub fn to_str(&self) -> &str {
        match self {
            BidStatus::Pending => "pending",
            BidStatus::Accepted => "accepted",
            BidStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(self, next: BidStatus) -> bool {
        matches!(
            (self, next),
            (BidStatus::Pending, BidStatus::Accepted) | (BidStatus::Pending, BidStatus::Rejected)
        )
    }
}

/// Catalogue entry a job is posted under and a contractor can offer.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct CatalogService {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub title: String,
    pub description: String,
    pub budget_min: Option<BigDecimal>,
    pub budget_max: Option<BigDecimal>,
    pub location: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A job joined with its poster's name and its service name.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobListing {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub service_id: Uuid,
    pub service_name: String,
    pub title: String,
    pub description: String,
    pub budget_min: Option<BigDecimal>,
    pub budget_max: Option<BigDecimal>,
    pub location: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: Uuid,
    pub job_id: Uuid,
    pub contractor_id: Uuid,
    pub amount: BigDecimal,
    pub proposal: Option<String>,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bid joined with the bidding contractor's names and the job title.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BidListing {
    pub id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub contractor_id: Uuid,
    pub business_name: Option<String>,
    pub contractor_name: Option<String>,
    pub amount: BigDecimal,
    pub proposal: Option<String>,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of an accept/reject attempt, decided while the job row is locked.
#[derive(Debug, Clone)]
pub enum BidDecision {
    Applied { job: Job, bid: Bid },
    JobNotFound,
    BidNotFound,
    BidJobMismatch,
    JobNotOpen(JobStatus),
    BidNotPending(BidStatus),
    AlreadyAccepted(Uuid),
}

impl BidDecision {
    /// Guard for pending -> accepted. `accepted_bid` is any other bid on the
    /// job that already holds accepted status.
    pub fn check_acceptance(
        job: Option<&Job>,
        bid: Option<&Bid>,
        accepted_bid: Option<Uuid>,
    ) -> Option<BidDecision> {
        let job = match job {
            Some(job) => job,
            None => return Some(BidDecision::JobNotFound),
        };
        if !job.status.accepts_bids() {
            return Some(BidDecision::JobNotOpen(job.status));
        }
        let bid = match bid {
            Some(bid) => bid,
            None => return Some(BidDecision::BidNotFound),
        };
        if bid.job_id != job.id {
            return Some(BidDecision::BidJobMismatch);
        }
        if !bid.status.can_transition_to(BidStatus::Accepted) {
            return Some(BidDecision::BidNotPending(bid.status));
        }
        if let Some(other) = accepted_bid {
            return Some(BidDecision::AlreadyAccepted(other));
        }
        None
    }

    /// Guard for pending -> rejected. Rejection is only possible while the
    /// parent job is still open.
    pub fn check_rejection(job: Option<&Job>, bid: Option<&Bid>) -> Option<BidDecision> {
        let bid = match bid {
            Some(bid) => bid,
            None => return Some(BidDecision::BidNotFound),
        };
        let job = match job {
            Some(job) => job,
            None => return Some(BidDecision::JobNotFound),
        };
        if bid.job_id != job.id {
            return Some(BidDecision::BidJobMismatch);
        }
        if !job.status.accepts_bids() {
            return Some(BidDecision::JobNotOpen(job.status));
        }
        if !bid.status.can_transition_to(BidStatus::Rejected) {
            return Some(BidDecision::BidNotPending(bid.status));
        }
        None
    }
}

use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::HttpError,
    models::{appointmentmodel::AppointmentStatus, jobmodel::*},
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Bid {0} not found")]
    BidNotFound(Uuid),

    #[error("Appointment {0} not found")]
    AppointmentNotFound(Uuid),

    #[error("Contractor {0} not found")]
    ContractorNotFound(Uuid),

    #[error("Service {0} not found")]
    ServiceNotFound(Uuid),

    #[error("Job {job_id} cannot move from {from:?} to {to:?}")]
    InvalidJobTransition { job_id: Uuid, from: JobStatus, to: JobStatus },

    #[error("Bid {bid_id} cannot move from {from:?} to {to:?}")]
    InvalidBidTransition { bid_id: Uuid, from: BidStatus, to: BidStatus },

    #[error("Appointment {appointment_id} cannot move from {from:?} to {to:?}")]
    InvalidAppointmentTransition {
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Job {0} is no longer open (status {1:?})")]
    JobNotOpen(Uuid, JobStatus),

    #[error("Bid {0} does not belong to job {1}")]
    BidJobMismatch(Uuid, Uuid),

    #[error("Job {0} already has an accepted bid ({1})")]
    BidAlreadyAccepted(Uuid, Uuid),

    #[error("Customer {customer_id} has no accepted bid from contractor {contractor_id}")]
    NoAcceptedBid { customer_id: Uuid, contractor_id: Uuid },

    #[error("User {0} is not authorized to perform this action on job {1}")]
    UnauthorizedJobAccess(Uuid, Uuid),

    #[error("User {0} is not authorized to perform this action on appointment {1}")]
    UnauthorizedAppointmentAccess(Uuid, Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::JobNotFound(_)
            | ServiceError::BidNotFound(_)
            | ServiceError::AppointmentNotFound(_)
            | ServiceError::ContractorNotFound(_)
            | ServiceError::ServiceNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidJobTransition { .. }
            | ServiceError::InvalidBidTransition { .. }
            | ServiceError::InvalidAppointmentTransition { .. }
            | ServiceError::JobNotOpen(_, _)
            | ServiceError::BidJobMismatch(_, _)
            | ServiceError::BidAlreadyAccepted(_, _)
            | ServiceError::NoAcceptedBid { .. } => StatusCode::CONFLICT,

            ServiceError::UnauthorizedJobAccess(_, _)
            | ServiceError::UnauthorizedAppointmentAccess(_, _) => StatusCode::FORBIDDEN,

            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Conflicting state changes: terminal or ineligible source status.
    pub fn is_invalid_transition(&self) -> bool {
        self.status_code() == StatusCode::CONFLICT
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        if let ServiceError::Database(ref e) = error {
            tracing::error!("Database operation failed: {}", e);
        } else if error.is_invalid_transition() {
            tracing::warn!("Rejected state change: {}", error);
        }
        HttpError::new(error.to_string(), status)
    }
}

impl ServiceError {
    /// Translate a guard outcome that did not apply into the matching error.
    pub fn from_bid_decision(decision: BidDecision, job_id: Uuid, bid_id: Uuid, target: BidStatus) -> Self {
        match decision {
            BidDecision::JobNotFound => ServiceError::JobNotFound(job_id),
            BidDecision::BidNotFound => ServiceError::BidNotFound(bid_id),
            BidDecision::BidJobMismatch => ServiceError::BidJobMismatch(bid_id, job_id),
            BidDecision::JobNotOpen(status) => ServiceError::JobNotOpen(job_id, status),
            BidDecision::BidNotPending(from) => ServiceError::InvalidBidTransition { bid_id, from, to: target },
            BidDecision::AlreadyAccepted(other) => ServiceError::BidAlreadyAccepted(job_id, other),
            BidDecision::Applied { bid, .. } => ServiceError::InvalidBidTransition {
                bid_id,
                from: bid.status,
                to: target,
            },
        }
    }
}

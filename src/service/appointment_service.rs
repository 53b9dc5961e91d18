// service/appointment_service.rs
use std::sync::Arc;

use chrono::{DateTime, Days, Utc};
use uuid::Uuid;

use crate::{
    db::{appointmentdb::AppointmentExt, biddb::BidExt, userdb::UserExt, MarketplaceStore},
    dtos::appointmentdtos::CreateAppointmentDto,
    models::{appointmentmodel::*, usermodel::UserRole},
    service::error::ServiceError,
};

pub const DEFAULT_DURATION: &str = "1 hour";

/// Earliest bookable instant: midnight UTC, `min_lead_days` after today.
/// Independently of the lead time, the slot must lie strictly in the future.
#[derive(Debug, Clone, Copy)]
pub struct SchedulingPolicy {
    pub min_lead_days: u64,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self { min_lead_days: 1 }
    }
}

impl SchedulingPolicy {
    pub fn new(min_lead_days: u64) -> Self {
        Self { min_lead_days }
    }

    pub fn earliest_allowed(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let day = now
            .date_naive()
            .checked_add_days(Days::new(self.min_lead_days))
            .unwrap_or(now.date_naive());
        day.and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .unwrap_or(now)
    }

    pub fn check(&self, scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ServiceError> {
        if scheduled_at <= now {
            return Err(ServiceError::Validation(
                "Appointment time must be in the future".to_string(),
            ));
        }
        let earliest = self.earliest_allowed(now);
        if scheduled_at < earliest {
            return Err(ServiceError::Validation(format!(
                "Appointments can be booked from {} onwards",
                earliest.format("%Y-%m-%d")
            )));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct AppointmentService {
    store: Arc<dyn MarketplaceStore>,
    policy: SchedulingPolicy,
}

impl AppointmentService {
    pub fn new(store: Arc<dyn MarketplaceStore>, policy: SchedulingPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn schedule(
        &self,
        customer_id: Uuid,
        appointment_data: CreateAppointmentDto,
    ) -> Result<Appointment, ServiceError> {
        self.schedule_at(customer_id, appointment_data, Utc::now()).await
    }

    /// `schedule` with an explicit clock.
    pub async fn schedule_at(
        &self,
        customer_id: Uuid,
        appointment_data: CreateAppointmentDto,
        now: DateTime<Utc>,
    ) -> Result<Appointment, ServiceError> {
        self.policy.check(appointment_data.scheduled_at, now)?;

        let contractor_id = appointment_data.contractor_id;
        let contractor = self
            .store
            .get_user(Some(contractor_id), None, None)
            .await?
            .filter(|user| user.role == UserRole::Contractor)
            .ok_or(ServiceError::ContractorNotFound(contractor_id))?;

        if !self
            .store
            .has_accepted_bid_between(customer_id, contractor.id)
            .await?
        {
            return Err(ServiceError::NoAcceptedBid {
                customer_id,
                contractor_id,
            });
        }

        let duration = appointment_data
            .duration
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DURATION);
        let notes = appointment_data
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let appointment = self
            .store
            .create_appointment(
                customer_id,
                contractor_id,
                appointment_data.scheduled_at,
                duration,
                notes,
            )
            .await?;

        tracing::info!(
            "Appointment {} scheduled between customer {} and contractor {} at {}",
            appointment.id,
            customer_id,
            contractor_id,
            appointment.scheduled_at
        );
        Ok(appointment)
    }

    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        user_id: Uuid,
        to: AppointmentStatus,
    ) -> Result<Appointment, ServiceError> {
        let appointment = self
            .store
            .get_appointment_by_id(appointment_id)
            .await?
            .ok_or(ServiceError::AppointmentNotFound(appointment_id))?;

        if !appointment.involves(user_id) {
            return Err(ServiceError::UnauthorizedAppointmentAccess(user_id, appointment_id));
        }

        if !appointment.status.can_transition_to(to) {
            return Err(ServiceError::InvalidAppointmentTransition {
                appointment_id,
                from: appointment.status,
                to,
            });
        }

        let updated = self
            .store
            .update_appointment_status(appointment_id, appointment.status, to)
            .await?
            .ok_or(ServiceError::InvalidAppointmentTransition {
                appointment_id,
                from: appointment.status,
                to,
            })?;

        tracing::info!(
            "Appointment {} moved from {} to {}",
            appointment_id,
            appointment.status.to_str(),
            to.to_str()
        );
        Ok(updated)
    }

    pub async fn list_for(&self, user_id: Uuid) -> Result<Vec<AppointmentDetails>, ServiceError> {
        Ok(self.store.get_user_appointments(user_id).await?)
    }

    pub async fn upcoming(&self, user_id: Uuid, limit: Option<i64>) -> Result<Vec<AppointmentDetails>, ServiceError> {
        Ok(self
            .store
            .get_upcoming_appointments(user_id, Utc::now(), limit)
            .await?)
    }
}

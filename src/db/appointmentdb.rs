// db/appointmentdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::appointmentmodel::{Appointment, AppointmentDetails, AppointmentStatus};

const APPOINTMENT_DETAILS_SELECT: &str = r#"
    SELECT a.id, a.customer_id, cu.full_name AS customer_name,
           a.contractor_id, cp.business_name AS contractor_business_name,
           co.full_name AS contractor_name,
           a.scheduled_at, a.duration, a.notes, a.status, a.created_at, a.updated_at
    FROM appointments a
    JOIN users cu ON cu.id = a.customer_id
    JOIN users co ON co.id = a.contractor_id
    LEFT JOIN contractor_profiles cp ON cp.id = a.contractor_id
"#;

#[async_trait]
pub trait AppointmentExt {
    async fn create_appointment(
        &self,
        customer_id: Uuid,
        contractor_id: Uuid,
        scheduled_at: DateTime<Utc>,
        duration: &str,
        notes: Option<&str>,
    ) -> Result<Appointment, sqlx::Error>;

    async fn get_appointment_by_id(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, sqlx::Error>;

    /// Applies only while the appointment is still in `from`.
    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, sqlx::Error>;

    /// Appointments where the user is either party, earliest first.
    async fn get_user_appointments(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AppointmentDetails>, sqlx::Error>;

    /// Scheduled appointments at or after `from`, earliest first.
    /// `limit: None` returns all of them.
    async fn get_upcoming_appointments(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<AppointmentDetails>, sqlx::Error>;
}

#[async_trait]
impl AppointmentExt for DBClient {
    async fn create_appointment(
        &self,
        customer_id: Uuid,
        contractor_id: Uuid,
        scheduled_at: DateTime<Utc>,
        duration: &str,
        notes: Option<&str>,
    ) -> Result<Appointment, sqlx::Error> {
        sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (customer_id, contractor_id, scheduled_at, duration, notes, status)
            VALUES ($1, $2, $3, $4, $5, 'scheduled'::appointment_status)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(contractor_id)
        .bind(scheduled_at)
        .bind(duration)
        .bind(notes)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_appointment_by_id(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        sqlx::query_as::<_, Appointment>(r#"SELECT * FROM appointments WHERE id = $1"#)
            .bind(appointment_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(appointment_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_appointments(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AppointmentDetails>, sqlx::Error> {
        let query = format!(
            "{} WHERE a.customer_id = $1 OR a.contractor_id = $1 ORDER BY a.scheduled_at ASC",
            APPOINTMENT_DETAILS_SELECT
        );
        sqlx::query_as::<_, AppointmentDetails>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_upcoming_appointments(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<AppointmentDetails>, sqlx::Error> {
        let query = format!(
            r#"{}
            WHERE (a.customer_id = $1 OR a.contractor_id = $1)
              AND a.status = 'scheduled'::appointment_status
              AND a.scheduled_at >= $2
            ORDER BY a.scheduled_at ASC
            LIMIT $3"#,
            APPOINTMENT_DETAILS_SELECT
        );
        sqlx::query_as::<_, AppointmentDetails>(&query)
            .bind(user_id)
            .bind(from)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }
}

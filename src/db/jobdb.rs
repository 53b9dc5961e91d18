// db/jobdb.rs
use async_trait::async_trait;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::jobmodel::{Job, JobListing, JobStatus};

/// Jobs with the poster's name and the service name joined in.
const JOB_LISTING_SELECT: &str = r#"
    SELECT j.id, j.customer_id, u.full_name AS customer_name,
           j.service_id, s.name AS service_name,
           j.title, j.description, j.budget_min, j.budget_max, j.location,
           j.status, j.created_at, j.updated_at
    FROM jobs j
    JOIN services s ON s.id = j.service_id
    JOIN users u ON u.id = j.customer_id
"#;

#[async_trait]
pub trait JobExt {
    async fn create_job(
        &self,
        customer_id: Uuid,
        service_id: Uuid,
        title: &str,
        description: &str,
        budget_min: Option<BigDecimal>,
        budget_max: Option<BigDecimal>,
        location: Option<&str>,
    ) -> Result<Job, sqlx::Error>;

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, sqlx::Error>;

    async fn get_job_listing(&self, job_id: Uuid) -> Result<Option<JobListing>, sqlx::Error>;

    /// All jobs, newest first.
    async fn get_job_listings(&self) -> Result<Vec<JobListing>, sqlx::Error>;

    async fn get_customer_jobs(&self, customer_id: Uuid) -> Result<Vec<JobListing>, sqlx::Error>;

    /// In-progress jobs where the contractor holds the accepted bid.
    async fn get_contractor_active_jobs(
        &self,
        contractor_id: Uuid,
    ) -> Result<Vec<JobListing>, sqlx::Error>;

    /// Conditional update: only applies while the job is still in `from`.
    /// `None` means the row was missing or had already moved.
    async fn update_job_status(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, sqlx::Error>;
}

#[async_trait]
impl JobExt for DBClient {
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
        sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (customer_id, service_id, title, description, budget_min, budget_max, location, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'open'::job_status)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(service_id)
        .bind(title)
        .bind(description)
        .bind(budget_min)
        .bind(budget_max)
        .bind(location)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(r#"SELECT * FROM jobs WHERE id = $1"#)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_job_listing(&self, job_id: Uuid) -> Result<Option<JobListing>, sqlx::Error> {
        let query = format!("{} WHERE j.id = $1", JOB_LISTING_SELECT);
        sqlx::query_as::<_, JobListing>(&query)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_job_listings(&self) -> Result<Vec<JobListing>, sqlx::Error> {
        let query = format!("{} ORDER BY j.created_at DESC", JOB_LISTING_SELECT);
        sqlx::query_as::<_, JobListing>(&query)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_customer_jobs(&self, customer_id: Uuid) -> Result<Vec<JobListing>, sqlx::Error> {
        let query = format!(
            "{} WHERE j.customer_id = $1 ORDER BY j.created_at DESC",
            JOB_LISTING_SELECT
        );
        sqlx::query_as::<_, JobListing>(&query)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_contractor_active_jobs(
        &self,
        contractor_id: Uuid,
    ) -> Result<Vec<JobListing>, sqlx::Error> {
        let query = format!(
            r#"{}
            JOIN bids b ON b.job_id = j.id
            WHERE b.contractor_id = $1
              AND b.status = 'accepted'::bid_status
              AND j.status = 'in_progress'::job_status
            ORDER BY j.updated_at DESC"#,
            JOB_LISTING_SELECT
        );
        sqlx::query_as::<_, JobListing>(&query)
            .bind(contractor_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn update_job_status(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    async fn seed_customer(pool: &PgPool) -> (Uuid, Uuid) {
        let customer_id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO users (email, password) VALUES ('budget@customer.test', 'x') RETURNING id"#,
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let service_id: Uuid = sqlx::query_scalar(r#"SELECT id FROM services LIMIT 1"#)
            .fetch_one(pool)
            .await
            .unwrap();
        (customer_id, service_id)
    }

    fn is_check_violation(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23514"))
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn test_budget_constraints(pool: PgPool) {
        let db = DBClient::new(pool.clone());
        let (customer_id, service_id) = seed_customer(&pool).await;

        let create = |min: Option<i64>, max: Option<i64>| {
            db.create_job(
                customer_id,
                service_id,
                "Fence repair",
                "Two panels down",
                min.map(BigDecimal::from),
                max.map(BigDecimal::from),
                None,
            )
        };

        assert!(create(Some(100), Some(500)).await.is_ok());
        assert!(create(None, Some(0)).await.is_ok());

        let negative = create(Some(-1), None).await.unwrap_err();
        assert!(is_check_violation(&negative));

        let inverted = create(Some(500), Some(100)).await.unwrap_err();
        assert!(is_check_violation(&inverted));
    }
}

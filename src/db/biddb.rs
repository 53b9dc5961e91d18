// db/biddb.rs
use async_trait::async_trait;
use sqlx::{types::BigDecimal, Postgres, Transaction};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::jobmodel::{Bid, BidDecision, BidListing, BidStatus, Job, JobStatus};

/// Bids with the job title and the bidding contractor's names joined in.
const BID_LISTING_SELECT: &str = r#"
    SELECT b.id, b.job_id, j.title AS job_title,
           b.contractor_id, cp.business_name, u.full_name AS contractor_name,
           b.amount, b.proposal, b.status, b.created_at, b.updated_at
    FROM bids b
    JOIN jobs j ON j.id = b.job_id
    JOIN users u ON u.id = b.contractor_id
    LEFT JOIN contractor_profiles cp ON cp.id = b.contractor_id
"#;

#[async_trait]
pub trait BidExt {
    async fn create_bid(
        &self,
        job_id: Uuid,
        contractor_id: Uuid,
        amount: BigDecimal,
        proposal: Option<&str>,
    ) -> Result<Bid, sqlx::Error>;

    async fn get_bid_by_id(&self, bid_id: Uuid) -> Result<Option<Bid>, sqlx::Error>;

    /// Newest first.
    async fn get_job_bids(&self, job_id: Uuid) -> Result<Vec<BidListing>, sqlx::Error>;

    async fn get_contractor_recent_bids(
        &self,
        contractor_id: Uuid,
        limit: i64,
    ) -> Result<Vec<BidListing>, sqlx::Error>;

    async fn has_bid_on_job(&self, job_id: Uuid, contractor_id: Uuid) -> Result<bool, sqlx::Error>;

    /// Accepts the bid and moves the job to in_progress in one transaction.
    /// Anything but `BidDecision::Applied` leaves both rows untouched.
    async fn accept_bid(&self, job_id: Uuid, bid_id: Uuid) -> Result<BidDecision, sqlx::Error>;

    async fn reject_bid(&self, bid_id: Uuid) -> Result<BidDecision, sqlx::Error>;

    /// True when a job of `customer_id` has an accepted bid from `contractor_id`.
    async fn has_accepted_bid_between(
        &self,
        customer_id: Uuid,
        contractor_id: Uuid,
    ) -> Result<bool, sqlx::Error>;
}

/// Row locks for a bid decision, always job first and bid second so that
/// accept and reject on the same job queue up instead of deadlocking.
async fn lock_job_then_bid(
    tx: &mut Transaction<'_, Postgres>,
    job_id: Uuid,
    bid_id: Uuid,
) -> Result<(Option<Job>, Option<Bid>), sqlx::Error> {
    let job = sqlx::query_as::<_, Job>(r#"SELECT * FROM jobs WHERE id = $1 FOR UPDATE"#)
        .bind(job_id)
        .fetch_optional(&mut **tx)
        .await?;

    let bid = sqlx::query_as::<_, Bid>(r#"SELECT * FROM bids WHERE id = $1 FOR UPDATE"#)
        .bind(bid_id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok((job, bid))
}

#[async_trait]
impl BidExt for DBClient {
    async fn create_bid(
        &self,
        job_id: Uuid,
        contractor_id: Uuid,
        amount: BigDecimal,
        proposal: Option<&str>,
    ) -> Result<Bid, sqlx::Error> {
        sqlx::query_as::<_, Bid>(
            r#"
            INSERT INTO bids (job_id, contractor_id, amount, proposal, status)
            VALUES ($1, $2, $3, $4, 'pending'::bid_status)
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(contractor_id)
        .bind(amount)
        .bind(proposal)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_bid_by_id(&self, bid_id: Uuid) -> Result<Option<Bid>, sqlx::Error> {
        sqlx::query_as::<_, Bid>(r#"SELECT * FROM bids WHERE id = $1"#)
            .bind(bid_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_job_bids(&self, job_id: Uuid) -> Result<Vec<BidListing>, sqlx::Error> {
        let query = format!("{} WHERE b.job_id = $1 ORDER BY b.created_at DESC", BID_LISTING_SELECT);
        sqlx::query_as::<_, BidListing>(&query)
            .bind(job_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_contractor_recent_bids(
        &self,
        contractor_id: Uuid,
        limit: i64,
    ) -> Result<Vec<BidListing>, sqlx::Error> {
        let query = format!(
            "{} WHERE b.contractor_id = $1 ORDER BY b.created_at DESC LIMIT $2",
            BID_LISTING_SELECT
        );
        sqlx::query_as::<_, BidListing>(&query)
            .bind(contractor_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    async fn has_bid_on_job(&self, job_id: Uuid, contractor_id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM bids WHERE job_id = $1 AND contractor_id = $2)"#,
        )
        .bind(job_id)
        .bind(contractor_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn accept_bid(&self, job_id: Uuid, bid_id: Uuid) -> Result<BidDecision, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Job row lock serialises concurrent accepts on the same job.
        let (job, bid) = lock_job_then_bid(&mut tx, job_id, bid_id).await?;

        let accepted_bid: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM bids
            WHERE job_id = $1 AND status = 'accepted'::bid_status AND id <> $2
            LIMIT 1
            "#,
        )
        .bind(job_id)
        .bind(bid_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(decision) =
            BidDecision::check_acceptance(job.as_ref(), bid.as_ref(), accepted_bid)
        {
            tx.rollback().await?;
            return Ok(decision);
        }

        let bid = sqlx::query_as::<_, Bid>(
            r#"
            UPDATE bids
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(bid_id)
        .bind(BidStatus::Accepted)
        .fetch_one(&mut *tx)
        .await?;

        let job = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(JobStatus::InProgress)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(BidDecision::Applied { job, bid })
    }

    async fn reject_bid(&self, bid_id: Uuid) -> Result<BidDecision, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Unlocked read; a bid never moves between jobs.
        let job_id: Option<Uuid> = sqlx::query_scalar(r#"SELECT job_id FROM bids WHERE id = $1"#)
            .bind(bid_id)
            .fetch_optional(&mut *tx)
            .await?;

        let (job, bid) = match job_id {
            Some(job_id) => lock_job_then_bid(&mut tx, job_id, bid_id).await?,
            None => (None, None),
        };

        if let Some(decision) = BidDecision::check_rejection(job.as_ref(), bid.as_ref()) {
            tx.rollback().await?;
            return Ok(decision);
        }

        let bid = sqlx::query_as::<_, Bid>(
            r#"
            UPDATE bids
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(bid_id)
        .bind(BidStatus::Rejected)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

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
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bids b
                JOIN jobs j ON j.id = b.job_id
                WHERE j.customer_id = $1
                  AND b.contractor_id = $2
                  AND b.status = 'accepted'::bid_status
            )
            "#,
        )
        .bind(customer_id)
        .bind(contractor_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

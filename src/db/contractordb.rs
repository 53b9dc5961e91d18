// db/contractordb.rs
use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::contractormodel::*;

#[async_trait]
pub trait ContractorExt {
    async fn get_contractor_profile(
        &self,
        contractor_id: Uuid,
    ) -> Result<Option<ContractorProfile>, sqlx::Error>;

    /// Upserts the profile and replaces the offered-services set in one transaction.
    async fn upsert_contractor_profile(
        &self,
        contractor_id: Uuid,
        update: &ContractorProfileUpdate,
        service_ids: &[Uuid],
    ) -> Result<ContractorProfile, sqlx::Error>;

    /// Insurance-verified contractors with owner fields and offered services.
    async fn get_verified_contractors(&self) -> Result<Vec<ContractorListing>, sqlx::Error>;

    async fn get_contractor_service_ids(&self, contractor_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error>;
}

#[async_trait]
pub trait ReviewExt {
    /// Newest first.
    async fn get_all_reviews(&self) -> Result<Vec<ReviewWithAuthor>, sqlx::Error>;

    async fn get_contractor_reviews(
        &self,
        contractor_id: Uuid,
    ) -> Result<Vec<ReviewWithAuthor>, sqlx::Error>;

    async fn create_review(
        &self,
        customer_id: Uuid,
        contractor_id: Uuid,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Review, sqlx::Error>;
}

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.customer_id, r.contractor_id, r.rating, r.comment,
           u.full_name AS reviewer_name, r.created_at
    FROM reviews r
    JOIN users u ON u.id = r.customer_id
"#;

#[async_trait]
impl ContractorExt for DBClient {
    async fn get_contractor_profile(
        &self,
        contractor_id: Uuid,
    ) -> Result<Option<ContractorProfile>, sqlx::Error> {
        sqlx::query_as::<_, ContractorProfile>(r#"SELECT * FROM contractor_profiles WHERE id = $1"#)
            .bind(contractor_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn upsert_contractor_profile(
        &self,
        contractor_id: Uuid,
        update: &ContractorProfileUpdate,
        service_ids: &[Uuid],
    ) -> Result<ContractorProfile, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let profile = sqlx::query_as::<_, ContractorProfile>(
            r#"
            INSERT INTO contractor_profiles
                (id, business_name, description, license_number, years_experience, service_area, website, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                business_name = EXCLUDED.business_name,
                description = EXCLUDED.description,
                license_number = EXCLUDED.license_number,
                years_experience = EXCLUDED.years_experience,
                service_area = EXCLUDED.service_area,
                website = EXCLUDED.website,
                phone = EXCLUDED.phone,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(contractor_id)
        .bind(&update.business_name)
        .bind(&update.description)
        .bind(&update.license_number)
        .bind(update.years_experience)
        .bind(&update.service_area)
        .bind(&update.website)
        .bind(&update.phone)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(r#"DELETE FROM contractor_services WHERE contractor_id = $1"#)
            .bind(contractor_id)
            .execute(&mut *tx)
            .await?;

        if !service_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO contractor_services (contractor_id, service_id)
                SELECT $1, UNNEST($2::uuid[])
                "#,
            )
            .bind(contractor_id)
            .bind(service_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(profile)
    }

    async fn get_verified_contractors(&self) -> Result<Vec<ContractorListing>, sqlx::Error> {
        let mut contractors = sqlx::query_as::<_, ContractorListing>(
            r#"
            SELECT cp.id, cp.business_name, cp.description, cp.years_experience,
                   cp.service_area, cp.website, cp.phone, cp.insurance_verified,
                   u.full_name, u.avatar_url
            FROM contractor_profiles cp
            JOIN users u ON u.id = cp.id
            WHERE cp.insurance_verified = true
            ORDER BY cp.business_name ASC NULLS LAST
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        if contractors.is_empty() {
            return Ok(contractors);
        }

        let ids: Vec<Uuid> = contractors.iter().map(|c| c.id).collect();
        let rows = sqlx::query_as::<_, ContractorServiceRow>(
            r#"
            SELECT cs.contractor_id, s.id, s.name
            FROM contractor_services cs
            JOIN services s ON s.id = cs.service_id
            WHERE cs.contractor_id = ANY($1)
            ORDER BY s.name ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_contractor: HashMap<Uuid, Vec<ServiceSummary>> = HashMap::new();
        for row in rows {
            by_contractor
                .entry(row.contractor_id)
                .or_default()
                .push(ServiceSummary { id: row.id, name: row.name });
        }

        for contractor in contractors.iter_mut() {
            contractor.services = by_contractor.remove(&contractor.id).unwrap_or_default();
        }

        Ok(contractors)
    }

    async fn get_contractor_service_ids(&self, contractor_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"SELECT service_id FROM contractor_services WHERE contractor_id = $1"#,
        )
        .bind(contractor_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl ReviewExt for DBClient {
    async fn get_all_reviews(&self) -> Result<Vec<ReviewWithAuthor>, sqlx::Error> {
        let query = format!("{} ORDER BY r.created_at DESC", REVIEW_SELECT);
        sqlx::query_as::<_, ReviewWithAuthor>(&query)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_contractor_reviews(
        &self,
        contractor_id: Uuid,
    ) -> Result<Vec<ReviewWithAuthor>, sqlx::Error> {
        let query = format!(
            "{} WHERE r.contractor_id = $1 ORDER BY r.created_at DESC",
            REVIEW_SELECT
        );
        sqlx::query_as::<_, ReviewWithAuthor>(&query)
            .bind(contractor_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn create_review(
        &self,
        customer_id: Uuid,
        contractor_id: Uuid,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Review, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (customer_id, contractor_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(contractor_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&self.pool)
        .await
    }
}

// db/userdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{User, UserRole};

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    /// Contractors get an empty contractor profile in the same transaction.
    async fn save_user(
        &self,
        full_name: Option<&str>,
        email: &str,
        password: &str,
        role: UserRole,
        verification_token: &str,
        token_expires_at: DateTime<Utc>,
    ) -> Result<User, sqlx::Error>;

    async fn verify_email_token(&self, token: &str) -> Result<(), sqlx::Error>;

    async fn update_profile(
        &self,
        user_id: Uuid,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
        email: &str,
    ) -> Result<User, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE LOWER(email) = LOWER($1)"#)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(token) = token {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE verification_token = $1"#)
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;
        }

        Ok(user)
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
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (full_name, email, password, role, verification_token, token_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(full_name)
        .bind(email)
        .bind(password)
        .bind(role)
        .bind(verification_token)
        .bind(token_expires_at)
        .fetch_one(&mut *tx)
        .await?;

        if role == UserRole::Contractor {
            sqlx::query(r#"INSERT INTO contractor_profiles (id) VALUES ($1)"#)
                .bind(user.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(user)
    }

    async fn verify_email_token(&self, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET verified = true,
                updated_at = NOW(),
                verification_token = NULL,
                token_expires_at = NULL
            WHERE verification_token = $1
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
        email: &str,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = $1, avatar_url = $2, email = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(full_name)
        .bind(avatar_url)
        .bind(email)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

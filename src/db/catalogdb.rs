// db/catalogdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::jobmodel::CatalogService;

#[async_trait]
pub trait CatalogExt {
    async fn get_services(&self) -> Result<Vec<CatalogService>, sqlx::Error>;

    async fn get_service(&self, service_id: Uuid) -> Result<Option<CatalogService>, sqlx::Error>;
}

#[async_trait]
impl CatalogExt for DBClient {
    async fn get_services(&self) -> Result<Vec<CatalogService>, sqlx::Error> {
        sqlx::query_as::<_, CatalogService>(r#"SELECT * FROM services ORDER BY name ASC"#)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_service(&self, service_id: Uuid) -> Result<Option<CatalogService>, sqlx::Error> {
        sqlx::query_as::<_, CatalogService>(r#"SELECT * FROM services WHERE id = $1"#)
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await
    }
}

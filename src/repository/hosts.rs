//! Hosts repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::Host,
};

#[derive(Clone)]
pub struct HostsRepository {
    pool: Pool<Postgres>,
}

impl HostsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all hosts, alphabetically
    pub async fn list(&self) -> AppResult<Vec<Host>> {
        let hosts = sqlx::query_as::<_, Host>("SELECT * FROM hosts ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(hosts)
    }

    /// Get host by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Host> {
        sqlx::query_as::<_, Host>("SELECT * FROM hosts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Host with id {} not found", id)))
    }
}

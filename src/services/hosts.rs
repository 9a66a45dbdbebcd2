//! Host reference list service

use crate::{error::AppResult, models::Host, repository::Repository};

#[derive(Clone)]
pub struct HostsService {
    repository: Repository,
}

impl HostsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all hosts
    pub async fn list(&self) -> AppResult<Vec<Host>> {
        self.repository.hosts.list().await
    }

    /// Get a host by ID
    pub async fn get(&self, id: i32) -> AppResult<Host> {
        self.repository.hosts.get_by_id(id).await
    }
}

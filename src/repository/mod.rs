//! Repository layer for database operations

pub mod hosts;
pub mod visitors;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub visitors: visitors::VisitorsRepository,
    pub hosts: hosts::HostsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            visitors: visitors::VisitorsRepository::new(pool.clone()),
            hosts: hosts::HostsRepository::new(pool.clone()),
            pool,
        }
    }
}

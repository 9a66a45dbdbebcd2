//! Business logic services

pub mod hosts;
pub mod sessions;
pub mod stats;
pub mod visitors;

use std::sync::Arc;

use crate::{config::KioskConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub visitors: visitors::VisitorsService,
    pub hosts: hosts::HostsService,
    pub stats: stats::StatsService,
    pub sessions: Arc<sessions::SessionService>,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, kiosk: KioskConfig) -> Self {
        Self {
            visitors: visitors::VisitorsService::new(
                Arc::new(repository.visitors.clone()),
                kiosk.clone(),
            ),
            hosts: hosts::HostsService::new(repository.clone()),
            stats: stats::StatsService::new(repository),
            sessions: Arc::new(sessions::SessionService::new(kiosk)),
        }
    }
}

//! Entre Visitor Check-in System
//!
//! A Rust implementation of the Entre visitor kiosk server, providing a
//! REST JSON API for the check-in wizard, visitor records and the admin
//! views.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod wizard;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

//! API handlers for the Entre REST endpoints
//!
//! The kiosk and admin panel talk to the same surface; authentication for
//! the admin routes is handled by the deployment's reverse proxy, not here.

pub mod health;
pub mod hosts;
pub mod openapi;
pub mod sessions;
pub mod stats;
pub mod visitors;

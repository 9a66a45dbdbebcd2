//! Host reference model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A member of staff a visitor can be registered against.
/// The list is static reference data, seeded by migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Host {
    pub id: i32,
    pub name: String,
    pub department: String,
}

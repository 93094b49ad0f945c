//! Address (shelving location) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Location record. The catalog only resolves addresses by id and never
/// mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Address {
    pub id: i32,
    pub street: String,
    pub zip_code: String,
    pub city: String,
}

/// Address insert payload (used to provision locations)
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub street: String,
    pub zip_code: String,
    pub city: String,
}

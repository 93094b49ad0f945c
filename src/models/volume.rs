//! Volume (physical copy) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::address::Address;
use super::material::Material;

/// Fully populated volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Volume {
    pub id: i32,
    pub material: Material,
    pub home_location: Address,
    /// Where the copy is now; may diverge from `home_location`
    pub current_location: Address,
}

/// Create volume request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct VolumeInput {
    pub material_id: i32,
    pub home_location_id: i32,
    pub current_location_id: i32,
}

/// `volumes` row with its foreign keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct VolumeRow {
    pub id: i32,
    pub material_id: i32,
    pub home_location_id: i32,
    pub current_location_id: i32,
}

/// Volume listing filter
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeFilter {
    pub material_id: Option<i32>,
    pub id: Option<i32>,
}

impl VolumeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_material(material_id: i32) -> Self {
        Self {
            material_id: Some(material_id),
            id: None,
        }
    }

    pub fn by_id(id: i32) -> Self {
        Self {
            material_id: None,
            id: Some(id),
        }
    }

    pub fn matches(&self, row: &VolumeRow) -> bool {
        self.material_id.map_or(true, |m| row.material_id == m) && self.id.map_or(true, |id| row.id == id)
    }
}

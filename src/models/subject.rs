//! Subject vocabulary

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subject {
    pub id: i32,
    pub name: String,
}

/// Subject reference supplied by a client when writing a material
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubjectRef {
    pub id: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 255, message = "Subject name must be at most 255 characters"))]
    pub name: String,
}

impl SubjectRef {
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

impl From<&Subject> for SubjectRef {
    fn from(subject: &Subject) -> Self {
        Self {
            id: Some(subject.id),
            name: subject.name.clone(),
        }
    }
}

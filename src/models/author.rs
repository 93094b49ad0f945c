//! Author model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Full author row, shared by many materials through `material_authors`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

/// Author reference supplied by a client when writing a material.
///
/// When `id` names an existing author that row is linked as-is; otherwise a
/// new author is created from the names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct AuthorRef {
    pub id: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 255, message = "First name must be at most 255 characters"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "Last name must be at most 255 characters"))]
    pub last_name: String,
}

/// Author insert payload
#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
}

impl AuthorRef {
    /// True when the reference carries enough data to create a new author
    pub fn has_names(&self) -> bool {
        !self.first_name.trim().is_empty() || !self.last_name.trim().is_empty()
    }

    pub fn to_new(&self) -> NewAuthor {
        NewAuthor {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
        }
    }
}

impl From<&Author> for AuthorRef {
    fn from(author: &Author) -> Self {
        Self {
            id: Some(author.id),
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
        }
    }
}

//! Material (bibliographic work) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::author::{Author, AuthorRef};
use super::subject::{Subject, SubjectRef};

/// Material type vocabulary entry (book, journal, map, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MaterialType {
    pub id: i32,
    pub name: String,
}

/// Type reference in a material write. Identity is the id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MaterialTypeRef {
    pub id: i32,
    pub name: Option<String>,
}

/// Fully populated material, as returned by every read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Material {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub language: String,
    pub description: Option<String>,
    pub lendable: bool,
    #[serde(rename = "type")]
    pub material_type: MaterialType,
    /// Authors in catalog order
    pub authors: Vec<Author>,
    /// Subjects in catalog order
    pub subjects: Vec<Subject>,
}

/// Create / full-replace update request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct MaterialInput {
    #[serde(default)]
    #[validate(length(max = 17, message = "ISBN must be at most 17 characters"))]
    pub isbn: String,
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 512,
        message = "Title must be between 1 and 512 characters"
    ))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 64, message = "Language must be at most 64 characters"))]
    pub language: String,
    #[serde(default)]
    pub lendable: bool,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub material_type: Option<MaterialTypeRef>,
    #[serde(default)]
    pub subjects: Vec<SubjectRef>,
    #[serde(default)]
    pub authors: Vec<AuthorRef>,
}

/// Scalar columns of the `materials` table, written by create and update
#[derive(Debug, Clone)]
pub struct MaterialRecord {
    pub isbn: String,
    pub title: String,
    pub language: String,
    pub description: Option<String>,
    pub lendable: bool,
    pub type_id: i32,
}

/// `materials` row joined with its type
#[derive(Debug, Clone, FromRow)]
pub struct MaterialRow {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub language: String,
    pub description: Option<String>,
    pub lendable: bool,
    pub type_id: i32,
    pub type_name: String,
}

impl MaterialRow {
    pub fn into_material(self, authors: Vec<Author>, subjects: Vec<Subject>) -> Material {
        Material {
            id: self.id,
            isbn: self.isbn,
            title: self.title,
            language: self.language,
            description: self.description,
            lendable: self.lendable,
            material_type: MaterialType {
                id: self.type_id,
                name: self.type_name,
            },
            authors,
            subjects,
        }
    }
}

impl MaterialInput {
    pub fn to_record(&self, type_id: i32) -> MaterialRecord {
        MaterialRecord {
            isbn: self.isbn.trim().to_string(),
            title: self.title.trim().to_string(),
            language: self.language.trim().to_string(),
            description: self.description.clone(),
            lendable: self.lendable,
            type_id,
        }
    }
}

impl From<&Material> for MaterialInput {
    fn from(material: &Material) -> Self {
        Self {
            isbn: material.isbn.clone(),
            title: material.title.clone(),
            language: material.language.clone(),
            lendable: material.lendable,
            description: material.description.clone(),
            material_type: Some(MaterialTypeRef {
                id: material.material_type.id,
                name: Some(material.material_type.name.clone()),
            }),
            subjects: material.subjects.iter().map(SubjectRef::from).collect(),
            authors: material.authors.iter().map(AuthorRef::from).collect(),
        }
    }
}

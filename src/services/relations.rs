//! Material input validation and relationship reconciliation.
//!
//! Authors and subjects are shared rows. A write names them by id; an id that
//! resolves is reused as-is, anything else is created from the descriptive
//! fields of the reference before being linked.

use std::collections::HashSet;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::AuthorRef,
        material::{MaterialInput, MaterialTypeRef},
        subject::SubjectRef,
    },
    repository::StoreTx,
};

/// A relationship reference awaiting resolution
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    Author(&'a AuthorRef),
    Subject(&'a SubjectRef),
}

impl Candidate<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Candidate::Author(_) => "Author",
            Candidate::Subject(_) => "Subject",
        }
    }

    fn id(&self) -> Option<i32> {
        match self {
            Candidate::Author(author) => author.id,
            Candidate::Subject(subject) => subject.id,
        }
    }

    fn can_create(&self) -> bool {
        match self {
            Candidate::Author(author) => author.has_names(),
            Candidate::Subject(subject) => subject.has_name(),
        }
    }

    /// Reject references that could neither be resolved nor created
    pub fn check(&self) -> AppResult<()> {
        match self {
            Candidate::Author(author) => author.validate()?,
            Candidate::Subject(subject) => subject.validate()?,
        }
        match self.id() {
            Some(id) if id <= 0 => Err(AppError::Validation(format!(
                "{} id must be positive, got {}",
                self.kind(),
                id
            ))),
            Some(_) => Ok(()),
            None if self.can_create() => Ok(()),
            None => Err(AppError::Validation(format!(
                "{} reference needs an id or a name",
                self.kind()
            ))),
        }
    }
}

/// Validate a create/update request and return its type reference.
///
/// Performs no I/O; type resolution happens inside the write transaction.
pub fn validate_material(input: &MaterialInput) -> AppResult<&MaterialTypeRef> {
    input.validate()?;

    if input.title.trim().is_empty() {
        return Err(AppError::Validation("Title must not be empty".to_string()));
    }

    let material_type = input
        .material_type
        .as_ref()
        .ok_or_else(|| AppError::Validation("Material type is required".to_string()))?;

    for author in &input.authors {
        Candidate::Author(author).check()?;
    }
    for subject in &input.subjects {
        Candidate::Subject(subject).check()?;
    }

    Ok(material_type)
}

/// Resolve the material type; a type is never created implicitly
pub async fn resolve_type(tx: &mut dyn StoreTx, type_ref: &MaterialTypeRef) -> AppResult<i32> {
    tx.find_material_type(type_ref.id)
        .await?
        .map(|t| t.id)
        .ok_or_else(|| AppError::NotFound(format!("Material type {} not found", type_ref.id)))
}

/// Return the id of the row the candidate names, creating the row first when
/// its id does not resolve.
pub async fn resolve_or_create(tx: &mut dyn StoreTx, candidate: Candidate<'_>) -> AppResult<i32> {
    if let Some(id) = candidate.id() {
        let existing = match candidate {
            Candidate::Author(_) => tx.find_author(id).await?.map(|a| a.id),
            Candidate::Subject(_) => tx.find_subject(id).await?.map(|s| s.id),
        };
        if let Some(id) = existing {
            tracing::debug!("{} id={} reused", candidate.kind(), id);
            return Ok(id);
        }
    }

    if !candidate.can_create() {
        return Err(AppError::Validation(format!(
            "{} {} does not exist and carries no data to create it",
            candidate.kind(),
            candidate.id().unwrap_or_default()
        )));
    }

    let id = match candidate {
        Candidate::Author(author) => tx.insert_author(&author.to_new()).await?.id,
        Candidate::Subject(subject) => tx.insert_subject(subject.name.trim()).await?.id,
    };
    tracing::debug!("{} id={} created", candidate.kind(), id);
    Ok(id)
}

/// Resolve every author reference, returning distinct ids in request order
pub async fn reconcile_authors(tx: &mut dyn StoreTx, authors: &[AuthorRef]) -> AppResult<Vec<i32>> {
    let mut ids = Vec::with_capacity(authors.len());
    let mut seen = HashSet::with_capacity(authors.len());
    for author in authors {
        let id = resolve_or_create(tx, Candidate::Author(author)).await?;
        if seen.insert(id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Resolve every subject reference, returning distinct ids in request order
pub async fn reconcile_subjects(tx: &mut dyn StoreTx, subjects: &[SubjectRef]) -> AppResult<Vec<i32>> {
    let mut ids = Vec::with_capacity(subjects.len());
    let mut seen = HashSet::with_capacity(subjects.len());
    for subject in subjects {
        let id = resolve_or_create(tx, Candidate::Subject(subject)).await?;
        if seen.insert(id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

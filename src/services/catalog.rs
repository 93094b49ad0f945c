//! Catalog management service: materials and their relationship sets

use crate::{
    error::{AppError, AppResult},
    models::material::{Material, MaterialInput, MaterialType},
    models::subject::Subject,
    repository::Repository,
};

use super::relations::{reconcile_authors, reconcile_subjects, resolve_type, validate_material};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List every material with type, authors and subjects
    pub async fn find_all(&self) -> AppResult<Vec<Material>> {
        self.repository.store.materials().await
    }

    /// Get a material by ID with full relationships
    pub async fn find_by_id(&self, id: i32) -> AppResult<Material> {
        self.repository
            .store
            .material(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Material with id {} not found", id)))
    }

    /// Create a material together with its author and subject links.
    ///
    /// Authors and subjects whose id already exists are linked, never copied.
    /// Nothing is written unless every reference resolves.
    pub async fn create(&self, input: MaterialInput) -> AppResult<Material> {
        let type_ref = validate_material(&input)?;

        let mut tx = self.repository.store.begin().await?;
        let type_id = resolve_type(tx.as_mut(), type_ref).await?;
        let id = tx.insert_material(&input.to_record(type_id)).await?;

        let author_ids = reconcile_authors(tx.as_mut(), &input.authors).await?;
        tx.link_authors(id, &author_ids).await?;
        let subject_ids = reconcile_subjects(tx.as_mut(), &input.subjects).await?;
        tx.link_subjects(id, &subject_ids).await?;
        tx.commit().await?;

        tracing::info!(
            "Material created id={} ({} authors, {} subjects)",
            id,
            author_ids.len(),
            subject_ids.len()
        );
        self.find_by_id(id).await
    }

    /// Replace a material's fields and its author/subject sets.
    ///
    /// Join rows are deleted and reinserted; shared authors and subjects stay.
    /// Returns the number of rows written.
    pub async fn update(&self, id: i32, input: MaterialInput) -> AppResult<u64> {
        let mut tx = self.repository.store.begin().await?;
        if !tx.material_exists(id).await? {
            return Err(AppError::NotFound(format!("Material with id {} not found", id)));
        }

        let type_ref = validate_material(&input)?;
        let type_id = resolve_type(tx.as_mut(), type_ref).await?;
        let mut written = tx.update_material(id, &input.to_record(type_id)).await?;

        written += tx.unlink_authors(id).await?;
        let author_ids = reconcile_authors(tx.as_mut(), &input.authors).await?;
        written += tx.link_authors(id, &author_ids).await?;

        written += tx.unlink_subjects(id).await?;
        let subject_ids = reconcile_subjects(tx.as_mut(), &input.subjects).await?;
        written += tx.link_subjects(id, &subject_ids).await?;

        tx.commit().await?;

        tracing::info!("Material updated id={} ({} rows written)", id, written);
        Ok(written)
    }

    /// Delete a material and its join rows.
    ///
    /// Refused while volumes reference the material. Returns the number of
    /// rows removed.
    pub async fn delete(&self, id: i32) -> AppResult<u64> {
        let mut tx = self.repository.store.begin().await?;
        if !tx.material_exists(id).await? {
            return Err(AppError::NotFound(format!("Material with id {} not found", id)));
        }

        let volumes = tx.count_volumes_for_material(id).await?;
        if volumes > 0 {
            tracing::warn!("Refusing to delete material id={}: {} volume(s) reference it", id, volumes);
            return Err(AppError::Conflict(format!(
                "Material {} still has {} volume(s)",
                id, volumes
            )));
        }

        let mut removed = tx.unlink_authors(id).await?;
        removed += tx.unlink_subjects(id).await?;
        removed += tx.delete_material(id).await?;
        tx.commit().await?;

        tracing::info!("Material deleted id={} ({} rows removed)", id, removed);
        Ok(removed)
    }

    /// Subject vocabulary
    pub async fn list_subjects(&self) -> AppResult<Vec<Subject>> {
        self.repository.store.subjects().await
    }

    /// Material type vocabulary
    pub async fn list_types(&self) -> AppResult<Vec<MaterialType>> {
        self.repository.store.material_types().await
    }
}

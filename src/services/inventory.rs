//! Inventory service: volumes (physical copies) of catalog materials

use crate::{
    error::{AppError, AppResult},
    models::address::Address,
    models::volume::{Volume, VolumeFilter, VolumeInput},
    repository::Repository,
};

use super::catalog::CatalogService;

#[derive(Clone)]
pub struct InventoryService {
    repository: Repository,
    catalog: CatalogService,
}

impl InventoryService {
    pub fn new(repository: Repository, catalog: CatalogService) -> Self {
        Self { repository, catalog }
    }

    /// List every volume with its material and locations
    pub async fn find_all(&self) -> AppResult<Vec<Volume>> {
        self.repository.store.volumes(VolumeFilter::all()).await
    }

    /// List the volumes of one material (empty when there are none)
    pub async fn find_volumes_for_material(&self, material_id: i32) -> AppResult<Vec<Volume>> {
        self.repository
            .store
            .volumes(VolumeFilter::for_material(material_id))
            .await
    }

    pub async fn find_by_id(&self, id: i32) -> AppResult<Volume> {
        self.repository
            .store
            .volumes(VolumeFilter::by_id(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Volume with id {} not found", id)))
    }

    /// Create a volume once its material and both locations resolve.
    ///
    /// Every reference is resolved before the write transaction opens, so a
    /// failed lookup never leaves a volume behind.
    pub async fn create(&self, input: VolumeInput) -> AppResult<Volume> {
        self.catalog.find_by_id(input.material_id).await?;
        self.resolve_location(input.home_location_id, "Home").await?;
        self.resolve_location(input.current_location_id, "Current").await?;

        let mut tx = self.repository.store.begin().await?;
        let id = tx.insert_volume(&input).await?;
        tx.commit().await?;

        tracing::info!("Volume created id={} for material id={}", id, input.material_id);
        self.find_by_id(id).await
    }

    /// Replacing a volume is not supported by the catalog
    pub async fn update(&self, id: i32, _input: VolumeInput) -> AppResult<Volume> {
        tracing::warn!("Volume update requested for id={}", id);
        Err(AppError::NotImplemented("Volume update is not supported".to_string()))
    }

    /// Deleting a volume is not supported by the catalog
    pub async fn delete(&self, id: i32) -> AppResult<u64> {
        tracing::warn!("Volume delete requested for id={}", id);
        Err(AppError::NotImplemented("Volume delete is not supported".to_string()))
    }

    /// Listing volumes by material type is not supported by the catalog
    pub async fn find_by_type(&self, type_id: i32) -> AppResult<Vec<Volume>> {
        tracing::warn!("Volume lookup by type requested for type id={}", type_id);
        Err(AppError::NotImplemented("Volume lookup by type is not supported".to_string()))
    }

    async fn resolve_location(&self, id: i32, role: &str) -> AppResult<Address> {
        self.repository
            .addresses
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} location with id {} not found", role, id)))
    }
}

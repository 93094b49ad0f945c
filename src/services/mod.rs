//! Business logic services

pub mod catalog;
pub mod inventory;
pub mod relations;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub inventory: inventory::InventoryService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        let catalog = catalog::CatalogService::new(repository.clone());
        Self {
            inventory: inventory::InventoryService::new(repository, catalog.clone()),
            catalog,
        }
    }
}

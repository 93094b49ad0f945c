//! Repository layer: the storage contract consumed by the catalog services
//! and its implementations

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        address::Address,
        author::{Author, NewAuthor},
        material::{Material, MaterialRecord, MaterialType},
        subject::Subject,
        volume::{Volume, VolumeFilter, VolumeInput},
    },
};

/// Material types provisioned with a fresh catalog
pub const DEFAULT_MATERIAL_TYPES: [&str; 5] = ["Book", "Journal", "Map", "Reference book", "Article"];

/// 1-based join row position of the element at `idx`
pub(crate) fn link_position(idx: usize) -> AppResult<i32> {
    i32::try_from(idx + 1)
        .map_err(|_| AppError::Validation(format!("Too many linked rows ({})", idx + 1)))
}

/// Read side of the storage collaborator plus the entry point for writes.
///
/// Every read returns fully populated records (material with type, authors
/// and subjects; volume with material and both addresses) taken from a single
/// consistent snapshot.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Check that the backing store is reachable
    async fn ping(&self) -> AppResult<()>;

    /// Open a write transaction. Dropping it without `commit` discards every
    /// write made through it.
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>>;

    async fn materials(&self) -> AppResult<Vec<Material>>;

    async fn material(&self, id: i32) -> AppResult<Option<Material>>;

    async fn subjects(&self) -> AppResult<Vec<Subject>>;

    async fn material_types(&self) -> AppResult<Vec<MaterialType>>;

    async fn volumes(&self, filter: VolumeFilter) -> AppResult<Vec<Volume>>;
}

/// Write transaction against the catalog tables
#[async_trait]
pub trait StoreTx: Send {
    async fn find_author(&mut self, id: i32) -> AppResult<Option<Author>>;

    async fn insert_author(&mut self, author: &NewAuthor) -> AppResult<Author>;

    async fn find_subject(&mut self, id: i32) -> AppResult<Option<Subject>>;

    async fn insert_subject(&mut self, name: &str) -> AppResult<Subject>;

    async fn find_material_type(&mut self, id: i32) -> AppResult<Option<MaterialType>>;

    /// Check (and, where supported, lock) a material row
    async fn material_exists(&mut self, id: i32) -> AppResult<bool>;

    /// Insert a material row and return its assigned id
    async fn insert_material(&mut self, record: &MaterialRecord) -> AppResult<i32>;

    async fn update_material(&mut self, id: i32, record: &MaterialRecord) -> AppResult<u64>;

    async fn delete_material(&mut self, id: i32) -> AppResult<u64>;

    /// Insert join rows in the given order; ids must already exist
    async fn link_authors(&mut self, material_id: i32, author_ids: &[i32]) -> AppResult<u64>;

    /// Remove every author join row of a material
    async fn unlink_authors(&mut self, material_id: i32) -> AppResult<u64>;

    async fn link_subjects(&mut self, material_id: i32, subject_ids: &[i32]) -> AppResult<u64>;

    async fn unlink_subjects(&mut self, material_id: i32) -> AppResult<u64>;

    async fn count_volumes_for_material(&mut self, material_id: i32) -> AppResult<i64>;

    /// Insert a volume row and return its assigned id
    async fn insert_volume(&mut self, volume: &VolumeInput) -> AppResult<i32>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Resolves shelving locations by id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Address>>;
}

/// Storage handles shared by all services
#[derive(Clone)]
pub struct Repository {
    pub store: Arc<dyn CatalogStore>,
    pub addresses: Arc<dyn AddressResolver>,
}

impl Repository {
    /// Create a repository backed by the given Postgres pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        let store = Arc::new(postgres::PgStore::new(pool));
        Self {
            store: store.clone(),
            addresses: store,
        }
    }

    /// Create a repository backed by an in-process store
    pub fn in_memory(store: memory::MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            store: store.clone(),
            addresses: store,
        }
    }

    /// Replace the address resolver (locations may live in another service)
    pub fn with_addresses(mut self, addresses: Arc<dyn AddressResolver>) -> Self {
        self.addresses = addresses;
        self
    }
}


//! In-process catalog store.
//!
//! Holds every table in one mutex-guarded snapshot. A write transaction owns
//! the lock for its whole lifetime and works on a private copy that replaces
//! the shared tables only on `commit`, so a failed operation leaves nothing
//! behind and concurrent writers are serialized.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{link_position, AddressResolver, CatalogStore, StoreTx, DEFAULT_MATERIAL_TYPES};
use crate::{
    error::{AppError, AppResult},
    models::{
        address::{Address, NewAddress},
        author::{Author, NewAuthor},
        material::{Material, MaterialRecord, MaterialType},
        subject::Subject,
        volume::{Volume, VolumeFilter, VolumeInput, VolumeRow},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Link {
    material_id: i32,
    target_id: i32,
    position: i32,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    last_id: i32,
    authors: BTreeMap<i32, Author>,
    subjects: BTreeMap<i32, Subject>,
    material_types: BTreeMap<i32, MaterialType>,
    materials: BTreeMap<i32, MaterialRecord>,
    material_authors: Vec<Link>,
    material_subjects: Vec<Link>,
    addresses: BTreeMap<i32, Address>,
    volumes: BTreeMap<i32, VolumeRow>,
}

/// Row counts per table, for inspecting the store from tests and tooling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub authors: usize,
    pub subjects: usize,
    pub material_types: usize,
    pub materials: usize,
    pub material_authors: usize,
    pub material_subjects: usize,
    pub addresses: usize,
    pub volumes: usize,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn linked<T: Clone>(links: &[Link], material_id: i32, rows: &BTreeMap<i32, T>) -> Vec<T> {
        let mut links: Vec<&Link> = links.iter().filter(|l| l.material_id == material_id).collect();
        links.sort_by_key(|l| l.position);
        links
            .into_iter()
            .filter_map(|l| rows.get(&l.target_id).cloned())
            .collect()
    }

    fn material(&self, id: i32) -> Option<Material> {
        let record = self.materials.get(&id)?;
        let material_type = self.material_types.get(&record.type_id)?.clone();

        Some(Material {
            id,
            isbn: record.isbn.clone(),
            title: record.title.clone(),
            language: record.language.clone(),
            description: record.description.clone(),
            lendable: record.lendable,
            material_type,
            authors: Self::linked(&self.material_authors, id, &self.authors),
            subjects: Self::linked(&self.material_subjects, id, &self.subjects),
        })
    }

    fn volume(&self, row: &VolumeRow) -> Option<Volume> {
        Some(Volume {
            id: row.id,
            material: self.material(row.material_id)?,
            home_location: self.addresses.get(&row.home_location_id)?.clone(),
            current_location: self.addresses.get(&row.current_location_id)?.clone(),
        })
    }

    fn link(links: &mut Vec<Link>, material_id: i32, target_ids: &[i32]) -> AppResult<u64> {
        let mut seen: HashSet<i32> = links
            .iter()
            .filter(|l| l.material_id == material_id)
            .map(|l| l.target_id)
            .collect();
        let mut inserted = 0;
        for (idx, target_id) in target_ids.iter().enumerate() {
            if !seen.insert(*target_id) {
                continue;
            }
            links.push(Link {
                material_id,
                target_id: *target_id,
                position: link_position(idx)?,
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    fn unlink(links: &mut Vec<Link>, material_id: i32) -> u64 {
        let before = links.len();
        links.retain(|l| l.material_id != material_id);
        (before - links.len()) as u64
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store provisioned with the default material types
    pub async fn with_default_vocabulary() -> Self {
        let store = Self::new();
        for name in DEFAULT_MATERIAL_TYPES {
            store.add_material_type(name).await;
        }
        store
    }

    pub async fn add_material_type(&self, name: &str) -> MaterialType {
        let mut tables = self.tables.lock().await;
        let material_type = MaterialType {
            id: tables.next_id(),
            name: name.to_string(),
        };
        tables.material_types.insert(material_type.id, material_type.clone());
        material_type
    }

    pub async fn add_subject(&self, name: &str) -> Subject {
        let mut tables = self.tables.lock().await;
        let subject = Subject {
            id: tables.next_id(),
            name: name.to_string(),
        };
        tables.subjects.insert(subject.id, subject.clone());
        subject
    }

    pub async fn add_author(&self, author: NewAuthor) -> Author {
        let mut tables = self.tables.lock().await;
        let author = Author {
            id: tables.next_id(),
            first_name: author.first_name,
            last_name: author.last_name,
        };
        tables.authors.insert(author.id, author.clone());
        author
    }

    pub async fn add_address(&self, address: NewAddress) -> Address {
        let mut tables = self.tables.lock().await;
        let address = Address {
            id: tables.next_id(),
            street: address.street,
            zip_code: address.zip_code,
            city: address.city,
        };
        tables.addresses.insert(address.id, address.clone());
        address
    }

    pub async fn counts(&self) -> TableCounts {
        let tables = self.tables.lock().await;
        TableCounts {
            authors: tables.authors.len(),
            subjects: tables.subjects.len(),
            material_types: tables.material_types.len(),
            materials: tables.materials.len(),
            material_authors: tables.material_authors.len(),
            material_subjects: tables.material_subjects.len(),
            addresses: tables.addresses.len(),
            volumes: tables.volumes.len(),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn materials(&self) -> AppResult<Vec<Material>> {
        let tables = self.tables.lock().await;
        Ok(tables.materials.keys().filter_map(|id| tables.material(*id)).collect())
    }

    async fn material(&self, id: i32) -> AppResult<Option<Material>> {
        Ok(self.tables.lock().await.material(id))
    }

    async fn subjects(&self) -> AppResult<Vec<Subject>> {
        Ok(self.tables.lock().await.subjects.values().cloned().collect())
    }

    async fn material_types(&self) -> AppResult<Vec<MaterialType>> {
        Ok(self.tables.lock().await.material_types.values().cloned().collect())
    }

    async fn volumes(&self, filter: VolumeFilter) -> AppResult<Vec<Volume>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .volumes
            .values()
            .filter(|row| filter.matches(row))
            .filter_map(|row| tables.volume(row))
            .collect())
    }
}

#[async_trait]
impl AddressResolver for MemoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Address>> {
        Ok(self.tables.lock().await.addresses.get(&id).cloned())
    }
}

/// Write transaction over a private copy of the tables
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

impl MemoryTx {
    fn require_material(&self, id: i32) -> AppResult<()> {
        if self.working.materials.contains_key(&id) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Material with id {} not found", id)))
        }
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_author(&mut self, id: i32) -> AppResult<Option<Author>> {
        Ok(self.working.authors.get(&id).cloned())
    }

    async fn insert_author(&mut self, author: &NewAuthor) -> AppResult<Author> {
        let author = Author {
            id: self.working.next_id(),
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
        };
        self.working.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn find_subject(&mut self, id: i32) -> AppResult<Option<Subject>> {
        Ok(self.working.subjects.get(&id).cloned())
    }

    async fn insert_subject(&mut self, name: &str) -> AppResult<Subject> {
        let subject = Subject {
            id: self.working.next_id(),
            name: name.to_string(),
        };
        self.working.subjects.insert(subject.id, subject.clone());
        Ok(subject)
    }

    async fn find_material_type(&mut self, id: i32) -> AppResult<Option<MaterialType>> {
        Ok(self.working.material_types.get(&id).cloned())
    }

    async fn material_exists(&mut self, id: i32) -> AppResult<bool> {
        Ok(self.working.materials.contains_key(&id))
    }

    async fn insert_material(&mut self, record: &MaterialRecord) -> AppResult<i32> {
        if !self.working.material_types.contains_key(&record.type_id) {
            return Err(AppError::NotFound(format!("Material type {} not found", record.type_id)));
        }
        let id = self.working.next_id();
        self.working.materials.insert(id, record.clone());
        Ok(id)
    }

    async fn update_material(&mut self, id: i32, record: &MaterialRecord) -> AppResult<u64> {
        match self.working.materials.get_mut(&id) {
            Some(row) => {
                *row = record.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_material(&mut self, id: i32) -> AppResult<u64> {
        Ok(self.working.materials.remove(&id).map_or(0, |_| 1))
    }

    async fn link_authors(&mut self, material_id: i32, author_ids: &[i32]) -> AppResult<u64> {
        self.require_material(material_id)?;
        if let Some(missing) = author_ids.iter().find(|id| !self.working.authors.contains_key(id)) {
            return Err(AppError::NotFound(format!("Author with id {} not found", missing)));
        }
        Tables::link(&mut self.working.material_authors, material_id, author_ids)
    }

    async fn unlink_authors(&mut self, material_id: i32) -> AppResult<u64> {
        Ok(Tables::unlink(&mut self.working.material_authors, material_id))
    }

    async fn link_subjects(&mut self, material_id: i32, subject_ids: &[i32]) -> AppResult<u64> {
        self.require_material(material_id)?;
        if let Some(missing) = subject_ids.iter().find(|id| !self.working.subjects.contains_key(id)) {
            return Err(AppError::NotFound(format!("Subject with id {} not found", missing)));
        }
        Tables::link(&mut self.working.material_subjects, material_id, subject_ids)
    }

    async fn unlink_subjects(&mut self, material_id: i32) -> AppResult<u64> {
        Ok(Tables::unlink(&mut self.working.material_subjects, material_id))
    }

    async fn count_volumes_for_material(&mut self, material_id: i32) -> AppResult<i64> {
        Ok(self
            .working
            .volumes
            .values()
            .filter(|v| v.material_id == material_id)
            .count() as i64)
    }

    async fn insert_volume(&mut self, volume: &VolumeInput) -> AppResult<i32> {
        self.require_material(volume.material_id)?;
        for location_id in [volume.home_location_id, volume.current_location_id] {
            if !self.working.addresses.contains_key(&location_id) {
                return Err(AppError::NotFound(format!("Address with id {} not found", location_id)));
            }
        }
        let id = self.working.next_id();
        self.working.volumes.insert(
            id,
            VolumeRow {
                id,
                material_id: volume.material_id,
                home_location_id: volume.home_location_id,
                current_location_id: volume.current_location_id,
            },
        );
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

//! Postgres catalog store.
//!
//! Reads run in a read-only REPEATABLE READ transaction so a material and its
//! join rows (or a volume and everything it references) come from the same
//! snapshot. Writes go through [`PgTx`], a thin wrapper over an sqlx
//! transaction that rolls back when dropped.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, PgConnection, Pool, Postgres, Transaction};

use super::{link_position, AddressResolver, CatalogStore, StoreTx};
use crate::{
    error::{AppError, AppResult},
    models::{
        address::Address,
        author::{Author, NewAuthor},
        material::{Material, MaterialRecord, MaterialRow, MaterialType},
        subject::Subject,
        volume::{Volume, VolumeFilter, VolumeInput, VolumeRow},
    },
};

#[derive(FromRow)]
struct LinkedAuthor {
    material_id: i32,
    id: i32,
    first_name: String,
    last_name: String,
}

#[derive(FromRow)]
struct LinkedSubject {
    material_id: i32,
    id: i32,
    name: String,
}

const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Load materials with type, authors and subjects. `None` loads every material.
async fn load_materials(conn: &mut PgConnection, ids: Option<Vec<i32>>) -> AppResult<Vec<Material>> {
    let rows = sqlx::query_as::<_, MaterialRow>(
        r#"
        SELECT m.id, m.isbn, m.title, m.language, m.description, m.lendable,
               t.id AS type_id, t.name AS type_name
        FROM materials m
        JOIN material_types t ON t.id = m.type_id
        WHERE ($1::int[] IS NULL OR m.id = ANY($1))
        ORDER BY m.id
        "#,
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let material_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

    let linked_authors = sqlx::query_as::<_, LinkedAuthor>(
        r#"
        SELECT ma.material_id, a.id, a.first_name, a.last_name
        FROM material_authors ma
        JOIN authors a ON a.id = ma.author_id
        WHERE ma.material_id = ANY($1)
        ORDER BY ma.material_id, ma.position
        "#,
    )
    .bind(&material_ids)
    .fetch_all(&mut *conn)
    .await?;

    let linked_subjects = sqlx::query_as::<_, LinkedSubject>(
        r#"
        SELECT ms.material_id, s.id, s.name
        FROM material_subjects ms
        JOIN subjects s ON s.id = ms.subject_id
        WHERE ms.material_id = ANY($1)
        ORDER BY ms.material_id, ms.position
        "#,
    )
    .bind(&material_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut authors: HashMap<i32, Vec<Author>> = HashMap::new();
    for row in linked_authors {
        authors.entry(row.material_id).or_default().push(Author {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
        });
    }

    let mut subjects: HashMap<i32, Vec<Subject>> = HashMap::new();
    for row in linked_subjects {
        subjects.entry(row.material_id).or_default().push(Subject {
            id: row.id,
            name: row.name,
        });
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            row.into_material(
                authors.remove(&id).unwrap_or_default(),
                subjects.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

async fn load_volumes(conn: &mut PgConnection, filter: VolumeFilter) -> AppResult<Vec<Volume>> {
    let rows = sqlx::query_as::<_, VolumeRow>(
        r#"
        SELECT id, material_id, home_location_id, current_location_id
        FROM volumes
        WHERE ($1::int IS NULL OR material_id = $1)
          AND ($2::int IS NULL OR id = $2)
        ORDER BY id
        "#,
    )
    .bind(filter.material_id)
    .bind(filter.id)
    .fetch_all(&mut *conn)
    .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut material_ids: Vec<i32> = rows.iter().map(|r| r.material_id).collect();
    material_ids.sort_unstable();
    material_ids.dedup();
    let materials: HashMap<i32, Material> = load_materials(conn, Some(material_ids))
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let address_ids: Vec<i32> = rows
        .iter()
        .flat_map(|r| [r.home_location_id, r.current_location_id])
        .collect();
    let addresses: HashMap<i32, Address> = sqlx::query_as::<_, Address>(
        "SELECT id, street, zip_code, city FROM addresses WHERE id = ANY($1)",
    )
    .bind(&address_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|a| (a.id, a))
    .collect();

    // Foreign keys guarantee every reference resolves inside the snapshot
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            Some(Volume {
                id: row.id,
                material: materials.get(&row.material_id)?.clone(),
                home_location: addresses.get(&row.home_location_id)?.clone(),
                current_location: addresses.get(&row.current_location_id)?.clone(),
            })
        })
        .collect())
}

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn snapshot(&self) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn materials(&self) -> AppResult<Vec<Material>> {
        let mut tx = self.snapshot().await?;
        let materials = load_materials(&mut *tx, None).await?;
        tx.commit().await?;
        Ok(materials)
    }

    async fn material(&self, id: i32) -> AppResult<Option<Material>> {
        let mut tx = self.snapshot().await?;
        let material = load_materials(&mut *tx, Some(vec![id])).await?.into_iter().next();
        tx.commit().await?;
        Ok(material)
    }

    async fn subjects(&self) -> AppResult<Vec<Subject>> {
        let rows = sqlx::query_as::<_, Subject>("SELECT id, name FROM subjects ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn material_types(&self) -> AppResult<Vec<MaterialType>> {
        let rows = sqlx::query_as::<_, MaterialType>("SELECT id, name FROM material_types ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn volumes(&self, filter: VolumeFilter) -> AppResult<Vec<Volume>> {
        let mut tx = self.snapshot().await?;
        let volumes = load_volumes(&mut *tx, filter).await?;
        tx.commit().await?;
        Ok(volumes)
    }
}

#[async_trait]
impl AddressResolver for PgStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(
            "SELECT id, street, zip_code, city FROM addresses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(address)
    }
}

/// Write transaction on the catalog tables
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn find_author(&mut self, id: i32) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(author)
    }

    async fn insert_author(&mut self, author: &NewAuthor) -> AppResult<Author> {
        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (first_name, last_name) VALUES ($1, $2) RETURNING id, first_name, last_name",
        )
        .bind(&author.first_name)
        .bind(&author.last_name)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(author)
    }

    async fn find_subject(&mut self, id: i32) -> AppResult<Option<Subject>> {
        let subject = sqlx::query_as::<_, Subject>("SELECT id, name FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(subject)
    }

    async fn insert_subject(&mut self, name: &str) -> AppResult<Subject> {
        let subject = sqlx::query_as::<_, Subject>(
            "INSERT INTO subjects (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(subject)
    }

    async fn find_material_type(&mut self, id: i32) -> AppResult<Option<MaterialType>> {
        let material_type = sqlx::query_as::<_, MaterialType>(
            "SELECT id, name FROM material_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(material_type)
    }

    async fn material_exists(&mut self, id: i32) -> AppResult<bool> {
        let found: Option<i32> = sqlx::query_scalar("SELECT id FROM materials WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(found.is_some())
    }

    async fn insert_material(&mut self, record: &MaterialRecord) -> AppResult<i32> {
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO materials (isbn, title, language, description, lendable, type_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id
            "#,
        )
        .bind(&record.isbn)
        .bind(&record.title)
        .bind(&record.language)
        .bind(&record.description)
        .bind(record.lendable)
        .bind(record.type_id)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn update_material(&mut self, id: i32, record: &MaterialRecord) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE materials SET
                isbn = $1,
                title = $2,
                language = $3,
                description = $4,
                lendable = $5,
                type_id = $6,
                updated_at = $7
            WHERE id = $8
            "#,
        )
        .bind(&record.isbn)
        .bind(&record.title)
        .bind(&record.language)
        .bind(&record.description)
        .bind(record.lendable)
        .bind(record.type_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_material(&mut self, id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM materials WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn link_authors(&mut self, material_id: i32, author_ids: &[i32]) -> AppResult<u64> {
        let mut inserted = 0;
        for (idx, author_id) in author_ids.iter().enumerate() {
            let result = sqlx::query(
                r#"
                INSERT INTO material_authors (material_id, author_id, position)
                VALUES ($1, $2, $3)
                ON CONFLICT (material_id, author_id) DO NOTHING
                "#,
            )
            .bind(material_id)
            .bind(author_id)
            .bind(link_position(idx)?)
            .execute(&mut *self.tx)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn unlink_authors(&mut self, material_id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM material_authors WHERE material_id = $1")
            .bind(material_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn link_subjects(&mut self, material_id: i32, subject_ids: &[i32]) -> AppResult<u64> {
        let mut inserted = 0;
        for (idx, subject_id) in subject_ids.iter().enumerate() {
            let result = sqlx::query(
                r#"
                INSERT INTO material_subjects (material_id, subject_id, position)
                VALUES ($1, $2, $3)
                ON CONFLICT (material_id, subject_id) DO NOTHING
                "#,
            )
            .bind(material_id)
            .bind(subject_id)
            .bind(link_position(idx)?)
            .execute(&mut *self.tx)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn unlink_subjects(&mut self, material_id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM material_subjects WHERE material_id = $1")
            .bind(material_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_volumes_for_material(&mut self, material_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM volumes WHERE material_id = $1")
            .bind(material_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count)
    }

    async fn insert_volume(&mut self, volume: &VolumeInput) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO volumes (material_id, home_location_id, current_location_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(volume.material_id)
        .bind(volume.home_location_id)
        .bind(volume.current_location_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match e {
            // A reference vanished after the service resolved it
            sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
                AppError::NotFound(format!(
                    "Volume references a missing row: {}",
                    db.constraint().unwrap_or("unknown constraint")
                ))
            }
            other => AppError::Database(other),
        })?;
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let PgTx { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}

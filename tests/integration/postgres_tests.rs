//! Catalog behavior against a real Postgres database.
//!
//! Each test gets a fresh, migrated database from `sqlx::test`.
//! Run with: DATABASE_URL=postgres://... cargo test -- --ignored

use sqlx::PgPool;
use tokio_test::{assert_err, assert_ok};

use gtl_server::{
    error::AppError,
    models::{
        address::Address,
        author::AuthorRef,
        material::{MaterialInput, MaterialTypeRef},
        subject::SubjectRef,
        volume::VolumeInput,
    },
    repository::Repository,
    services::Services,
};

async fn book_type(services: &Services) -> i32 {
    let types = assert_ok!(services.catalog.list_types().await);
    types
        .into_iter()
        .find(|t| t.name == "Book")
        .map(|t| t.id)
        .expect("seeded Book type")
}

async fn add_address(pool: &PgPool, street: &str) -> Address {
    sqlx::query_as::<_, Address>(
        "INSERT INTO addresses (street, zip_code, city) VALUES ($1, '5000', 'Odense') RETURNING id, street, zip_code, city",
    )
    .bind(street)
    .fetch_one(pool)
    .await
    .expect("Failed to insert address")
}

fn author(first: &str, last: &str) -> AuthorRef {
    AuthorRef {
        id: None,
        first_name: first.to_string(),
        last_name: last.to_string(),
    }
}

fn material(type_id: i32, title: &str) -> MaterialInput {
    MaterialInput {
        title: title.to_string(),
        language: "en".to_string(),
        material_type: Some(MaterialTypeRef { id: type_id, name: None }),
        ..Default::default()
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_create_then_find_round_trip(pool: PgPool) {
    let services = Services::new(Repository::new(pool));
    let book = book_type(&services).await;

    let mut input = material(book, "Good Omens");
    input.authors = vec![author("Terry", "Pratchett"), author("Neil", "Gaiman")];
    input.subjects = vec![SubjectRef { id: None, name: "Fantasy".to_string() }];

    let created = assert_ok!(services.catalog.create(input).await);
    assert_eq!(created.material_type.name, "Book");
    let last_names: Vec<&str> = created.authors.iter().map(|a| a.last_name.as_str()).collect();
    assert_eq!(last_names, vec!["Pratchett", "Gaiman"]);

    let found = assert_ok!(services.catalog.find_by_id(created.id).await);
    assert_eq!(found, created);
    assert_eq!(assert_ok!(services.catalog.find_all().await), vec![created]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_shared_author_is_reused(pool: PgPool) {
    let services = Services::new(Repository::new(pool.clone()));
    let book = book_type(&services).await;

    let mut first = material(book, "Mort");
    first.authors = vec![author("Terry", "Pratchett")];
    let first = assert_ok!(services.catalog.create(first).await);

    let mut second = material(book, "Guards! Guards!");
    second.authors = vec![AuthorRef::from(&first.authors[0])];
    let second = assert_ok!(services.catalog.create(second).await);

    assert_eq!(second.authors, first.authors);
    let authors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(authors, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_update_replaces_relationship_sets(pool: PgPool) {
    let services = Services::new(Repository::new(pool));
    let book = book_type(&services).await;

    let mut input = material(book, "Dune");
    input.authors = vec![author("Frank", "Herbert"), author("Brian", "Herbert")];
    input.subjects = vec![SubjectRef { id: None, name: "Science fiction".to_string() }];
    let created = assert_ok!(services.catalog.create(input).await);

    let mut replacement = material(book, "Dune Messiah");
    replacement.authors = vec![AuthorRef::from(&created.authors[0])];
    replacement.subjects = vec![SubjectRef { id: None, name: "Politics".to_string() }];

    // 1 material row, 2 + 1 author links, 1 + 1 subject links
    let written = assert_ok!(services.catalog.update(created.id, replacement).await);
    assert_eq!(written, 6);

    let updated = assert_ok!(services.catalog.find_by_id(created.id).await);
    assert_eq!(updated.title, "Dune Messiah");
    assert_eq!(updated.authors, vec![created.authors[0].clone()]);
    assert_eq!(updated.subjects.len(), 1);
    assert_eq!(updated.subjects[0].name, "Politics");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_update_missing_material_is_not_found(pool: PgPool) {
    let services = Services::new(Repository::new(pool));
    let book = book_type(&services).await;

    let err = assert_err!(services.catalog.update(4321, material(book, "Ghost")).await);
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_links_keep_order_and_skip_repeats(pool: PgPool) {
    let repository = Repository::new(pool);
    let services = Services::new(repository.clone());
    let book = book_type(&services).await;
    let created = assert_ok!(services.catalog.create(material(book, "Atlas")).await);

    let mut tx = assert_ok!(repository.store.begin().await);
    let a = assert_ok!(tx.insert_subject("Geography").await);
    let b = assert_ok!(tx.insert_subject("History").await);
    assert_eq!(assert_ok!(tx.link_subjects(created.id, &[b.id, a.id, b.id]).await), 2);
    assert_eq!(assert_ok!(tx.link_subjects(created.id, &[a.id]).await), 0);
    assert_ok!(tx.commit().await);

    let found = assert_ok!(services.catalog.find_by_id(created.id).await);
    assert_eq!(found.subjects, vec![b, a]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_volumes_guard_material_delete(pool: PgPool) {
    let services = Services::new(Repository::new(pool.clone()));
    let book = book_type(&services).await;
    let shelf = add_address(&pool, "Shelf 1").await;
    let desk = add_address(&pool, "Front desk").await;

    let kept = assert_ok!(services.catalog.create(material(book, "Kept")).await);
    let other = assert_ok!(services.catalog.create(material(book, "Other")).await);

    let volume = assert_ok!(
        services
            .inventory
            .create(VolumeInput {
                material_id: kept.id,
                home_location_id: shelf.id,
                current_location_id: desk.id,
            })
            .await
    );
    assert_eq!(volume.home_location, shelf);
    assert_eq!(volume.current_location, desk);

    let volumes = assert_ok!(services.inventory.find_volumes_for_material(kept.id).await);
    assert_eq!(volumes, vec![volume]);
    assert!(assert_ok!(services.inventory.find_volumes_for_material(other.id).await).is_empty());

    let err = assert_err!(services.catalog.delete(kept.id).await);
    assert!(matches!(err, AppError::Conflict(_)));
    assert_ok!(services.catalog.find_by_id(kept.id).await);

    assert_eq!(assert_ok!(services.catalog.delete(other.id).await), 1);
    let err = assert_err!(services.catalog.find_by_id(other.id).await);
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_volume_with_vanished_material_is_not_found(pool: PgPool) {
    let repository = Repository::new(pool.clone());
    let shelf = add_address(&pool, "Shelf 2").await;

    let mut tx = assert_ok!(repository.store.begin().await);
    let err = assert_err!(
        tx.insert_volume(&VolumeInput {
            material_id: 9999,
            home_location_id: shelf.id,
            current_location_id: shelf.id,
        })
        .await
    );
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_dropped_transaction_rolls_back(pool: PgPool) {
    let repository = Repository::new(pool.clone());
    {
        let mut tx = assert_ok!(repository.store.begin().await);
        assert_ok!(tx.insert_subject("Transient").await);
    }
    assert!(assert_ok!(repository.store.subjects().await).is_empty());

    let mut tx = assert_ok!(repository.store.begin().await);
    assert!(!assert_ok!(tx.material_exists(1).await));
}

//! SQLite data survives reopening the database file.

#![cfg(feature = "sqlite")]

use catalog_rust::{Catalog, SqliteConfig, SqliteEntityStore, VersionedEntity};

use crate::book;

#[test]
fn reopened_store_keeps_versions_and_stock() {
    let dir = std::env::temp_dir().join(format!("catalog-{}", uuid::Uuid::new_v4()));
    let config = SqliteConfig::new(dir.join("catalog.db"));

    let id = {
        let catalog = Catalog::new(SqliteEntityStore::open(&config).unwrap());
        let created = catalog.create_book(book("Dune", "scifi")).unwrap();
        catalog.sale_book(created.id(), 3).unwrap();
        created.id().to_string()
    };

    let catalog = Catalog::new(SqliteEntityStore::open(&config).unwrap());
    let reopened = catalog.get_book(&id).unwrap();
    assert_eq!(reopened.current_amount, 7);
    assert_eq!(reopened.sold_amount, 3);
    assert_eq!(reopened.version(), 2);

    drop(catalog);
    let _ = std::fs::remove_dir_all(&dir);
}

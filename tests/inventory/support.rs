//! Shared fixtures: a stocked book in each store implementation.

use catalog_rust::{Book, BookInput, Catalog, EntityStore, InMemoryEntityStore};

pub fn in_memory() -> Catalog<InMemoryEntityStore> {
    Catalog::new(InMemoryEntityStore::new())
}

#[cfg(feature = "sqlite")]
pub fn sqlite() -> Catalog<catalog_rust::SqliteEntityStore> {
    Catalog::new(catalog_rust::SqliteEntityStore::open_in_memory().unwrap())
}

pub fn stocked<S: EntityStore>(catalog: &Catalog<S>, current_amount: u64) -> Book {
    catalog
        .create_book(BookInput {
            title: "The Pragmatic Programmer".into(),
            category: "software".into(),
            language: "en".into(),
            publisher: "Addison-Wesley".into(),
            current_amount,
            ..Default::default()
        })
        .unwrap()
}

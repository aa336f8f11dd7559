//! Catalog - create/read/update/delete/list use cases for books and reviews.
//!
//! `Catalog<S>` owns the storage handle it was constructed with; nothing is
//! shared through globals. Every update goes through the version guard and
//! returns a fresh read of the record, so callers observe the store's
//! version and `modified_time` rather than a local guess.
//!
//! ## Example
//!
//! ```ignore
//! use catalog_rust::{BookInput, Catalog, InMemoryEntityStore};
//!
//! let catalog = Catalog::new(InMemoryEntityStore::new());
//! let book = catalog.create_book(input)?;
//! catalog.sale_book(book.id(), 2)?;
//! ```

mod books;
mod reports;
mod reviews;

use crate::guard::VersionGuard;
use crate::ledger::InventoryLedger;
use crate::model::{Book, Review};
use crate::store::{EntitiesExt, EntityRepository, EntityStore};

pub use books::{BookPage, BookQuery};
pub use reports::{BestSellerBook, BestSellerCategory};

/// The catalog service.
pub struct Catalog<S> {
    store: S,
}

impl<S: EntityStore> Catalog<S> {
    /// Create a catalog over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stock operations over this catalog's store.
    pub fn ledger(&self) -> InventoryLedger<'_, S> {
        InventoryLedger::new(&self.store)
    }

    fn guard(&self) -> VersionGuard<'_, S> {
        VersionGuard::new(&self.store)
    }

    fn books(&self) -> EntityRepository<'_, S, Book> {
        self.store.entities::<Book>()
    }

    fn reviews(&self) -> EntityRepository<'_, S, Review> {
        self.store.entities::<Review>()
    }
}

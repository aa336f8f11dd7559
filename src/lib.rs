mod catalog;
mod config;
mod error;
mod guard;
#[cfg(feature = "http")]
pub mod http;
mod ledger;
pub mod model;
pub mod store;

pub use catalog::{BestSellerBook, BestSellerCategory, BookPage, BookQuery, Catalog};
pub use config::CatalogConfig;
pub use error::CatalogError;
pub use guard::{retry_on_conflict, VersionGuard};
pub use ledger::InventoryLedger;
pub use model::{Book, BookInput, Record, Review, ReviewInput, VersionedEntity};
pub use store::{
    EntitiesExt, EntityRepository, EntityStore, InMemoryEntityStore, Query, SortOrder, StoreError,
};
#[cfg(feature = "sqlite")]
pub use store::{SqliteConfig, SqliteEntityStore};

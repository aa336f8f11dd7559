//! Models - Versioned catalog records.
//!
//! Every persisted record carries a [`Record`] header (identity, timestamps
//! and an optimistic-concurrency version). The [`VersionedEntity`] trait
//! exposes that header generically so a single store implementation and a
//! single version guard serve every entity kind.
//!
//! ## Example
//!
//! ```ignore
//! use catalog_rust::{Book, InMemoryEntityStore, EntitiesExt};
//!
//! let store = InMemoryEntityStore::new();
//! let book = store.entities::<Book>().insert(&Book::default())?;
//! assert_eq!(book.version(), 1);
//! ```

mod book;
mod review;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use book::{Book, BookInput};
pub use review::{Review, ReviewInput};

/// Identity, timestamps and version shared by every stored entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: u64,
}

impl Record {
    /// Header for a freshly inserted entity: version 1, both timestamps `at`.
    pub fn created(id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_time: Some(at),
            modified_time: Some(at),
            version: 1,
        }
    }
}

/// Trait for types that can be stored and updated under the version guard.
pub trait VersionedEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection name for this entity type (e.g., "books", "reviews").
    /// Maps to a table in SQL or a key prefix in the in-memory store.
    const COLLECTION: &'static str;

    /// Human-readable kind used in error messages.
    const KIND: &'static str;

    /// Fields that may appear in an equality filter.
    const FILTERABLE: &'static [&'static str];

    /// Fields that may be used as a sort key, besides the record fields.
    const SORTABLE: &'static [&'static str];

    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;

    fn id(&self) -> &str {
        &self.record().id
    }

    fn version(&self) -> u64 {
        self.record().version
    }

    /// Reset fields that are computed at read time and must never be persisted.
    fn clear_derived(&mut self) {}
}

/// Record fields every entity can be sorted by.
pub const RECORD_SORTABLE: &[&str] = &["id", "created_time", "modified_time", "version"];

/// Returns true if `field` is a valid sort key for `E`.
pub fn is_sortable<E: VersionedEntity>(field: &str) -> bool {
    RECORD_SORTABLE.contains(&field) || E::SORTABLE.contains(&field)
}

/// Returns true if `field` is a valid equality filter for `E`.
pub fn is_filterable<E: VersionedEntity>(field: &str) -> bool {
    field == "id" || E::FILTERABLE.contains(&field)
}

/// Current time truncated to the microsecond precision every store keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// The modification time for a write happening at `now` over a record last
/// modified at `previous`. Always strictly after `previous`.
pub fn next_modified(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    }
}

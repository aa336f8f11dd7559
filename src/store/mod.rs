//! Entity Store - Durable keyed storage for versioned entities.
//!
//! The store offers point reads, filtered and paginated scans, and a
//! conditional update keyed on `(id, version)`. The conditional update is the
//! only serialization point for concurrent writers: no store keeps a cache or
//! holds a lock across calls.
//!
//! ## Example
//!
//! ```ignore
//! use catalog_rust::{Book, EntitiesExt, InMemoryEntityStore, Query};
//!
//! let store = InMemoryEntityStore::new();
//! let books = store.entities::<Book>();
//! let mut book = books.insert(&draft)?;
//! book.current_amount += 5;
//! let book = books.update(&book)?; // fails with VersionConflict if stale
//! let page = books.query(&Query::new().filter("title", "Dune").limit(5))?;
//! ```

mod in_memory;
mod query;
mod repository;
#[cfg(feature = "sqlite")]
mod sqlite;

use std::fmt;

use crate::model::VersionedEntity;

pub use in_memory::InMemoryEntityStore;
pub use query::{Query, SortOrder};
pub use repository::{EntitiesExt, EntityRepository};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConfig, SqliteEntityStore};

/// Error type for entity store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The conditional update matched a row whose version differs.
    VersionConflict {
        collection: String,
        id: String,
        expected: u64,
        actual: u64,
    },
    /// No row exists for the given identifier.
    NotFound { collection: String, id: String },
    /// Filter or sort field outside the entity's allow-list.
    InvalidQuery(String),
    /// Serialization/deserialization error.
    Serde(String),
    /// Storage-level error.
    Storage(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::VersionConflict {
                collection,
                id,
                expected,
                actual,
            } => write!(
                f,
                "version conflict on {}:{} (expected version {}, actual {})",
                collection, id, expected, actual
            ),
            StoreError::NotFound { collection, id } => {
                write!(f, "entity not found: {}:{}", collection, id)
            }
            StoreError::InvalidQuery(msg) => write!(f, "invalid query: {}", msg),
            StoreError::Serde(msg) => write!(f, "entity serialization error: {}", msg),
            StoreError::Storage(msg) => write!(f, "entity storage error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

impl StoreError {
    pub(crate) fn not_found<E: VersionedEntity>(id: &str) -> Self {
        StoreError::NotFound {
            collection: E::COLLECTION.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn conflict<E: VersionedEntity>(id: &str, expected: u64, actual: u64) -> Self {
        StoreError::VersionConflict {
            collection: E::COLLECTION.to_string(),
            id: id.to_string(),
            expected,
            actual,
        }
    }
}

/// Abstract storage for versioned entities.
///
/// All writes are single-record statements. Implementations are shared
/// across concurrent callers (clone-friendly handles) and must make the
/// version check and the write of `update` one atomic step.
pub trait EntityStore: Send + Sync {
    /// Get an entity by ID. Returns None if not found.
    fn get<E: VersionedEntity>(&self, id: &str) -> Result<Option<E>, StoreError>;

    /// Entities matching the query's filters, sorted and paginated.
    fn query<E: VersionedEntity>(&self, query: &Query) -> Result<Vec<E>, StoreError>;

    /// Number of entities matching the query's filters. Sort and pagination
    /// are ignored.
    fn count<E: VersionedEntity>(&self, query: &Query) -> Result<usize, StoreError>;

    /// Persist a new entity. Assigns a fresh identifier, sets both timestamps
    /// and version 1, and returns the persisted value.
    fn insert<E: VersionedEntity>(&self, entity: &E) -> Result<E, StoreError>;

    /// Persist all mutable fields if the stored version equals
    /// `entity.version()`. On success the stored version is advanced by one
    /// and `modified_time` is refreshed by the store.
    fn update<E: VersionedEntity>(&self, entity: &E) -> Result<E, StoreError>;

    /// Delete an entity by ID, unconditionally. Returns true if it existed.
    fn delete<E: VersionedEntity>(&self, id: &str) -> Result<bool, StoreError>;
}

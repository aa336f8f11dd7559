use std::error::Error;
use std::fmt;

use crate::store::StoreError;

/// Error type for catalog operations.
///
/// The set is closed: each variant is a distinct category a transport can
/// map to a stable status code and a retry decision.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// No record at the given identifier.
    NotFound { kind: String, id: String },
    /// The record changed since it was read. Re-read before retrying.
    VersionConflict {
        kind: String,
        id: String,
        expected: u64,
        actual: u64,
    },
    /// A sale asked for more than is on hand.
    InsufficientStock { id: String, remaining: u64 },
    /// Rejected before touching storage.
    InvalidInput(String),
    /// I/O or driver failure. Never a business outcome.
    Storage(StoreError),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::NotFound { kind, id } => write!(f, "{} id {} is not found", kind, id),
            CatalogError::VersionConflict {
                kind,
                id,
                expected,
                actual,
            } => write!(
                f,
                "data conflict on {} {} (expected version {}, actual {})",
                kind, id, expected, actual
            ),
            CatalogError::InsufficientStock { remaining, .. } => {
                write!(f, "insufficient stock, only {} items left", remaining)
            }
            CatalogError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            CatalogError::Storage(e) => write!(f, "storage failure: {}", e),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CatalogError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => CatalogError::NotFound {
                kind: kind_of(&collection),
                id,
            },
            StoreError::VersionConflict {
                collection,
                id,
                expected,
                actual,
            } => CatalogError::VersionConflict {
                kind: kind_of(&collection),
                id,
                expected,
                actual,
            },
            StoreError::InvalidQuery(msg) => CatalogError::InvalidInput(msg),
            other => CatalogError::Storage(other),
        }
    }
}

/// "books" -> "book".
fn kind_of(collection: &str) -> String {
    collection
        .strip_suffix('s')
        .unwrap_or(collection)
        .to_string()
}

impl CatalogError {
    pub fn not_found(kind: &str, id: &str) -> Self {
        CatalogError::NotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }

    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            CatalogError::NotFound { .. } => 404,
            CatalogError::VersionConflict { .. } => 409,
            CatalogError::InsufficientStock { .. } => 400,
            CatalogError::InvalidInput(_) => 400,
            CatalogError::Storage(_) => 500,
        }
    }

    /// Whether repeating the same call (after a re-read) can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::VersionConflict { .. } | CatalogError::Storage(_)
        )
    }
}

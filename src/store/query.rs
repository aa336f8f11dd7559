//! Query - Filter, sort and pagination for entity scans.

use serde_json::Value;

use super::StoreError;
use crate::model::{is_filterable, is_sortable, VersionedEntity};

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse `asc`/`desc` (case-insensitive). Anything else is None.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Equality filters, one sort key, and limit/offset pagination.
///
/// No upper bound is placed on `limit` here; callers facing untrusted input
/// clamp it before building the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub sort_by: Option<String>,
    pub order: SortOrder,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`.
    pub fn filter(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn sort_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort_by = Some(field.to_string());
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// The effective sort key. Defaults to creation time.
    pub fn sort_field(&self) -> &str {
        self.sort_by.as_deref().unwrap_or("created_time")
    }

    /// Check every field against `E`'s allow-lists.
    pub fn validate<E: VersionedEntity>(&self) -> Result<(), StoreError> {
        for (field, _) in &self.filters {
            if !is_filterable::<E>(field) {
                return Err(StoreError::InvalidQuery(format!(
                    "cannot filter {} by {}",
                    E::COLLECTION,
                    field
                )));
            }
        }

        let sort = self.sort_field();
        if !is_sortable::<E>(sort) {
            return Err(StoreError::InvalidQuery(format!(
                "cannot sort {} by {}",
                E::COLLECTION,
                sort
            )));
        }

        Ok(())
    }
}

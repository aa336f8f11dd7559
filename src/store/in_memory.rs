//! InMemoryEntityStore - HashMap-backed entity store for testing and development.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use uuid::Uuid;

use super::{EntityStore, Query, SortOrder, StoreError};
use crate::model::{self, Record, VersionedEntity};

/// In-memory entity store backed by a HashMap of JSON documents.
///
/// Storage key is `"COLLECTION:id"`. Clone-friendly via Arc: clones share
/// the same storage. The version check and the write of `update` happen
/// under one write lock.
#[derive(Clone)]
pub struct InMemoryEntityStore {
    storage: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl Default for InMemoryEntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEntityStore {
    /// Create a new empty entity store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn make_key(collection: &str, id: &str) -> String {
        format!("{}:{}", collection, id)
    }

    /// Decode every document of `E`'s collection that passes the filters.
    fn scan<E: VersionedEntity>(&self, query: &Query) -> Result<Vec<(Value, E)>, StoreError> {
        query.validate::<E>()?;

        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        let prefix = format!("{}:", E::COLLECTION);
        let mut results = Vec::new();

        for (key, bytes) in storage.iter() {
            if !key.starts_with(&prefix) {
                continue;
            }
            let doc: Value = serde_json::from_slice(bytes)?;
            let matches = query
                .filters
                .iter()
                .all(|(field, expected)| doc.get(field).unwrap_or(&Value::Null) == expected);
            if matches {
                let entity: E = serde_json::from_value(doc.clone())?;
                results.push((doc, entity));
            }
        }

        Ok(results)
    }
}

impl EntityStore for InMemoryEntityStore {
    fn get<E: VersionedEntity>(&self, id: &str) -> Result<Option<E>, StoreError> {
        let key = Self::make_key(E::COLLECTION, id);
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        match storage.get(&key) {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
            None => Ok(None),
        }
    }

    fn query<E: VersionedEntity>(&self, query: &Query) -> Result<Vec<E>, StoreError> {
        let mut items = self.scan::<E>(query)?;
        sort_documents(&mut items, query.sort_field(), query.order);

        Ok(items
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|(_, entity)| entity)
            .collect())
    }

    fn count<E: VersionedEntity>(&self, query: &Query) -> Result<usize, StoreError> {
        Ok(self.scan::<E>(query)?.len())
    }

    fn insert<E: VersionedEntity>(&self, entity: &E) -> Result<E, StoreError> {
        let mut entity = entity.clone();
        entity.clear_derived();
        *entity.record_mut() = Record::created(Uuid::new_v4().to_string(), model::now());

        let key = Self::make_key(E::COLLECTION, entity.id());
        let bytes = serde_json::to_vec(&entity)?;

        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        if storage.contains_key(&key) {
            return Err(StoreError::Storage(format!("duplicate identifier {}", key)));
        }
        storage.insert(key, bytes);

        Ok(entity)
    }

    fn update<E: VersionedEntity>(&self, entity: &E) -> Result<E, StoreError> {
        let mut entity = entity.clone();
        entity.clear_derived();
        let key = Self::make_key(E::COLLECTION, entity.id());

        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        let stored: Record = match storage.get(&key) {
            Some(bytes) => serde_json::from_slice(bytes)?,
            None => return Err(StoreError::not_found::<E>(entity.id())),
        };

        if stored.version != entity.version() {
            return Err(StoreError::conflict::<E>(
                entity.id(),
                entity.version(),
                stored.version,
            ));
        }

        let record = entity.record_mut();
        record.created_time = stored.created_time;
        record.modified_time = Some(model::next_modified(stored.modified_time, model::now()));
        record.version = stored.version + 1;

        storage.insert(key, serde_json::to_vec(&entity)?);

        Ok(entity)
    }

    fn delete<E: VersionedEntity>(&self, id: &str) -> Result<bool, StoreError> {
        let key = Self::make_key(E::COLLECTION, id);
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        Ok(storage.remove(&key).is_some())
    }
}

/// Sort by `field`, breaking ties by id so pagination is stable.
fn sort_documents<E: VersionedEntity>(items: &mut [(Value, E)], field: &str, order: SortOrder) {
    items.sort_by(|(a_doc, a), (b_doc, b)| {
        let ordering = match field {
            "id" => a.id().cmp(b.id()),
            "created_time" => a.record().created_time.cmp(&b.record().created_time),
            "modified_time" => a.record().modified_time.cmp(&b.record().modified_time),
            "version" => a.version().cmp(&b.version()),
            _ => compare_values(
                a_doc.get(field).unwrap_or(&Value::Null),
                b_doc.get(field).unwrap_or(&Value::Null),
            ),
        };
        let ordering = match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        ordering.then_with(|| a.id().cmp(b.id()))
    });
}

/// Null < bool < number < string; other shapes compare equal.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

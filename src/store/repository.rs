//! EntityRepository - Typed accessor for entity store operations.

use std::marker::PhantomData;

use super::{EntityStore, Query, StoreError};
use crate::model::VersionedEntity;

/// Typed repository wrapper for accessing entities of a specific type.
pub struct EntityRepository<'a, S, E> {
    store: &'a S,
    _marker: PhantomData<E>,
}

impl<'a, S: EntityStore, E: VersionedEntity> EntityRepository<'a, S, E> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Get an entity by ID.
    pub fn get(&self, id: &str) -> Result<Option<E>, StoreError> {
        self.store.get(id)
    }

    /// Get an entity by ID, treating absence as `StoreError::NotFound`.
    pub fn require(&self, id: &str) -> Result<E, StoreError> {
        self.store
            .get(id)?
            .ok_or_else(|| StoreError::not_found::<E>(id))
    }

    /// Entities matching the query.
    pub fn query(&self, query: &Query) -> Result<Vec<E>, StoreError> {
        self.store.query(query)
    }

    /// Entities matching the query together with the unpaginated total.
    pub fn page(&self, query: &Query) -> Result<(Vec<E>, usize), StoreError> {
        let items = self.store.query(query)?;
        let total = self.store.count::<E>(query)?;
        Ok((items, total))
    }

    /// Number of entities matching the query's filters.
    pub fn count(&self, query: &Query) -> Result<usize, StoreError> {
        self.store.count::<E>(query)
    }

    /// Insert a new entity.
    pub fn insert(&self, entity: &E) -> Result<E, StoreError> {
        self.store.insert(entity)
    }

    /// Conditionally update an entity at its current version.
    pub fn update(&self, entity: &E) -> Result<E, StoreError> {
        self.store.update(entity)
    }

    /// Delete an entity by ID. Returns true if it existed.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.store.delete::<E>(id)
    }
}

/// Extension trait for typed entity access on any EntityStore.
pub trait EntitiesExt: EntityStore + Sized {
    /// Get a typed entity repository.
    fn entities<E: VersionedEntity>(&self) -> EntityRepository<'_, Self, E> {
        EntityRepository::new(self)
    }
}

impl<S: EntityStore> EntitiesExt for S {}

//! Version Guard - read, mutate a copy, write back only if nothing changed.
//!
//! Every update path goes through [`VersionGuard`]:
//!
//! 1. read the current entity (NotFound if absent);
//! 2. let the caller mutate the in-memory copy;
//! 3. write it with the version captured at read time.
//!
//! Two callers racing from the same version get exactly one success; the
//! other sees `VersionConflict`. The guard never retries by itself: whether
//! to re-read and try again is the caller's decision, see
//! [`retry_on_conflict`].

use crate::error::CatalogError;
use crate::model::VersionedEntity;
use crate::store::EntityStore;

/// Optimistic-concurrency protocol over an [`EntityStore`].
pub struct VersionGuard<'a, S> {
    store: &'a S,
}

impl<'a, S: EntityStore> VersionGuard<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Read `id`, apply `mutate`, and write at the version just read.
    ///
    /// If `mutate` returns an error nothing is written.
    pub fn update<E, F>(&self, id: &str, mutate: F) -> Result<E, CatalogError>
    where
        E: VersionedEntity,
        F: FnOnce(&mut E) -> Result<(), CatalogError>,
    {
        self.run(id, None, mutate)
    }

    /// Like [`update`](Self::update), but the caller states the version it
    /// last saw. A mismatch fails with `VersionConflict` before any write.
    pub fn update_expecting<E, F>(
        &self,
        id: &str,
        expected: u64,
        mutate: F,
    ) -> Result<E, CatalogError>
    where
        E: VersionedEntity,
        F: FnOnce(&mut E) -> Result<(), CatalogError>,
    {
        self.run(id, Some(expected), mutate)
    }

    fn run<E, F>(&self, id: &str, expected: Option<u64>, mutate: F) -> Result<E, CatalogError>
    where
        E: VersionedEntity,
        F: FnOnce(&mut E) -> Result<(), CatalogError>,
    {
        let mut draft: E = self
            .store
            .get(id)?
            .ok_or_else(|| CatalogError::not_found(E::KIND, id))?;
        let captured = draft.record().clone();

        if let Some(expected) = expected {
            if expected != captured.version {
                tracing::warn!(
                    kind = E::KIND,
                    id,
                    expected,
                    actual = captured.version,
                    "stale version submitted"
                );
                return Err(CatalogError::VersionConflict {
                    kind: E::KIND.to_string(),
                    id: id.to_string(),
                    expected,
                    actual: captured.version,
                });
            }
        }

        mutate(&mut draft)?;
        // Identity, timestamps and version belong to the store.
        *draft.record_mut() = captured;

        match self.store.update(&draft) {
            Ok(written) => {
                tracing::debug!(kind = E::KIND, id, version = written.version(), "entity updated");
                Ok(written)
            }
            Err(err) => {
                let err = CatalogError::from(err);
                if let CatalogError::VersionConflict { .. } = err {
                    tracing::warn!(kind = E::KIND, id, "lost update race: {}", err);
                }
                Err(err)
            }
        }
    }
}

/// Run `op` up to `attempts` times, repeating only on `VersionConflict`.
///
/// `op` must redo the whole read-validate-write each time, so business
/// checks always run against the snapshot that is written.
pub fn retry_on_conflict<T, F>(attempts: usize, mut op: F) -> Result<T, CatalogError>
where
    F: FnMut() -> Result<T, CatalogError>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Err(err @ CatalogError::VersionConflict { .. }) if attempt < attempts => {
                tracing::debug!(attempt, "retrying after {}", err);
                attempt += 1;
            }
            result => return result,
        }
    }
}

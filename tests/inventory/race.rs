//! Concurrent writers against one book.

use std::sync::Barrier;
use std::thread;

use catalog_rust::{retry_on_conflict, Catalog, CatalogError, EntityStore, VersionedEntity};

use crate::support::{self, stocked};

/// Two sales of 6 against 10 on hand: exactly one wins.
fn competing_sales<S: EntityStore>(catalog: Catalog<S>) {
    let book = stocked(&catalog, 10);
    let barrier = Barrier::new(2);

    let results: Vec<Result<_, CatalogError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    catalog.sale_book(book.id(), 6)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for result in &results {
        if let Err(err) = result {
            assert!(
                matches!(
                    err,
                    CatalogError::VersionConflict { .. } | CatalogError::InsufficientStock { .. }
                ),
                "unexpected error: {err}"
            );
        }
    }

    let stored = catalog.get_book(book.id()).unwrap();
    assert_eq!(stored.current_amount, 4);
    assert_eq!(stored.sold_amount, 6);
    assert_eq!(stored.version(), 2);
}

/// Without retries, every lost race is reported and nothing is lost silently.
fn lost_fills_are_reported<S: EntityStore>(catalog: Catalog<S>) {
    const WRITERS: usize = 8;
    let book = stocked(&catalog, 0);
    let barrier = Barrier::new(WRITERS);

    let results: Vec<Result<_, CatalogError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..WRITERS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    catalog.fill_book(book.id(), 1)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let successes = results.iter().filter(|r| r.is_ok()).count() as u64;
    assert!(successes >= 1);
    assert!(results.iter().all(|r| match r {
        Ok(_) => true,
        Err(err) => matches!(err, CatalogError::VersionConflict { .. }),
    }));

    let stored = catalog.get_book(book.id()).unwrap();
    assert_eq!(stored.current_amount, successes);
    assert_eq!(stored.version(), 1 + successes);
}

/// Callers that retry on conflict sell out exactly, never below zero.
fn retried_sales_sell_out<S: EntityStore>(catalog: Catalog<S>) {
    const BUYERS: usize = 6;
    let book = stocked(&catalog, BUYERS as u64);
    let barrier = Barrier::new(BUYERS);

    thread::scope(|scope| {
        for _ in 0..BUYERS {
            scope.spawn(|| {
                barrier.wait();
                // Each conflict means another buyer won, so BUYERS attempts suffice.
                retry_on_conflict(BUYERS, || catalog.sale_book(book.id(), 1)).unwrap();
            });
        }
    });

    let stored = catalog.get_book(book.id()).unwrap();
    assert_eq!(stored.current_amount, 0);
    assert_eq!(stored.sold_amount, BUYERS as u64);
    assert_eq!(stored.version(), 1 + BUYERS as u64);

    assert!(matches!(
        catalog.sale_book(book.id(), 1),
        Err(CatalogError::InsufficientStock { remaining: 0, .. })
    ));
}

#[test]
fn in_memory_competing_sales() {
    competing_sales(support::in_memory());
}

#[test]
fn in_memory_lost_fills_are_reported() {
    lost_fills_are_reported(support::in_memory());
}

#[test]
fn in_memory_retried_sales_sell_out() {
    retried_sales_sell_out(support::in_memory());
}

#[cfg(feature = "sqlite")]
#[test]
fn sqlite_competing_sales() {
    competing_sales(support::sqlite());
}

#[cfg(feature = "sqlite")]
#[test]
fn sqlite_lost_fills_are_reported() {
    lost_fills_are_reported(support::sqlite());
}

#[cfg(feature = "sqlite")]
#[test]
fn sqlite_retried_sales_sell_out() {
    retried_sales_sell_out(support::sqlite());
}

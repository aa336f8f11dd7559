//! Reviews are scoped to their book and feed its average score.

use catalog_rust::{Catalog, EntityStore, Query, Review, ReviewInput, VersionedEntity};

use crate::book;

fn review(score: i32) -> ReviewInput {
    ReviewInput {
        score,
        description: "worth reading".into(),
        version: None,
    }
}

fn average_and_cascade<S: EntityStore>(catalog: Catalog<S>) {
    let dune = catalog.create_book(book("Dune", "scifi")).unwrap();
    let emma = catalog.create_book(book("Emma", "classic")).unwrap();

    for score in [3, 4, 5] {
        catalog.create_review(dune.id(), review(score)).unwrap();
    }
    catalog.create_review(emma.id(), review(1)).unwrap();

    assert_eq!(catalog.get_book(dune.id()).unwrap().average_score, Some(4.0));
    assert_eq!(catalog.list_reviews(dune.id()).unwrap().len(), 3);

    // The derived score never reaches storage or the version counter.
    let stored = catalog.store().get::<catalog_rust::Book>(dune.id()).unwrap().unwrap();
    assert_eq!(stored.average_score, None);
    assert_eq!(stored.version(), 1);

    catalog.delete_book(dune.id()).unwrap();
    let remaining = catalog.store().query::<Review>(&Query::new()).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].book_id, emma.id());
}

fn scoped_to_book<S: EntityStore>(catalog: Catalog<S>) {
    let dune = catalog.create_book(book("Dune", "scifi")).unwrap();
    let emma = catalog.create_book(book("Emma", "classic")).unwrap();
    let on_dune = catalog.create_review(dune.id(), review(4)).unwrap();

    assert_eq!(
        catalog.get_review(emma.id(), on_dune.id()).unwrap_err().status_code(),
        404
    );
    assert_eq!(
        catalog.delete_review(emma.id(), on_dune.id()).unwrap_err().status_code(),
        404
    );
    assert!(catalog.list_reviews(emma.id()).unwrap().is_empty());

    let mut changes = review(2);
    changes.version = Some(on_dune.version());
    let updated = catalog
        .update_review(dune.id(), on_dune.id(), changes.clone())
        .unwrap();
    assert_eq!(updated.score, 2);
    assert_eq!(updated.version(), 2);

    // Same payload again carries a stale version now.
    assert_eq!(
        catalog
            .update_review(dune.id(), on_dune.id(), changes)
            .unwrap_err()
            .status_code(),
        409
    );
}

#[test]
fn in_memory_average_and_cascade() {
    average_and_cascade(crate::in_memory());
}

#[test]
fn in_memory_scoped_to_book() {
    scoped_to_book(crate::in_memory());
}

#[cfg(feature = "sqlite")]
#[test]
fn sqlite_average_and_cascade() {
    average_and_cascade(crate::sqlite());
}

#[cfg(feature = "sqlite")]
#[test]
fn sqlite_scoped_to_book() {
    scoped_to_book(crate::sqlite());
}

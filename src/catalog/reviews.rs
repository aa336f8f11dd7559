use super::Catalog;
use crate::error::CatalogError;
use crate::model::{Book, Review, ReviewInput, VersionedEntity};
use crate::store::{EntityStore, Query, SortOrder};

impl<S: EntityStore> Catalog<S> {
    /// Add a review to an existing book.
    pub fn create_review(&self, book_id: &str, input: ReviewInput) -> Result<Review, CatalogError> {
        self.require_book(book_id)?;

        let created = self.reviews().insert(&input.into_review(book_id))?;
        tracing::info!(book_id, review_id = created.id(), "create new review");
        self.get_review(book_id, created.id())
    }

    /// Get a review that belongs to `book_id`.
    pub fn get_review(&self, book_id: &str, id: &str) -> Result<Review, CatalogError> {
        let review = self.reviews().require(id)?;
        if review.book_id != book_id {
            return Err(CatalogError::not_found(Review::KIND, id));
        }
        Ok(review)
    }

    /// All reviews of a book, oldest first.
    pub fn list_reviews(&self, book_id: &str) -> Result<Vec<Review>, CatalogError> {
        self.require_book(book_id)?;

        let query = Query::new()
            .filter("book_id", book_id)
            .sort_by("created_time", SortOrder::Asc);
        Ok(self.reviews().query(&query)?)
    }

    /// Replace a review's score and description if `input.version` is
    /// still current.
    pub fn update_review(
        &self,
        book_id: &str,
        id: &str,
        input: ReviewInput,
    ) -> Result<Review, CatalogError> {
        // Ownership before any version or payload check.
        self.get_review(book_id, id)?;
        let expected = input
            .version
            .ok_or_else(|| CatalogError::InvalidInput("version is required".into()))?;

        self.guard()
            .update_expecting(id, expected, |review: &mut Review| {
                if review.book_id != book_id {
                    return Err(CatalogError::not_found(Review::KIND, id));
                }
                input.apply_to(review);
                Ok(())
            })?;

        self.get_review(book_id, id)
    }

    /// Delete a review of `book_id`.
    pub fn delete_review(&self, book_id: &str, id: &str) -> Result<(), CatalogError> {
        self.get_review(book_id, id)?;
        if !self.reviews().delete(id)? {
            return Err(CatalogError::not_found(Review::KIND, id));
        }
        tracing::info!(book_id, review_id = id, "review deleted");
        Ok(())
    }

    fn require_book(&self, book_id: &str) -> Result<Book, CatalogError> {
        Ok(self.books().require(book_id)?)
    }
}

use serde::Serialize;

use super::Catalog;
use crate::error::CatalogError;
use crate::model::{Book, BookInput, Review, VersionedEntity};
use crate::store::{EntityStore, Query, SortOrder};

/// Listing parameters for books.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookQuery {
    /// Exact title match.
    pub title: Option<String>,
    pub sort_by: Option<String>,
    pub order: SortOrder,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl BookQuery {
    fn to_query(&self) -> Query {
        let mut query = Query::new().offset(self.offset);
        if let Some(title) = &self.title {
            query = query.filter("title", title.as_str());
        }
        if let Some(sort_by) = &self.sort_by {
            query = query.sort_by(sort_by, self.order);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }
}

/// One page of books plus the total number matching the filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookPage {
    pub books: Vec<Book>,
    pub total: usize,
}

impl<S: EntityStore> Catalog<S> {
    /// Validate and insert a new book, returning its persisted form.
    pub fn create_book(&self, input: BookInput) -> Result<Book, CatalogError> {
        input.validate()?;
        tracing::info!(title = %input.title, "create new book");

        let created = self.books().insert(&input.into_book())?;
        self.get_book(created.id())
    }

    /// Get a book with its average review score.
    pub fn get_book(&self, id: &str) -> Result<Book, CatalogError> {
        let mut book = self.books().require(id)?;
        book.average_score = self.average_score(id)?;
        Ok(book)
    }

    /// List books matching the query, with the unpaginated total.
    pub fn list_books(&self, query: &BookQuery) -> Result<BookPage, CatalogError> {
        let (mut books, total) = self.books().page(&query.to_query())?;
        for book in books.iter_mut() {
            book.average_score = self.average_score(book.id())?;
        }
        Ok(BookPage { books, total })
    }

    /// Replace a book's mutable fields if `input.version` is still current.
    pub fn update_book(&self, id: &str, input: BookInput) -> Result<Book, CatalogError> {
        input.validate()?;
        let expected = input
            .version
            .ok_or_else(|| CatalogError::InvalidInput("version is required".into()))?;

        self.guard()
            .update_expecting(id, expected, |book: &mut Book| {
                input.apply_to(book);
                Ok(())
            })?;

        self.get_book(id)
    }

    /// Delete a book, then its reviews.
    ///
    /// The two steps are separate writes; a review created concurrently
    /// with the delete may survive it.
    pub fn delete_book(&self, id: &str) -> Result<(), CatalogError> {
        if !self.books().delete(id)? {
            return Err(CatalogError::not_found(Book::KIND, id));
        }

        let orphans = self.reviews().query(&Query::new().filter("book_id", id))?;
        for review in &orphans {
            self.reviews().delete(review.id())?;
        }

        tracing::info!(book_id = id, reviews = orphans.len(), "book deleted");
        Ok(())
    }

    /// Add stock to a book.
    pub fn fill_book(&self, id: &str, amount: u64) -> Result<Book, CatalogError> {
        let mut book = self.ledger().fill(id, amount)?;
        book.average_score = self.average_score(id)?;
        Ok(book)
    }

    /// Sell stock from a book.
    pub fn sale_book(&self, id: &str, amount: u64) -> Result<Book, CatalogError> {
        let mut book = self.ledger().sale(id, amount)?;
        book.average_score = self.average_score(id)?;
        Ok(book)
    }

    /// Mean score of the book's reviews, None without reviews.
    fn average_score(&self, book_id: &str) -> Result<Option<f64>, CatalogError> {
        let reviews: Vec<Review> = self
            .reviews()
            .query(&Query::new().filter("book_id", book_id))?;
        if reviews.is_empty() {
            return Ok(None);
        }

        let sum: f64 = reviews.iter().map(|r| f64::from(r.score)).sum();
        Ok(Some(sum / reviews.len() as f64))
    }
}

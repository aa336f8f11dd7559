use serde::{Deserialize, Serialize};

use super::{Record, VersionedEntity};
use crate::error::CatalogError;

/// A catalog book with its two stock counters.
///
/// `sold_amount` only grows through sales; `current_amount` is stock on hand
/// and is unsigned, so it can never go negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(flatten)]
    pub record: Record,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub synopsis: String,
    #[serde(default)]
    pub isbn10: String,
    #[serde(default)]
    pub isbn13: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub edition: String,
    #[serde(default)]
    pub sold_amount: u64,
    #[serde(default)]
    pub current_amount: u64,
    #[serde(default)]
    pub paperback_price: Option<f64>,
    #[serde(default)]
    pub ebook_price: Option<f64>,
    /// Mean review score, filled in at read time.
    #[serde(default)]
    pub average_score: Option<f64>,
}

impl VersionedEntity for Book {
    const COLLECTION: &'static str = "books";
    const KIND: &'static str = "book";
    const FILTERABLE: &'static [&'static str] = &["title", "category", "language", "publisher"];
    const SORTABLE: &'static [&'static str] = &[
        "title",
        "category",
        "language",
        "publisher",
        "sold_amount",
        "current_amount",
        "paperback_price",
        "ebook_price",
    ];

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    fn clear_derived(&mut self) {
        self.average_score = None;
    }
}

/// Client-supplied book fields for create and update.
///
/// `version` is the version the client last read; it is required on update
/// and ignored on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub synopsis: String,
    #[serde(default)]
    pub isbn10: String,
    #[serde(default)]
    pub isbn13: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub edition: String,
    #[serde(default)]
    pub sold_amount: u64,
    #[serde(default)]
    pub current_amount: u64,
    #[serde(default)]
    pub paperback_price: Option<f64>,
    #[serde(default)]
    pub ebook_price: Option<f64>,
    #[serde(default)]
    pub version: Option<u64>,
}

impl BookInput {
    /// Reject blank required fields and negative or non-finite prices.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (name, value) in [
            ("title", &self.title),
            ("language", &self.language),
            ("publisher", &self.publisher),
        ] {
            if value.trim().is_empty() {
                return Err(CatalogError::InvalidInput(format!("{} is required", name)));
            }
        }

        for (name, price) in [
            ("paperback_price", self.paperback_price),
            ("ebook_price", self.ebook_price),
        ] {
            if let Some(price) = price {
                if !price.is_finite() || price < 0.0 {
                    return Err(CatalogError::InvalidInput(format!(
                        "{} must be a non-negative number",
                        name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Copy every mutable field onto `book`, leaving its record untouched.
    pub fn apply_to(&self, book: &mut Book) {
        book.title = self.title.clone();
        book.synopsis = self.synopsis.clone();
        book.isbn10 = self.isbn10.clone();
        book.isbn13 = self.isbn13.clone();
        book.category = self.category.clone();
        book.language = self.language.clone();
        book.publisher = self.publisher.clone();
        book.edition = self.edition.clone();
        book.sold_amount = self.sold_amount;
        book.current_amount = self.current_amount;
        book.paperback_price = self.paperback_price;
        book.ebook_price = self.ebook_price;
    }

    pub fn into_book(self) -> Book {
        let mut book = Book::default();
        self.apply_to(&mut book);
        book
    }
}

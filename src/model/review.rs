use serde::{Deserialize, Serialize};

use super::{Record, VersionedEntity};

/// A review left on a book. Many reviews per book.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub record: Record,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub book_id: String,
}

impl VersionedEntity for Review {
    const COLLECTION: &'static str = "reviews";
    const KIND: &'static str = "review";
    const FILTERABLE: &'static [&'static str] = &["book_id", "score"];
    const SORTABLE: &'static [&'static str] = &["score"];

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

/// Client-supplied review fields. The owning book comes from the route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewInput {
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: Option<u64>,
}

impl ReviewInput {
    pub fn apply_to(&self, review: &mut Review) {
        review.score = self.score;
        review.description = self.description.clone();
    }

    pub fn into_review(self, book_id: impl Into<String>) -> Review {
        let mut review = Review {
            book_id: book_id.into(),
            ..Default::default()
        };
        self.apply_to(&mut review);
        review
    }
}

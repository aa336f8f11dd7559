use std::collections::BTreeMap;

use serde::Serialize;

use super::Catalog;
use crate::error::CatalogError;
use crate::model::Book;
use crate::store::{EntityStore, Query};

/// Sales figure for one title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestSellerBook {
    pub title: String,
    pub total_sale_amount: u64,
}

/// Sales figure for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestSellerCategory {
    pub category: String,
    pub total_sale_amount: u64,
}

impl<S: EntityStore> Catalog<S> {
    /// Titles ranked by their best-selling edition.
    pub fn best_selling_books(&self) -> Result<Vec<BestSellerBook>, CatalogError> {
        let books = self.books().query(&Query::new())?;
        Ok(rank_by(&books, |b| &b.title)
            .into_iter()
            .map(|(title, total_sale_amount)| BestSellerBook {
                title,
                total_sale_amount,
            })
            .collect())
    }

    /// Categories ranked by their best-selling book.
    pub fn best_selling_categories(&self) -> Result<Vec<BestSellerCategory>, CatalogError> {
        let books = self.books().query(&Query::new())?;
        Ok(rank_by(&books, |b| &b.category)
            .into_iter()
            .map(|(category, total_sale_amount)| BestSellerCategory {
                category,
                total_sale_amount,
            })
            .collect())
    }
}

/// Group by `key`, keep the highest `sold_amount` per group, sort descending.
fn rank_by<F>(books: &[Book], key: F) -> Vec<(String, u64)>
where
    F: Fn(&Book) -> &String,
{
    let mut groups: BTreeMap<&str, u64> = BTreeMap::new();
    for book in books {
        let best = groups.entry(key(book).as_str()).or_insert(0);
        *best = (*best).max(book.sold_amount);
    }

    let mut ranked: Vec<(String, u64)> = groups
        .into_iter()
        .map(|(name, amount)| (name.to_string(), amount))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

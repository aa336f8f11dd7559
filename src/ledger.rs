//! Inventory Ledger - stock fill and sale under the version guard.
//!
//! Both operations validate their input before touching storage, then run
//! one guarded read-modify-write. The stock check for a sale runs against the
//! exact snapshot that is written, so a concurrent change between read and
//! write surfaces as `VersionConflict` instead of a negative stock level.

use crate::error::CatalogError;
use crate::guard::VersionGuard;
use crate::model::Book;
use crate::store::EntityStore;

pub struct InventoryLedger<'a, S> {
    guard: VersionGuard<'a, S>,
}

impl<'a, S: EntityStore> InventoryLedger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            guard: VersionGuard::new(store),
        }
    }

    /// Add `amount` to the book's stock on hand.
    pub fn fill(&self, book_id: &str, amount: u64) -> Result<Book, CatalogError> {
        check_amount(amount)?;

        let book = self.guard.update(book_id, |book: &mut Book| {
            book.current_amount = book.current_amount.checked_add(amount).ok_or_else(|| {
                CatalogError::InvalidInput("fill amount overflows the stock counter".into())
            })?;
            Ok(())
        })?;

        tracing::info!(book_id, amount, current = book.current_amount, "stock filled");
        Ok(book)
    }

    /// Take `amount` out of stock and record it as sold.
    ///
    /// Fails with `InsufficientStock` (and writes nothing) when fewer than
    /// `amount` items are on hand.
    pub fn sale(&self, book_id: &str, amount: u64) -> Result<Book, CatalogError> {
        check_amount(amount)?;

        let book = self.guard.update(book_id, |book: &mut Book| {
            if amount > book.current_amount {
                tracing::warn!(
                    book_id,
                    amount,
                    remaining = book.current_amount,
                    "sale exceeds stock"
                );
                return Err(CatalogError::InsufficientStock {
                    id: book_id.to_string(),
                    remaining: book.current_amount,
                });
            }
            book.current_amount -= amount;
            book.sold_amount = book.sold_amount.checked_add(amount).ok_or_else(|| {
                CatalogError::InvalidInput("sale amount overflows the sold counter".into())
            })?;
            Ok(())
        })?;

        tracing::info!(book_id, amount, current = book.current_amount, "stock sold");
        Ok(book)
    }
}

fn check_amount(amount: u64) -> Result<(), CatalogError> {
    if amount == 0 {
        return Err(CatalogError::InvalidInput("amount must be more than 0".into()));
    }
    Ok(())
}

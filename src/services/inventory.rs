//! Copy inventory service
//!
//! Librarians may place and lift holds (`available` <-> `reserved`).
//! Moving a copy into or out of `borrowed` belongs to the order lifecycle.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::copy::{BookCopy, CopyStatus},
    repository::Repository,
};

/// Largest batch accepted by [`InventoryService::add_copies`]
pub const MAX_BATCH: u32 = 1000;

#[derive(Clone)]
pub struct InventoryService {
    repository: Repository,
}

impl InventoryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Available copies of an existing book, in allocation order
    pub async fn list_available(&self, book_id: Uuid) -> AppResult<Vec<BookCopy>> {
        // 404 for unknown books rather than an empty list
        self.repository.books.get(book_id).await?;
        self.repository.copies.list_available(book_id).await
    }

    /// Add copies to an existing book
    pub async fn add_copies(&self, book_id: Uuid, count: u32) -> AppResult<Vec<BookCopy>> {
        if count == 0 || count > MAX_BATCH {
            return Err(AppError::Validation(format!(
                "count must be between 1 and {}",
                MAX_BATCH
            )));
        }

        let copies = self.repository.copies.create_batch(book_id, count).await?;
        tracing::info!(%book_id, count, "Copies added");
        Ok(copies)
    }

    /// Place or lift a hold on a copy
    pub async fn set_copy_status(&self, copy_id: Uuid, status: CopyStatus) -> AppResult<BookCopy> {
        if status == CopyStatus::Borrowed {
            return Err(AppError::InvalidTransition(
                "Copies are borrowed through orders".to_string(),
            ));
        }

        // The ledger refuses borrowed copies under the same lock as the write
        self.repository.copies.set_hold(copy_id, status).await
    }
}

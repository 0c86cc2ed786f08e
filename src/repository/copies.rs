//! Copy inventory ledger
//!
//! The ledger is the only code that writes `book_copies.status`. Order
//! creation and completion reach it through [`CopiesRepository::allocate`]
//! and [`CopiesRepository::release`] inside the order transaction.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::copy::{BookCopy, CopyStatus},
};

use super::finish;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CopyLedger: Send + Sync {
    /// Available copies of a book, oldest `added_at` first (ties by `copy_id`)
    async fn list_available(&self, book_id: Uuid) -> AppResult<Vec<BookCopy>>;

    /// Get a single copy
    async fn get(&self, copy_id: Uuid) -> AppResult<BookCopy>;

    /// Place or lift a hold. Only `available <-> reserved` is accepted; the
    /// check and the write happen under one row lock.
    async fn set_hold(&self, copy_id: Uuid, status: CopyStatus) -> AppResult<BookCopy>;

    /// Add `count` available copies to an existing book
    async fn create_batch(&self, book_id: Uuid, count: u32) -> AppResult<Vec<BookCopy>>;
}

pub(crate) fn not_found(copy_id: Uuid) -> AppError {
    AppError::NotFound(format!("Book copy {} not found", copy_id))
}

pub(crate) fn invalid_transition(copy_id: Uuid, from: CopyStatus, to: CopyStatus) -> AppError {
    AppError::InvalidTransition(format!(
        "Book copy {} cannot change from {} to {}",
        copy_id, from, to
    ))
}

#[derive(Clone)]
pub struct CopiesRepository {
    pool: Pool<Postgres>,
}

impl CopiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Mark the oldest available copy of a book borrowed, in one statement.
    /// Rows locked by a concurrent allocation are skipped, so two callers
    /// never receive the same copy.
    pub(crate) async fn allocate(
        conn: &mut PgConnection,
        book_id: Uuid,
    ) -> AppResult<Option<BookCopy>> {
        let copy = sqlx::query_as::<_, BookCopy>(
            r#"
            UPDATE book_copies
            SET status = 'borrowed'
            WHERE copy_id = (
                SELECT copy_id FROM book_copies
                WHERE book_id = $1 AND status = 'available'
                ORDER BY added_at, copy_id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            AND status = 'available'
            RETURNING copy_id, book_id, status, added_at
            "#,
        )
        .bind(book_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(copy)
    }

    /// Put a borrowed copy back into the pool. Returns `None` when the copy
    /// was not borrowed.
    pub(crate) async fn release(
        conn: &mut PgConnection,
        copy_id: Uuid,
    ) -> AppResult<Option<BookCopy>> {
        let copy = sqlx::query_as::<_, BookCopy>(
            r#"
            UPDATE book_copies
            SET status = 'available'
            WHERE copy_id = $1 AND status = 'borrowed'
            RETURNING copy_id, book_id, status, added_at
            "#,
        )
        .bind(copy_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(copy)
    }

    /// Insert `count` available copies stamped with the same `added_at`
    pub(crate) async fn insert_batch(
        conn: &mut PgConnection,
        book_id: Uuid,
        count: u32,
    ) -> AppResult<Vec<BookCopy>> {
        let now = Utc::now();
        let mut copies = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let copy = BookCopy::new(book_id, now);
            let inserted = sqlx::query_as::<_, BookCopy>(
                r#"
                INSERT INTO book_copies (copy_id, book_id, status, added_at)
                VALUES ($1, $2, $3, $4)
                RETURNING copy_id, book_id, status, added_at
                "#,
            )
            .bind(copy.copy_id)
            .bind(copy.book_id)
            .bind(copy.status)
            .bind(copy.added_at)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| AppError::from_write(e, "book copy"))?;
            copies.push(inserted);
        }

        Ok(copies)
    }

    async fn set_hold_in(
        conn: &mut PgConnection,
        copy_id: Uuid,
        status: CopyStatus,
    ) -> AppResult<BookCopy> {
        let current = sqlx::query_as::<_, BookCopy>(
            "SELECT copy_id, book_id, status, added_at FROM book_copies WHERE copy_id = $1 FOR UPDATE",
        )
        .bind(copy_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found(copy_id))?;

        if !current.status.is_hold_transition(status) {
            return Err(invalid_transition(copy_id, current.status, status));
        }

        sqlx::query_as::<_, BookCopy>(
            r#"
            UPDATE book_copies SET status = $2
            WHERE copy_id = $1 AND status IN ('available', 'reserved')
            RETURNING copy_id, book_id, status, added_at
            "#,
        )
        .bind(copy_id)
        .bind(status)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_write(e, "copy status"))
    }

    async fn create_batch_in(
        conn: &mut PgConnection,
        book_id: Uuid,
        count: u32,
    ) -> AppResult<Vec<BookCopy>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE book_id = $1)")
                .bind(book_id)
                .fetch_one(&mut *conn)
                .await?;

        if !exists {
            return Err(AppError::NotFound(format!("Book {} not found", book_id)));
        }

        Self::insert_batch(conn, book_id, count).await
    }
}

#[async_trait]
impl CopyLedger for CopiesRepository {
    async fn list_available(&self, book_id: Uuid) -> AppResult<Vec<BookCopy>> {
        tracing::debug!(%book_id, "Fetching available copies");

        let copies = sqlx::query_as::<_, BookCopy>(
            r#"
            SELECT copy_id, book_id, status, added_at
            FROM book_copies
            WHERE book_id = $1 AND status = 'available'
            ORDER BY added_at, copy_id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(copies)
    }

    async fn get(&self, copy_id: Uuid) -> AppResult<BookCopy> {
        sqlx::query_as::<_, BookCopy>(
            "SELECT copy_id, book_id, status, added_at FROM book_copies WHERE copy_id = $1",
        )
        .bind(copy_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(copy_id))
    }

    async fn set_hold(&self, copy_id: Uuid, status: CopyStatus) -> AppResult<BookCopy> {
        tracing::info!(%copy_id, %status, "Updating book copy hold");

        let mut tx = self.pool.begin().await?;
        let result = Self::set_hold_in(&mut *tx, copy_id, status).await;
        finish(tx, result).await
    }

    async fn create_batch(&self, book_id: Uuid, count: u32) -> AppResult<Vec<BookCopy>> {
        tracing::info!(%book_id, count, "Creating book copies");

        let mut tx = self.pool.begin().await?;
        let result = Self::create_batch_in(&mut *tx, book_id, count).await;
        finish(tx, result).await
    }
}

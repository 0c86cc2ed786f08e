//! Book catalog repository

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetails},
        PageRequest,
    },
};

use super::{copies::CopiesRepository, finish};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// Insert a book together with `copies` available copies
    async fn create(&self, book: Book, copies: u32) -> AppResult<BookDetails>;

    /// Get a book with its available copy count
    async fn get(&self, book_id: Uuid) -> AppResult<BookDetails>;

    /// Books ordered by title. Returns up to `page.fetch_limit()` rows.
    async fn list(&self, page: PageRequest) -> AppResult<Vec<BookDetails>>;
}

pub(crate) fn not_found(book_id: Uuid) -> AppError {
    AppError::NotFound(format!("Book {} not found", book_id))
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn create_in(conn: &mut PgConnection, book: Book, copies: u32) -> AppResult<BookDetails> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (book_id, title, author, isbn, publication_year, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING book_id, title, author, isbn, publication_year, description
            "#,
        )
        .bind(book.book_id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.publication_year)
        .bind(&book.description)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_write(e, "book"))?;

        let created = CopiesRepository::insert_batch(&mut *conn, book.book_id, copies).await?;

        Ok(BookDetails::from_book(book, created.len() as i64))
    }
}

#[async_trait]
impl BookCatalog for BooksRepository {
    async fn create(&self, book: Book, copies: u32) -> AppResult<BookDetails> {
        tracing::info!(title = %book.title, copies, "Creating book");

        let mut tx = self.pool.begin().await?;
        let result = Self::create_in(&mut *tx, book, copies).await;
        finish(tx, result).await
    }

    async fn get(&self, book_id: Uuid) -> AppResult<BookDetails> {
        sqlx::query_as::<_, BookDetails>(
            r#"
            SELECT b.book_id, b.title, b.author, b.isbn, b.publication_year, b.description,
                   (SELECT COUNT(*) FROM book_copies c
                    WHERE c.book_id = b.book_id AND c.status = 'available') AS available_copies
            FROM books b
            WHERE b.book_id = $1
            "#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(book_id))
    }

    async fn list(&self, page: PageRequest) -> AppResult<Vec<BookDetails>> {
        let books = sqlx::query_as::<_, BookDetails>(
            r#"
            SELECT b.book_id, b.title, b.author, b.isbn, b.publication_year, b.description,
                   (SELECT COUNT(*) FROM book_copies c
                    WHERE c.book_id = b.book_id AND c.status = 'available') AS available_copies
            FROM books b
            ORDER BY b.title, b.book_id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.fetch_limit())
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }
}

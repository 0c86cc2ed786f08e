//! Book catalog service

use uuid::Uuid;
use validator::Validate;

use crate::{
    config::OrdersConfig,
    error::AppResult,
    models::book::{BookDetails, BookPage, CreateBook},
    repository::Repository,
};

use super::page_request;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    config: OrdersConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, config: OrdersConfig) -> Self {
        Self { repository, config }
    }

    /// Add a book together with its initial copies
    pub async fn create_book(&self, request: CreateBook) -> AppResult<BookDetails> {
        request.validate()?;

        let copies = request.num_copies;
        let book = self.repository.books.create(request.into_book(), copies).await?;

        tracing::info!(book_id = %book.book_id, copies, "Book added to catalog");
        Ok(book)
    }

    /// Get a book with its available copy count
    pub async fn get_book(&self, book_id: Uuid) -> AppResult<BookDetails> {
        self.repository.books.get(book_id).await
    }

    /// List books ordered by title
    pub async fn list_books(&self, limit: Option<i64>, offset: Option<i64>) -> AppResult<BookPage> {
        let page = page_request(&self.config, limit, offset)?;

        if page.limit <= 0 {
            return Ok(BookPage {
                books: Vec::new(),
                page: page.page(),
                has_next: false,
            });
        }

        let rows = self.repository.books.list(page).await?;
        let (books, has_next) = page.split(rows);

        Ok(BookPage {
            books,
            page: page.page(),
            has_next,
        })
    }
}

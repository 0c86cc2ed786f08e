//! Catalog book model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub book_id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: Option<i32>,
    pub description: Option<String>,
}

/// Book with its current number of available copies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookDetails {
    pub book_id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: Option<i32>,
    pub description: Option<String>,
    pub available_copies: i64,
}

impl BookDetails {
    pub fn from_book(book: Book, available_copies: i64) -> Self {
        Self {
            book_id: book.book_id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            publication_year: book.publication_year,
            description: book.description,
            available_copies,
        }
    }
}

/// One page of the catalog
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookPage {
    pub books: Vec<BookDetails>,
    pub page: i64,
    pub has_next: bool,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"))]
    pub author: String,
    #[validate(length(min = 10, max = 13, message = "ISBN must be 10-13 characters"))]
    pub isbn: String,
    pub publication_year: Option<i32>,
    pub description: Option<String>,
    /// Number of copies created together with the book
    #[serde(default)]
    #[validate(range(max = 1000, message = "At most 1000 copies at once"))]
    pub num_copies: u32,
}

impl CreateBook {
    pub fn into_book(self) -> Book {
        Book {
            book_id: Uuid::new_v4(),
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            publication_year: self.publication_year,
            description: self.description,
        }
    }
}

/// Book ranked by recent order count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PopularBook {
    pub book_id: Uuid,
    pub title: String,
    pub author: String,
    pub order_count: i64,
}

/// Popular books query parameters
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PopularQuery {
    pub limit: Option<i64>,
    /// Trailing window in days
    pub days: Option<i64>,
}

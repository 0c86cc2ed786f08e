//! Catalog and copy inventory endpoints

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::{BookDetails, BookPage, CreateBook, PopularBook, PopularQuery},
        copy::{AddCopies, BookCopy},
    },
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, AuthenticatedUser, Pagination};

/// Add a book and its initial copies
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookDetails),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarian role required", body = crate::error::ErrorResponse),
        (status = 409, description = "ISBN already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(request): ApiJson<CreateBook>,
) -> AppResult<(StatusCode, Json<BookDetails>)> {
    claims.require_librarian()?;

    let book = state.services.catalog.create_book(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// List books by title
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(Pagination),
    responses(
        (status = 200, description = "Page of books", body = BookPage)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<Pagination>,
) -> AppResult<Json<BookPage>> {
    let page = state.services.catalog.list_books(query.limit, query.offset).await?;
    Ok(Json(page))
}

/// Get a book with its available copy count
#[utoipa::path(
    get,
    path = "/books/{book_id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("book_id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    ApiPath(book_id): ApiPath<Uuid>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.catalog.get_book(book_id).await?;
    Ok(Json(book))
}

/// Most ordered books over a trailing window
#[utoipa::path(
    get,
    path = "/books/most-borrowed",
    tag = "books",
    security(("bearer_auth" = [])),
    params(PopularQuery),
    responses(
        (status = 200, description = "Books by order count", body = Vec<PopularBook>)
    )
)]
pub async fn most_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<PopularQuery>,
) -> AppResult<Json<Vec<PopularBook>>> {
    let books = state
        .services
        .reports
        .popular_books(query.days, query.limit)
        .await?;
    Ok(Json(books))
}

/// Available copies of a book, in allocation order
#[utoipa::path(
    get,
    path = "/books/{book_id}/copies",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("book_id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Available copies", body = Vec<BookCopy>),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_copies(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    ApiPath(book_id): ApiPath<Uuid>,
) -> AppResult<Json<Vec<BookCopy>>> {
    let copies = state.services.inventory.list_available(book_id).await?;
    Ok(Json(copies))
}

/// Add copies to a book
#[utoipa::path(
    post,
    path = "/books/{book_id}/copies",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("book_id" = Uuid, Path, description = "Book ID")),
    request_body = AddCopies,
    responses(
        (status = 201, description = "Copies created", body = Vec<BookCopy>),
        (status = 400, description = "Count out of range", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_copies(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(book_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<AddCopies>,
) -> AppResult<(StatusCode, Json<Vec<BookCopy>>)> {
    claims.require_librarian()?;

    let copies = state.services.inventory.add_copies(book_id, request.count).await?;
    Ok((StatusCode::CREATED, Json(copies)))
}

//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, copies, health, orders, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Orders API",
        version = "0.3.0",
        description = "Book orders and copy inventory for a lending library"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Users
        users::signup,
        users::login,
        users::me,
        // Books
        books::create_book,
        books::list_books,
        books::get_book,
        books::most_borrowed,
        books::list_copies,
        books::add_copies,
        // Copies
        copies::set_copy_status,
        // Orders
        orders::create_order,
        orders::my_orders,
        orders::list_user_orders,
        orders::list_active_orders,
        orders::update_order_status,
    ),
    components(
        schemas(
            // Users
            crate::models::user::User,
            crate::models::user::Role,
            crate::models::user::CreateUser,
            crate::models::user::LoginRequest,
            users::LoginResponse,
            // Books
            crate::models::book::BookDetails,
            crate::models::book::BookPage,
            crate::models::book::CreateBook,
            crate::models::book::PopularBook,
            // Copies
            crate::models::copy::BookCopy,
            crate::models::copy::CopyStatus,
            crate::models::copy::AddCopies,
            // Orders
            crate::models::order::Order,
            crate::models::order::OrderDetails,
            crate::models::order::OrderPage,
            crate::models::order::OrderType,
            crate::models::order::OrderStatus,
            crate::models::order::CreateOrder,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Accounts and authentication"),
        (name = "books", description = "Catalog and copy inventory"),
        (name = "copies", description = "Copy holds"),
        (name = "orders", description = "Order lifecycle")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

//! Order endpoints

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::order::{ActiveOrderFilter, CreateOrder, Order, OrderPage, OrderStatusQuery},
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, AuthenticatedUser, Pagination};

/// Order the first available copy of a book
#[utoipa::path(
    post,
    path = "/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    request_body = CreateOrder,
    responses(
        (status = 201, description = "Order placed", body = Order),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Reader role required", body = crate::error::ErrorResponse),
        (status = 404, description = "No available copies", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(request): ApiJson<CreateOrder>,
) -> AppResult<(StatusCode, Json<Order>)> {
    claims.require_reader()?;

    let order = state
        .services
        .orders
        .create_order(claims.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Active orders of the caller
#[utoipa::path(
    get,
    path = "/orders/my_orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(Pagination),
    responses(
        (status = 200, description = "Page of active orders", body = OrderPage),
        (status = 403, description = "Reader role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn my_orders(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<Pagination>,
) -> AppResult<Json<OrderPage>> {
    claims.require_reader()?;

    let page = state
        .services
        .reports
        .list_orders_by_user(ActiveOrderFilter::UserId(claims.user_id), query.limit, query.offset)
        .await?;
    Ok(Json(page))
}

/// Active orders of a given user
#[utoipa::path(
    get,
    path = "/orders/{username}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("username" = String, Path, description = "Username"), Pagination),
    responses(
        (status = 200, description = "Page of active orders", body = OrderPage),
        (status = 403, description = "Librarian role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_user_orders(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(username): ApiPath<String>,
    ApiQuery(query): ApiQuery<Pagination>,
) -> AppResult<Json<OrderPage>> {
    claims.require_librarian()?;

    let page = state
        .services
        .reports
        .list_orders_by_user(ActiveOrderFilter::Username(username), query.limit, query.offset)
        .await?;
    Ok(Json(page))
}

/// Every active order
#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(Pagination),
    responses(
        (status = 200, description = "Page of active orders", body = OrderPage),
        (status = 403, description = "Librarian role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_active_orders(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<Pagination>,
) -> AppResult<Json<OrderPage>> {
    claims.require_librarian()?;

    let page = state
        .services
        .reports
        .list_active_orders(query.limit, query.offset)
        .await?;
    Ok(Json(page))
}

/// Move an order to a new status
#[utoipa::path(
    put,
    path = "/orders/{order_id}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("order_id" = Uuid, Path, description = "Order ID"), OrderStatusQuery),
    responses(
        (status = 200, description = "Order updated", body = Order),
        (status = 400, description = "Unknown status", body = crate::error::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Transition not allowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(order_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<OrderStatusQuery>,
) -> AppResult<Json<Order>> {
    claims.require_librarian()?;

    let order_id = Uuid::parse_str(&order_id)
        .map_err(|_| AppError::Validation(format!("Invalid order ID: {}", order_id)))?;

    let order = state
        .services
        .orders
        .update_order_status(order_id, &query.status)
        .await?;
    Ok(Json(order))
}

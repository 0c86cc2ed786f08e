//! Orders repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::PopularBook,
        order::{ActiveOrderFilter, NewOrder, Order, OrderDetails, OrderStatus},
        PageRequest,
    },
};

use super::{copies::CopiesRepository, finish};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Allocate a copy of `order.book_id` and insert the order, atomically.
    /// Fails with `NoAvailableCopy` when every copy is taken.
    async fn place(&self, order: NewOrder) -> AppResult<Order>;

    /// Get order by ID
    async fn get_by_id(&self, order_id: Uuid) -> AppResult<Order>;

    /// Change an order's status; completing it releases its copy in the same
    /// atomic unit.
    async fn transition(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Order>;

    /// Active orders, newest first. Returns up to `page.fetch_limit()` rows.
    async fn list_active(
        &self,
        filter: ActiveOrderFilter,
        page: PageRequest,
    ) -> AppResult<Vec<OrderDetails>>;

    /// Books ranked by number of orders placed since `since`
    async fn popular_books(&self, since: DateTime<Utc>, limit: i64) -> AppResult<Vec<PopularBook>>;
}

pub(crate) const NO_COPIES: &str = "No available copies for this book";

pub(crate) fn not_found(order_id: Uuid) -> AppError {
    AppError::NotFound(format!("Order {} not found", order_id))
}

pub(crate) fn invalid_transition(order_id: Uuid, from: OrderStatus, to: OrderStatus) -> AppError {
    AppError::InvalidTransition(format!(
        "Order {} cannot change from {} to {}",
        order_id, from, to
    ))
}

/// A completing order whose copy is not `borrowed` means the ledger and the
/// order table disagree; callers roll back.
pub(crate) fn copy_not_borrowed(order_id: Uuid, copy_id: Uuid) -> AppError {
    tracing::error!(%order_id, %copy_id, "Completed order's copy was not marked borrowed");
    AppError::Internal(format!(
        "Copy {} of order {} was not borrowed",
        copy_id, order_id
    ))
}

const ORDER_COLUMNS: &str =
    "order_id, user_id, copy_id, order_type, order_date, due_date, return_date, status";

#[derive(Clone)]
pub struct OrdersRepository {
    pool: Pool<Postgres>,
}

impl OrdersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn place_in(conn: &mut PgConnection, order: &NewOrder) -> AppResult<Order> {
        let copy = CopiesRepository::allocate(&mut *conn, order.book_id)
            .await?
            .ok_or_else(|| AppError::NoAvailableCopy(NO_COPIES.to_string()))?;

        sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (order_id, user_id, copy_id, order_type, order_date, due_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(order.order_id)
        .bind(order.user_id)
        .bind(copy.copy_id)
        .bind(order.order_type)
        .bind(order.order_date)
        .bind(order.due_date)
        .bind(OrderStatus::Pending)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_write(e, "order"))
    }

    async fn transition_in(
        conn: &mut PgConnection,
        order_id: Uuid,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Order> {
        let current = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE order_id = $1 FOR UPDATE",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found(order_id))?;

        if !current.status.can_transition_to(status) {
            return Err(invalid_transition(order_id, current.status, status));
        }

        let return_date = if status == OrderStatus::Completed {
            Some(at)
        } else {
            current.return_date
        };

        let updated = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2, return_date = $3 WHERE order_id = $1 RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(status)
        .bind(return_date)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_write(e, "order status"))?;

        if status == OrderStatus::Completed
            && CopiesRepository::release(&mut *conn, updated.copy_id)
                .await?
                .is_none()
        {
            return Err(copy_not_borrowed(order_id, updated.copy_id));
        }

        Ok(updated)
    }
}

#[async_trait]
impl OrderStore for OrdersRepository {
    async fn place(&self, order: NewOrder) -> AppResult<Order> {
        let mut tx = self.pool.begin().await?;
        let result = Self::place_in(&mut *tx, &order).await;
        finish(tx, result).await
    }

    async fn get_by_id(&self, order_id: Uuid) -> AppResult<Order> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE order_id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(order_id))
    }

    async fn transition(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Order> {
        let mut tx = self.pool.begin().await?;
        let result = Self::transition_in(&mut *tx, order_id, status, at).await;
        finish(tx, result).await
    }

    async fn list_active(
        &self,
        filter: ActiveOrderFilter,
        page: PageRequest,
    ) -> AppResult<Vec<OrderDetails>> {
        let (user_id, username) = match filter {
            ActiveOrderFilter::All => (None, None),
            ActiveOrderFilter::UserId(id) => (Some(id), None),
            ActiveOrderFilter::Username(name) => (None, Some(name)),
        };

        let orders = sqlx::query_as::<_, OrderDetails>(
            r#"
            SELECT o.order_id, u.username, o.copy_id, o.order_type,
                   o.order_date, o.due_date, o.return_date, o.status,
                   b.title AS book_title
            FROM orders o
            LEFT JOIN book_copies c ON o.copy_id = c.copy_id
            LEFT JOIN books b ON c.book_id = b.book_id
            LEFT JOIN users u ON o.user_id = u.user_id
            WHERE o.status <> 'completed'
              AND ($1::uuid IS NULL OR o.user_id = $1)
              AND ($2::text IS NULL OR u.username = $2)
            ORDER BY o.order_date DESC, o.order_id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(page.fetch_limit())
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn popular_books(&self, since: DateTime<Utc>, limit: i64) -> AppResult<Vec<PopularBook>> {
        let books = sqlx::query_as::<_, PopularBook>(
            r#"
            SELECT b.book_id, b.title, b.author, COUNT(o.order_id) AS order_count
            FROM books b
            JOIN book_copies c ON c.book_id = b.book_id
            JOIN orders o ON o.copy_id = c.copy_id AND o.order_date >= $1
            GROUP BY b.book_id, b.title, b.author
            ORDER BY order_count DESC, b.title
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }
}

//! Order lifecycle service
//!
//! Creating an order allocates a copy and completing one releases it; both
//! run as single atomic store operations.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use uuid::Uuid;

use crate::{
    config::OrdersConfig,
    error::{AppError, AppResult},
    models::order::{CreateOrder, NewOrder, Order, OrderStatus},
    repository::Repository,
};

#[derive(Clone)]
pub struct OrdersService {
    repository: Repository,
    loan_period: Duration,
}

impl OrdersService {
    pub fn new(repository: Repository, config: &OrdersConfig) -> Self {
        Self {
            repository,
            loan_period: Duration::days(config.loan_period_days),
        }
    }

    /// Place an order for the first available copy of a book
    pub async fn create_order(&self, user_id: Uuid, request: CreateOrder) -> AppResult<Order> {
        self.create_order_at(user_id, request, Utc::now()).await
    }

    /// Place an order as of `now`
    pub async fn create_order_at(
        &self,
        user_id: Uuid,
        request: CreateOrder,
        now: DateTime<Utc>,
    ) -> AppResult<Order> {
        // Stored timestamps keep microseconds
        let order_date = now.trunc_subsecs(6);

        let new_order = NewOrder {
            order_id: Uuid::new_v4(),
            user_id,
            book_id: request.book_id,
            order_type: request.order_type,
            order_date,
            due_date: request.order_type.due_date(order_date, self.loan_period),
        };

        let order = match self.repository.orders.place(new_order).await {
            Ok(order) => order,
            Err(AppError::NoAvailableCopy(msg)) => {
                tracing::info!(%user_id, book_id = %request.book_id, "No available copy");
                return Err(AppError::NoAvailableCopy(msg));
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            order_id = %order.order_id,
            copy_id = %order.copy_id,
            order_type = %order.order_type,
            "Order placed"
        );

        Ok(order)
    }

    /// Get an order by ID
    pub async fn get_order(&self, order_id: Uuid) -> AppResult<Order> {
        self.repository.orders.get_by_id(order_id).await
    }

    /// Change an order's status from its textual form
    pub async fn update_order_status(&self, order_id: Uuid, status: &str) -> AppResult<Order> {
        let status: OrderStatus = status.parse().map_err(AppError::Validation)?;
        self.transition(order_id, status).await
    }

    /// Change an order's status; completing releases the copy
    pub async fn transition(&self, order_id: Uuid, status: OrderStatus) -> AppResult<Order> {
        let at = Utc::now().trunc_subsecs(6);
        let order = self.repository.orders.transition(order_id, status, at).await?;

        tracing::info!(%order_id, status = %order.status, "Order status updated");

        Ok(order)
    }
}

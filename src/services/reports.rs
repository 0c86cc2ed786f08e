//! Read-only order listings and catalog popularity

use chrono::{Duration, Utc};

use crate::{
    config::OrdersConfig,
    error::{AppError, AppResult},
    models::{
        book::PopularBook,
        order::{ActiveOrderFilter, OrderPage},
    },
    repository::Repository,
};

use super::page_request;

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
    config: OrdersConfig,
}

impl ReportsService {
    pub fn new(repository: Repository, config: OrdersConfig) -> Self {
        Self { repository, config }
    }

    /// Every active order, newest first
    pub async fn list_active_orders(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> AppResult<OrderPage> {
        self.list_orders(ActiveOrderFilter::All, limit, offset).await
    }

    /// Active orders of one user, newest first
    pub async fn list_orders_by_user(
        &self,
        filter: ActiveOrderFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> AppResult<OrderPage> {
        self.list_orders(filter, limit, offset).await
    }

    async fn list_orders(
        &self,
        filter: ActiveOrderFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> AppResult<OrderPage> {
        let page = page_request(&self.config, limit, offset)?;
        tracing::debug!(?filter, limit = page.limit, offset = page.offset, "Listing active orders");

        if page.limit <= 0 {
            return Ok(OrderPage {
                orders: Vec::new(),
                page: page.page(),
                has_next: false,
            });
        }

        let rows = self.repository.orders.list_active(filter, page).await?;
        let (orders, has_next) = page.split(rows);

        Ok(OrderPage {
            orders,
            page: page.page(),
            has_next,
        })
    }

    /// Books with the most orders over the trailing window
    pub async fn popular_books(
        &self,
        window_days: Option<i64>,
        limit: Option<i64>,
    ) -> AppResult<Vec<PopularBook>> {
        let window_days = window_days.unwrap_or(self.config.popular_window_days);
        if window_days <= 0 {
            return Err(AppError::Validation("days must be positive".to_string()));
        }

        let limit = limit
            .unwrap_or(self.config.default_page_size)
            .clamp(0, self.config.max_page_size);
        let since = Utc::now() - Duration::days(window_days);

        self.repository.orders.popular_books(since, limit).await
    }
}

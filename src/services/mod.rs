//! Business logic services

pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod reports;
pub mod users;

use crate::{
    config::{AppConfig, OrdersConfig},
    error::{AppError, AppResult},
    models::PageRequest,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub inventory: inventory::InventoryService,
    pub orders: orders::OrdersService,
    pub reports: reports::ReportsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            users: users::UsersService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone(), config.orders.clone()),
            inventory: inventory::InventoryService::new(repository.clone()),
            orders: orders::OrdersService::new(repository.clone(), &config.orders),
            reports: reports::ReportsService::new(repository.clone(), config.orders.clone()),
            repository,
        }
    }

    /// Check the backing store
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}

/// Resolve optional limit/offset query values against the configured
/// defaults. Limits above the maximum are capped; a negative offset is
/// rejected.
pub(crate) fn page_request(
    config: &OrdersConfig,
    limit: Option<i64>,
    offset: Option<i64>,
) -> AppResult<PageRequest> {
    let limit = limit
        .unwrap_or(config.default_page_size)
        .min(config.max_page_size);
    let offset = offset.unwrap_or(0);

    if offset < 0 {
        return Err(AppError::Validation("offset must not be negative".to_string()));
    }

    Ok(PageRequest::new(limit, offset))
}

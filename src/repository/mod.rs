//! Repository layer for database operations
//!
//! Each store is an async trait so the services can run against either the
//! PostgreSQL implementation or the in-process [`memory::MemoryStore`].

pub mod books;
pub mod copies;
pub mod memory;
pub mod orders;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres, Transaction};

use crate::error::AppResult;

pub use books::BookCatalog;
pub use copies::CopyLedger;
pub use orders::OrderStore;
pub use users::UserStore;

/// Main repository struct holding every store
#[derive(Clone)]
pub struct Repository {
    pool: Option<Pool<Postgres>>,
    pub copies: Arc<dyn CopyLedger>,
    pub orders: Arc<dyn OrderStore>,
    pub books: Arc<dyn BookCatalog>,
    pub users: Arc<dyn UserStore>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            copies: Arc::new(copies::CopiesRepository::new(pool.clone())),
            orders: Arc::new(orders::OrdersRepository::new(pool.clone())),
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            users: Arc::new(users::UsersRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Create a repository backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::from_memory(memory::MemoryStore::default())
    }

    pub fn from_memory(store: memory::MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            pool: None,
            copies: store.clone(),
            orders: store.clone(),
            books: store.clone(),
            users: store,
        }
    }

    /// Check that the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(ref pool) = self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Commit on success; on failure roll back explicitly before handing the
/// error back.
pub(crate) async fn finish<T>(
    tx: Transaction<'_, Postgres>,
    result: AppResult<T>,
) -> AppResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

//! In-process store implementing every repository trait
//!
//! All state sits behind one async mutex and every operation holds the lock
//! from its first read to its last write, so each call is atomic in the same
//! way a single database transaction is.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetails, PopularBook},
        copy::{BookCopy, CopyStatus},
        order::{ActiveOrderFilter, NewOrder, Order, OrderDetails, OrderStatus},
        user::{NewUser, User},
        PageRequest,
    },
};

use super::{books, copies, orders, BookCatalog, CopyLedger, OrderStore, UserStore};

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    books: Vec<Book>,
    copies: Vec<BookCopy>,
    orders: Vec<Order>,
}

impl MemoryState {
    fn book(&self, book_id: Uuid) -> Option<&Book> {
        self.books.iter().find(|b| b.book_id == book_id)
    }

    fn user(&self, user_id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.user_id == user_id)
    }

    fn copy_mut(&mut self, copy_id: Uuid) -> Option<&mut BookCopy> {
        self.copies.iter_mut().find(|c| c.copy_id == copy_id)
    }

    /// Available copies, oldest first
    fn available(&self, book_id: Uuid) -> Vec<BookCopy> {
        let mut copies: Vec<BookCopy> = self
            .copies
            .iter()
            .filter(|c| c.book_id == book_id && c.status == CopyStatus::Available)
            .cloned()
            .collect();
        copies.sort_by(|a, b| (a.added_at, a.copy_id).cmp(&(b.added_at, b.copy_id)));
        copies
    }

    fn details(&self, book: &Book) -> BookDetails {
        let available = self
            .copies
            .iter()
            .filter(|c| c.book_id == book.book_id && c.status == CopyStatus::Available)
            .count();
        BookDetails::from_book(book.clone(), available as i64)
    }

    fn allocate(&mut self, book_id: Uuid) -> Option<BookCopy> {
        let copy_id = self.available(book_id).first()?.copy_id;
        let copy = self.copy_mut(copy_id)?;
        copy.status = CopyStatus::Borrowed;
        Some(copy.clone())
    }

    fn release(&mut self, copy_id: Uuid) -> Option<BookCopy> {
        let copy = self.copy_mut(copy_id)?;
        if copy.status != CopyStatus::Borrowed {
            return None;
        }
        copy.status = CopyStatus::Available;
        Some(copy.clone())
    }

    fn insert_batch(&mut self, book_id: Uuid, count: u32) -> Vec<BookCopy> {
        let now = Utc::now();
        let created: Vec<BookCopy> = (0..count).map(|_| BookCopy::new(book_id, now)).collect();
        self.copies.extend(created.iter().cloned());
        created
    }

    fn order_details(&self, order: &Order) -> OrderDetails {
        let book_title = self
            .copies
            .iter()
            .find(|c| c.copy_id == order.copy_id)
            .and_then(|c| self.book(c.book_id))
            .map(|b| b.title.clone());

        OrderDetails {
            order_id: order.order_id,
            username: self.user(order.user_id).map(|u| u.username.clone()),
            copy_id: order.copy_id,
            order_type: order.order_type,
            order_date: order.order_date,
            due_date: order.due_date,
            return_date: order.return_date,
            status: order.status,
            book_title,
        }
    }
}

/// Shared in-memory store; clones see the same data
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CopyLedger for MemoryStore {
    async fn list_available(&self, book_id: Uuid) -> AppResult<Vec<BookCopy>> {
        Ok(self.state.lock().await.available(book_id))
    }

    async fn get(&self, copy_id: Uuid) -> AppResult<BookCopy> {
        let state = self.state.lock().await;
        state
            .copies
            .iter()
            .find(|c| c.copy_id == copy_id)
            .cloned()
            .ok_or_else(|| copies::not_found(copy_id))
    }

    async fn set_hold(&self, copy_id: Uuid, status: CopyStatus) -> AppResult<BookCopy> {
        let mut state = self.state.lock().await;
        let copy = state
            .copy_mut(copy_id)
            .ok_or_else(|| copies::not_found(copy_id))?;

        if !copy.status.is_hold_transition(status) {
            return Err(copies::invalid_transition(copy_id, copy.status, status));
        }

        copy.status = status;
        Ok(copy.clone())
    }

    async fn create_batch(&self, book_id: Uuid, count: u32) -> AppResult<Vec<BookCopy>> {
        let mut state = self.state.lock().await;
        if state.book(book_id).is_none() {
            return Err(books::not_found(book_id));
        }
        Ok(state.insert_batch(book_id, count))
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn place(&self, order: NewOrder) -> AppResult<Order> {
        let mut state = self.state.lock().await;

        // Foreign key checks come first so a rejected insert leaves no trace
        if state.user(order.user_id).is_none() {
            return Err(AppError::Constraint("Invalid order".to_string()));
        }
        if state.orders.iter().any(|o| o.order_id == order.order_id) {
            return Err(AppError::Conflict("order already exists".to_string()));
        }

        let copy = state
            .allocate(order.book_id)
            .ok_or_else(|| AppError::NoAvailableCopy(orders::NO_COPIES.to_string()))?;

        let placed = Order {
            order_id: order.order_id,
            user_id: order.user_id,
            copy_id: copy.copy_id,
            order_type: order.order_type,
            order_date: order.order_date,
            due_date: order.due_date,
            return_date: None,
            status: OrderStatus::Pending,
        };
        state.orders.push(placed.clone());

        Ok(placed)
    }

    async fn get_by_id(&self, order_id: Uuid) -> AppResult<Order> {
        let state = self.state.lock().await;
        state
            .orders
            .iter()
            .find(|o| o.order_id == order_id)
            .cloned()
            .ok_or_else(|| orders::not_found(order_id))
    }

    async fn transition(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Order> {
        let mut state = self.state.lock().await;
        let index = state
            .orders
            .iter()
            .position(|o| o.order_id == order_id)
            .ok_or_else(|| orders::not_found(order_id))?;

        let current = state.orders[index].clone();
        if !current.status.can_transition_to(status) {
            return Err(orders::invalid_transition(order_id, current.status, status));
        }

        // Release first so a copy in the wrong state leaves the order untouched
        if status == OrderStatus::Completed && state.release(current.copy_id).is_none() {
            return Err(orders::copy_not_borrowed(order_id, current.copy_id));
        }

        let order = &mut state.orders[index];
        order.status = status;
        if status == OrderStatus::Completed {
            order.return_date = Some(at);
        }

        Ok(order.clone())
    }

    async fn list_active(
        &self,
        filter: ActiveOrderFilter,
        page: PageRequest,
    ) -> AppResult<Vec<OrderDetails>> {
        let state = self.state.lock().await;

        let mut matching: Vec<OrderDetails> = state
            .orders
            .iter()
            .filter(|o| o.status.is_active())
            .filter(|o| match &filter {
                ActiveOrderFilter::UserId(user_id) => o.user_id == *user_id,
                _ => true,
            })
            .map(|o| state.order_details(o))
            .filter(|o| match &filter {
                ActiveOrderFilter::Username(name) => o.username.as_deref() == Some(name.as_str()),
                _ => true,
            })
            .collect();

        matching.sort_by(|a, b| {
            b.order_date
                .cmp(&a.order_date)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });

        Ok(matching
            .into_iter()
            .skip(page.offset.max(0) as usize)
            .take(page.fetch_limit() as usize)
            .collect())
    }

    async fn popular_books(&self, since: DateTime<Utc>, limit: i64) -> AppResult<Vec<PopularBook>> {
        let state = self.state.lock().await;

        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for order in state.orders.iter().filter(|o| o.order_date >= since) {
            if let Some(copy) = state.copies.iter().find(|c| c.copy_id == order.copy_id) {
                *counts.entry(copy.book_id).or_default() += 1;
            }
        }

        let mut ranked: Vec<PopularBook> = counts
            .into_iter()
            .filter_map(|(book_id, order_count)| {
                state.book(book_id).map(|b| PopularBook {
                    book_id,
                    title: b.title.clone(),
                    author: b.author.clone(),
                    order_count,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.order_count
                .cmp(&a.order_count)
                .then_with(|| a.title.cmp(&b.title))
        });
        ranked.truncate(limit.max(0) as usize);

        Ok(ranked)
    }
}

#[async_trait]
impl BookCatalog for MemoryStore {
    async fn create(&self, book: Book, copies: u32) -> AppResult<BookDetails> {
        let mut state = self.state.lock().await;

        if state.books.iter().any(|b| b.isbn == book.isbn) {
            return Err(AppError::Conflict("book already exists".to_string()));
        }

        let book_id = book.book_id;
        state.books.push(book);
        state.insert_batch(book_id, copies);

        let created = state.book(book_id).ok_or_else(|| books::not_found(book_id))?;
        Ok(state.details(created))
    }

    async fn get(&self, book_id: Uuid) -> AppResult<BookDetails> {
        let state = self.state.lock().await;
        let book = state.book(book_id).ok_or_else(|| books::not_found(book_id))?;
        Ok(state.details(book))
    }

    async fn list(&self, page: PageRequest) -> AppResult<Vec<BookDetails>> {
        let state = self.state.lock().await;

        let mut sorted: Vec<&Book> = state.books.iter().collect();
        sorted.sort_by(|a, b| (&a.title, a.book_id).cmp(&(&b.title, b.book_id)));

        Ok(sorted
            .into_iter()
            .skip(page.offset.max(0) as usize)
            .take(page.fetch_limit() as usize)
            .map(|b| state.details(b))
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut state = self.state.lock().await;

        if state.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("username already exists".to_string()));
        }

        let created = User {
            user_id: user.user_id,
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        };
        state.users.push(created.clone());

        Ok(created)
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_by_id(&self, user_id: Uuid) -> AppResult<User> {
        let state = self.state.lock().await;
        state
            .user(user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))
    }
}

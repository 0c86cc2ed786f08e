//! Order (borrow / read-in-library) model and related types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Kind of order placed by a reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Borrow,
    ReadInLibrary,
}

text_enum!(OrderType {
    Borrow => "borrow",
    ReadInLibrary => "read_in_library",
});

impl OrderType {
    /// Due date for an order placed at `order_date`. Only borrow orders
    /// carry one.
    pub fn due_date(self, order_date: DateTime<Utc>, loan_period: Duration) -> Option<DateTime<Utc>> {
        match self {
            OrderType::Borrow => Some(order_date + loan_period),
            OrderType::ReadInLibrary => None,
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Overdue,
}

text_enum!(OrderStatus {
    Pending => "pending",
    Completed => "completed",
    Overdue => "overdue",
});

impl OrderStatus {
    /// Transition table for order status. Completed is terminal.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Completed) | (Pending, Overdue) | (Overdue, Completed)
        )
    }

    /// Active orders still hold their copy
    pub fn is_active(self) -> bool {
        self != OrderStatus::Completed
    }
}

/// Order model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Order {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub copy_id: Uuid,
    pub order_type: OrderType,
    pub order_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: OrderStatus,
}

/// Order as listed, joined with borrower and book for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrderDetails {
    pub order_id: Uuid,
    pub username: Option<String>,
    pub copy_id: Uuid,
    pub order_type: OrderType,
    pub order_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub book_title: Option<String>,
}

/// One page of active orders
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderPage {
    pub orders: Vec<OrderDetails>,
    pub page: i64,
    pub has_next: bool,
}

/// Create order request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrder {
    pub book_id: Uuid,
    pub order_type: OrderType,
}

/// Everything the store needs to place an order; the copy is chosen by the
/// store at insertion time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub order_type: OrderType,
    pub order_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Which active orders a listing covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveOrderFilter {
    All,
    UserId(Uuid),
    Username(String),
}

/// Query string for an order status change
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderStatusQuery {
    /// New status: pending, completed or overdue
    pub status: String,
}

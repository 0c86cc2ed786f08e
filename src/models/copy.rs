//! Physical book copy model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Availability state of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CopyStatus {
    Available,
    Borrowed,
    Reserved,
}

text_enum!(CopyStatus {
    Available => "available",
    Borrowed => "borrowed",
    Reserved => "reserved",
});

impl CopyStatus {
    /// Transition table for copy availability
    pub fn can_transition_to(self, next: CopyStatus) -> bool {
        use CopyStatus::*;
        matches!(
            (self, next),
            (Available, Borrowed)
                | (Borrowed, Available)
                | (Available, Reserved)
                | (Reserved, Available)
        )
    }

    /// Holds only move between `available` and `reserved`; `borrowed` is
    /// entered and left through orders.
    pub fn is_hold_transition(self, next: CopyStatus) -> bool {
        self != CopyStatus::Borrowed && next != CopyStatus::Borrowed && self.can_transition_to(next)
    }
}

/// One loanable instance of a catalog book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookCopy {
    pub copy_id: Uuid,
    pub book_id: Uuid,
    pub status: CopyStatus,
    pub added_at: DateTime<Utc>,
}

impl BookCopy {
    pub fn new(book_id: Uuid, added_at: DateTime<Utc>) -> Self {
        Self {
            copy_id: Uuid::new_v4(),
            book_id,
            status: CopyStatus::Available,
            added_at,
        }
    }
}

/// Request body for adding copies to an existing book
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCopies {
    pub count: u32,
}

/// Query string for a copy status change
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CopyStatusQuery {
    pub status: CopyStatus,
}

//! Data models for the library orders server

/// Implements string conversions and SQLx text encoding for a closed enum
/// stored in a `VARCHAR` column with a `CHECK` constraint.
macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    _ => Err(format!("Invalid {} value: {}", stringify!($ty), s)),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

pub mod book;
pub mod copy;
pub mod order;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookDetails, PopularBook};
pub use copy::{BookCopy, CopyStatus};
pub use order::{Order, OrderDetails, OrderStatus, OrderType};
pub use user::{Role, User, UserClaims};

/// Limit/offset window over an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

impl PageRequest {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// 1-based page number; always 1 when `limit` is not positive
    pub fn page(&self) -> i64 {
        if self.limit > 0 {
            self.offset / self.limit + 1
        } else {
            1
        }
    }

    /// Rows to fetch so that the presence of a next page can be detected
    pub fn fetch_limit(&self) -> i64 {
        self.limit.max(0) + 1
    }

    /// Split rows fetched with [`fetch_limit`](Self::fetch_limit) into the
    /// page content and the `has_next` flag.
    pub fn split<T>(&self, mut rows: Vec<T>) -> (Vec<T>, bool) {
        let limit = self.limit.max(0) as usize;
        let has_next = rows.len() > limit;
        rows.truncate(limit);
        (rows, has_next)
    }
}

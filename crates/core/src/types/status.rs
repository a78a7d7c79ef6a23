//! Order status as stored in the `orders.status` column.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unknown order status string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid order status: {0}")]
pub struct OrderStatusError(pub String);

/// Lifecycle of an order, changed by staff from the admin area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order (used for the admin status picker).
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Label shown to staff.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Ожидает",
            Self::Processing => "В обработке",
            Self::Shipped => "Отправлен",
            Self::Delivered => "Доставлен",
            Self::Cancelled => "Отменён",
        }
    }

    /// Badge class for the admin order list.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Pending => "badge badge-yellow",
            Self::Processing => "badge badge-blue",
            Self::Shipped => "badge badge-purple",
            Self::Delivered => "badge badge-green",
            Self::Cancelled => "badge badge-red",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderStatusError(s.to_string()))
    }
}

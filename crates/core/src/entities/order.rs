//! Order record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::CartLine;
use crate::types::{Email, OrderId, OrderStatus, Price};

/// A placed order.
///
/// Immutable once created except for `status`, which only changes via an
/// explicit status transition. Orders are remote-authoritative; the local
/// cache is a read fallback only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order id (remote primary key).
    pub id: OrderId,
    /// Email of the customer who placed the order.
    pub owner_email: Email,
    /// Line items frozen at checkout time.
    pub lines: Vec<CartLine>,
    /// Order total at checkout time.
    pub total: Price,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Total number of units across all line items.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

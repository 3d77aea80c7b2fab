//! Admin notification record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{NotificationId, NotificationKind};

/// A back-office notification created by domain events (new order, new
/// message) and consumed by an admin-facing observer.
///
/// Ids are generated client-side (UUIDv4) so read/delete by id keeps working
/// against the local fallback copy when the remote channel is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification id.
    pub id: NotificationId,
    /// Event category. Stored as `type` in the remote collection.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Detail text. Stored as `message` in the remote collection.
    #[serde(rename = "message")]
    pub body: String,
    /// Whether an admin has read it.
    pub read: bool,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// Free-form event context (e.g. the order id that triggered it).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Notification {
    /// Create an unread notification with a fresh id and timestamp.
    #[must_use]
    pub fn new(kind: NotificationKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: NotificationId::new(Uuid::new_v4().to_string()),
            kind,
            title: title.into(),
            body: body.into(),
            read: false,
            created_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Attach metadata, builder-style.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unread_with_unique_id() {
        let a = Notification::new(NotificationKind::Order, "New order", "Order #1 placed");
        let b = Notification::new(NotificationKind::Order, "New order", "Order #2 placed");
        assert!(!a.read);
        assert_ne!(a.id, b.id);
    }
}

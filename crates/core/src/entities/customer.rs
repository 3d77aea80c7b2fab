//! Customer record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CustomerId, Email};

/// A storefront customer.
///
/// The locally cached "current user" copy of this record doubles as tier (b)
/// of actor resolution: its id, or failing that its email, serves as a
/// stable surrogate actor key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer id (remote primary key).
    pub id: CustomerId,
    /// Email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// When the customer record was created.
    pub created_at: DateTime<Utc>,
}

//! Actor identity resolution.
//!
//! Derives a stable actor key for the current session: the authenticated
//! session subject, a locally persisted current-user record, or nothing
//! (anonymous). Resolution is tiered and silent (a failing tier degrades to
//! the next one) and runs fresh on every actor-scoped operation, since
//! session state can change between calls.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use blue_papaya_core::{ActorKey, CustomerId, Email};

use crate::cache::{CacheSlot, LocalCache};

/// Authentication collaborator: supplies the active session's subject id.
///
/// The data layer never sees credentials or session internals; it only asks
/// "who is signed in right now?".
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Subject id of the active authenticated session, if any.
    async fn current_subject(&self) -> Option<ActorKey>;
}

/// The locally persisted "current user" record, tier (b) of resolution.
///
/// May predate a remote round trip and therefore lack an id; the email then
/// serves as a stable surrogate key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Remote customer id, when known.
    pub id: Option<CustomerId>,
    /// Email address.
    pub email: Email,
    /// Display name, when known.
    pub name: Option<String>,
}

impl CurrentUser {
    /// The actor key this record stands for: the id, or the email surrogate.
    #[must_use]
    pub fn actor_key(&self) -> ActorKey {
        match &self.id {
            Some(id) => ActorKey::new(id.as_str()),
            None => ActorKey::new(self.email.as_str()),
        }
    }
}

/// Tiered actor resolution.
#[derive(Clone)]
pub struct IdentityResolver {
    session: Option<Arc<dyn SessionProvider>>,
    cache: LocalCache,
}

impl IdentityResolver {
    /// Create a resolver over an optional session collaborator and the
    /// local cache (which holds the current-user record).
    #[must_use]
    pub fn new(session: Option<Arc<dyn SessionProvider>>, cache: LocalCache) -> Self {
        Self { session, cache }
    }

    /// Resolve the current actor. Never errors: each tier's failure
    /// degrades silently to the next, ending at anonymous (`None`).
    pub async fn resolve(&self) -> Option<ActorKey> {
        if let Some(session) = &self.session
            && let Some(subject) = session.current_subject().await
        {
            return Some(subject);
        }

        match self.cache.get::<CurrentUser>(CacheSlot::CurrentUser).await {
            Ok(Some(user)) => Some(user.actor_key()),
            Ok(None) => None,
            Err(e) => {
                debug!(error = %e, "current-user lookup failed; resolving as anonymous");
                None
            }
        }
    }
}

//! Admin notification accessor and polling backstop.
//!
//! Notifications live in their own remote collection with a local fallback
//! copy. Reads are capped at the 100 most recent. The poller exists because
//! the remote real-time channel is optional infrastructure: the admin view
//! must not silently go stale when that channel is unavailable or
//! unsubscribed, so a fixed-period refresh re-derives the list and emits
//! when it changed. The poller owns its task and is cancelled on teardown.

use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use blue_papaya_core::{Notification, NotificationId, NotificationKind};

use super::{remote_or_local, Store};
use crate::cache::CacheSlot;
use crate::error::Result;
use crate::events::StoreEvent;
use crate::remote::{Collection, FetchOptions};

const SLOT: CacheSlot = CacheSlot::AdminNotifications;

/// Reads return at most this many notifications, newest first.
pub const NOTIFICATION_READ_CAP: usize = 100;

/// Accessor for admin notifications.
pub struct NotificationStore<'a> {
    store: &'a Store,
}

impl<'a> NotificationStore<'a> {
    pub(crate) const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// The most recent notifications (up to [`NOTIFICATION_READ_CAP`]).
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Notification>> {
        self.store.ensure_live()?;
        let remote = remote_or_local(
            self.store
                .remote()
                .fetch_all::<Notification>(
                    Collection::AdminNotifications,
                    FetchOptions::newest_first_capped(NOTIFICATION_READ_CAP),
                )
                .await,
        );

        if let Some(notifications) = remote {
            self.store.ensure_live()?;
            self.store.cache().set(SLOT, &notifications).await?;
            return Ok(notifications);
        }

        Ok(self.store.cache().get(SLOT).await?.unwrap_or_default())
    }

    /// Create a notification.
    ///
    /// The id is generated client-side so read/delete keep working against
    /// the local fallback copy when the remote insert did not go through.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self, title, body, metadata))]
    pub async fn create(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
        metadata: Option<Value>,
    ) -> Result<Notification> {
        self.store.ensure_live()?;
        let mut notification = Notification::new(kind, title, body);
        if let Some(metadata) = metadata {
            notification = notification.with_metadata(metadata);
        }

        let _ = remote_or_local(
            self.store
                .remote()
                .insert(Collection::AdminNotifications, &notification)
                .await,
        );

        self.store.ensure_live()?;
        let stored = notification.clone();
        self.store
            .cache()
            .update(SLOT, move |list: Option<Vec<Notification>>| {
                let mut list = list.unwrap_or_default();
                list.insert(0, stored);
                list.truncate(NOTIFICATION_READ_CAP);
                list
            })
            .await?;

        self.store.emit(StoreEvent::NewNotification {
            notification_id: notification.id.clone(),
        });
        Ok(notification)
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn mark_read(&self, id: &NotificationId) -> Result<()> {
        self.store.ensure_live()?;
        let _ = remote_or_local(
            self.store
                .remote()
                .update(
                    Collection::AdminNotifications,
                    id.as_str(),
                    json!({ "read": true }),
                )
                .await,
        );

        self.store.ensure_live()?;
        let target = id.clone();
        self.store
            .cache()
            .update(SLOT, move |list: Option<Vec<Notification>>| {
                let mut list = list.unwrap_or_default();
                if let Some(notification) = list.iter_mut().find(|n| n.id == target) {
                    notification.read = true;
                }
                list
            })
            .await?;
        self.store.emit(StoreEvent::NotificationUpdated);
        Ok(())
    }

    /// Mark every notification read.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self))]
    pub async fn mark_all_read(&self) -> Result<()> {
        self.store.ensure_live()?;
        let unread: Vec<NotificationId> = self
            .get_all()
            .await?
            .into_iter()
            .filter(|notification| !notification.read)
            .map(|notification| notification.id)
            .collect();

        for id in &unread {
            let _ = remote_or_local(
                self.store
                    .remote()
                    .update(
                        Collection::AdminNotifications,
                        id.as_str(),
                        json!({ "read": true }),
                    )
                    .await,
            );
        }

        self.store.ensure_live()?;
        self.store
            .cache()
            .update(SLOT, move |list: Option<Vec<Notification>>| {
                let mut list = list.unwrap_or_default();
                for notification in &mut list {
                    notification.read = true;
                }
                list
            })
            .await?;
        self.store.emit(StoreEvent::NotificationUpdated);
        Ok(())
    }

    /// Delete a notification.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &NotificationId) -> Result<()> {
        self.store.ensure_live()?;
        let _ = remote_or_local(
            self.store
                .remote()
                .delete(Collection::AdminNotifications, id.as_str())
                .await,
        );

        self.store.ensure_live()?;
        let target = id.clone();
        self.store
            .cache()
            .update(SLOT, move |list: Option<Vec<Notification>>| {
                let mut list = list.unwrap_or_default();
                list.retain(|notification| notification.id != target);
                list
            })
            .await?;
        self.store.emit(StoreEvent::NotificationUpdated);
        Ok(())
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    pub async fn unread_count(&self) -> Result<usize> {
        Ok(self
            .get_all()
            .await?
            .iter()
            .filter(|notification| !notification.read)
            .count())
    }
}

/// The fixed-period notification refresh.
///
/// Re-fetches through the accessor (which keeps the local mirror current)
/// and emits `NotificationUpdated` when the list changed since the last
/// tick. Owns its task: dropping or shutting down cancels the loop.
pub struct NotificationPoller {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl NotificationPoller {
    /// Spawn the poller with the store's configured period.
    #[must_use]
    pub fn spawn(store: Store) -> Self {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let period = store.notify_poll();

        let handle = tokio::spawn(async move {
            let mut last: Option<Vec<Notification>> = None;
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; use it to seed the baseline.
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = task_token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                match store.notifications().get_all().await {
                    Ok(current) => {
                        let changed = last.as_ref() != Some(&current);
                        if last.replace(current).is_some() && changed {
                            store.emit(StoreEvent::NotificationUpdated);
                        }
                    }
                    Err(e) => debug!(error = %e, "notification poll failed"),
                }
            }
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    /// Cancel the poller and wait for its task to finish.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

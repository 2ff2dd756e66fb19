use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use models::notification::{self, validate_title};

use crate::errors::ServiceError;
use crate::retry::RetryPolicy;
use crate::store::Store;

/// A fan-out delivery that could not be stored.
#[derive(Debug, Clone)]
pub struct FailedNotification {
    pub user_id: Uuid,
    pub title: String,
    pub error: String,
    pub at: DateTime<Utc>,
}

/// Creates notification records and tracks their read state.
pub struct NotificationEmitter<S: Store + ?Sized> {
    store: Arc<S>,
    retry: RetryPolicy,
    failures: Mutex<Vec<FailedNotification>>,
}

impl<S: Store + ?Sized> NotificationEmitter<S> {
    pub fn new(store: Arc<S>, retry: RetryPolicy) -> Self {
        Self { store, retry, failures: Mutex::new(Vec::new()) }
    }

    /// Store one notification for `user_id`. Storage errors are returned, never swallowed.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::notifications::NotificationEmitter;
    /// use service::retry::RetryPolicy;
    /// use service::store::memory::InMemoryStore;
    /// let emitter = NotificationEmitter::new(Arc::new(InMemoryStore::new()), RetryPolicy::none());
    /// let user = uuid::Uuid::new_v4();
    /// let n = tokio_test::block_on(emitter.notify(user, "Booking confirmed", "See you soon")).unwrap();
    /// assert!(!n.read);
    /// assert_eq!(tokio_test::block_on(emitter.unread_count(user)).unwrap(), 1);
    /// ```
    #[instrument(skip(self, message), fields(user_id = %user_id))]
    pub async fn notify(&self, user_id: Uuid, title: &str, message: &str) -> Result<notification::Model, ServiceError> {
        validate_title(title)?;
        let record = notification::Model {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            message: message.to_string(),
            read: false,
            created_at: Utc::now().fixed_offset(),
        };
        let store = &self.store;
        let saved = self
            .retry
            .run("create_notification", move || store.create_notification(record.clone()))
            .await?;
        debug!(notification_id = %saved.id, "notification_created");
        Ok(saved)
    }

    /// Deliver to every recipient except the actor, once each.
    ///
    /// Failures are logged and recorded; the count of stored notifications is returned.
    pub async fn notify_all(&self, actor_id: Uuid, recipients: Vec<Uuid>, title: &str, message: &str) -> usize {
        let mut seen = HashSet::new();
        let mut delivered = 0;
        for user_id in recipients {
            if user_id == actor_id || !seen.insert(user_id) {
                continue;
            }
            match self.notify(user_id, title, message).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    warn!(user_id = %user_id, title, error = %e, "notification_failed");
                    self.record_failure(user_id, title, &e);
                }
            }
        }
        delivered
    }

    fn record_failure(&self, user_id: Uuid, title: &str, error: &ServiceError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(FailedNotification {
                user_id,
                title: title.to_string(),
                error: error.to_string(),
                at: Utc::now(),
            });
        }
    }

    /// Deliveries dropped by [`notify_all`](Self::notify_all), oldest first.
    pub fn failures(&self) -> Vec<FailedNotification> {
        self.failures.lock().map(|f| f.clone()).unwrap_or_default()
    }

    /// Newest first.
    pub async fn list_for(&self, user_id: Uuid) -> Result<Vec<notification::Model>, ServiceError> {
        let store = &self.store;
        self.retry.run("list_notifications", move || store.list_notifications(user_id)).await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<usize, ServiceError> {
        Ok(self.list_for(user_id).await?.iter().filter(|n| !n.read).count())
    }

    /// Mark one of the caller's notifications read. Someone else's reads as NotFound.
    #[instrument(skip(self), fields(notification_id = %id, caller = %caller))]
    pub async fn mark_read(&self, id: Uuid, caller: Uuid) -> Result<notification::Model, ServiceError> {
        let store = &self.store;
        let found = self.retry.run("get_notification", move || store.get_notification(id)).await?;
        let mut n = match found {
            Some(n) if n.user_id == caller => n,
            Some(_) => {
                debug!("notification belongs to another user");
                return Err(ServiceError::not_found("notification"));
            }
            None => return Err(ServiceError::not_found("notification")),
        };
        if n.read {
            return Ok(n);
        }
        n.read = true;
        let saved = self
            .retry
            .run("update_notification", move || store.update_notification(n.clone()))
            .await?;
        info!("notification_read");
        Ok(saved)
    }

    /// Returns how many notifications changed state.
    #[instrument(skip(self), fields(caller = %caller))]
    pub async fn mark_all_read(&self, caller: Uuid) -> Result<usize, ServiceError> {
        let mut changed = 0;
        for mut n in self.list_for(caller).await?.into_iter().filter(|n| !n.read) {
            n.read = true;
            let store = &self.store;
            self.retry
                .run("update_notification", move || store.update_notification(n.clone()))
                .await?;
            changed += 1;
        }
        info!(changed, "notifications_read_all");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn emitter() -> (Arc<InMemoryStore>, NotificationEmitter<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), NotificationEmitter::new(store, RetryPolicy::none()))
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (_, em) = emitter();
        let u = Uuid::new_v4();
        em.notify(u, "first", "a").await.unwrap();
        em.notify(u, "second", "b").await.unwrap();
        em.notify(Uuid::new_v4(), "other", "c").await.unwrap();
        let titles: Vec<_> = em.list_for(u).await.unwrap().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let (_, em) = emitter();
        let err = em.notify(Uuid::new_v4(), "  ", "x").await.unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn mark_read_is_idempotent() {
        let (_, em) = emitter();
        let u = Uuid::new_v4();
        let n = em.notify(u, "t", "m").await.unwrap();
        let once = em.mark_read(n.id, u).await.unwrap();
        let twice = em.mark_read(n.id, u).await.unwrap();
        assert!(once.read && twice.read);
        assert_eq!(em.unread_count(u).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn mark_read_of_foreign_notification_is_not_found() {
        let (_, em) = emitter();
        let owner = Uuid::new_v4();
        let n = em.notify(owner, "t", "m").await.unwrap();
        let err = em.mark_read(n.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(em.unread_count(owner).await.unwrap(), 1);
        assert!(matches!(em.mark_read(Uuid::new_v4(), owner).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn mark_all_read_counts_changes() {
        let (_, em) = emitter();
        let u = Uuid::new_v4();
        let first = em.notify(u, "a", "").await.unwrap();
        em.notify(u, "b", "").await.unwrap();
        em.notify(u, "c", "").await.unwrap();
        em.mark_read(first.id, u).await.unwrap();
        assert_eq!(em.mark_all_read(u).await.unwrap(), 2);
        assert_eq!(em.mark_all_read(u).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn fan_out_skips_actor_and_duplicates() {
        let (_, em) = emitter();
        let actor = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let delivered = em.notify_all(actor, vec![a, actor, b, a], "t", "m").await;
        assert_eq!(delivered, 2);
        assert!(em.list_for(actor).await.unwrap().is_empty());
        assert_eq!(em.list_for(a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fan_out_failures_are_recorded_not_raised() {
        let (store, em) = emitter();
        store.set_notifications_down(true);
        let target = Uuid::new_v4();
        let delivered = em.notify_all(Uuid::new_v4(), vec![target], "Quote ready", "m").await;
        assert_eq!(delivered, 0);
        let failures = em.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].user_id, target);
        assert_eq!(failures[0].title, "Quote ready");
    }
}

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per booking, created on first use.
#[derive(Default)]
pub struct BookingLocks {
    inner: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl BookingLocks {
    pub fn new() -> Self { Self::default() }

    pub async fn acquire(&self, booking_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self.inner.entry(booking_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone();
        lock.lock_owned().await
    }

    /// Drop the entry of a booking nobody is holding or waiting on.
    pub fn forget(&self, booking_id: Uuid) {
        self.inner.remove_if(&booking_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize { self.inner.len() }

    pub fn is_empty(&self) -> bool { self.inner.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_booking_is_serialized() {
        let locks = Arc::new(BookingLocks::new());
        let id = Uuid::new_v4();
        let guard = locks.acquire(id).await;
        let l2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = l2.acquire(id).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn other_bookings_do_not_block() {
        let locks = BookingLocks::new();
        let _a = locks.acquire(Uuid::new_v4()).await;
        let _b = tokio::time::timeout(Duration::from_millis(50), locks.acquire(Uuid::new_v4())).await;
        assert!(_b.is_ok());
    }

    #[tokio::test]
    async fn forget_keeps_held_locks() {
        let locks = BookingLocks::new();
        let id = Uuid::new_v4();
        let guard = locks.acquire(id).await;
        locks.forget(id);
        assert_eq!(locks.len(), 1);
        drop(guard);
        locks.forget(id);
        assert!(locks.is_empty());
    }
}

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Single-slot supervisor for the classification request.
///
/// At most one request may be in flight; a sampling tick that fires while
/// the slot is held is skipped entirely, with no queueing and no retry.
/// Sampling is best-effort and a stale frame is worthless once a fresh
/// one exists.
#[derive(Clone)]
pub struct InflightSlot {
    semaphore: Arc<Semaphore>,
}

impl InflightSlot {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// Non-blocking acquire. `None` means a request is already in flight
    /// and the caller should drop this tick.
    pub fn try_acquire(&self) -> Option<InflightGuard> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| InflightGuard { _permit: permit })
    }

    pub fn is_idle(&self) -> bool {
        self.semaphore.available_permits() > 0
    }
}

/// RAII guard; dropping it releases the slot for the next tick.
pub struct InflightGuard {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_is_skipped_while_held() {
        let slot = InflightSlot::new();

        let guard = slot.try_acquire();
        assert!(guard.is_some());
        assert!(!slot.is_idle());
        assert!(slot.try_acquire().is_none());

        drop(guard);
        assert!(slot.is_idle());
        assert!(slot.try_acquire().is_some());
    }

    #[tokio::test]
    async fn clones_share_the_same_slot() {
        let slot = InflightSlot::new();
        let clone = slot.clone();

        let _guard = slot.try_acquire().unwrap();
        assert!(clone.try_acquire().is_none());
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

const NEVER: u64 = u64::MAX;

/// Pool-wide politeness clock.
///
/// Each caller atomically reserves the next free slot, at least `interval`
/// after the previous reservation, and sleeps until it. Two callers can never
/// claim the same slot.
#[derive(Debug)]
pub struct Pacer {
    interval_ms: u64,
    origin: Instant,
    /// Last reserved slot, in milliseconds since `origin`.
    last_slot: AtomicU64,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            origin: Instant::now(),
            last_slot: AtomicU64::new(NEVER),
        }
    }

    /// Reserve a slot and return how long to wait for it.
    pub fn reserve(&self) -> Duration {
        let now = self.origin.elapsed().as_millis() as u64;
        let slot_after = |last: u64| {
            if last == NEVER { now } else { now.max(last.saturating_add(self.interval_ms)) }
        };
        let prev = match self
            .last_slot
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(slot_after(last)))
        {
            Ok(prev) | Err(prev) => prev,
        };
        Duration::from_millis(slot_after(prev) - now)
    }

    pub async fn wait_turn(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

//! transient status notices with generation-guarded auto-hide

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use verdant_core::StatusNotice;

#[derive(Default)]
struct Inner {
    current: Mutex<Option<StatusNotice>>,
    generation: AtomicU64,
}

/// single-slot status display with optional auto-hide
///
/// an auto-hide timer only clears the notice it was armed for: any newer
/// `show` or `clear` bumps the generation and the stale timer is a no-op.
#[derive(Clone, Default)]
pub struct StatusTracker {
    inner: Arc<Inner>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// display `notice`, scheduling it to disappear after `auto_hide`
    ///
    /// pending notices pass `None` and stay until superseded.
    pub fn show(&self, notice: StatusNotice, auto_hide: Option<Duration>) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.inner.current.lock().unwrap() = Some(notice);

        if let Some(delay) = auto_hide {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let mut current = inner.current.lock().unwrap();
                if inner.generation.load(Ordering::SeqCst) == generation {
                    *current = None;
                }
            });
        }
    }

    pub fn clear(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        *self.inner.current.lock().unwrap() = None;
    }

    pub fn current(&self) -> Option<StatusNotice> {
        self.inner.current.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_core::StatusKind;

    #[tokio::test(start_paused = true)]
    async fn auto_hide_clears_after_delay() {
        let tracker = StatusTracker::new();
        tracker.show(StatusNotice::success("done"), Some(Duration::from_secs(2)));
        assert_eq!(tracker.current().unwrap().kind, StatusKind::Success);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert!(tracker.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn pending_stays_until_superseded() {
        let tracker = StatusTracker::new();
        tracker.show(StatusNotice::pending("working..."), None);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(tracker.current().unwrap().kind, StatusKind::Pending);

        tracker.show(StatusNotice::error("boom"), Some(Duration::from_secs(3)));
        assert_eq!(tracker.current().unwrap().kind, StatusKind::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_cannot_clear_a_newer_notice() {
        let tracker = StatusTracker::new();
        tracker.show(
            StatusNotice::success("first"),
            Some(Duration::from_millis(50)),
        );
        tracker.show(StatusNotice::pending("second"), None);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let current = tracker.current().unwrap();
        assert_eq!(current.kind, StatusKind::Pending);
        assert_eq!(current.message, "second");
    }
}

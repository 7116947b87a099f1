use std::{
    collections::VecDeque,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::sync::Notify;

pub const DEFAULT_TOAST_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

impl ToastKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: String,
    pub kind: ToastKind,
    pub message: String,
}

/// Ephemeral user notifications.
///
/// Expiry drains the queue strictly FIFO: once the queue has been left
/// unchanged for the configured delay, the oldest toast is removed, whichever
/// toast was shown last. Every change to the queue re-arms the delay.
#[derive(Debug)]
pub struct Toasts {
    queue: Mutex<VecDeque<Toast>>,
    next_id: AtomicU64,
    delay: Duration,
    changed: Notify,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DELAY)
    }
}

impl Toasts {
    pub fn new(delay: Duration) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            delay,
            changed: Notify::new(),
        }
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Toast>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn show(&self, kind: ToastKind, message: impl Into<String>) -> String {
        let id = format!("toast-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let toast = Toast {
            id: id.clone(),
            kind,
            message: message.into(),
        };
        tracing::debug!(id = %toast.id, kind = kind.label(), message = %toast.message, "toast");
        self.queue().push_back(toast);
        self.changed.notify_one();
        id
    }

    pub fn success(&self, message: impl Into<String>) -> String {
        self.show(ToastKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> String {
        self.show(ToastKind::Error, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> String {
        self.show(ToastKind::Warning, message)
    }

    /// Removes a specific toast immediately.
    pub fn hide(&self, id: &str) {
        let removed = {
            let mut queue = self.queue();
            let before = queue.len();
            queue.retain(|toast| toast.id != id);
            before != queue.len()
        };
        if removed {
            self.changed.notify_one();
        }
    }

    /// Removes the oldest toast, if any.
    pub fn expire_oldest(&self) -> Option<Toast> {
        self.queue().pop_front()
    }

    pub fn snapshot(&self) -> Vec<Toast> {
        self.queue().iter().cloned().collect()
    }

    /// Takes every pending toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        let drained: Vec<Toast> = self.queue().drain(..).collect();
        if !drained.is_empty() {
            self.changed.notify_one();
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Drives automatic expiry. Never returns; run it on its own task.
    pub async fn run_expiry(&self) {
        loop {
            if self.is_empty() {
                self.changed.notified().await;
                continue;
            }
            match tokio::time::timeout(self.delay, self.changed.notified()).await {
                Ok(()) => continue,
                Err(_) => {
                    if let Some(toast) = self.expire_oldest() {
                        tracing::debug!(id = %toast.id, "toast expired");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn ids_are_unique_and_ordered() {
        let toasts = Toasts::default();
        let a = toasts.success("a");
        let b = toasts.error("b");
        assert_ne!(a, b);
        let ids: Vec<String> = toasts.snapshot().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn hide_removes_only_that_toast() {
        let toasts = Toasts::default();
        let a = toasts.show(ToastKind::Info, "a");
        let b = toasts.show(ToastKind::Warning, "b");
        toasts.hide(&a);
        let left = toasts.snapshot();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, b);
        assert_eq!(left[0].kind, ToastKind::Warning);
    }

    #[test]
    fn expire_oldest_is_fifo() {
        let toasts = Toasts::default();
        toasts.show(ToastKind::Info, "first");
        toasts.show(ToastKind::Info, "second");
        assert_eq!(toasts.expire_oldest().unwrap().message, "first");
        assert_eq!(toasts.expire_oldest().unwrap().message, "second");
        assert!(toasts.expire_oldest().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_removes_one_toast_per_delay() {
        let toasts = Arc::new(Toasts::new(Duration::from_secs(5)));
        let driver = tokio::spawn({
            let toasts = Arc::clone(&toasts);
            async move { toasts.run_expiry().await }
        });
        tokio::task::yield_now().await;

        toasts.show(ToastKind::Info, "first");
        toasts.show(ToastKind::Info, "second");

        tokio::time::sleep(Duration::from_millis(5_100)).await;
        let left = toasts.snapshot();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].message, "second");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(toasts.is_empty());
        driver.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn new_toast_rearms_delay_and_oldest_goes_first() {
        let toasts = Arc::new(Toasts::new(Duration::from_secs(5)));
        let driver = tokio::spawn({
            let toasts = Arc::clone(&toasts);
            async move { toasts.run_expiry().await }
        });
        tokio::task::yield_now().await;

        toasts.show(ToastKind::Info, "old");
        tokio::time::sleep(Duration::from_secs(3)).await;
        toasts.show(ToastKind::Info, "new");

        // The first toast outlived its own five seconds: the delay restarted.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(toasts.len(), 2);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        let left = toasts.snapshot();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].message, "new");
        driver.abort();
    }
}

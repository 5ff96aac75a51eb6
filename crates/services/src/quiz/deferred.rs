use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A task that runs after a delay unless cancelled first.
///
/// Dropping the handle cancels the task. Requires a running tokio runtime.
#[derive(Debug)]
pub struct DeferredCall {
    handle: Option<JoinHandle<()>>,
}

impl DeferredCall {
    pub fn schedule<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Abort the task if it has not run yet.
    pub fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Release the handle without aborting, for use by the task itself.
    pub(crate) fn detach(mut self) {
        self.handle.take();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for DeferredCall {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn runs_after_delay() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let call = DeferredCall::schedule(Duration::from_millis(500), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(call.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_prevent_the_call() {
        let hits = Arc::new(AtomicUsize::new(0));
        let first = Arc::clone(&hits);
        let second = Arc::clone(&hits);
        let cancelled = DeferredCall::schedule(Duration::from_millis(200), async move {
            first.fetch_add(1, Ordering::SeqCst);
        });
        let dropped = DeferredCall::schedule(Duration::from_millis(200), async move {
            second.fetch_add(1, Ordering::SeqCst);
        });

        cancelled.cancel();
        drop(dropped);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}

//! Fire-and-forget work that must not fail silently.
//!
//! Cache revalidation runs after the response has already been handed back,
//! so nobody awaits it. Tasks spawned here log their error instead of
//! dropping it, and the host (or a test) can `drain` outstanding work.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use ouca_core::Error;
use tokio::task::JoinHandle;

/// Tracker for detached tasks on the current tokio runtime.
#[derive(Clone, Debug, Default)]
pub struct BackgroundTasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task`; an `Err` result is logged at debug level under `label`.
    pub fn spawn<F>(&self, label: &'static str, task: F)
    where
        F: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            if let Err(e) = task.await {
                tracing::debug!(task = label, error = %e, "background task failed");
            }
        });

        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Tasks spawned and not yet observed finished.
    pub fn pending(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every task spawned so far.
    pub async fn drain(&self) {
        let handles = std::mem::take(&mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner));
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "background task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_drain_waits_for_tasks() {
        let tasks = BackgroundTasks::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = counter.clone();
            tasks.spawn("count", async move {
                tokio::task::yield_now().await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        tasks.drain().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(tasks.pending(), 0);
    }

    #[tokio::test]
    async fn test_failed_task_is_contained() {
        let tasks = BackgroundTasks::new();
        tasks.spawn("refresh", async { Err(Error::Network("offline".into())) });
        tasks.drain().await;
        assert_eq!(tasks.pending(), 0);
    }
}

//! Cancellable single-shot deferred tasks
//!
//! The pipeline needs two kinds of delayed callback: the post-detection
//! capture resume and periodic watchdog work. Both are modelled as
//! `DeferredTask`: a worker thread that waits for either the deadline or a
//! cancel signal, whichever comes first. Dropping the task cancels it, so
//! an owner that replaces a pending task (a new pause while one is already
//! pending) cancels the previous timer rather than stacking a duplicate
//! resume.

use crossbeam_channel::{after, bounded, select, Sender};
use std::time::Duration;

/// A single-shot deferred callback that fires after `delay` unless
/// cancelled first
pub struct DeferredTask {
    cancel_tx: Sender<()>,
}

impl DeferredTask {
    /// Schedules `f` to run after `delay` on a background thread
    pub fn schedule<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);

        std::thread::spawn(move || {
            select! {
                recv(cancel_rx) -> _ => {
                    tracing::debug!("Deferred task cancelled");
                }
                recv(after(delay)) -> _ => {
                    f();
                }
            }
        });

        Self { cancel_tx }
    }

    /// Cancels the task if it has not fired yet; idempotent
    pub fn cancel(&self) {
        let _ = self.cancel_tx.try_send(());
    }
}

impl Drop for DeferredTask {
    fn drop(&mut self) {
        // Non-blocking: never joins, so a callback may drop its own handle
        let _ = self.cancel_tx.try_send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_task_fires_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let flag = fired.clone();

        let task = DeferredTask::schedule(Duration::from_millis(10), move || {
            flag.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        drop(task);
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let flag = fired.clone();

        let task = DeferredTask::schedule(Duration::from_millis(30), move || {
            flag.fetch_add(1, Ordering::SeqCst);
        });
        task.cancel();

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_cancels() {
        let fired = Arc::new(AtomicUsize::new(0));
        let flag = fired.clone();

        {
            let _task = DeferredTask::schedule(Duration::from_millis(30), move || {
                flag.fetch_add(1, Ordering::SeqCst);
            });
        }

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_replacement_cancels_previous() {
        let fired = Arc::new(AtomicUsize::new(0));

        let flag = fired.clone();
        let mut pending = Some(DeferredTask::schedule(
            Duration::from_millis(30),
            move || {
                flag.fetch_add(1, Ordering::SeqCst);
            },
        ));

        // Replacing the pending task drops (and cancels) the old one
        let flag = fired.clone();
        pending = Some(DeferredTask::schedule(
            Duration::from_millis(10),
            move || {
                flag.fetch_add(10, Ordering::SeqCst);
            },
        ));

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(fired.load(Ordering::SeqCst), 10);
        drop(pending);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let task = DeferredTask::schedule(Duration::from_millis(30), || {});
        task.cancel();
        task.cancel();
    }
}

//! Supervised background tasks.
//!
//! # Responsibilities
//! - Run detached work without blocking the request that started it
//! - Contain panics inside the task and log them
//! - Track how many tasks are still running so shutdown can wait for them
//!
//! # Design Decisions
//! - The outstanding count is decremented by a drop guard, so it happens
//!   exactly once whether the task finishes, panics or is dropped by the runtime
//! - No cancellation: tasks run to completion or until the runtime stops

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::Notify;

use crate::observability::logging::{Level, Logger};
use crate::observability::metrics;
use crate::observability::panics::{panic_message, with_location};

/// Launcher for fire-and-forget tasks.
#[derive(Clone, Debug)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    outstanding: AtomicUsize,
    idle: Notify,
    logger: Arc<Logger>,
}

/// Decrements the outstanding count when the task is gone.
struct TaskGuard {
    inner: Arc<Inner>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        let previous = self.inner.outstanding.fetch_sub(1, Ordering::AcqRel);
        metrics::set_background_tasks(previous - 1);
        if previous == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

impl TaskGuard {
    fn report(&self, payload: Box<dyn Any + Send>) {
        let _ = self.inner.logger.log(
            Level::Error,
            &panic_message(payload.as_ref()),
            Some(&with_location(Default::default())),
        );
    }
}

impl BackgroundTasks {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            inner: Arc::new(Inner {
                outstanding: AtomicUsize::new(0),
                idle: Notify::new(),
                logger,
            }),
        }
    }

    fn track(&self) -> TaskGuard {
        let now = self.inner.outstanding.fetch_add(1, Ordering::AcqRel) + 1;
        metrics::set_background_tasks(now);
        TaskGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Run `task` on its own Tokio task. A panic inside it is logged at
    /// `Error` and otherwise ignored.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = self.track();
        tokio::spawn(async move {
            if let Err(payload) = AssertUnwindSafe(task).catch_unwind().await {
                guard.report(payload);
            }
        });
    }

    /// Run a synchronous closure on the blocking thread pool, so slow work
    /// never holds up a runtime worker. Panics are handled as in `spawn`.
    pub fn run<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = self.track();
        tokio::task::spawn_blocking(move || {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
                guard.report(payload);
            }
        });
    }

    /// Number of tasks started but not yet finished.
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    /// Wait until no tasks are outstanding.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Wait for outstanding tasks for at most `timeout`. Returns false if
    /// some were still running when the deadline passed.
    pub async fn drain(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_idle()).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::logging::SharedBuffer;
    use std::sync::atomic::AtomicBool;

    fn tasks() -> (BackgroundTasks, SharedBuffer) {
        let buf = SharedBuffer::default();
        let logger = Arc::new(Logger::new(buf.clone(), Level::Info));
        (BackgroundTasks::new(logger), buf)
    }

    #[tokio::test]
    async fn test_task_runs_and_count_drains() {
        let (tasks, buf) = tasks();
        let ran = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&ran);
        tasks.spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
        });
        assert_eq!(tasks.outstanding(), 1);

        assert!(tasks.drain(Duration::from_secs(5)).await);
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(tasks.outstanding(), 0);
        assert!(buf.contents().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_task_is_contained() {
        let (tasks, buf) = tasks();

        tasks.run(|| panic!("sensor feed went away"));
        tasks.spawn(async {});

        assert!(tasks.drain(Duration::from_secs(5)).await);
        assert_eq!(tasks.outstanding(), 0);

        let lines = buf.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "ERROR+STACK");
        assert_eq!(lines[0]["message"], "sensor feed went away");
    }

    #[tokio::test]
    async fn test_drain_times_out() {
        let (tasks, _buf) = tasks();
        tasks.spawn(tokio::time::sleep(Duration::from_secs(60)));

        assert!(!tasks.drain(Duration::from_millis(20)).await);
        assert_eq!(tasks.outstanding(), 1);
    }

    #[tokio::test]
    async fn test_wait_idle_with_nothing_running() {
        let (tasks, _buf) = tasks();
        tasks.wait_idle().await;
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_blocking_job_does_not_stall_runtime() {
        let (tasks, _buf) = tasks();

        tasks.run(|| std::thread::sleep(Duration::from_millis(500)));

        let start = std::time::Instant::now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(start.elapsed() < Duration::from_millis(300));
        assert_eq!(tasks.outstanding(), 1);

        assert!(tasks.drain(Duration::from_secs(5)).await);
    }
}

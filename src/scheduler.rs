//! The cooperative, single-OS-thread task runner (spec.md §4.2).
//!
//! Built directly on `tokio`'s current-thread runtime and `LocalSet`, the
//! same pairing `distant-net`'s own binaries use to run non-`Send` futures on
//! a dedicated thread. A thread-local flag records whether a `Scheduler` is
//! currently driving the calling thread, so [`Endpoint`](crate::endpoint)
//! can choose between a cooperative send and transparently bootstrapping one
//! (spec.md §4.3).

use std::cell::Cell;
use std::future::Future;
use std::time::Duration;

use tokio::runtime::Builder;
use tokio::sync::Notify;
use tokio::task::{JoinHandle, LocalSet};

thread_local! {
    static SCHEDULER_INSTALLED: Cell<bool> = Cell::new(false);
}

/// A cooperative condition variable understood by the [`Scheduler`]: tasks
/// parked on it suspend without blocking the OS thread, and are resumed in
/// the order `tokio::sync::Notify` wakes them.
#[derive(Default)]
pub struct Condition {
    notify: Notify,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wakes at most one parked task.
    pub fn notify_one(&self) {
        self.notify.notify_one();
    }

    /// Wakes every currently parked task.
    pub fn notify_all(&self) {
        self.notify.notify_waiters();
    }

    /// Suspends the current task until notified or until `timeout` elapses,
    /// whichever comes first. Returns `true` if notified, `false` on
    /// timeout. A zero timeout yields once without actually waiting, which
    /// is how the `ServerLoop`'s deferred-dispatch busy wait (spec.md §4.4)
    /// polls `sleeping()` without spinning the scheduler hot.
    pub async fn wait(&self, timeout: Duration) -> bool {
        if timeout.is_zero() {
            tokio::task::yield_now().await;
            return false;
        }
        tokio::time::timeout(timeout, self.notify.notified())
            .await
            .is_ok()
    }

    /// Suspends the current task until notified, with no deadline.
    pub async fn wait_forever(&self) {
        self.notify.notified().await;
    }
}

/// Runs cooperative tasks ("fibers") on the current OS thread (spec.md §4.2).
///
/// A `Scheduler` is cheap to construct and single-use: build one, call
/// [`start`](Self::start) once with the root task, and let it drive every
/// task `spawn`ed from within that root (directly or transitively) to
/// completion.
pub struct Scheduler {
    local: LocalSet,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            local: LocalSet::new(),
        }
    }

    /// Whether a `Scheduler` is currently driving the calling OS thread.
    pub fn is_installed() -> bool {
        SCHEDULER_INSTALLED.with(|c| c.get())
    }

    /// Schedules `fut` as a new task sharing this thread with its siblings.
    /// Must be called from within [`start`](Self::start)'s root task (or a
    /// task transitively spawned from it).
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.local.spawn_local(fut)
    }

    /// Voluntarily relinquishes the current task, letting sibling tasks run.
    pub async fn yield_now() {
        tokio::task::yield_now().await;
    }

    pub fn new_condition(&self) -> Condition {
        Condition::new()
    }

    /// Runs tasks on this thread until `root` completes and every task
    /// transitively spawned from it has also completed. Installs this
    /// thread as having a current scheduler for the duration of the call.
    pub fn start<F>(&self, root: F) -> F::Output
    where
        F: Future,
    {
        let previously_installed = SCHEDULER_INSTALLED.with(|c| c.replace(true));

        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("building a current-thread tokio runtime should never fail");

        let result = runtime.block_on(self.local.run_until(root));

        SCHEDULER_INSTALLED.with(|c| c.set(previously_installed));
        result
    }
}

//! Schedulers decide where and when a unit of work runs.
//!
//! Every scheduler measures time as a [`Duration`] since its own epoch and
//! hands back a [`TaskHandle`] for each task. Unsubscribing the handle stops
//! a task that has not started yet; it has no effect once the task is
//! running or done.
//!
//! | Scheduler | Runs on |
//! |-----------|---------|
//! | [`ImmediateScheduler`] | the calling thread, blocking on delays |
//! | [`ThreadScheduler`] | a fresh OS thread per task |
//! | [`ThreadPoolScheduler`] | a `futures` thread pool (`futures-scheduler`) |
//! | [`TokioScheduler`] | a tokio runtime (`tokio-scheduler`) |
//! | [`TestScheduler`] | a thread-local virtual clock |

use std::{
  sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
  },
  time::{Duration, Instant},
};

use once_cell::sync::Lazy;

use crate::subscription::SubscriptionLike;

mod test_scheduler;
mod thread_scheduler;
#[cfg(feature = "futures-scheduler")]
mod thread_pool_scheduler;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

pub use test_scheduler::TestScheduler;
pub use thread_scheduler::{new_thread, ThreadScheduler};
#[cfg(feature = "futures-scheduler")]
pub use thread_pool_scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// A Scheduler is an object to order task and schedule their execution.
pub trait Scheduler: Clone + Send + Sync + 'static {
  /// Current time of this scheduler's clock.
  fn now(&self) -> Duration;

  /// Run `task` once the clock reaches `due`. A `due` in the past means
  /// "as soon as possible".
  fn schedule_at<F>(&self, due: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static;

  #[inline]
  fn schedule<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    self.schedule_at(self.now(), task)
  }

  #[inline]
  fn schedule_after<F>(&self, delay: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    self.schedule_at(self.now() + delay, task)
  }
}

// ============================================================================
// TaskHandle
// ============================================================================

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const FINISHED: u8 = 2;
const CANCELLED: u8 = 3;

/// Cancellation handle of one scheduled task.
#[derive(Clone, Debug)]
pub struct TaskHandle(Arc<AtomicU8>);

impl TaskHandle {
  pub(crate) fn pending() -> Self { TaskHandle(Arc::new(AtomicU8::new(PENDING))) }

  /// Claim the task for execution. Returns `false` if it was cancelled.
  pub(crate) fn start(&self) -> bool {
    self
      .0
      .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }

  pub(crate) fn finish(&self) { self.0.store(FINISHED, Ordering::Release); }

  /// Run `task` unless this handle was cancelled first.
  pub(crate) fn run(&self, task: impl FnOnce()) {
    if self.start() {
      task();
      self.finish();
    }
  }

  pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Acquire) == CANCELLED }

  pub fn is_finished(&self) -> bool { self.0.load(Ordering::Acquire) == FINISHED }
}

impl SubscriptionLike for TaskHandle {
  fn unsubscribe(&mut self) {
    if self
      .0
      .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
    {
      tracing::trace!("scheduled task cancelled");
    }
  }

  #[inline]
  fn is_closed(&self) -> bool {
    let state = self.0.load(Ordering::Acquire);
    state == FINISHED || state == CANCELLED
  }
}

// ============================================================================
// Wall clock
// ============================================================================

static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Time since the process-wide epoch shared by the real-time schedulers.
#[inline]
pub(crate) fn wall_clock() -> Duration { EPOCH.elapsed() }

/// Executes tasks on the calling thread before `schedule*` returns.
#[derive(Clone, Copy, Default, Debug)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  #[inline]
  fn now(&self) -> Duration { wall_clock() }

  fn schedule_at<F>(&self, due: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let delay = due.saturating_sub(self.now());
    if !delay.is_zero() {
      std::thread::sleep(delay);
    }
    let handle = TaskHandle::pending();
    handle.run(task);
    handle
  }
}

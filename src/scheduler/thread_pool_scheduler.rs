use std::{io, time::Duration};

use futures::executor::ThreadPool;

use super::{wall_clock, Scheduler, TaskHandle};

/// Runs tasks on a `futures` thread pool. Delays are timers, not blocked
/// threads.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
}

impl ThreadPoolScheduler {
  /// A scheduler backed by a new pool with one thread per CPU.
  pub fn new() -> io::Result<Self> { ThreadPool::new().map(Self::from_pool) }

  pub fn from_pool(pool: ThreadPool) -> Self { ThreadPoolScheduler { pool } }
}

impl Scheduler for ThreadPoolScheduler {
  #[inline]
  fn now(&self) -> Duration { wall_clock() }

  fn schedule_at<F>(&self, due: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::pending();
    let delay = due.saturating_sub(self.now());
    let h = handle.clone();
    self.pool.spawn_ok(async move {
      if !delay.is_zero() {
        futures_time::task::sleep(delay.into()).await;
      }
      h.run(task);
    });
    handle
  }
}

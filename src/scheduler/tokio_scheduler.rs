use std::time::Duration;

use tokio::runtime::Handle;

use super::{wall_clock, Scheduler, TaskHandle};

/// Spawns tasks on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
  runtime: Handle,
}

impl TokioScheduler {
  pub fn new(runtime: Handle) -> Self { TokioScheduler { runtime } }

  /// The runtime the caller is running in, if any.
  pub fn current() -> Option<Self> { Handle::try_current().ok().map(Self::new) }
}

impl Scheduler for TokioScheduler {
  #[inline]
  fn now(&self) -> Duration { wall_clock() }

  fn schedule_at<F>(&self, due: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::pending();
    let delay = due.saturating_sub(self.now());
    let h = handle.clone();
    self.runtime.spawn(async move {
      if !delay.is_zero() {
        tokio::time::sleep(delay).await;
      }
      h.run(task);
    });
    handle
  }
}

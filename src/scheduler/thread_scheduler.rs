use std::{thread, time::Duration};

use super::{wall_clock, Scheduler, TaskHandle};

/// Runs every task on a fresh OS thread.
#[derive(Clone, Copy, Default, Debug)]
pub struct ThreadScheduler;

/// Returns a Scheduler instance that creates a new thread for each unit of
/// work.
pub fn new_thread() -> ThreadScheduler { ThreadScheduler }

impl Scheduler for ThreadScheduler {
  #[inline]
  fn now(&self) -> Duration { wall_clock() }

  fn schedule_at<F>(&self, due: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::pending();
    let delay = due.saturating_sub(self.now());
    let h = handle.clone();
    thread::spawn(move || {
      if !delay.is_zero() {
        thread::sleep(delay);
      }
      h.run(task);
    });
    handle
  }
}

//! Virtual-time scheduler for deterministic tests.
//!
//! Time only moves when the test says so. Tasks run synchronously on the
//! calling thread while time is advanced, in due-time order and, for equal
//! due times, in the order they were scheduled.
//!
//! ```rust
//! use std::{sync::{Arc, Mutex}, time::Duration};
//! use rxcast::scheduler::{Scheduler, TestScheduler};
//!
//! TestScheduler::init();
//! let fired = Arc::new(Mutex::new(None));
//! let f = fired.clone();
//! TestScheduler.schedule_after(Duration::from_millis(100), move || {
//!   *f.lock().unwrap() = Some(TestScheduler::clock());
//! });
//! TestScheduler::advance_by(Duration::from_millis(100));
//! assert_eq!(*fired.lock().unwrap(), Some(100));
//! ```
//!
//! The state is thread-local: every thread has its own clock and queue, so
//! tests running in parallel do not interfere. One clock tick is one
//! millisecond of [`Duration`].

use std::{cell::RefCell, cmp::Ordering, collections::BinaryHeap, time::Duration};

use super::{Scheduler, TaskHandle};
use crate::subscription::SubscriptionLike;

// ==================== Internal State ====================

#[derive(Default)]
struct TestSchedulerState {
  virtual_time: Duration,
  task_queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
}

struct ScheduledTask {
  scheduled_time: Duration,
  task_id: usize,
  task: Box<dyn FnOnce()>,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool {
    self.scheduled_time == other.scheduled_time && self.task_id == other.task_id
  }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other
      .scheduled_time
      .cmp(&self.scheduled_time)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

thread_local! {
  static TEST_SCHEDULER_STATE: RefCell<TestSchedulerState>
    = RefCell::new(TestSchedulerState::default());
}

// ==================== TestScheduler ====================

/// A virtual time scheduler for deterministic testing.
///
/// This is a zero-sized type that accesses thread-local state.
/// All instances in the same thread share the same virtual time and task queue.
#[derive(Clone, Copy, Default, Debug)]
pub struct TestScheduler;

impl TestScheduler {
  /// Reset the clock to zero and drop every pending task.
  pub fn init() {
    TEST_SCHEDULER_STATE.with(|state| {
      let mut state = state.borrow_mut();
      state.virtual_time = Duration::ZERO;
      state.task_queue.clear();
      state.next_task_id = 0;
    });
  }

  /// Current virtual time in ticks.
  pub fn clock() -> u64 { to_ticks(Self::elapsed()) }

  /// Current virtual time.
  pub fn elapsed() -> Duration { TEST_SCHEDULER_STATE.with(|state| state.borrow().virtual_time) }

  /// Number of tasks still waiting to run. Cancelled tasks are not counted.
  pub fn pending_count() -> usize {
    TEST_SCHEDULER_STATE.with(|state| {
      state
        .borrow()
        .task_queue
        .iter()
        .filter(|t| !t.handle.is_closed())
        .count()
    })
  }

  pub fn is_empty() -> bool { Self::pending_count() == 0 }

  /// Advance the clock by `delta`, running every task due on the way.
  pub fn advance_by(delta: Duration) {
    let target = Self::elapsed() + delta;
    Self::run_until(Some(target));
  }

  /// Advance the clock to the absolute tick `tick`, running every task due
  /// on the way. A tick in the past runs only what is already due.
  pub fn advance_to(tick: u64) { Self::run_until(Some(Duration::from_millis(tick))); }

  /// Run until the queue is empty, including tasks scheduled by running
  /// tasks. The clock ends at the due time of the last task run.
  pub fn flush() { Self::run_until(None); }

  fn run_until(target: Option<Duration>) {
    while let Some(task) = Self::pop_due(target) {
      let ScheduledTask { task, handle, .. } = task;
      if handle.is_cancelled() {
        continue;
      }
      // no borrow of the state is held here, so the task may schedule more
      handle.run(task);
    }
    if let Some(target) = target {
      TEST_SCHEDULER_STATE.with(|state| {
        let mut state = state.borrow_mut();
        if state.virtual_time < target {
          state.virtual_time = target;
        }
      });
    }
  }

  fn pop_due(target: Option<Duration>) -> Option<ScheduledTask> {
    TEST_SCHEDULER_STATE.with(|state| {
      let mut state = state.borrow_mut();
      let due = state.task_queue.peek()?.scheduled_time;
      if target.is_some_and(|target| due > target) {
        return None;
      }
      let task = state.task_queue.pop()?;
      if state.virtual_time < task.scheduled_time {
        state.virtual_time = task.scheduled_time;
      }
      Some(task)
    })
  }
}

impl Scheduler for TestScheduler {
  #[inline]
  fn now(&self) -> Duration { Self::elapsed() }

  fn schedule_at<F>(&self, due: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::pending();
    TEST_SCHEDULER_STATE.with(|state| {
      let mut state = state.borrow_mut();
      let scheduled_time = due.max(state.virtual_time);
      let task_id = state.next_task_id;
      state.next_task_id += 1;
      state.task_queue.push(ScheduledTask {
        scheduled_time,
        task_id,
        task: Box::new(task),
        handle: handle.clone(),
      });
    });
    handle
  }
}

#[inline]
pub(crate) fn to_ticks(d: Duration) -> u64 { d.as_millis() as u64 }

#[cfg(test)]
mod test {
  use std::sync::{Arc, Mutex};

  use super::*;

  type Log = Arc<Mutex<Vec<(u64, &'static str)>>>;

  fn at(log: &Log, tick: u64, name: &'static str) -> TaskHandle {
    let log = log.clone();
    TestScheduler.schedule_at(Duration::from_millis(tick), move || {
      log.lock().unwrap().push((TestScheduler::clock(), name));
    })
  }

  #[rxcast_macro::test(virtual_time)]
  fn runs_in_due_order_with_fifo_ties() {
    let log = Log::default();
    at(&log, 20, "c");
    at(&log, 10, "a");
    at(&log, 10, "b");
    TestScheduler::flush();
    assert_eq!(*log.lock().unwrap(), vec![(10, "a"), (10, "b"), (20, "c")]);
    assert_eq!(TestScheduler::clock(), 20);
  }

  #[rxcast_macro::test(virtual_time)]
  fn advance_stops_at_horizon() {
    let log = Log::default();
    at(&log, 100, "a");
    at(&log, 300, "b");
    TestScheduler::advance_to(200);
    assert_eq!(*log.lock().unwrap(), vec![(100, "a")]);
    assert_eq!(TestScheduler::clock(), 200);
    assert_eq!(TestScheduler::pending_count(), 1);
    TestScheduler::advance_by(Duration::from_millis(100));
    assert_eq!(log.lock().unwrap().len(), 2);
    assert!(TestScheduler::is_empty());
  }

  #[rxcast_macro::test(virtual_time)]
  fn cancelled_tasks_are_skipped() {
    let log = Log::default();
    let mut handle = at(&log, 10, "cancelled");
    at(&log, 20, "kept");
    handle.unsubscribe();
    assert_eq!(TestScheduler::pending_count(), 1);
    TestScheduler::flush();
    assert_eq!(*log.lock().unwrap(), vec![(20, "kept")]);
  }

  #[rxcast_macro::test(virtual_time)]
  fn nested_scheduling_within_horizon() {
    let log = Log::default();
    let l = log.clone();
    TestScheduler.schedule_at(Duration::from_millis(10), move || {
      at(&l, 15, "nested");
      at(&l, 50, "late");
    });
    TestScheduler::advance_to(20);
    assert_eq!(*log.lock().unwrap(), vec![(15, "nested")]);
  }

  #[rxcast_macro::test(virtual_time)]
  fn past_due_runs_now() {
    TestScheduler::advance_to(100);
    let log = Log::default();
    at(&log, 30, "late");
    TestScheduler::flush();
    assert_eq!(*log.lock().unwrap(), vec![(100, "late")]);
  }

  #[rxcast_macro::test(virtual_time)]
  fn same_tick_scheduling_from_task_runs_after_siblings() {
    let log = Log::default();
    let l = log.clone();
    TestScheduler.schedule_at(Duration::from_millis(5), move || {
      l.lock().unwrap().push((TestScheduler::clock(), "first"));
      let l2 = l.clone();
      TestScheduler.schedule(move || l2.lock().unwrap().push((TestScheduler::clock(), "third")));
    });
    at(&log, 5, "second");
    TestScheduler::flush();
    assert_eq!(*log.lock().unwrap(), vec![(5, "first"), (5, "second"), (5, "third")]);
  }
}

use std::{collections::VecDeque, time::Duration};

use super::{broadcast_complete, broadcast_error, broadcast_value, remove_on_close, SubjectLike, Subscribers};
use crate::{
  notification::Notification,
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut},
  scheduler::Scheduler,
  subscriber::Subscriber,
  subscription::SharedSubscription,
};

/// A subject that keeps a bounded tail of what it received and replays it to
/// every new subscriber, synchronously and in the original order, followed
/// by the terminal notification if there was one.
///
/// The tail is bounded by `buffer_size` (number of values) and by `window`
/// (age of a value, measured with the scheduler's clock). Values are
/// timestamped on arrival; the buffer is trimmed on every insert and again
/// before a replay.
pub struct ReplaySubject<Item, Err, S> {
  inner: MutArc<ReplayState<Item, Err>>,
  scheduler: S,
}

struct ReplayState<Item, Err> {
  buffer: VecDeque<(Duration, Item)>,
  buffer_size: Option<usize>,
  window: Option<Duration>,
  observers: Subscribers<Item, Err>,
  terminal: Option<Notification<Item, Err>>,
}

impl<Item, Err> ReplayState<Item, Err> {
  fn trim(&mut self, now: Duration) {
    if let Some(size) = self.buffer_size {
      while self.buffer.len() > size {
        self.buffer.pop_front();
      }
    }
    if let Some(window) = self.window {
      while self
        .buffer
        .front()
        .is_some_and(|(at, _)| now.saturating_sub(*at) > window)
      {
        self.buffer.pop_front();
      }
    }
  }
}

impl<Item, Err, S: Clone> Clone for ReplaySubject<Item, Err, S> {
  fn clone(&self) -> Self { ReplaySubject { inner: self.inner.clone(), scheduler: self.scheduler.clone() } }
}

impl<Item, Err, S> ReplaySubject<Item, Err, S> {
  pub fn new(buffer_size: Option<usize>, window: Option<Duration>, scheduler: S) -> Self {
    ReplaySubject {
      inner: MutArc::own(ReplayState {
        buffer: VecDeque::new(),
        buffer_size,
        window,
        observers: Subscribers::default(),
        terminal: None,
      }),
      scheduler,
    }
  }

  /// A subject that replays everything it received.
  pub fn unbounded(scheduler: S) -> Self { Self::new(None, None, scheduler) }

  pub fn subscriber_count(&self) -> usize { self.inner.rc_deref().observers.len() }
}

impl<Item, Err, S> Observer<Item, Err> for ReplaySubject<Item, Err, S>
where
  Item: Clone,
  Err: Clone,
  S: Scheduler,
{
  fn next(&mut self, value: Item) {
    let now = self.scheduler.now();
    let observers = {
      let mut state = self.inner.rc_deref_mut();
      if state.terminal.is_some() {
        return;
      }
      state.buffer.push_back((now, value.clone()));
      state.trim(now);
      state.observers.snapshot()
    };
    broadcast_value(observers, value);
  }

  fn error(&mut self, err: Err) {
    let observers = {
      let mut state = self.inner.rc_deref_mut();
      if state.terminal.is_some() {
        return;
      }
      state.terminal = Some(Notification::Error(err.clone()));
      state.observers.drain()
    };
    broadcast_error(observers, err);
  }

  fn complete(&mut self) {
    let observers = {
      let mut state = self.inner.rc_deref_mut();
      if state.terminal.is_some() {
        return;
      }
      state.terminal = Some(Notification::Complete);
      state.observers.drain()
    };
    broadcast_complete(observers);
  }

  fn is_closed(&self) -> bool { self.inner.rc_deref().terminal.is_some() }
}

impl<Item, Err, S> Observable for ReplaySubject<Item, Err, S>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  S: Scheduler,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let now = self.scheduler.now();
    let subscriber = Subscriber::new(observer);
    let subscription = subscriber.subscription();
    let mut held = subscriber.hold();
    let (backlog, terminal, id) = {
      let mut state = self.inner.rc_deref_mut();
      state.trim(now);
      let backlog: Vec<Item> = state.buffer.iter().map(|(_, v)| v.clone()).collect();
      let terminal = state.terminal.clone();
      let id = terminal.is_none().then(|| state.observers.add(subscriber.clone()));
      (backlog, terminal, id)
    };
    if let Some(id) = id {
      remove_on_close(&subscription, &self.inner, id, |s| &mut s.observers);
    }
    for v in backlog {
      held.next(v);
    }
    if let Some(terminal) = terminal {
      held.terminate(terminal);
    }
    subscription
  }
}

impl<Item, Err, S> SubjectLike<Item, Err> for ReplaySubject<Item, Err, S>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  S: Scheduler,
{
  fn renew(&self) -> Self {
    let (buffer_size, window) = {
      let state = self.inner.rc_deref();
      (state.buffer_size, state.window)
    };
    ReplaySubject::new(buffer_size, window, self.scheduler.clone())
  }
}

#[cfg(test)]
mod test {
  use std::sync::{Arc, Mutex};

  use super::*;
  use crate::{
    observable::ObservableExt, observer::NotificationObserver, scheduler::TestScheduler,
  };

  type Log = Arc<Mutex<Vec<(u64, Notification<i32, &'static str>)>>>;

  fn record<S: Scheduler>(subject: &ReplaySubject<i32, &'static str, S>) -> Log {
    let log = Log::default();
    let l = log.clone();
    subject.clone().subscribe_with(NotificationObserver::new(move |n| {
      l.lock().unwrap().push((TestScheduler::clock(), n))
    }));
    log
  }

  fn values(log: &Log) -> Vec<i32> {
    log.lock().unwrap().iter().filter_map(|(_, n)| n.value().copied()).collect()
  }

  #[rxcast_macro::test(virtual_time)]
  fn size_bound_keeps_latest() {
    let mut subject = ReplaySubject::new(Some(2), None, TestScheduler);
    (1..=5).for_each(|v| subject.next(v));
    let log = record(&subject);
    assert_eq!(values(&log), vec![4, 5]);
    subject.next(6);
    assert_eq!(values(&log), vec![4, 5, 6]);
  }

  #[rxcast_macro::test(virtual_time)]
  fn window_evicts_old_values() {
    let mut subject = ReplaySubject::new(None, Some(Duration::from_millis(100)), TestScheduler);
    let mut s = subject.clone();
    TestScheduler.schedule_at(Duration::from_millis(10), move || s.next(1));
    let mut s = subject.clone();
    TestScheduler.schedule_at(Duration::from_millis(90), move || s.next(2));
    TestScheduler::advance_to(150);
    let log = record(&subject);
    assert_eq!(values(&log), vec![2]);
    assert_eq!(log.lock().unwrap()[0].0, 150);
    subject.next(3);
    assert_eq!(values(&log), vec![2, 3]);
  }

  #[rxcast_macro::test(virtual_time)]
  fn window_boundary_is_inclusive() {
    let mut subject = ReplaySubject::new(None, Some(Duration::from_millis(100)), TestScheduler);
    subject.next(1);
    TestScheduler::advance_to(100);
    assert_eq!(values(&record(&subject)), vec![1]);
    TestScheduler::advance_to(101);
    assert!(values(&record(&subject)).is_empty());
  }

  #[rxcast_macro::test(virtual_time)]
  fn both_bounds_apply() {
    let mut subject = ReplaySubject::new(Some(2), Some(Duration::from_millis(50)), TestScheduler);
    subject.next(1);
    TestScheduler::advance_to(40);
    subject.next(2);
    subject.next(3);
    assert_eq!(values(&record(&subject)), vec![2, 3]);
    TestScheduler::advance_to(100);
    subject.next(4);
    assert_eq!(values(&record(&subject)), vec![4]);
  }

  #[rxcast_macro::test(virtual_time)]
  fn replays_terminal_after_backlog() {
    let mut subject = ReplaySubject::new(Some(1), None, TestScheduler);
    subject.next(1);
    subject.next(2);
    subject.error("boom");
    let log = record(&subject);
    let got: Vec<_> = log.lock().unwrap().iter().map(|(_, n)| n.clone()).collect();
    assert_eq!(got, vec![Notification::Next(2), Notification::Error("boom")]);
    assert_eq!(subject.subscriber_count(), 0);
  }
}

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use super::{Message, Recorded};
use crate::{
  error::ContractViolation,
  notification::Notification,
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut},
  scheduler::TestScheduler,
};

/// Records every notification with the virtual tick it arrived at.
///
/// Clones share the same log, so one clone can be handed to a source while
/// the test keeps another for inspection. Notifications arriving after a
/// terminal one are still recorded, and also reported as
/// [`ContractViolation`]s. So is a notification that arrives while a
/// previous call into the observer has not returned yet.
///
/// A reaction registered with [`TestObserver::reacting`] runs inside every
/// call, which lets a scenario feed its own source from the observer.
pub struct TestObserver<Item, Err> {
  state: MutArc<TestObserverState<Item, Err>>,
  delivering: Arc<AtomicBool>,
  reaction: MutArc<Option<Reaction<Item, Err>>>,
}

type Reaction<Item, Err> = Box<dyn FnMut(&Notification<Item, Err>) + Send>;

struct TestObserverState<Item, Err> {
  messages: Vec<Message<Item, Err>>,
  violations: Vec<ContractViolation>,
  terminated: bool,
}

impl<Item, Err> Clone for TestObserver<Item, Err> {
  fn clone(&self) -> Self {
    TestObserver {
      state: self.state.clone(),
      delivering: self.delivering.clone(),
      reaction: self.reaction.clone(),
    }
  }
}

impl<Item, Err> Default for TestObserver<Item, Err> {
  fn default() -> Self {
    TestObserver {
      state: MutArc::own(TestObserverState { messages: vec![], violations: vec![], terminated: false }),
      delivering: Arc::default(),
      reaction: MutArc::own(None),
    }
  }
}

impl<Item, Err> TestObserver<Item, Err> {
  pub fn new() -> Self { Self::default() }

  /// An observer that calls `reaction` with each notification before
  /// recording it.
  pub fn reacting(reaction: impl FnMut(&Notification<Item, Err>) + Send + 'static) -> Self {
    let observer = Self::default();
    *observer.reaction.rc_deref_mut() = Some(Box::new(reaction));
    observer
  }

  pub fn messages(&self) -> Vec<Message<Item, Err>>
  where
    Item: Clone,
    Err: Clone,
  {
    self.state.rc_deref().messages.clone()
  }

  /// Only the values, without timestamps.
  pub fn values(&self) -> Vec<Item>
  where
    Item: Clone,
  {
    let state = self.state.rc_deref();
    state
      .messages
      .iter()
      .filter_map(|m| m.value.value().cloned())
      .collect()
  }

  pub fn violations(&self) -> Vec<ContractViolation> { self.state.rc_deref().violations.clone() }

  pub fn is_terminated(&self) -> bool { self.state.rc_deref().terminated }

  fn record(&mut self, notification: Notification<Item, Err>) {
    let time = TestScheduler::clock();
    let overlapping = self.delivering.swap(true, Ordering::AcqRel);

    // a nested call finds the reaction locked and skips it
    if let Some(mut reaction) = self.reaction.try_rc_deref_mut() {
      if let Some(reaction) = reaction.as_mut() {
        reaction(&notification);
      }
    }

    let kind = kind_of(&notification);
    let mut state = self.state.rc_deref_mut();
    if overlapping {
      state
        .violations
        .push(ContractViolation::OverlappingDelivery { time, kind });
    }
    if state.terminated {
      state
        .violations
        .push(ContractViolation::NotificationAfterTerminal { time, kind });
    }
    state.terminated |= notification.is_terminal();
    state.messages.push(Recorded::new(time, notification));
    drop(state);

    if !overlapping {
      self.delivering.store(false, Ordering::Release);
    }
  }
}

fn kind_of<Item, Err>(notification: &Notification<Item, Err>) -> &'static str {
  match notification {
    Notification::Next(_) => "next",
    Notification::Error(_) => "error",
    Notification::Complete => "complete",
  }
}

impl<Item, Err> Observer<Item, Err> for TestObserver<Item, Err> {
  fn next(&mut self, value: Item) { self.record(Notification::Next(value)); }

  fn error(&mut self, err: Err) { self.record(Notification::Error(err)); }

  fn complete(&mut self) { self.record(Notification::Complete); }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::testing::{on_completed, on_next};

  #[rxcast_macro::test(virtual_time)]
  fn stamps_with_virtual_clock() {
    let mut observer = TestObserver::<i32, ()>::new();
    TestScheduler::advance_to(10);
    observer.next(1);
    TestScheduler::advance_to(25);
    observer.complete();
    assert_eq!(observer.messages(), vec![on_next(10, 1), on_completed(25)]);
    assert!(observer.violations().is_empty());
  }

  #[rxcast_macro::test(virtual_time)]
  fn reports_delivery_after_terminal() {
    let mut observer = TestObserver::<i32, &'static str>::new();
    observer.error("boom");
    observer.next(1);
    observer.complete();
    assert_eq!(
      observer.violations(),
      vec![
        ContractViolation::NotificationAfterTerminal { time: 0, kind: "next" },
        ContractViolation::NotificationAfterTerminal { time: 0, kind: "complete" },
      ]
    );
    assert_eq!(observer.messages().len(), 3);
  }

  #[rxcast_macro::test(virtual_time)]
  fn reports_overlapping_delivery() {
    let slot: Arc<std::sync::Mutex<Option<TestObserver<i32, ()>>>> = Arc::default();
    let inner = slot.clone();
    let mut observer = TestObserver::reacting(move |n: &Notification<i32, ()>| {
      if n.value() == Some(&1) {
        if let Some(mut same) = inner.lock().unwrap().clone() {
          same.next(2);
        }
      }
    });
    *slot.lock().unwrap() = Some(observer.clone());
    TestScheduler::advance_to(7);
    observer.next(1);
    observer.next(3);
    assert_eq!(
      observer.violations(),
      vec![ContractViolation::OverlappingDelivery { time: 7, kind: "next" }]
    );
    assert_eq!(observer.values(), vec![2, 1, 3]);
  }
}

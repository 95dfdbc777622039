//! Subjects: observers that are also observables.
//!
//! Every notification a subject receives is fanned out to the observers
//! subscribed at that moment. Subjects are handles: clones share the same
//! observer list, so one clone can be fed by a source while another is
//! handed out to subscribers.
//!
//! Delivery happens outside the subject's lock. An observer may subscribe
//! to, unsubscribe from, or feed the subject it is being called by. A
//! notification fed back from inside a callback is queued on that observer
//! and delivered once the running callback returns, so calls into one
//! observer never nest.

use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut},
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};

mod behavior_subject;
mod replay_subject;
mod subscribers;

pub use behavior_subject::BehaviorSubject;
pub use replay_subject::ReplaySubject;
use subscribers::{broadcast_complete, broadcast_error, broadcast_value, Subscribers};

/// Anything that can sit between a source and many subscribers.
pub trait SubjectLike<Item, Err>:
  Observer<Item, Err>
  + Observable<Item = Item, Err = Err, Unsub = SharedSubscription>
  + Clone
  + Send
  + Sync
  + 'static
{
  /// A subject of the same flavour and configuration that has received
  /// nothing yet.
  fn renew(&self) -> Self;
}

/// Plain multicast subject without any memory.
///
/// Observers that subscribe after the subject terminated get nothing, not
/// even the terminal notification.
pub struct Subject<Item, Err> {
  inner: MutArc<SubjectState<Item, Err>>,
}

struct SubjectState<Item, Err> {
  observers: Subscribers<Item, Err>,
  stopped: bool,
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self {
    Subject { inner: MutArc::own(SubjectState { observers: Subscribers::default(), stopped: false }) }
  }
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Subject { inner: self.inner.clone() } }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Self::default() }

  /// Number of observers currently subscribed.
  pub fn subscriber_count(&self) -> usize { self.inner.rc_deref().observers.len() }

  /// Whether an error or completion has been received.
  pub fn is_stopped(&self) -> bool { self.inner.rc_deref().stopped }
}

impl<Item, Err> Observer<Item, Err> for Subject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    let observers = {
      let state = self.inner.rc_deref();
      if state.stopped {
        return;
      }
      state.observers.snapshot()
    };
    broadcast_value(observers, value);
  }

  fn error(&mut self, err: Err) {
    let observers = {
      let mut state = self.inner.rc_deref_mut();
      if state.stopped {
        return;
      }
      state.stopped = true;
      state.observers.drain()
    };
    broadcast_error(observers, err);
  }

  fn complete(&mut self) {
    let observers = {
      let mut state = self.inner.rc_deref_mut();
      if state.stopped {
        return;
      }
      state.stopped = true;
      state.observers.drain()
    };
    broadcast_complete(observers);
  }

  #[inline]
  fn is_closed(&self) -> bool { self.is_stopped() }
}

impl<Item, Err> Observable for Subject<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let subscriber = Subscriber::new(observer);
    let mut subscription = subscriber.subscription();
    let id = {
      let mut state = self.inner.rc_deref_mut();
      if state.stopped {
        None
      } else {
        Some(state.observers.add(subscriber))
      }
    };
    match id {
      Some(id) => remove_on_close(&subscription, &self.inner, id, |s| &mut s.observers),
      None => subscription.unsubscribe(),
    }
    subscription
  }
}

impl<Item, Err> SubjectLike<Item, Err> for Subject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  #[inline]
  fn renew(&self) -> Self { Subject::new() }
}

/// Remove entry `id` from the subject state once `subscription` closes.
///
/// The subject is referenced weakly, so a subscription never keeps the
/// subject it came from alive. The removed subscriber is dropped after the
/// lock is released.
pub(crate) fn remove_on_close<S, Item, Err>(
  subscription: &SharedSubscription, state: &MutArc<S>, id: usize,
  observers: fn(&mut S) -> &mut Subscribers<Item, Err>,
) where
  S: Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  let weak = state.downgrade();
  subscription.add_fn(move || {
    if let Some(state) = weak.upgrade() {
      let removed = observers(&mut state.rc_deref_mut()).remove(id);
      drop(removed);
    }
  });
}

#[cfg(test)]
mod test {
  use std::sync::{Arc, Mutex};

  use super::*;
  use crate::{notification::Notification, observable::ObservableExt, observer::NotificationObserver};

  type Log = Arc<Mutex<Vec<Notification<i32, &'static str>>>>;

  fn record(subject: &Subject<i32, &'static str>) -> (Log, SharedSubscription) {
    let log = Log::default();
    let l = log.clone();
    let s = subject
      .clone()
      .subscribe_with(NotificationObserver::new(move |n| l.lock().unwrap().push(n)))
      .into_inner();
    (log, s)
  }

  #[rxcast_macro::test]
  fn base_data_flow() {
    let mut subject = Subject::new();
    let (a, _) = record(&subject);
    subject.next(1);
    let (b, _) = record(&subject);
    subject.next(2);
    subject.complete();
    assert_eq!(
      *a.lock().unwrap(),
      vec![Notification::Next(1), Notification::Next(2), Notification::Complete]
    );
    assert_eq!(*b.lock().unwrap(), vec![Notification::Next(2), Notification::Complete]);
  }

  #[rxcast_macro::test]
  fn error_reaches_every_observer_once() {
    let mut subject = Subject::new();
    let (a, _) = record(&subject);
    let (b, _) = record(&subject);
    subject.error("boom");
    subject.error("again");
    subject.next(3);
    for log in [a, b] {
      assert_eq!(*log.lock().unwrap(), vec![Notification::Error("boom")]);
    }
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[rxcast_macro::test]
  fn late_subscriber_after_terminal_gets_nothing() {
    let mut subject = Subject::new();
    subject.complete();
    let (log, subscription) = record(&subject);
    subject.next(1);
    assert!(log.lock().unwrap().is_empty());
    assert!(subscription.is_closed());
  }

  #[rxcast_macro::test]
  fn unsubscribe_removes_observer() {
    let mut subject = Subject::new();
    let (log, mut subscription) = record(&subject);
    assert_eq!(subject.subscriber_count(), 1);
    subscription.unsubscribe();
    assert_eq!(subject.subscriber_count(), 0);
    subject.next(1);
    assert!(log.lock().unwrap().is_empty());
  }

  #[rxcast_macro::test]
  fn subscribe_from_inside_delivery() {
    let mut subject = Subject::<i32, ()>::new();
    let late = Arc::new(Mutex::new(vec![]));
    let (s, l) = (subject.clone(), late.clone());
    let mut first = true;
    subject.clone().subscribe(move |_| {
      if first {
        first = false;
        let l = l.clone();
        s.clone().subscribe(move |v| l.lock().unwrap().push(v));
      }
    });
    subject.next(1);
    subject.next(2);
    assert_eq!(*late.lock().unwrap(), vec![2]);
  }

  #[rxcast_macro::test]
  fn concurrent_next_and_subscribe() {
    let subject = Subject::<i32, ()>::new();
    let count = Arc::new(Mutex::new(0));
    let producers: Vec<_> = (0..4)
      .map(|_| {
        let mut subject = subject.clone();
        std::thread::spawn(move || (0..100).for_each(|v| subject.next(v)))
      })
      .collect();
    for _ in 0..10 {
      let c = count.clone();
      subject.clone().subscribe(move |_| *c.lock().unwrap() += 1);
    }
    for p in producers {
      p.join().unwrap();
    }
    assert_eq!(subject.subscriber_count(), 10);
  }

  #[rxcast_macro::test]
  fn observer_may_complete_its_own_subject() {
    let mut subject = Subject::<i32, ()>::new();
    let log: Arc<Mutex<Vec<Notification<i32, ()>>>> = Arc::default();
    let (l, lc, mut s) = (log.clone(), log.clone(), subject.clone());
    subject.clone().subscribe_all(
      move |v| {
        l.lock().unwrap().push(Notification::Next(v));
        if v == 2 {
          s.complete();
        }
      },
      |_| {},
      move || lc.lock().unwrap().push(Notification::Complete),
    );
    subject.next(1);
    subject.next(2);
    subject.next(3);
    assert_eq!(
      *log.lock().unwrap(),
      vec![Notification::Next(1), Notification::Next(2), Notification::Complete]
    );
    assert!(subject.is_stopped());
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[rxcast_macro::test]
  fn feeding_from_inside_delivery_does_not_nest() {
    let mut subject = Subject::<i32, ()>::new();
    let trace = Arc::new(Mutex::new(vec![]));
    let (t, mut s) = (trace.clone(), subject.clone());
    subject.clone().subscribe(move |v| {
      t.lock().unwrap().push(("enter", v));
      if v < 3 {
        s.next(v + 1);
      }
      t.lock().unwrap().push(("leave", v));
    });
    subject.next(1);
    assert_eq!(
      *trace.lock().unwrap(),
      vec![("enter", 1), ("leave", 1), ("enter", 2), ("leave", 2), ("enter", 3), ("leave", 3)]
    );
  }
}

//! Makes a [`ConnectableObservable`] behave like an ordinary observable.
//!
//! The first subscriber connects the underlying connectable; when the number
//! of subscribers drops back to zero the connection is disposed. A later
//! subscriber opens a brand new connection, re-subscribing the source. If the
//! subject terminated along the way it is replaced by a fresh one first, so
//! a subscriber arriving after the source completed starts a new run instead
//! of attaching to a finished subject.
//!
//! `share()` is exactly `publish().ref_count()`.

use crate::{
  observable::{ConnectableObservable, Observable},
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut},
  subject::SubjectLike,
  subscription::{SharedSubscription, SubscriptionLike},
};

pub struct RefCount<S, Subj> {
  connectable: ConnectableObservable<S, Subj>,
  state: MutArc<RefCountState>,
}

#[derive(Default)]
struct RefCountState {
  count: usize,
  connection: Option<SharedSubscription>,
}

impl<S: Clone, Subj: Clone> Clone for RefCount<S, Subj> {
  fn clone(&self) -> Self {
    RefCount { connectable: self.connectable.clone(), state: self.state.clone() }
  }
}

impl<S, Subj> RefCount<S, Subj> {
  pub(crate) fn new(connectable: ConnectableObservable<S, Subj>) -> Self {
    RefCount { connectable, state: MutArc::own(RefCountState::default()) }
  }

  /// Number of live subscriptions counted against the connection.
  pub fn subscriber_count(&self) -> usize { self.state.rc_deref().count }
}

impl<S, Subj> Observable for RefCount<S, Subj>
where
  S: Observable + Clone,
  Subj: SubjectLike<S::Item, S::Err>,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    if self.state.rc_deref().count == 0 && self.connectable.renew_terminated_subject() {
      tracing::debug!("ref_count renewed a terminated subject");
    }
    let subscription = self.connectable.fork().actual_subscribe(observer);
    if subscription.is_closed() {
      return subscription;
    }

    let first = {
      let mut state = self.state.rc_deref_mut();
      state.count += 1;
      state.count == 1
    };
    let state = self.state.clone();
    subscription.add_fn(move || release(&state));

    if first {
      let connection = self.connectable.connect();
      tracing::debug!("ref_count connected");
      let stale = {
        let mut state = self.state.rc_deref_mut();
        if state.count == 0 {
          Some(connection)
        } else {
          state.connection = Some(connection);
          None
        }
      };
      if let Some(mut stale) = stale {
        stale.unsubscribe();
      }
    }
    subscription
  }
}

fn release(state: &MutArc<RefCountState>) {
  let connection = {
    let mut state = state.rc_deref_mut();
    state.count -= 1;
    if state.count == 0 { state.connection.take() } else { None }
  };
  if let Some(mut connection) = connection {
    tracing::debug!("ref_count disconnected");
    connection.unsubscribe();
  }
}

#[cfg(test)]
mod test {
  use std::sync::{Arc, Mutex};

  use crate::{prelude::*, subject::Subject};

  #[rxcast_macro::test]
  fn connects_on_first_and_disconnects_on_last() {
    let mut source = Subject::<i32, ()>::new();
    let shared = source.clone().share();
    assert_eq!(source.subscriber_count(), 0);

    let a = Arc::new(Mutex::new(vec![]));
    let b = Arc::new(Mutex::new(vec![]));
    let (a2, b2) = (a.clone(), b.clone());
    let mut first = shared.clone().subscribe(move |v| a2.lock().unwrap().push(v));
    assert_eq!(source.subscriber_count(), 1);
    let mut second = shared.clone().subscribe(move |v| b2.lock().unwrap().push(v));
    assert_eq!(source.subscriber_count(), 1);
    assert_eq!(shared.subscriber_count(), 2);

    source.next(1);
    first.unsubscribe();
    source.next(2);
    assert_eq!(source.subscriber_count(), 1);
    second.unsubscribe();
    assert_eq!(source.subscriber_count(), 0);
    assert_eq!(*a.lock().unwrap(), vec![1]);
    assert_eq!(*b.lock().unwrap(), vec![1, 2]);
  }

  #[rxcast_macro::test]
  fn reconnects_fresh_after_dropping_to_zero() {
    let subscriptions = Arc::new(Mutex::new(0));
    let s = subscriptions.clone();
    let source = observable::create(move |mut subscriber: Subscriber<i32, ()>| {
      *s.lock().unwrap() += 1;
      subscriber.next(1);
    });
    let shared = source.share();

    let seen = Arc::new(Mutex::new(vec![]));
    let v = seen.clone();
    let mut first = shared.clone().subscribe(move |x| v.lock().unwrap().push(x));
    first.unsubscribe();
    let v = seen.clone();
    shared.clone().subscribe(move |x| v.lock().unwrap().push(x));

    assert_eq!(*subscriptions.lock().unwrap(), 2);
    assert_eq!(*seen.lock().unwrap(), vec![1, 1]);
  }

  #[rxcast_macro::test]
  fn completion_releases_the_count() {
    let mut source = Subject::<i32, ()>::new();
    let shared = source.clone().share();
    shared.clone().subscribe(|_| {});
    source.complete();
    assert_eq!(shared.subscriber_count(), 0);
  }

  #[rxcast_macro::test]
  fn subscriber_after_completion_starts_a_new_run() {
    let subscriptions = Arc::new(Mutex::new(0));
    let s = subscriptions.clone();
    let shared = observable::create(move |mut subscriber: Subscriber<i32, ()>| {
      *s.lock().unwrap() += 1;
      subscriber.next(1);
      subscriber.complete();
    })
    .share();

    let log = Arc::new(Mutex::new(vec![]));
    for run in ["first", "second"] {
      let (l, lc) = (log.clone(), log.clone());
      shared.clone().subscribe_all(
        move |v| l.lock().unwrap().push(format!("{run}:{v}")),
        |_| {},
        move || lc.lock().unwrap().push(format!("{run}:done")),
      );
    }

    assert_eq!(*subscriptions.lock().unwrap(), 2);
    assert_eq!(*log.lock().unwrap(), vec!["first:1", "first:done", "second:1", "second:done"]);
    assert_eq!(shared.subscriber_count(), 0);
  }

  #[rxcast_macro::test]
  fn renewed_behavior_subject_starts_from_its_seed() {
    let mut source = Subject::<i32, ()>::new();
    let shared = source.clone().publish_value(0).ref_count();
    let seen = Arc::new(Mutex::new(vec![]));
    let v = seen.clone();
    shared.clone().subscribe(move |x| v.lock().unwrap().push(x));
    source.next(1);
    source.complete();

    let v = seen.clone();
    shared.clone().subscribe(move |x| v.lock().unwrap().push(x));
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 0]);
  }
}

//! Multicasting through a subject that is fed by an explicit connection.
//!
//! A [`ConnectableObservable`] does not touch its source when subscribed.
//! Subscribers attach to the subject; [`connect`] subscribes the subject to
//! the source, and the returned subscription severs it again.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxcast::prelude::*;
//!
//! let seen = Arc::new(Mutex::new(vec![]));
//! let connectable = observable::from_iter::<_, ()>(1..=3).publish();
//!
//! let s = seen.clone();
//! connectable.clone().subscribe(move |v| s.lock().unwrap().push(v));
//! assert!(seen.lock().unwrap().is_empty());
//!
//! connectable.connect();
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
//! ```
//!
//! [`connect`]: ConnectableObservable::connect

use crate::{
  observable::Observable,
  observer::Observer,
  ops::ref_count::RefCount,
  rc::{MutArc, RcDeref, RcDerefMut},
  subject::SubjectLike,
  subscription::{SharedSubscription, SubscriptionLike},
};

/// A source paired with the subject that shares it.
///
/// Clones share the subject and the connection state.
pub struct ConnectableObservable<S, Subj> {
  source: S,
  subject: MutArc<Subj>,
  connection: MutArc<Option<SharedSubscription>>,
}

impl<S: Clone, Subj: Clone> Clone for ConnectableObservable<S, Subj> {
  fn clone(&self) -> Self {
    ConnectableObservable {
      source: self.source.clone(),
      subject: self.subject.clone(),
      connection: self.connection.clone(),
    }
  }
}

impl<S, Subj> ConnectableObservable<S, Subj> {
  pub(crate) fn new(source: S, subject: Subj) -> Self {
    ConnectableObservable { source, subject: MutArc::own(subject), connection: MutArc::own(None) }
  }

  /// The subject subscribers attach to.
  #[inline]
  pub fn fork(&self) -> Subj
  where
    Subj: Clone,
  {
    self.subject.rc_deref().clone()
  }

  /// Whether a connection is currently open.
  pub fn is_connected(&self) -> bool {
    self
      .connection
      .rc_deref()
      .as_ref()
      .is_some_and(|c| !c.is_closed())
  }

  /// Connect on the first subscriber, disconnect when the last one leaves.
  #[inline]
  pub fn ref_count(self) -> RefCount<S, Subj> { RefCount::new(self) }
}

impl<S, Subj> ConnectableObservable<S, Subj>
where
  S: Observable + Clone,
  Subj: SubjectLike<S::Item, S::Err>,
{
  /// Swap a subject that already terminated for a fresh one, so the next
  /// connection starts over. Returns whether a swap happened.
  pub(crate) fn renew_terminated_subject(&self) -> bool {
    let mut subject = self.subject.rc_deref_mut();
    if !Observer::<S::Item, S::Err>::is_closed(&*subject) {
      return false;
    }
    let fresh = SubjectLike::<S::Item, S::Err>::renew(&*subject);
    let stale = std::mem::replace(&mut *subject, fresh);
    drop(subject);
    drop(stale);
    true
  }

  /// Subscribe the subject to the source.
  ///
  /// While connected, every call returns the same subscription (compare with
  /// [`SharedSubscription::ptr_eq`]). Once that subscription is unsubscribed
  /// the next call opens a new connection with a new subscription.
  pub fn connect(&self) -> SharedSubscription {
    let connection = {
      let mut slot = self.connection.rc_deref_mut();
      if let Some(current) = slot.as_ref().filter(|c| !c.is_closed()) {
        return current.clone();
      }
      let connection = SharedSubscription::default();
      *slot = Some(connection.clone());
      connection
    };
    tracing::debug!("connectable connected");
    connection.add_fn(|| tracing::debug!("connectable disconnected"));
    let upstream = self.source.clone().actual_subscribe(self.fork());
    connection.add(upstream);
    connection
  }
}

impl<S, Subj> Observable for ConnectableObservable<S, Subj>
where
  S: Observable,
  Subj: SubjectLike<S::Item, S::Err>,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = SharedSubscription;

  #[inline]
  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    self.fork().actual_subscribe(observer)
  }
}

#[cfg(test)]
mod test {
  use std::sync::{Arc, Mutex};

  use crate::{prelude::*, subject::Subject};

  fn capture<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl FnMut(T) + Send + 'static) {
    let values = Arc::new(Mutex::new(vec![]));
    let v = values.clone();
    (values, move |value| v.lock().unwrap().push(value))
  }

  #[rxcast_macro::test]
  fn subscribers_share_one_connection() {
    let connectable = observable::of::<_, ()>(42).publish();
    let (a, obs_a) = capture();
    let (b, obs_b) = capture();
    connectable.clone().subscribe(obs_a);
    connectable.fork().subscribe(obs_b);
    connectable.connect();
    assert_eq!(*a.lock().unwrap(), vec![42]);
    assert_eq!(*b.lock().unwrap(), vec![42]);
  }

  #[rxcast_macro::test]
  fn nothing_flows_before_connect() {
    let mut source = Subject::<i32, ()>::new();
    let connectable = source.clone().publish();
    let (values, observer) = capture();
    connectable.clone().subscribe(observer);
    source.next(1);
    assert_eq!(source.subscriber_count(), 0);
    connectable.connect();
    source.next(2);
    assert_eq!(*values.lock().unwrap(), vec![2]);
  }

  #[rxcast_macro::test]
  fn connect_is_idempotent_while_connected() {
    let source = Subject::<i32, ()>::new();
    let connectable = source.clone().publish();
    let first = connectable.connect();
    let second = connectable.connect();
    assert!(first.ptr_eq(&second));
    assert_eq!(source.subscriber_count(), 1);

    let mut first = first;
    first.unsubscribe();
    assert!(!connectable.is_connected());
    assert_eq!(source.subscriber_count(), 0);

    let third = connectable.connect();
    assert!(!third.ptr_eq(&second));
    assert_eq!(source.subscriber_count(), 1);
  }

  #[rxcast_macro::test]
  fn disconnect_stops_delivery_but_keeps_subscribers() {
    let mut source = Subject::<i32, ()>::new();
    let connectable = source.clone().publish();
    let (values, observer) = capture();
    connectable.clone().subscribe(observer);
    let mut connection = connectable.connect();
    source.next(1);
    connection.unsubscribe();
    source.next(2);
    connectable.connect();
    source.next(3);
    assert_eq!(*values.lock().unwrap(), vec![1, 3]);
  }

  #[rxcast_macro::test]
  fn publish_value_seeds_subscribers() {
    let mut source = Subject::<i32, ()>::new();
    let connectable = source.clone().publish_value(0);
    let (values, observer) = capture();
    connectable.clone().subscribe(observer);
    connectable.connect();
    source.next(1);
    assert_eq!(*values.lock().unwrap(), vec![0, 1]);
  }
}

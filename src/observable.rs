//! The source side of the push protocol.
//!
//! An [`Observable`] is consumed by value: subscribing moves it into the
//! subscription. Sources that must be subscribed more than once (connectable
//! sources, inners of `flat_map`) are `Clone`.

use std::{hash::Hash, time::Duration};

use crate::{
  observer::{AllObserver, FnMutObserver, Observer},
  ops::{
    flat_map::FlatMapOp,
    group_by::{DefaultComparer, GroupByOp, KeyComparer},
    ref_count::RefCount,
    selector::{Fallible, Identity, Infallible},
  },
  scheduler::Scheduler,
  subject::{BehaviorSubject, ReplaySubject, Subject, SubjectLike},
  subscription::{SubscriptionLike, SubscriptionWrapper},
};

mod connectable_observable;
mod create;
mod from_iter;
mod trivial;

pub use connectable_observable::ConnectableObservable;
pub use create::{create, Create};
pub use from_iter::{from_iter, of, IterObservable, OfObservable};
pub use trivial::{empty, never, throw_err, EmptyObservable, NeverObservable, ThrowObservable};

/// A push-based source of `Item`s that may fail with `Err`.
pub trait Observable: Sized {
  type Item;
  type Err;
  type Unsub: SubscriptionLike + Send + 'static;

  /// Attach `observer` and start producing.
  ///
  /// Cold sources may call the observer back before this returns. The
  /// returned handle stops any further delivery caused by this subscription.
  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static;
}

pub trait ObservableExt: Observable {
  /// Invokes an execution of an Observable and registers Observer handlers
  /// for values. Errors and completion are ignored.
  #[inline]
  fn subscribe<N>(self, next: N) -> SubscriptionWrapper<Self::Unsub>
  where
    N: FnMut(Self::Item) + Send + 'static,
  {
    SubscriptionWrapper(self.actual_subscribe(FnMutObserver(next)))
  }

  #[inline]
  fn subscribe_err<N, E>(self, next: N, error: E) -> SubscriptionWrapper<Self::Unsub>
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnMut(Self::Err) + Send + 'static,
  {
    SubscriptionWrapper(self.actual_subscribe(AllObserver::new(next, error, || {})))
  }

  #[inline]
  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C) -> SubscriptionWrapper<Self::Unsub>
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnMut(Self::Err) + Send + 'static,
    C: FnMut() + Send + 'static,
  {
    SubscriptionWrapper(self.actual_subscribe(AllObserver::new(next, error, complete)))
  }

  /// Subscribe a ready-made observer.
  #[inline]
  fn subscribe_with<O>(self, observer: O) -> SubscriptionWrapper<Self::Unsub>
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    SubscriptionWrapper(self.actual_subscribe(observer))
  }

  /// Projects each value to an inner observable and merges their values.
  ///
  /// The result completes once the source and every inner have completed.
  /// The first error from any of them terminates the whole result and
  /// unsubscribes everything still running.
  #[inline]
  fn flat_map<Inner, F>(self, f: F) -> FlatMapOp<Self, Infallible<F>>
  where
    F: FnMut(Self::Item) -> Inner + Send + 'static,
    Inner: Observable<Err = Self::Err>,
  {
    FlatMapOp::new(self, Infallible(f))
  }

  /// Like [`flat_map`](ObservableExt::flat_map), with a projection that may
  /// fail. A failed projection terminates the result with that error.
  #[inline]
  fn try_flat_map<Inner, F>(self, f: F) -> FlatMapOp<Self, Fallible<F>>
  where
    F: FnMut(Self::Item) -> Result<Inner, Self::Err> + Send + 'static,
    Inner: Observable<Err = Self::Err>,
  {
    FlatMapOp::new(self, Fallible(f))
  }

  /// Splits the source into one live group per distinct key.
  #[inline]
  fn group_by<Key, F>(self, key: F) -> GroupByOp<Self, Infallible<F>, Identity, DefaultComparer, Key, Self::Item>
  where
    F: FnMut(&Self::Item) -> Key + Send + 'static,
    Key: Hash + Eq,
  {
    GroupByOp::new(self, Infallible(key), Identity, DefaultComparer)
  }

  /// Fully general group by: fallible key and element selectors, and a key
  /// comparer whose hash and equality may fail. Any failure terminates the
  /// outer stream and every open group.
  #[inline]
  fn try_group_by<Key, Value, K, E, C>(
    self, key: K, element: E, comparer: C,
  ) -> GroupByOp<Self, Fallible<K>, Fallible<E>, C, Key, Value>
  where
    K: FnMut(&Self::Item) -> Result<Key, Self::Err> + Send + 'static,
    E: FnMut(Self::Item) -> Result<Value, Self::Err> + Send + 'static,
    C: KeyComparer<Key, Self::Err>,
  {
    GroupByOp::new(self, Fallible(key), Fallible(element), comparer)
  }

  /// Share one subscription to this source through `subject`, started by
  /// [`ConnectableObservable::connect`].
  #[inline]
  fn multicast<Subj>(self, subject: Subj) -> ConnectableObservable<Self, Subj>
  where
    Subj: SubjectLike<Self::Item, Self::Err>,
  {
    ConnectableObservable::new(self, subject)
  }

  /// Multicast without buffering: subscribers see only what is emitted
  /// while they are subscribed and connected.
  #[inline]
  fn publish(self) -> ConnectableObservable<Self, Subject<Self::Item, Self::Err>>
  where
    Self::Item: Clone + Send + 'static,
    Self::Err: Clone + Send + 'static,
  {
    self.multicast(Subject::default())
  }

  /// Multicast that hands every new subscriber the latest value, starting
  /// with `initial`.
  #[inline]
  fn publish_value(self, initial: Self::Item) -> ConnectableObservable<Self, BehaviorSubject<Self::Item, Self::Err>>
  where
    Self::Item: Clone + Send + 'static,
    Self::Err: Clone + Send + 'static,
  {
    self.multicast(BehaviorSubject::new(initial))
  }

  /// Multicast that replays a bounded tail to every new subscriber.
  ///
  /// `buffer_size` bounds the number of values kept, `window` their age as
  /// measured by `scheduler`. Either, both or neither may be given.
  #[inline]
  fn replay<S>(
    self, buffer_size: Option<usize>, window: Option<Duration>, scheduler: S,
  ) -> ConnectableObservable<Self, ReplaySubject<Self::Item, Self::Err, S>>
  where
    Self::Item: Clone + Send + 'static,
    Self::Err: Clone + Send + 'static,
    S: Scheduler,
  {
    self.multicast(ReplaySubject::new(buffer_size, window, scheduler))
  }

  /// Replay of the last value only. Subscribers arriving after the source
  /// terminated still receive the terminal notification.
  #[inline]
  fn prune<S>(self, scheduler: S) -> ConnectableObservable<Self, ReplaySubject<Self::Item, Self::Err, S>>
  where
    Self::Item: Clone + Send + 'static,
    Self::Err: Clone + Send + 'static,
    S: Scheduler,
  {
    self.replay(Some(1), None, scheduler)
  }

  /// `publish().ref_count()`.
  #[inline]
  fn share(self) -> RefCount<Self, Subject<Self::Item, Self::Err>>
  where
    Self: Clone + Send + 'static,
    Self::Item: Clone + Send + 'static,
    Self::Err: Clone + Send + 'static,
  {
    self.publish().ref_count()
  }
}

impl<T: Observable> ObservableExt for T {}

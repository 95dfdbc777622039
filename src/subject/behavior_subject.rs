use super::{broadcast_complete, broadcast_error, broadcast_value, remove_on_close, SubjectLike, Subscribers};
use crate::{
  notification::Notification,
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut},
  subscriber::Subscriber,
  subscription::SharedSubscription,
};

/// A subject that remembers its latest value and hands it to every new
/// subscriber before any live value.
///
/// After termination, new subscribers receive only the terminal
/// notification.
pub struct BehaviorSubject<Item, Err> {
  inner: MutArc<BehaviorState<Item, Err>>,
}

struct BehaviorState<Item, Err> {
  seed: Item,
  value: Item,
  observers: Subscribers<Item, Err>,
  terminal: Option<Notification<Item, Err>>,
}

impl<Item, Err> Clone for BehaviorSubject<Item, Err> {
  fn clone(&self) -> Self { BehaviorSubject { inner: self.inner.clone() } }
}

impl<Item, Err> BehaviorSubject<Item, Err> {
  pub fn new(value: Item) -> Self
  where
    Item: Clone,
  {
    BehaviorSubject {
      inner: MutArc::own(BehaviorState {
        seed: value.clone(),
        value,
        observers: Subscribers::default(),
        terminal: None,
      }),
    }
  }

  pub fn value(&self) -> Item
  where
    Item: Clone,
  {
    self.inner.rc_deref().value.clone()
  }

  pub fn subscriber_count(&self) -> usize { self.inner.rc_deref().observers.len() }
}

impl<Item, Err> Observer<Item, Err> for BehaviorSubject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    let observers = {
      let mut state = self.inner.rc_deref_mut();
      if state.terminal.is_some() {
        return;
      }
      state.value = value.clone();
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

impl<Item, Err> Observable for BehaviorSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let subscriber = Subscriber::new(observer);
    let subscription = subscriber.subscription();
    let mut held = subscriber.hold();
    let mut state = self.inner.rc_deref_mut();
    if let Some(terminal) = state.terminal.clone() {
      drop(state);
      held.terminate(terminal);
      return subscription;
    }
    let value = state.value.clone();
    let id = state.observers.add(subscriber.clone());
    drop(state);
    remove_on_close(&subscription, &self.inner, id, |s| &mut s.observers);
    held.next(value);
    subscription
  }
}

impl<Item, Err> SubjectLike<Item, Err> for BehaviorSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  /// Starts again from the value this subject was created with.
  fn renew(&self) -> Self {
    let seed = self.inner.rc_deref().seed.clone();
    BehaviorSubject::new(seed)
  }
}

use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription, type_hint::TypeHint,
};

/// Creates an observable that emits no items, just terminates with an error.
pub fn throw_err<Item, Err>(e: Err) -> ThrowObservable<Item, Err> {
  ThrowObservable { err: e, _hint: TypeHint::new() }
}

/// Creates an observable that produces no values and completes immediately.
pub fn empty<Item, Err>() -> EmptyObservable<Item, Err> { EmptyObservable(TypeHint::new()) }

/// Creates an observable that never emits anything, not even a terminal
/// notification.
pub fn never<Item, Err>() -> NeverObservable<Item, Err> { NeverObservable(TypeHint::new()) }

#[derive(Clone)]
pub struct ThrowObservable<Item, Err> {
  err: Err,
  _hint: TypeHint<Item>,
}

#[derive(Clone)]
pub struct EmptyObservable<Item, Err>(TypeHint<(Item, Err)>);

#[derive(Clone)]
pub struct NeverObservable<Item, Err>(TypeHint<(Item, Err)>);

impl<Item: Send + 'static, Err: Send + 'static> Observable for ThrowObservable<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let mut subscriber = Subscriber::new(observer);
    subscriber.error(self.err);
    subscriber.subscription()
  }
}

impl<Item: Send + 'static, Err: Send + 'static> Observable for EmptyObservable<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let mut subscriber = Subscriber::new(observer);
    subscriber.complete();
    subscriber.subscription()
  }
}

impl<Item: Send + 'static, Err: Send + 'static> Observable for NeverObservable<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    Subscriber::new(observer).subscription()
  }
}

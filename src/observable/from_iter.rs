use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription, type_hint::TypeHint,
};

/// Creates an observable that produces values from an iterator.
///
/// Completes when all elements have been emitted. Never emits an error. The
/// iteration stops early once the subscription is closed, so an observer
/// that unsubscribes from its own `next` halts the loop.
///
/// ```
/// use rxcast::prelude::*;
///
/// observable::from_iter::<_, ()>(0..10).subscribe(|v| println!("{v},"));
/// ```
pub fn from_iter<Iter, Err>(iter: Iter) -> IterObservable<Iter, Err>
where
  Iter: IntoIterator,
{
  IterObservable { iter, _hint: TypeHint::new() }
}

/// Creates an observable producing a single value, then completing.
pub fn of<Item, Err>(v: Item) -> OfObservable<Item, Err> { OfObservable { v, _hint: TypeHint::new() } }

#[derive(Clone)]
pub struct IterObservable<Iter, Err> {
  iter: Iter,
  _hint: TypeHint<Err>,
}

#[derive(Clone)]
pub struct OfObservable<Item, Err> {
  v: Item,
  _hint: TypeHint<Err>,
}

impl<Iter, Err> Observable for IterObservable<Iter, Err>
where
  Iter: IntoIterator,
  Iter::Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Iter::Item;
  type Err = Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Err> + Send + 'static,
  {
    let mut subscriber = Subscriber::new(observer);
    for v in self.iter {
      if subscriber.is_closed() {
        break;
      }
      subscriber.next(v);
    }
    subscriber.complete();
    subscriber.subscription()
  }
}

impl<Item, Err> Observable for OfObservable<Item, Err>
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
    let mut subscriber = Subscriber::new(observer);
    subscriber.next(self.v);
    subscriber.complete();
    subscriber.subscription()
  }
}

use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription, type_hint::TypeHint,
};

/// Creates an observable from a subscribe function.
///
/// `subscribe` receives a [`Subscriber`] it may push to, now or later and
/// from any thread. The subscriber enforces the observer contract, so calls
/// after a terminal notification or after unsubscribe are dropped. Teardown
/// that must run when the subscription ends is registered with
/// [`Subscriber::add`].
///
/// ```
/// use rxcast::prelude::*;
///
/// observable::create(|mut s: Subscriber<i32, ()>| {
///   s.next(1);
///   s.next(2);
///   s.complete();
/// })
/// .subscribe(|v| println!("{v}"));
/// ```
pub fn create<F, Item, Err>(subscribe: F) -> Create<F, Item, Err>
where
  F: FnOnce(Subscriber<Item, Err>),
{
  Create { subscribe, _hint: TypeHint::new() }
}

#[derive(Clone)]
pub struct Create<F, Item, Err> {
  subscribe: F,
  _hint: TypeHint<(Item, Err)>,
}

impl<F, Item, Err> Observable for Create<F, Item, Err>
where
  F: FnOnce(Subscriber<Item, Err>),
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
    let subscription = subscriber.subscription();
    (self.subscribe)(subscriber);
    subscription
  }
}

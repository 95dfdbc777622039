use std::sync::Arc;

use super::{ticks, Message, SubscriptionRecord};
use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut},
  scheduler::{Scheduler, TestScheduler},
  subscriber::Subscriber,
  subscription::SharedSubscription,
};

/// A scripted source that replays its whole script to each subscriber.
///
/// Message ticks are relative to the moment of subscription. Unsubscribing
/// cancels whatever part of the script is still pending.
pub struct ColdObservable<Item, Err> {
  messages: Arc<Vec<Message<Item, Err>>>,
  subscriptions: MutArc<Vec<SubscriptionRecord>>,
}

impl<Item, Err> Clone for ColdObservable<Item, Err> {
  fn clone(&self) -> Self {
    ColdObservable { messages: self.messages.clone(), subscriptions: self.subscriptions.clone() }
  }
}

impl<Item, Err> ColdObservable<Item, Err> {
  pub fn new(messages: Vec<Message<Item, Err>>) -> Self {
    ColdObservable { messages: Arc::new(messages), subscriptions: MutArc::own(vec![]) }
  }

  pub fn subscriptions(&self) -> Vec<SubscriptionRecord> { self.subscriptions.rc_deref().clone() }
}

impl<Item, Err> Observable for ColdObservable<Item, Err>
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
    let index = {
      let mut records = self.subscriptions.rc_deref_mut();
      records.push(SubscriptionRecord::open(TestScheduler::clock()));
      records.len() - 1
    };
    let subscriber = Subscriber::new(observer);
    let subscription = subscriber.subscription();
    let records = self.subscriptions;
    subscription.add_fn(move || records.rc_deref_mut()[index].unsubscribed = TestScheduler::clock());

    for message in self.messages.iter() {
      let mut target = subscriber.clone();
      let notification = message.value.clone();
      let task = TestScheduler.schedule_after(ticks(message.time), move || notification.accept(&mut target));
      subscription.add(task);
    }
    subscription
  }
}

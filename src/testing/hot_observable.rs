use super::{ticks, Message, SubscriptionRecord};
use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut},
  scheduler::{Scheduler, TestScheduler},
  subject::Subject,
  subscription::SharedSubscription,
};

/// A scripted source that emits on its own timeline.
///
/// Every message is scheduled once, at its absolute tick, when the source is
/// created. Whoever is subscribed at that tick receives it; late subscribers
/// miss it.
pub struct HotObservable<Item, Err> {
  subject: Subject<Item, Err>,
  subscriptions: MutArc<Vec<SubscriptionRecord>>,
}

impl<Item, Err> Clone for HotObservable<Item, Err> {
  fn clone(&self) -> Self {
    HotObservable { subject: self.subject.clone(), subscriptions: self.subscriptions.clone() }
  }
}

impl<Item, Err> HotObservable<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  pub fn new(messages: Vec<Message<Item, Err>>) -> Self {
    let subject = Subject::new();
    for message in messages {
      let mut target = subject.clone();
      TestScheduler.schedule_at(ticks(message.time), move || message.value.accept(&mut target));
    }
    HotObservable { subject, subscriptions: MutArc::own(vec![]) }
  }
}

impl<Item, Err> HotObservable<Item, Err> {
  /// Every subscription made so far, in subscription order.
  pub fn subscriptions(&self) -> Vec<SubscriptionRecord> { self.subscriptions.rc_deref().clone() }
}

impl<Item, Err> Observable for HotObservable<Item, Err>
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
    let index = {
      let mut records = self.subscriptions.rc_deref_mut();
      records.push(SubscriptionRecord::open(TestScheduler::clock()));
      records.len() - 1
    };
    let subscription = self.subject.actual_subscribe(observer);
    let records = self.subscriptions;
    subscription.add_fn(move || records.rc_deref_mut()[index].unsubscribed = TestScheduler::clock());
    subscription
  }
}

use std::{collections::VecDeque, mem};

use crate::{
  notification::Notification,
  observer::{BoxObserver, Observer},
  rc::{MutArc, RcDeref, RcDerefMut},
  subscription::{SharedSubscription, SubscriptionLike},
};

/// The delivery slot every source pushes through.
///
/// A `Subscriber` owns the downstream observer together with the
/// subscription that represents it, and enforces the observer contract on
/// the producer's behalf:
///
/// - after the first `error`/`complete` later calls are dropped;
/// - once the subscription is closed no new delivery starts;
/// - calls into the observer never overlap.
///
/// Delivery is a trampoline. The first caller claims the observer and calls
/// it without holding any lock. A notification that arrives meanwhile, from
/// another thread or re-entrantly from inside the observer itself, is queued
/// and delivered by the claiming caller once the current call returns.
///
/// `unsubscribe` never waits for a delivery in flight. Queued notifications
/// are discarded and the observer is released by the delivery running when
/// it returns.
pub struct Subscriber<Item, Err> {
  slot: MutArc<Slot<Item, Err>>,
  subscription: SharedSubscription,
}

struct Slot<Item, Err> {
  /// `None` while a delivery is running or after the subscriber closed.
  observer: Option<BoxObserver<Item, Err>>,
  busy: bool,
  stopped: bool,
  pending: VecDeque<Notification<Item, Err>>,
}

impl<Item, Err> Clone for Subscriber<Item, Err> {
  fn clone(&self) -> Self { Self { slot: self.slot.clone(), subscription: self.subscription.clone() } }
}

impl<Item, Err> Subscriber<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  pub fn new<O>(observer: O) -> Self
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let slot = MutArc::own(Slot {
      observer: Some(Box::new(observer) as BoxObserver<Item, Err>),
      busy: false,
      stopped: false,
      pending: VecDeque::new(),
    });
    let subscription = SharedSubscription::default();
    let teardown = slot.clone();
    subscription.add_fn(move || {
      let released = {
        let mut slot = teardown.rc_deref_mut();
        (slot.observer.take(), mem::take(&mut slot.pending))
      };
      drop(released);
    });
    Subscriber { slot, subscription }
  }
}

impl<Item, Err> Subscriber<Item, Err> {
  /// Handle that closes this subscriber when unsubscribed.
  #[inline]
  pub fn subscription(&self) -> SharedSubscription { self.subscription.clone() }

  /// Register a teardown that runs when this subscriber closes, either by
  /// unsubscribe or after a terminal notification.
  #[inline]
  pub fn add<S: SubscriptionLike + Send + 'static>(&self, teardown: S) {
    self.subscription.add(teardown)
  }

  /// Claim delivery without delivering anything yet.
  ///
  /// Replaying subjects claim the subscriber before registering it, so a
  /// value pushed concurrently by the producer is queued until the backlog
  /// has been handed over through the returned [`Held`].
  pub(crate) fn hold(&self) -> Held<'_, Item, Err> {
    let observer = {
      let mut slot = self.slot.rc_deref_mut();
      if slot.busy {
        None
      } else {
        let observer = slot.observer.take();
        slot.busy = observer.is_some();
        observer
      }
    };
    Held { subscriber: self, observer }
  }

  fn push(&self, notification: Notification<Item, Err>) {
    let observer = {
      let mut slot = self.slot.rc_deref_mut();
      if slot.stopped || self.subscription.is_closed() {
        return;
      }
      slot.stopped = notification.is_terminal();
      if slot.busy {
        slot.pending.push_back(notification);
        return;
      }
      match slot.observer.take() {
        Some(observer) => {
          slot.busy = true;
          observer
        }
        None => return,
      }
    };
    self.drain(observer, Some(notification));
  }

  /// Deliver `first`, then whatever was queued meanwhile, and hand the
  /// observer back to the slot.
  fn drain(&self, mut observer: BoxObserver<Item, Err>, first: Option<Notification<Item, Err>>) {
    let mut next = first;
    loop {
      if let Some(notification) = next.take() {
        if notification.is_terminal() {
          notification.accept(&mut observer);
          let discarded = {
            let mut slot = self.slot.rc_deref_mut();
            slot.busy = false;
            slot.stopped = true;
            mem::take(&mut slot.pending)
          };
          drop(discarded);
          drop(observer);
          self.subscription.clone().unsubscribe();
          return;
        }
        notification.accept(&mut observer);
      }
      let mut slot = self.slot.rc_deref_mut();
      if self.subscription.is_closed() {
        slot.busy = false;
        let discarded = mem::take(&mut slot.pending);
        drop(slot);
        drop(discarded);
        return;
      }
      match slot.pending.pop_front() {
        Some(notification) => next = Some(notification),
        None => {
          slot.observer = Some(observer);
          slot.busy = false;
          return;
        }
      }
    }
  }
}

impl<Item, Err> Observer<Item, Err> for Subscriber<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { self.push(Notification::Next(value)) }

  #[inline]
  fn error(&mut self, err: Err) { self.push(Notification::Error(err)) }

  #[inline]
  fn complete(&mut self) { self.push(Notification::Complete) }

  fn is_closed(&self) -> bool {
    if self.subscription.is_closed() {
      return true;
    }
    let slot = self.slot.rc_deref();
    slot.stopped
      || slot
        .observer
        .as_ref()
        .is_some_and(|o| Observer::<Item, Err>::is_closed(o))
  }
}

/// Claimed delivery on a [`Subscriber`], see [`Subscriber::hold`].
///
/// Dropping it delivers whatever was queued while it was held.
pub(crate) struct Held<'a, Item, Err> {
  subscriber: &'a Subscriber<Item, Err>,
  observer: Option<BoxObserver<Item, Err>>,
}

impl<Item, Err> Held<'_, Item, Err> {
  pub(crate) fn next(&mut self, value: Item) {
    if self.subscriber.subscription.is_closed() {
      return;
    }
    if let Some(observer) = self.observer.as_mut() {
      observer.next(value);
    }
  }

  /// Deliver `notification`, then anything queued while held. A terminal
  /// notification closes the subscriber.
  pub(crate) fn terminate(mut self, notification: Notification<Item, Err>) {
    let Some(observer) = self.observer.take() else { return };
    let notification = if self.subscriber.subscription.is_closed() {
      None
    } else {
      if notification.is_terminal() {
        self.subscriber.slot.rc_deref_mut().stopped = true;
      }
      Some(notification)
    };
    self.subscriber.drain(observer, notification);
  }
}

impl<Item, Err> Drop for Held<'_, Item, Err> {
  fn drop(&mut self) {
    if let Some(observer) = self.observer.take() {
      self.subscriber.drain(observer, None);
    }
  }
}

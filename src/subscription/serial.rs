use super::{BoxSubscription, SubscriptionLike};
use crate::rc::{MutArc, RcDeref, RcDerefMut};

/// A single-slot subscription whose content can be replaced.
///
/// Assigning a new subscription unsubscribes the previous one. Once the slot
/// itself is closed, anything assigned to it is unsubscribed immediately, so
/// a late `set` racing with `unsubscribe` never leaks.
#[derive(Clone, Default)]
pub struct SerialSubscription(MutArc<Slot>);

#[derive(Default)]
struct Slot {
  closed: bool,
  current: Option<BoxSubscription>,
}

impl SerialSubscription {
  pub fn set<S: SubscriptionLike + Send + 'static>(&self, subscription: S) {
    let mut subscription: BoxSubscription = Box::new(subscription);
    let mut slot = self.0.rc_deref_mut();
    if slot.closed {
      drop(slot);
      subscription.unsubscribe();
      return;
    }
    let previous = slot.current.replace(subscription);
    drop(slot);
    if let Some(mut previous) = previous {
      previous.unsubscribe();
    }
  }

  pub fn is_empty(&self) -> bool { self.0.rc_deref().current.is_none() }
}

impl SubscriptionLike for SerialSubscription {
  fn unsubscribe(&mut self) {
    let current = {
      let mut slot = self.0.rc_deref_mut();
      if slot.closed {
        return;
      }
      slot.closed = true;
      slot.current.take()
    };
    if let Some(mut current) = current {
      current.unsubscribe();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

#[cfg(test)]
mod test {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;
  use crate::subscription::ActionSubscription;

  fn tracked(count: &Arc<AtomicUsize>) -> ActionSubscription {
    let count = count.clone();
    ActionSubscription::new(move || {
      count.fetch_add(1, Ordering::SeqCst);
    })
  }

  #[rxcast_macro::test]
  fn replacing_disposes_previous() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let serial = SerialSubscription::default();
    serial.set(tracked(&first));
    serial.set(tracked(&second));
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
    assert!(!serial.is_empty());
  }

  #[rxcast_macro::test]
  fn set_after_close_disposes_new() {
    let count = Arc::new(AtomicUsize::new(0));
    let mut serial = SerialSubscription::default();
    serial.unsubscribe();
    serial.set(tracked(&count));
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(serial.is_empty());
  }

  #[rxcast_macro::test]
  fn unsubscribe_disposes_current_once() {
    let count = Arc::new(AtomicUsize::new(0));
    let mut serial = SerialSubscription::default();
    serial.set(tracked(&count));
    serial.unsubscribe();
    serial.unsubscribe();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(serial.is_closed());
  }
}

use smallvec::SmallVec;

use crate::{observer::Observer, subscriber::Subscriber};

/// The observers currently subscribed to a subject, keyed by a per-subject
/// id so a subscription can remove exactly its own entry.
///
/// Delivery never iterates this list in place. The subject copies it while
/// holding its lock and delivers to the copy after releasing it, so
/// subscribe and unsubscribe are free to run from inside a delivery.
pub(crate) struct Subscribers<Item, Err> {
  next_id: usize,
  entries: SmallVec<[(usize, Subscriber<Item, Err>); 2]>,
}

pub(crate) type Snapshot<Item, Err> = SmallVec<[Subscriber<Item, Err>; 2]>;

impl<Item, Err> Default for Subscribers<Item, Err> {
  fn default() -> Self { Self { next_id: 0, entries: SmallVec::new() } }
}

impl<Item, Err> Subscribers<Item, Err> {
  pub(crate) fn add(&mut self, subscriber: Subscriber<Item, Err>) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.entries.push((id, subscriber));
    id
  }

  pub(crate) fn remove(&mut self, id: usize) -> Option<Subscriber<Item, Err>> {
    let idx = self.entries.iter().position(|(i, _)| *i == id)?;
    Some(self.entries.remove(idx).1)
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.entries.len() }

  pub(crate) fn snapshot(&self) -> Snapshot<Item, Err> {
    self.entries.iter().map(|(_, s)| s.clone()).collect()
  }

  /// Empty the list, returning what it held.
  pub(crate) fn drain(&mut self) -> Snapshot<Item, Err> {
    self.entries.drain(..).map(|(_, s)| s).collect()
  }
}

/// Send `value` to every subscriber. The last one receives the value itself,
/// the others a clone.
pub(crate) fn broadcast_value<Item: Clone, Err>(subscribers: Snapshot<Item, Err>, value: Item) {
  let mut iter = subscribers.into_iter().peekable();
  while let Some(mut subscriber) = iter.next() {
    if iter.peek().is_some() {
      subscriber.next(value.clone());
    } else {
      subscriber.next(value);
      break;
    }
  }
}

pub(crate) fn broadcast_error<Item, Err: Clone>(subscribers: Snapshot<Item, Err>, err: Err) {
  let mut iter = subscribers.into_iter().peekable();
  while let Some(mut subscriber) = iter.next() {
    if iter.peek().is_some() {
      subscriber.error(err.clone());
    } else {
      subscriber.error(err);
      break;
    }
  }
}

pub(crate) fn broadcast_complete<Item, Err>(subscribers: Snapshot<Item, Err>) {
  for mut subscriber in subscribers {
    subscriber.complete();
  }
}

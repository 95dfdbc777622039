use crate::notification::Notification;

/// A value stamped with the virtual tick it happened at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Recorded<T> {
  pub time: u64,
  pub value: T,
}

/// A scripted or observed notification.
pub type Message<Item, Err> = Recorded<Notification<Item, Err>>;

impl<T> Recorded<T> {
  #[inline]
  pub fn new(time: u64, value: T) -> Self { Recorded { time, value } }
}

#[inline]
pub fn on_next<Item, Err>(time: u64, value: Item) -> Message<Item, Err> {
  Recorded::new(time, Notification::Next(value))
}

#[inline]
pub fn on_error<Item, Err>(time: u64, err: Err) -> Message<Item, Err> {
  Recorded::new(time, Notification::Error(err))
}

#[inline]
pub fn on_completed<Item, Err>(time: u64) -> Message<Item, Err> { Recorded::new(time, Notification::Complete) }

/// When a test source was subscribed and when that subscription ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionRecord {
  pub subscribed: u64,
  pub unsubscribed: u64,
}

impl SubscriptionRecord {
  /// Marks a subscription that was still open when the scenario ended.
  pub const INFINITE: u64 = u64::MAX;

  #[inline]
  pub fn new(subscribed: u64, unsubscribed: u64) -> Self { SubscriptionRecord { subscribed, unsubscribed } }

  #[inline]
  pub fn open(subscribed: u64) -> Self { Self::new(subscribed, Self::INFINITE) }
}

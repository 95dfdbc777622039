//! Virtual-time test harness.
//!
//! Scenarios are written against [`TestScheduler`]: sources are scripted
//! with messages stamped in ticks, a [`TestObserver`] records what reaches
//! it together with the tick of arrival, and [`start`] drives the classic
//! create / subscribe / dispose timeline.
//!
//! ```rust
//! use rxcast::{prelude::*, testing::*};
//!
//! TestScheduler::init();
//! let source = HotObservable::<i32, ()>::new(vec![
//!   on_next(150, 1),
//!   on_next(210, 2),
//!   on_completed(250),
//! ]);
//! let s = source.clone();
//! let observer = start_default(move || s);
//! assert_eq!(observer.messages(), vec![on_next(210, 2), on_completed(250)]);
//! assert_eq!(source.subscriptions(), vec![SubscriptionRecord::new(200, 250)]);
//! ```

use std::time::Duration;

use crate::{
  observable::Observable,
  rc::{MutArc, RcDerefMut},
  scheduler::{Scheduler, TestScheduler},
  subscription::SubscriptionLike,
};

mod cold_observable;
mod hot_observable;
mod recorded;
mod test_observer;

pub use cold_observable::ColdObservable;
pub use hot_observable::HotObservable;
pub use recorded::{on_completed, on_error, on_next, Message, Recorded, SubscriptionRecord};
pub use test_observer::TestObserver;

pub const CREATED: u64 = 100;
pub const SUBSCRIBED: u64 = 200;
pub const DISPOSED: u64 = 1000;

/// Run a scenario on the virtual clock.
///
/// The source is built by `create` at tick `created`, subscribed at
/// `subscribed` and disposed at `disposed`. The scheduler is then flushed
/// and the observer returned for inspection.
pub fn start<S, F>(create: F, created: u64, subscribed: u64, disposed: u64) -> TestObserver<S::Item, S::Err>
where
  S: Observable + Send + 'static,
  S::Item: Send + 'static,
  S::Err: Send + 'static,
  F: FnOnce() -> S + Send + 'static,
{
  let observer = TestObserver::new();
  let source: MutArc<Option<S>> = MutArc::own(None);
  let subscription: MutArc<Option<S::Unsub>> = MutArc::own(None);

  let slot = source.clone();
  TestScheduler.schedule_at(ticks(created), move || *slot.rc_deref_mut() = Some(create()));

  let (slot, target, o) = (source, subscription.clone(), observer.clone());
  TestScheduler.schedule_at(ticks(subscribed), move || {
    let source = slot.rc_deref_mut().take();
    if let Some(source) = source {
      let unsub = source.actual_subscribe(o);
      *target.rc_deref_mut() = Some(unsub);
    }
  });

  TestScheduler.schedule_at(ticks(disposed), move || {
    let unsub = subscription.rc_deref_mut().take();
    if let Some(mut unsub) = unsub {
      unsub.unsubscribe();
    }
  });

  TestScheduler::flush();
  observer
}

/// [`start`] with the customary ticks 100, 200 and 1000.
#[inline]
pub fn start_default<S, F>(create: F) -> TestObserver<S::Item, S::Err>
where
  S: Observable + Send + 'static,
  S::Item: Send + 'static,
  S::Err: Send + 'static,
  F: FnOnce() -> S + Send + 'static,
{
  start(create, CREATED, SUBSCRIBED, DISPOSED)
}

#[inline]
pub(crate) fn ticks(tick: u64) -> Duration { Duration::from_millis(tick) }

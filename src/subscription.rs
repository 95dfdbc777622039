use std::{
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use smallvec::SmallVec;

use crate::rc::{MutArc, RcDeref, RcDerefMut};

mod serial;
pub use serial::SerialSubscription;

/// Subscription returns from `Observable.subscribe(Subscriber)` to allow
///  unsubscribing.
///
/// `unsubscribe` is idempotent: only the first call has any effect.
pub trait SubscriptionLike {
  /// This allows deregistering an stream before it has finished receiving all
  /// events (i.e. before onCompleted is called).
  fn unsubscribe(&mut self);

  fn is_closed(&self) -> bool;
}

pub type BoxSubscription = Box<dyn SubscriptionLike + Send>;

impl Debug for Box<dyn SubscriptionLike + Send> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Box<dyn SubscriptionLike>")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

impl<T: ?Sized> SubscriptionLike for Box<T>
where
  T: SubscriptionLike,
{
  #[inline]
  fn unsubscribe(&mut self) { (**self).unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

// ============================================================================
// SharedSubscription - composite
// ============================================================================

/// A composite subscription that owns a dynamic set of teardowns.
///
/// Cloning yields another handle to the same composite, so a clone can be
/// handed to an operator while the original is returned to the caller.
/// Adding a teardown to an already closed composite unsubscribes it on the
/// spot.
#[derive(Clone, Default)]
pub struct SharedSubscription(MutArc<Inner>);

#[derive(Default)]
struct Inner {
  closed: bool,
  teardown: SmallVec<[BoxSubscription; 1]>,
}

impl SharedSubscription {
  pub fn add<S: SubscriptionLike + Send + 'static>(&self, subscription: S) {
    if self.is_same(&subscription) {
      return;
    }
    let mut subscription: BoxSubscription = Box::new(subscription);
    let mut inner = self.0.rc_deref_mut();
    if inner.closed {
      drop(inner);
      subscription.unsubscribe();
    } else {
      inner.teardown.retain(|v| !v.is_closed());
      inner.teardown.push(subscription);
    }
  }

  /// Register an action to run once when this subscription is closed.
  pub fn add_fn(&self, f: impl FnOnce() + Send + 'static) { self.add(ActionSubscription::new(f)) }

  /// Whether both handles point to the same composite.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { self.0.ptr_eq(&other.0) }

  pub fn teardown_size(&self) -> usize { self.0.rc_deref().teardown.len() }

  fn is_same<S: 'static>(&self, other: &S) -> bool {
    (other as &dyn std::any::Any)
      .downcast_ref::<Self>()
      .is_some_and(|other| self.ptr_eq(other))
  }
}

impl SubscriptionLike for SharedSubscription {
  fn unsubscribe(&mut self) {
    let teardown = {
      let mut inner = self.0.rc_deref_mut();
      if inner.closed {
        return;
      }
      inner.closed = true;
      std::mem::take(&mut inner.teardown)
    };
    for mut v in teardown {
      v.unsubscribe();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

impl Debug for SharedSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let inner = self.0.rc_deref();
    f.debug_struct("SharedSubscription")
      .field("closed", &inner.closed)
      .field("teardown_count", &inner.teardown.len())
      .finish()
  }
}

// ============================================================================
// ActionSubscription - create from action
// ============================================================================

/// Runs an action exactly once, on the first `unsubscribe`.
pub struct ActionSubscription {
  action: MutArc<Option<Box<dyn FnOnce() + Send>>>,
  closed: Arc<AtomicBool>,
}

impl ActionSubscription {
  pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
    ActionSubscription {
      action: MutArc::own(Some(Box::new(action))),
      closed: Arc::new(AtomicBool::new(false)),
    }
  }
}

impl Clone for ActionSubscription {
  fn clone(&self) -> Self { Self { action: self.action.clone(), closed: self.closed.clone() } }
}

impl SubscriptionLike for ActionSubscription {
  fn unsubscribe(&mut self) {
    if self.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let action = self.action.rc_deref_mut().take();
    if let Some(action) = action {
      action();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}

// ============================================================================
// Wrapper / Guard
// ============================================================================

/// Wrapper around a subscription which provides the
/// `unsubscribe_when_dropped()` method.
pub struct SubscriptionWrapper<T: SubscriptionLike>(pub(crate) T);

impl<T: SubscriptionLike> SubscriptionWrapper<T> {
  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard<T> { SubscriptionGuard(self.0) }

  /// Consumes this wrapper and returns the underlying subscription.
  pub fn into_inner(self) -> T { self.0 }
}

impl<T: SubscriptionLike> SubscriptionLike for SubscriptionWrapper<T> {
  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
  #[inline]
  fn unsubscribe(&mut self) { self.0.unsubscribe() }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[must_use]
pub struct SubscriptionGuard<T: SubscriptionLike>(pub(crate) T);

impl<T: SubscriptionLike> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(subscription) }
}

impl<T: SubscriptionLike> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}

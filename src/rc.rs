//! Shared mutable pointers used by subjects, operators and subscriptions.
//!
//! Every piece of state that is reachable from more than one observer lives
//! behind a [`MutArc`]. Guards are recovered from poisoning: a panic in one
//! observer must not wedge the whole pipeline.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};

pub trait RcDeref {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a>;
}

pub trait RcDerefMut {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a>;
}

#[derive(Default)]
pub struct MutArc<T>(Arc<Mutex<T>>);

/// Non-owning back reference to a [`MutArc`].
pub struct WeakArc<T>(Weak<Mutex<T>>);

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  /// Lock without blocking. Returns `None` when another delivery currently
  /// holds the lock, on this thread or another one.
  pub fn try_rc_deref_mut(&self) -> Option<MutexGuard<'_, T>> {
    match self.0.try_lock() {
      Ok(guard) => Some(guard),
      Err(TryLockError::Poisoned(p)) => Some(p.into_inner()),
      Err(TryLockError::WouldBlock) => None,
    }
  }

  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }

  #[inline]
  pub fn downgrade(&self) -> WeakArc<T> { WeakArc(Arc::downgrade(&self.0)) }
}

impl<T> WeakArc<T> {
  #[inline]
  pub fn upgrade(&self) -> Option<MutArc<T>> { self.0.upgrade().map(MutArc) }
}

impl<T> RcDeref for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<T> RcDerefMut for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<T> From<T> for MutArc<T> {
  #[inline]
  fn from(value: T) -> Self { Self::own(value) }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Clone for WeakArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

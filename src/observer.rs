//! Observer trait and closure adapters.
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

use crate::notification::Notification;

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable. Producers guarantee that calls never overlap and that at
/// most one of `error`/`complete` is ever made.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&mut self, value: Item);

  /// Handle an error from the observable. No further calls follow.
  fn error(&mut self, err: Err);

  /// Handle completion of the observable. No further calls follow.
  fn complete(&mut self);

  /// Returns `true` if the observer will not accept more values.
  ///
  /// Sources that loop (like `from_iter`) poll this to stop early.
  fn is_closed(&self) -> bool;
}

/// Boxed observer as stored by subjects and sources.
pub type BoxObserver<Item, Err> = Box<dyn Observer<Item, Err> + Send>;

impl<Item, Err, T> Observer<Item, Err> for Box<T>
where
  T: Observer<Item, Err> + ?Sized,
{
  #[inline]
  fn next(&mut self, value: Item) { (**self).next(value) }

  #[inline]
  fn error(&mut self, err: Err) { (**self).error(err) }

  #[inline]
  fn complete(&mut self) { (**self).complete() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

/// Option observer - None ignores all events, Some delegates to inner
impl<O, Item, Err> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(inner) = self {
      inner.next(value);
    }
  }

  fn error(&mut self, err: Err) {
    if let Some(mut inner) = self.take() {
      inner.error(err);
    }
  }

  fn complete(&mut self) {
    if let Some(mut inner) = self.take() {
      inner.complete();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(Observer::is_closed) }
}

// ============================================================================
// Closure adapters
// ============================================================================

/// Observer built from a `next` closure; errors and completion are ignored.
///
/// This enables ergonomic subscription syntax:
/// `observable.subscribe(|v| println!("{}", v))`.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, Item, Err> Observer<Item, Err> for FnMutObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, v: Item) { (self.0)(v); }

  #[inline]
  fn error(&mut self, _err: Err) {}

  #[inline]
  fn complete(&mut self) {}

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Observer built from three closures.
#[derive(Clone)]
pub struct AllObserver<N, E, C> {
  next: N,
  error: E,
  complete: C,
  done: bool,
}

impl<N, E, C> AllObserver<N, E, C> {
  pub fn new(next: N, error: E, complete: C) -> Self { Self { next, error, complete, done: false } }
}

impl<N, E, C, Item, Err> Observer<Item, Err> for AllObserver<N, E, C>
where
  N: FnMut(Item),
  E: FnMut(Err),
  C: FnMut(),
{
  #[inline]
  fn next(&mut self, value: Item) {
    if !self.done {
      (self.next)(value);
    }
  }

  fn error(&mut self, err: Err) {
    if !self.done {
      self.done = true;
      (self.error)(err);
    }
  }

  fn complete(&mut self) {
    if !self.done {
      self.done = true;
      (self.complete)();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.done }
}

/// Observer that forwards every event, reified, to a closure.
#[derive(Clone)]
pub struct NotificationObserver<F> {
  f: F,
  done: bool,
}

impl<F> NotificationObserver<F> {
  pub fn new(f: F) -> Self { Self { f, done: false } }
}

impl<F, Item, Err> Observer<Item, Err> for NotificationObserver<F>
where
  F: FnMut(Notification<Item, Err>),
{
  fn next(&mut self, value: Item) {
    if !self.done {
      (self.f)(Notification::Next(value));
    }
  }

  fn error(&mut self, err: Err) {
    if !self.done {
      self.done = true;
      (self.f)(Notification::Error(err));
    }
  }

  fn complete(&mut self) {
    if !self.done {
      self.done = true;
      (self.f)(Notification::Complete);
    }
  }

  fn is_closed(&self) -> bool { self.done }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod test {
  use super::*;

  struct TestObserver {
    values: Vec<i32>,
  }

  impl Observer<i32, ()> for TestObserver {
    fn next(&mut self, value: i32) { self.values.push(value); }

    fn error(&mut self, _: ()) {}

    fn complete(&mut self) {}

    fn is_closed(&self) -> bool { false }
  }

  #[rxcast_macro::test]
  fn test_observer_trait() {
    let mut obs = TestObserver { values: vec![] };
    obs.next(1);
    obs.next(2);
    assert_eq!(obs.values, vec![1, 2]);
    assert!(!Observer::<i32, ()>::is_closed(&obs));
  }

  #[rxcast_macro::test]
  fn test_closure_as_observer() {
    let mut count = 0;
    let mut closure_obs = FnMutObserver(|v: i32| {
      count += v;
    });

    Observer::<_, ()>::next(&mut closure_obs, 10);
    Observer::<_, ()>::next(&mut closure_obs, 20);
    assert_eq!(count, 30);
  }

  #[rxcast_macro::test]
  fn all_observer_is_terminal_once() {
    let mut completes = 0;
    let mut errors = 0;
    {
      let mut obs = AllObserver::new(|_: i32| {}, |_: ()| errors += 1, || completes += 1);
      Observer::<i32, ()>::complete(&mut obs);
      Observer::<i32, ()>::complete(&mut obs);
      Observer::<i32, ()>::error(&mut obs, ());
      assert!(Observer::<i32, ()>::is_closed(&obs));
    }
    assert_eq!(completes, 1);
    assert_eq!(errors, 0);
  }

  #[rxcast_macro::test]
  fn option_observer_takes_itself_on_terminal() {
    let mut obs = Some(TestObserver { values: vec![] });
    Observer::<i32, ()>::next(&mut obs, 1);
    Observer::<i32, ()>::complete(&mut obs);
    assert!(obs.is_none());
    assert!(Observer::<i32, ()>::is_closed(&obs));
  }
}

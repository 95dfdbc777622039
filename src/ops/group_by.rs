//! Dynamic partitioning of a stream by key.
//!
//! Each distinct key gets one live [`Subject`]; its [`GroupedObservable`]
//! wrapper is emitted on the outer stream the first time the key is seen.
//! Groups keep no backlog: values routed to a group before anyone
//! subscribes to it are lost to later subscribers.
//!
//! The source subscription outlives the outer subscriber as long as any
//! group is still subscribed. Once the outer subscriber is gone, values with
//! a key that has no group yet are dropped.

use std::{
  collections::{hash_map::DefaultHasher, HashMap},
  hash::{Hash, Hasher},
};

use super::selector::{KeySelector, Selector};
use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDerefMut},
  subject::Subject,
  subscription::{SharedSubscription, SubscriptionLike},
  type_hint::TypeHint,
};

/// Hashing and equality of group keys.
///
/// Both may fail; a failure terminates the outer stream and every open group
/// with the returned error.
pub trait KeyComparer<Key, Err>: Send + 'static {
  fn hash_key(&self, key: &Key) -> Result<u64, Err>;

  fn eq_keys(&self, a: &Key, b: &Key) -> Result<bool, Err>;
}

/// Compares keys with their own `Hash` and `Eq`.
#[derive(Clone, Copy, Default, Debug)]
pub struct DefaultComparer;

impl<Key: Hash + Eq, Err> KeyComparer<Key, Err> for DefaultComparer {
  fn hash_key(&self, key: &Key) -> Result<u64, Err> {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    Ok(hasher.finish())
  }

  #[inline]
  fn eq_keys(&self, a: &Key, b: &Key) -> Result<bool, Err> { Ok(a == b) }
}

#[derive(Clone)]
pub struct GroupByOp<S, K, E, C, Key, Value> {
  source: S,
  key: K,
  element: E,
  comparer: C,
  _hint: TypeHint<(Key, Value)>,
}

impl<S, K, E, C, Key, Value> GroupByOp<S, K, E, C, Key, Value> {
  #[inline]
  pub(crate) fn new(source: S, key: K, element: E, comparer: C) -> Self {
    Self { source, key, element, comparer, _hint: TypeHint::new() }
  }
}

/// One partition of a grouped stream.
pub struct GroupedObservable<Key, Value, Err> {
  key: Key,
  subject: Subject<Value, Err>,
  lifetime: GroupLifetime,
}

impl<Key: Clone, Value, Err> Clone for GroupedObservable<Key, Value, Err> {
  fn clone(&self) -> Self {
    GroupedObservable {
      key: self.key.clone(),
      subject: self.subject.clone(),
      lifetime: self.lifetime.clone(),
    }
  }
}

impl<Key, Value, Err> GroupedObservable<Key, Value, Err> {
  #[inline]
  pub fn key(&self) -> &Key { &self.key }
}

impl<Key, Value, Err> Observable for GroupedObservable<Key, Value, Err>
where
  Value: Send + 'static,
  Err: Send + 'static,
{
  type Item = Value;
  type Err = Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Value, Err> + Send + 'static,
  {
    self.lifetime.acquire();
    let subscription = self.subject.actual_subscribe(observer);
    let lifetime = self.lifetime;
    subscription.add_fn(move || lifetime.release_group());
    subscription
  }
}

// ============================================================================
// Source lifetime
// ============================================================================

/// Keeps the source subscribed while either the outer subscriber or any
/// group subscription is alive.
#[derive(Clone)]
struct GroupLifetime(MutArc<LifetimeState>);

struct LifetimeState {
  outer_alive: bool,
  groups: usize,
  source: SharedSubscription,
}

impl GroupLifetime {
  fn new(source: SharedSubscription) -> Self {
    GroupLifetime(MutArc::own(LifetimeState { outer_alive: true, groups: 0, source }))
  }

  fn acquire(&self) { self.0.rc_deref_mut().groups += 1; }

  fn release_group(&self) {
    let source = {
      let mut state = self.0.rc_deref_mut();
      state.groups -= 1;
      (!state.outer_alive && state.groups == 0).then(|| state.source.clone())
    };
    Self::dispose(source);
  }

  fn release_outer(&self) {
    let source = {
      let mut state = self.0.rc_deref_mut();
      state.outer_alive = false;
      (state.groups == 0).then(|| state.source.clone())
    };
    Self::dispose(source);
  }

  fn dispose(source: Option<SharedSubscription>) {
    if let Some(mut source) = source {
      tracing::debug!("group_by source released");
      source.unsubscribe();
    }
  }
}

// ============================================================================
// Operator
// ============================================================================

impl<S, K, E, C, Key, Value> Observable for GroupByOp<S, K, E, C, Key, Value>
where
  S: Observable,
  S::Err: Clone + Send + 'static,
  K: KeySelector<S::Item, S::Err, Key = Key> + Send + 'static,
  E: Selector<S::Item, S::Err, Output = Value> + Send + 'static,
  C: KeyComparer<Key, S::Err>,
  Key: Clone + Send + 'static,
  Value: Clone + Send + 'static,
{
  type Item = GroupedObservable<Key, Value, S::Err>;
  type Err = S::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let source_subscription = SharedSubscription::default();
    let lifetime = GroupLifetime::new(source_subscription.clone());
    let downstream = SharedSubscription::default();
    let outer = lifetime.clone();
    downstream.add_fn(move || outer.release_outer());

    let group_observer = GroupByObserver {
      observer,
      key: self.key,
      element: self.element,
      comparer: self.comparer,
      groups: HashMap::new(),
      order: Vec::new(),
      lifetime,
      downstream: downstream.clone(),
      source: source_subscription.clone(),
      stopped: false,
    };
    source_subscription.add(self.source.actual_subscribe(group_observer));
    downstream
  }
}

type Bucket<Key, Value, Err> = Vec<(Key, Subject<Value, Err>)>;

pub struct GroupByObserver<O, K, E, C, Key, Value, Err> {
  observer: O,
  key: K,
  element: E,
  comparer: C,
  groups: HashMap<u64, Bucket<Key, Value, Err>>,
  /// Every group in the order it was opened.
  order: Vec<Subject<Value, Err>>,
  lifetime: GroupLifetime,
  downstream: SharedSubscription,
  source: SharedSubscription,
  stopped: bool,
}

/// Where one source value goes: its group, whether that group is new, and
/// the selected element.
struct Routed<Key, Value, Err> {
  fresh: Option<Key>,
  group: Subject<Value, Err>,
  element: Value,
}

impl<O, K, E, C, Key, Value, Err> GroupByObserver<O, K, E, C, Key, Value, Err>
where
  C: KeyComparer<Key, Err>,
  Key: Clone,
{
  /// The group of `key`, if one exists.
  fn lookup(&self, hash: u64, key: &Key) -> Result<Option<Subject<Value, Err>>, Err> {
    if let Some(bucket) = self.groups.get(&hash) {
      for (k, subject) in bucket {
        if self.comparer.eq_keys(k, key)? {
          return Ok(Some(subject.clone()));
        }
      }
    }
    Ok(None)
  }

  /// Run the selectors for `value` and find or open its group. Returns
  /// `None` when the value has no group and none may be opened anymore.
  fn route<Item>(&mut self, value: Item) -> Result<Option<Routed<Key, Value, Err>>, Err>
  where
    K: KeySelector<Item, Err, Key = Key>,
    E: Selector<Item, Err, Output = Value>,
  {
    let key = self.key.key_of(&value)?;
    let hash = self.comparer.hash_key(&key)?;
    let (group, fresh) = match self.lookup(hash, &key)? {
      Some(group) => (group, None),
      None if self.downstream.is_closed() => return Ok(None),
      None => {
        let group = Subject::default();
        self
          .groups
          .entry(hash)
          .or_default()
          .push((key.clone(), group.clone()));
        self.order.push(group.clone());
        (group, Some(key))
      }
    };
    let element = self.element.select(value)?;
    Ok(Some(Routed { fresh, group, element }))
  }

  fn stop(&mut self) -> Vec<Subject<Value, Err>> {
    self.stopped = true;
    self.groups.clear();
    std::mem::take(&mut self.order)
  }
}

impl<O, K, E, C, Item, Err, Key, Value> Observer<Item, Err>
  for GroupByObserver<O, K, E, C, Key, Value, Err>
where
  O: Observer<GroupedObservable<Key, Value, Err>, Err>,
  K: KeySelector<Item, Err, Key = Key>,
  E: Selector<Item, Err, Output = Value>,
  C: KeyComparer<Key, Err>,
  Key: Clone,
  Value: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    if self.stopped {
      return;
    }
    match self.route(value) {
      Ok(Some(Routed { fresh, mut group, element })) => {
        if let Some(key) = fresh {
          tracing::debug!(groups = self.order.len(), "group_by opened a new group");
          self.observer.next(GroupedObservable {
            key,
            subject: group.clone(),
            lifetime: self.lifetime.clone(),
          });
        }
        group.next(element);
      }
      Ok(None) => {}
      Err(err) => Observer::<Item, Err>::error(self, err),
    }
  }

  fn error(&mut self, err: Err) {
    if self.stopped {
      return;
    }
    for mut group in self.stop() {
      group.error(err.clone());
    }
    if !self.downstream.is_closed() {
      self.observer.error(err);
    }
    self.source.clone().unsubscribe();
    self.downstream.clone().unsubscribe();
  }

  fn complete(&mut self) {
    if self.stopped {
      return;
    }
    for mut group in self.stop() {
      group.complete();
    }
    if !self.downstream.is_closed() {
      self.observer.complete();
    }
    self.source.clone().unsubscribe();
    self.downstream.clone().unsubscribe();
  }

  fn is_closed(&self) -> bool { self.stopped || self.source.is_closed() }
}

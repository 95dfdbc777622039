use super::selector::Selector;
use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDerefMut},
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};

/// Operator returned by [`ObservableExt::flat_map`] and
/// [`ObservableExt::try_flat_map`].
///
/// Values from the inners reach the downstream observer through one
/// [`Subscriber`], so inners emitting from different threads are delivered
/// one at a time, and a downstream observer that feeds the source back from
/// inside its callback has that value queued rather than nested.
///
/// [`ObservableExt::flat_map`]: crate::observable::ObservableExt::flat_map
/// [`ObservableExt::try_flat_map`]: crate::observable::ObservableExt::try_flat_map
#[derive(Clone)]
pub struct FlatMapOp<S, F> {
  source: S,
  project: F,
}

impl<S, F> FlatMapOp<S, F> {
  #[inline]
  pub(crate) fn new(source: S, project: F) -> Self { Self { source, project } }
}

impl<S, F> Observable for FlatMapOp<S, F>
where
  S: Observable,
  F: Selector<S::Item, S::Err> + Send + 'static,
  F::Output: Observable<Err = S::Err>,
  <F::Output as Observable>::Item: Send + 'static,
  S::Err: Send + 'static,
{
  type Item = <F::Output as Observable>::Item;
  type Err = S::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let downstream = Subscriber::new(observer);
    let upstream = SharedSubscription::default();
    downstream.add(upstream.clone());
    let merge = Merge {
      downstream,
      upstream: upstream.clone(),
      counts: MutArc::own(Counts { active: 0, outer_completed: false }),
    };
    let outer = OuterObserver { merge: merge.clone(), project: self.project };
    upstream.add(self.source.actual_subscribe(outer));
    merge.downstream.subscription()
  }
}

struct Counts {
  active: usize,
  outer_completed: bool,
}

/// State shared by the outer observer and every inner one.
///
/// `upstream` holds the outer and inner subscriptions. It is cut as soon as
/// an error arrives, while the error itself may still be queued on
/// `downstream`.
struct Merge<Item, Err> {
  downstream: Subscriber<Item, Err>,
  upstream: SharedSubscription,
  counts: MutArc<Counts>,
}

impl<Item, Err> Clone for Merge<Item, Err> {
  fn clone(&self) -> Self {
    Merge {
      downstream: self.downstream.clone(),
      upstream: self.upstream.clone(),
      counts: self.counts.clone(),
    }
  }
}

impl<Item, Err> Merge<Item, Err> {
  fn fail(&mut self, err: Err) {
    self.downstream.error(err);
    self.upstream.clone().unsubscribe();
  }

  fn complete_if_done(&mut self) {
    let done = {
      let counts = self.counts.rc_deref_mut();
      counts.outer_completed && counts.active == 0
    };
    if done {
      self.downstream.complete();
    }
  }
}

pub struct OuterObserver<Item, Err, F> {
  merge: Merge<Item, Err>,
  project: F,
}

pub struct InnerObserver<Item, Err> {
  merge: Merge<Item, Err>,
}

impl<Item, Err, F, In> Observer<In, Err> for OuterObserver<Item, Err, F>
where
  F: Selector<In, Err>,
  F::Output: Observable<Item = Item, Err = Err>,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn next(&mut self, value: In) {
    if self.merge.upstream.is_closed() {
      return;
    }
    let inner = match self.project.select(value) {
      Ok(inner) => inner,
      Err(err) => return self.merge.fail(err),
    };
    self.merge.counts.rc_deref_mut().active += 1;
    let unsub = inner.actual_subscribe(InnerObserver { merge: self.merge.clone() });
    if !unsub.is_closed() {
      self.merge.upstream.add(unsub);
    }
  }

  fn error(&mut self, err: Err) { self.merge.fail(err) }

  fn complete(&mut self) {
    self.merge.counts.rc_deref_mut().outer_completed = true;
    self.merge.complete_if_done();
  }

  fn is_closed(&self) -> bool { self.merge.upstream.is_closed() }
}

impl<Item, Err> Observer<Item, Err> for InnerObserver<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { self.merge.downstream.next(value) }

  fn error(&mut self, err: Err) { self.merge.fail(err) }

  fn complete(&mut self) {
    self.merge.counts.rc_deref_mut().active -= 1;
    self.merge.complete_if_done();
  }

  fn is_closed(&self) -> bool { self.merge.upstream.is_closed() }
}

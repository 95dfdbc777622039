//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

pub use crate::{
  error::ContractViolation,
  notification::Notification,
  observable,
  observable::{ConnectableObservable, Observable, ObservableExt},
  observer::{AllObserver, BoxObserver, FnMutObserver, NotificationObserver, Observer},
  ops::{
    flat_map::FlatMapOp,
    group_by::{DefaultComparer, GroupByOp, GroupedObservable, KeyComparer},
    ref_count::RefCount,
  },
  scheduler::{new_thread, ImmediateScheduler, Scheduler, TaskHandle, TestScheduler, ThreadScheduler},
  subject::{BehaviorSubject, ReplaySubject, Subject, SubjectLike},
  subscriber::Subscriber,
  subscription::{
    ActionSubscription, BoxSubscription, SerialSubscription, SharedSubscription, SubscriptionGuard,
    SubscriptionLike, SubscriptionWrapper,
  },
};
#[cfg(feature = "futures-scheduler")]
pub use crate::scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;

//! # rxcast: push-based event composition
//!
//! Producers push values, an error or a completion signal to observers;
//! operators compose producers into new ones, and schedulers decide when and
//! on which thread the work runs.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxcast::prelude::*;
//!
//! let seen = Arc::new(Mutex::new(vec![]));
//! let s = seen.clone();
//! observable::from_iter::<_, ()>(1..=3)
//!   .flat_map(|v| observable::from_iter(vec![v, v * 10]))
//!   .subscribe(move |v| s.lock().unwrap().push(v));
//! assert_eq!(*seen.lock().unwrap(), vec![1, 10, 2, 20, 3, 30]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A source; subscribing it starts delivery |
//! | [`Observer`] | Consumes `next`, `error` and `complete` |
//! | [`SubscriptionLike`] | Handle that stops delivery when unsubscribed |
//! | [`Scheduler`] | Decides when and where scheduled work runs |
//! | [`Subject`] | Observer and observable at once, multicasts to subscribers |
//! | [`ConnectableObservable`] | Shares one source subscription among many subscribers |
//!
//! Time-dependent behaviour is tested on the virtual clock of
//! [`TestScheduler`] with the helpers in [`testing`].
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): thread pool scheduler backed by `futures`
//! - **`tokio-scheduler`**: scheduler spawning onto a tokio runtime
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`SubscriptionLike`]: subscription::SubscriptionLike
//! [`Scheduler`]: scheduler::Scheduler
//! [`Subject`]: subject::Subject
//! [`ConnectableObservable`]: observable::ConnectableObservable
//! [`TestScheduler`]: scheduler::TestScheduler

extern crate self as rxcast;

pub mod error;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
pub mod subscription;
pub mod testing;
pub mod type_hint;

pub use prelude::*;

//! Observer and subscription contracts that every source must keep.

use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
  },
  thread,
  time::Duration,
};

use rxcast::{prelude::*, testing::*};

#[rxcast_macro::test]
fn subscriber_drops_everything_after_a_terminal() {
  let observer = TestObserver::<i32, &'static str>::new();
  let misbehaving = observable::create(|mut subscriber: Subscriber<i32, &'static str>| {
    subscriber.next(1);
    subscriber.complete();
    subscriber.next(2);
    subscriber.error("late");
    subscriber.complete();
  });
  misbehaving.subscribe_with(observer.clone());
  assert_eq!(observer.values(), vec![1]);
  assert!(observer.is_terminated());
  assert!(observer.violations().is_empty());
}

#[rxcast_macro::test(virtual_time)]
fn operators_keep_the_terminal_once_grammar() {
  let xs = HotObservable::<u64, &'static str>::new(vec![on_next(210, 1), on_next(220, 2), on_error(230, "boom")]);
  let inner = ColdObservable::new(vec![on_next(1, 7), on_error(2, "inner"), on_completed(3)]);
  let (s, i) = (xs.clone(), inner.clone());
  let observer = start_default(move || s.flat_map(move |_| i.clone()).share());
  assert_eq!(observer.messages(), vec![on_next(211, 7), on_error(212, "inner")]);
  assert!(observer.violations().is_empty());
}

#[rxcast_macro::test]
fn unsubscribe_is_idempotent() {
  let runs = Arc::new(AtomicUsize::new(0));
  let r = runs.clone();
  let mut subscription = SharedSubscription::default();
  subscription.add_fn(move || {
    r.fetch_add(1, Ordering::SeqCst);
  });
  subscription.unsubscribe();
  subscription.unsubscribe();
  subscription.clone().unsubscribe();
  assert_eq!(runs.load(Ordering::SeqCst), 1);

  let r = runs.clone();
  let mut serial = SerialSubscription::default();
  serial.set(ActionSubscription::new(move || {
    r.fetch_add(1, Ordering::SeqCst);
  }));
  serial.unsubscribe();
  serial.unsubscribe();
  assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[rxcast_macro::test]
fn concurrent_unsubscribe_runs_teardown_once() {
  let runs = Arc::new(AtomicUsize::new(0));
  let subscription = SharedSubscription::default();
  let r = runs.clone();
  subscription.add_fn(move || {
    r.fetch_add(1, Ordering::SeqCst);
  });
  let handles: Vec<_> = (0..8)
    .map(|_| {
      let mut s = subscription.clone();
      thread::spawn(move || s.unsubscribe())
    })
    .collect();
  for h in handles {
    h.join().unwrap();
  }
  assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[rxcast_macro::test]
fn no_delivery_starts_after_unsubscribe_returns() {
  let subject = Subject::<usize, ()>::new();
  let seen = Arc::new(Mutex::new(vec![]));
  let s = seen.clone();
  let mut subscription = subject.clone().subscribe(move |v| s.lock().unwrap().push(v));

  let producer = {
    let mut subject = subject.clone();
    thread::spawn(move || {
      for v in 0..10_000 {
        subject.next(v);
      }
    })
  };
  thread::sleep(Duration::from_millis(1));
  subscription.unsubscribe();
  let len = seen.lock().unwrap().len();
  producer.join().unwrap();
  // a delivery already running on the producer thread may still land
  assert!(seen.lock().unwrap().len() <= len + 1);
}

#[rxcast_macro::test]
fn schedulers_run_work_off_thread() {
  let (tx, rx) = std::sync::mpsc::channel();
  let caller = thread::current().id();
  let _ = new_thread().schedule_after(Duration::from_millis(5), move || {
    tx.send(thread::current().id()).unwrap();
  });
  let worker = rx.recv_timeout(Duration::from_secs(5)).unwrap();
  assert_ne!(worker, caller);
}

#[rxcast_macro::test(virtual_time)]
fn feeding_a_subject_from_its_observer_is_serialized() {
  let subject = Subject::<i32, ()>::new();
  let mut feedback = subject.clone();
  let observer = TestObserver::reacting(move |n: &Notification<i32, ()>| match n.value() {
    Some(&v) if v < 3 => feedback.next(v + 1),
    Some(_) => feedback.complete(),
    None => {}
  });
  subject.clone().subscribe_with(observer.clone());

  TestScheduler::advance_to(40);
  let mut subject = subject;
  subject.next(1);

  assert_eq!(
    observer.messages(),
    vec![on_next(40, 1), on_next(40, 2), on_next(40, 3), on_completed(40)]
  );
  assert!(observer.violations().is_empty());
  assert_eq!(subject.subscriber_count(), 0);
}

#[rxcast_macro::test(virtual_time)]
fn flat_map_feedback_loop_keeps_the_grammar() {
  let outer = Subject::<i32, ()>::new();
  let mut feedback = outer.clone();
  let observer = TestObserver::reacting(move |n: &Notification<i32, ()>| {
    if let Some(&v) = n.value() {
      if v < 4 {
        feedback.next(v + 1);
      } else {
        feedback.complete();
      }
    }
  });
  outer.clone().flat_map(observable::of).subscribe_with(observer.clone());

  let mut outer = outer;
  outer.next(1);

  assert_eq!(observer.values(), vec![1, 2, 3, 4]);
  assert!(observer.is_terminated());
  assert!(observer.violations().is_empty());
}

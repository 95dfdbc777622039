use crate::observer::Observer;

/// One event of a sequence, reified as a value.
///
/// A well-formed sequence is any number of `Next` followed by at most one
/// `Error` or `Complete`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

impl<Item, Err> Notification<Item, Err> {
  #[inline]
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }

  /// Deliver this notification to `observer`.
  pub fn accept<O>(self, observer: &mut O)
  where
    O: Observer<Item, Err> + ?Sized,
  {
    match self {
      Notification::Next(v) => observer.next(v),
      Notification::Error(e) => observer.error(e),
      Notification::Complete => observer.complete(),
    }
  }

  pub fn value(&self) -> Option<&Item> {
    match self {
      Notification::Next(v) => Some(v),
      _ => None,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(Item) -> U) -> Notification<U, Err> {
    match self {
      Notification::Next(v) => Notification::Next(f(v)),
      Notification::Error(e) => Notification::Error(e),
      Notification::Complete => Notification::Complete,
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[derive(Default)]
  struct Log(Vec<String>);

  impl Observer<i32, &'static str> for Log {
    fn next(&mut self, value: i32) { self.0.push(format!("next {value}")); }
    fn error(&mut self, err: &'static str) { self.0.push(format!("error {err}")); }
    fn complete(&mut self) { self.0.push("complete".to_owned()); }
    fn is_closed(&self) -> bool { false }
  }

  #[rxcast_macro::test]
  fn accept_dispatches_by_kind() {
    let mut log = Log::default();
    Notification::Next(1).accept(&mut log);
    Notification::<i32, _>::Error("boom").accept(&mut log);
    Notification::<i32, &'static str>::Complete.accept(&mut log);
    assert_eq!(log.0, vec!["next 1", "error boom", "complete"]);
  }

  #[rxcast_macro::test]
  fn terminal_kinds() {
    assert!(!Notification::<_, ()>::Next(1).is_terminal());
    assert!(Notification::<i32, _>::Error(()).is_terminal());
    assert!(Notification::<i32, ()>::Complete.is_terminal());
    assert_eq!(Notification::<_, ()>::Next(2).map(|v| v * 10), Notification::Next(20));
  }
}

use thiserror::Error;

/// A breach of the observer contract detected by a recording observer.
///
/// Production sources never report these; they exist so that tests can
/// assert a pipeline kept the grammar `Next* (Error | Complete)?` and
/// never called one observer while it was still busy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
  #[error("`{kind}` delivered at tick {time} after the sequence had terminated")]
  NotificationAfterTerminal { time: u64, kind: &'static str },
  #[error("`{kind}` delivered at tick {time} while another notification was still being delivered")]
  OverlappingDelivery { time: u64, kind: &'static str },
}

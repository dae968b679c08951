use chrono::{DateTime, Utc};

/// Injectable time source.
///
/// The dispatch loop and the subscription gate take their "now" from this
/// trait so tests can exercise due/sent transitions without waiting on a
/// real clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

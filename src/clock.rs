/// Wall-clock source for scoring and alarm planning
use chrono::{DateTime, FixedOffset, Local};

pub trait Clock {
    /// Current time carrying the host's local UTC offset
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The host's local clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

/// Source of wall-clock time for cache expiry.
pub trait Clock: Send + Sync + fmt::Debug {
	fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
	now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
	pub fn new(start: DateTime<Utc>) -> Self {
		Self { now: Mutex::new(start) }
	}

	pub fn set(&self, now: DateTime<Utc>) {
		*self.now.lock() = now;
	}

	/// Moves the clock forward by `by`.
	pub fn advance(&self, by: Duration) {
		let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
		let mut now = self.now.lock();
		*now = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> DateTime<Utc> {
		*self.now.lock()
	}
}

//! Strong hold on the most recently used environment.
//!
//! A weakly caching registry may drop an environment as soon as no test
//! holds it. Consecutive test classes usually target the same runner and
//! version, so the guard keeps exactly one `(runner, version)` entry alive
//! between them.

use std::sync::Arc;

use parking_lot::Mutex;
use roboscope_primitives::{RunnerId, VersionConfig};
use tracing::debug;

use crate::{Environment, EnvironmentError, EnvironmentRegistry};

struct Held {
	runner: RunnerId,
	version: VersionConfig,
	environment: Arc<Environment>,
}

/// Process-wide single-entry retention.
#[derive(Default)]
pub struct RetentionGuard {
	held: Mutex<Option<Held>>,
}

impl RetentionGuard {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the held environment when `runner` and `version` match,
	/// otherwise releases it, obtains one from `registry` and holds that.
	///
	/// The guard's lock is not held while `registry` builds.
	///
	/// # Errors
	///
	/// Propagates the registry's error; the guard is left empty.
	pub fn get_or_retain<D>(
		&self,
		runner: &RunnerId,
		version: VersionConfig,
		registry: &EnvironmentRegistry<D>,
		build: impl FnOnce() -> Result<Environment, EnvironmentError>,
	) -> Result<Arc<Environment>, EnvironmentError> {
		{
			let mut held = self.held.lock();
			if let Some(h) = held.as_ref()
				&& h.runner == *runner
				&& h.version == version
			{
				debug!(runner = %runner, sdk = %version, "Retained environment hit");
				return Ok(Arc::clone(&h.environment));
			}
			if let Some(previous) = held.take() {
				debug!(runner = %previous.runner, sdk = %previous.version, "Releasing retained environment");
			}
		}

		let environment = registry.get_or_build(version, build)?;
		*self.held.lock() = Some(Held {
			runner: runner.clone(),
			version,
			environment: Arc::clone(&environment),
		});
		Ok(environment)
	}

	/// Key of the currently held entry.
	pub fn retained(&self) -> Option<(RunnerId, VersionConfig)> {
		self.held.lock().as_ref().map(|h| (h.runner.clone(), h.version))
	}

	/// Releases the held environment.
	pub fn clear(&self) {
		self.held.lock().take();
	}
}

impl std::fmt::Debug for RetentionGuard {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RetentionGuard").field("retained", &self.retained()).finish()
	}
}

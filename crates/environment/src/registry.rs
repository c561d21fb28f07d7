//! Per-runner memoization of descriptors and environments.
//!
//! Environments are keyed by [`VersionConfig`]. Concurrent requests for the
//! same version share one build: the first caller leads it, later callers
//! block on the leader's published outcome. Failed builds are never stored,
//! so the next request retries.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::{Condvar, Mutex};
use roboscope_primitives::{DescriptorKey, VersionConfig};
use tracing::{debug, warn};

use crate::{Environment, EnvironmentError};

type BuildOutcome = Result<Arc<Environment>, EnvironmentError>;

/// How the registry holds built environments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
	/// Keep every environment for the registry's lifetime.
	#[default]
	Strong,
	/// Keep an environment only while something else holds it.
	Weak,
}

enum Retained {
	Strong(Arc<Environment>),
	Weak(Weak<Environment>),
}

impl Retained {
	fn new(environment: &Arc<Environment>, policy: CachePolicy) -> Self {
		match policy {
			CachePolicy::Strong => Self::Strong(Arc::clone(environment)),
			CachePolicy::Weak => Self::Weak(Arc::downgrade(environment)),
		}
	}

	fn upgrade(&self) -> Option<Arc<Environment>> {
		match self {
			Self::Strong(env) => Some(Arc::clone(env)),
			Self::Weak(env) => env.upgrade(),
		}
	}
}

enum Slot {
	Ready(Retained),
	Building(Arc<InFlightBuild>),
}

/// Rendezvous for callers waiting on a build led by another thread.
struct InFlightBuild {
	outcome: Mutex<Option<BuildOutcome>>,
	done: Condvar,
}

impl InFlightBuild {
	fn new() -> Self {
		Self {
			outcome: Mutex::new(None),
			done: Condvar::new(),
		}
	}

	fn publish(&self, outcome: BuildOutcome) {
		*self.outcome.lock() = Some(outcome);
		self.done.notify_all();
	}

	fn wait(&self) -> BuildOutcome {
		let mut outcome = self.outcome.lock();
		loop {
			if let Some(outcome) = outcome.as_ref() {
				return outcome.clone();
			}
			self.done.wait(&mut outcome);
		}
	}
}

/// Memo tables owned by one runner kind.
pub struct EnvironmentRegistry<D> {
	policy: CachePolicy,
	descriptors: Mutex<HashMap<DescriptorKey, Arc<D>>>,
	environments: Mutex<HashMap<VersionConfig, Slot>>,
}

impl<D> Default for EnvironmentRegistry<D> {
	fn default() -> Self {
		Self::new(CachePolicy::default())
	}
}

impl<D> EnvironmentRegistry<D> {
	pub fn new(policy: CachePolicy) -> Self {
		Self {
			policy,
			descriptors: Mutex::new(HashMap::new()),
			environments: Mutex::new(HashMap::new()),
		}
	}

	pub fn policy(&self) -> CachePolicy {
		self.policy
	}

	/// Returns the memoized descriptor for `key`, creating it on first use.
	///
	/// `create` may report that no descriptor exists (`Ok(None)`); that answer
	/// is not memoized. When two callers race on a fresh key, the first
	/// stored descriptor wins and both receive it.
	///
	/// # Errors
	///
	/// Propagates `create`'s error; nothing is stored.
	pub fn get_or_create_descriptor<E>(
		&self,
		key: &DescriptorKey,
		create: impl FnOnce() -> Result<Option<D>, E>,
	) -> Result<Option<Arc<D>>, E> {
		if let Some(existing) = self.descriptors.lock().get(key) {
			return Ok(Some(Arc::clone(existing)));
		}

		let Some(created) = create()? else {
			return Ok(None);
		};
		let mut descriptors = self.descriptors.lock();
		let stored = descriptors.entry(key.clone()).or_insert_with(|| Arc::new(created));
		Ok(Some(Arc::clone(stored)))
	}

	/// Returns the environment for `version`, building it at most once
	/// across concurrent callers.
	///
	/// # Errors
	///
	/// Returns the build's error to the leader and to every caller waiting
	/// on it. The failed outcome is not memoized.
	pub fn get_or_build(
		&self,
		version: VersionConfig,
		build: impl FnOnce() -> Result<Environment, EnvironmentError>,
	) -> BuildOutcome {
		let flight = {
			let mut slots = self.environments.lock();
			let waiting = match slots.get(&version) {
				Some(Slot::Ready(retained)) => match retained.upgrade() {
					Some(environment) => {
						debug!(sdk = %version, id = %environment.id(), "Reusing environment");
						return Ok(environment);
					}
					None => {
						debug!(sdk = %version, "Environment was released, rebuilding");
						None
					}
				},
				Some(Slot::Building(flight)) => Some(Arc::clone(flight)),
				None => None,
			};

			if let Some(flight) = waiting {
				drop(slots);
				debug!(sdk = %version, "Waiting on in-flight environment build");
				return flight.wait();
			}

			let flight = Arc::new(InFlightBuild::new());
			slots.insert(version, Slot::Building(Arc::clone(&flight)));
			flight
		};

		let guard = BuildGuard {
			registry: self,
			version,
			flight,
			completed: false,
		};
		let outcome = build().map(Arc::new);
		guard.complete(outcome)
	}

	/// Number of environments currently retrievable without a rebuild.
	pub fn environment_count(&self) -> usize {
		self.environments
			.lock()
			.values()
			.filter(|slot| matches!(slot, Slot::Ready(retained) if retained.upgrade().is_some()))
			.count()
	}

	pub fn descriptor_count(&self) -> usize {
		self.descriptors.lock().len()
	}

	/// Returns true if an environment for `version` is available without a rebuild.
	pub fn contains(&self, version: VersionConfig) -> bool {
		matches!(
			self.environments.lock().get(&version),
			Some(Slot::Ready(retained)) if retained.upgrade().is_some()
		)
	}
}

impl<D> std::fmt::Debug for EnvironmentRegistry<D> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EnvironmentRegistry")
			.field("policy", &self.policy)
			.field("descriptors", &self.descriptor_count())
			.field("environments", &self.environment_count())
			.finish()
	}
}

/// Publishes the leader's outcome, or [`EnvironmentError::Abandoned`] if
/// the build unwinds.
struct BuildGuard<'a, D> {
	registry: &'a EnvironmentRegistry<D>,
	version: VersionConfig,
	flight: Arc<InFlightBuild>,
	completed: bool,
}

impl<D> BuildGuard<'_, D> {
	fn complete(mut self, outcome: BuildOutcome) -> BuildOutcome {
		self.completed = true;
		{
			let mut slots = self.registry.environments.lock();
			match &outcome {
				Ok(environment) => {
					slots.insert(
						self.version,
						Slot::Ready(Retained::new(environment, self.registry.policy)),
					);
				}
				Err(err) => {
					warn!(sdk = %self.version, error = %err, "Environment build failed");
					remove_if_ours(&mut slots, self.version, &self.flight);
				}
			}
		}
		self.flight.publish(outcome.clone());
		outcome
	}
}

impl<D> Drop for BuildGuard<'_, D> {
	fn drop(&mut self) {
		if self.completed {
			return;
		}
		warn!(sdk = %self.version, "Environment build abandoned");
		remove_if_ours(&mut self.registry.environments.lock(), self.version, &self.flight);
		self.flight.publish(Err(EnvironmentError::Abandoned(self.version)));
	}
}

fn remove_if_ours(slots: &mut HashMap<VersionConfig, Slot>, version: VersionConfig, flight: &Arc<InFlightBuild>) {
	if matches!(slots.get(&version), Some(Slot::Building(current)) if Arc::ptr_eq(current, flight)) {
		slots.remove(&version);
	}
}

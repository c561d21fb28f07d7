// Resolution runs inside test processes - report through tracing, never stdout/stderr
#![deny(clippy::print_stderr, clippy::print_stdout)]

//! Artifact resolution.
//!
//! Turns abstract [`ArtifactId`]s into files on the local disk.
//!
//! # Resolvers
//!
//! * [`LocalResolver`]: pre-provisioned directory, fails fast on a missing file
//! * [`RemoteResolver`]: Maven-layout HTTP repository with a local repository mirror
//! * [`CachingResolver`]: wraps any resolver with a TTL-bounded on-disk record cache
//!
//! [`ResolverPolicy`] picks between them from the process environment.

mod cache;
mod clock;
mod error;
mod fs;
mod local;
mod policy;
mod remote;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
pub use cache::{CachingResolver, DEFAULT_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ResolutionError, Result};
pub use local::LocalResolver;
pub use policy::{DEPENDENCY_DIR_ENV, OFFLINE_ENV, ResolverPolicy};
pub use remote::{MAVEN_CENTRAL, RemoteResolver};
use roboscope_primitives::{ArtifactId, ArtifactSet};

/// One artifact mapped to a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
	pub id: ArtifactId,
	pub path: PathBuf,
	/// When the underlying resolver produced this mapping.
	pub resolved_at: DateTime<Utc>,
}

/// Fully resolved artifact set, in classpath order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedArtifacts {
	entries: Vec<ResolvedArtifact>,
}

impl ResolvedArtifacts {
	pub fn new(entries: Vec<ResolvedArtifact>) -> Self {
		Self { entries }
	}

	pub fn iter(&self) -> std::slice::Iter<'_, ResolvedArtifact> {
		self.entries.iter()
	}

	/// Local paths in classpath order.
	pub fn paths(&self) -> Vec<PathBuf> {
		self.entries.iter().map(|e| e.path.clone()).collect()
	}

	/// Looks up the local path of one artifact.
	pub fn get(&self, id: &ArtifactId) -> Option<&Path> {
		self.entries.iter().find(|e| &e.id == id).map(|e| e.path.as_path())
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Resolves artifact identifiers to local files.
pub trait ArtifactResolver: Send + Sync {
	/// Resolves a single artifact.
	///
	/// # Errors
	///
	/// Returns [`ResolutionError`] when the artifact cannot be located or fetched.
	fn resolve(&self, artifact: &ArtifactId) -> Result<ResolvedArtifact>;

	/// Resolves every artifact of `artifacts`, stopping at the first failure.
	///
	/// No partial result is returned.
	fn resolve_all(&self, artifacts: &ArtifactSet) -> Result<ResolvedArtifacts> {
		artifacts
			.iter()
			.map(|id| self.resolve(id))
			.collect::<Result<Vec<_>>>()
			.map(ResolvedArtifacts::new)
	}
}

impl<T: ArtifactResolver + ?Sized> ArtifactResolver for Arc<T> {
	fn resolve(&self, artifact: &ArtifactId) -> Result<ResolvedArtifact> {
		(**self).resolve(artifact)
	}
}

impl<T: ArtifactResolver + ?Sized> ArtifactResolver for Box<T> {
	fn resolve(&self, artifact: &ArtifactId) -> Result<ResolvedArtifact> {
		(**self).resolve(artifact)
	}
}

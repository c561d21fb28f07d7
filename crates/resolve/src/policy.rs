//! Resolver selection from the process environment.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::ArtifactResolver;
use crate::cache::{CachingResolver, DEFAULT_TTL};
use crate::local::LocalResolver;
use crate::remote::{MAVEN_CENTRAL, RemoteResolver, default_local_repository};

/// Boolean toggle selecting offline, directory-only resolution.
pub const OFFLINE_ENV: &str = "ROBOSCOPE_OFFLINE";

/// Directory holding pre-provisioned artifacts in offline mode.
pub const DEPENDENCY_DIR_ENV: &str = "ROBOSCOPE_DEPENDENCY_DIR";

/// How artifacts should be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverPolicy {
	/// Resolve only from [`Self::dependency_dir`].
	pub offline: bool,
	/// Flat artifact directory used when offline.
	pub dependency_dir: PathBuf,
	/// Where cache records are kept when online.
	pub cache_dir: PathBuf,
	/// Lifetime of a cache record.
	pub ttl: Duration,
	/// Remote repository base URL.
	pub repository_url: String,
	/// Local mirror for downloaded artifacts.
	pub local_repository: PathBuf,
}

impl Default for ResolverPolicy {
	fn default() -> Self {
		Self {
			offline: false,
			dependency_dir: PathBuf::from("."),
			cache_dir: std::env::temp_dir().join("roboscope"),
			ttl: DEFAULT_TTL,
			repository_url: MAVEN_CENTRAL.to_string(),
			local_repository: default_local_repository(),
		}
	}
}

impl ResolverPolicy {
	/// Reads [`OFFLINE_ENV`] and [`DEPENDENCY_DIR_ENV`].
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds a policy from an arbitrary variable lookup.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let offline = lookup(OFFLINE_ENV).is_some_and(|v| parse_bool(&v));
		let dependency_dir = lookup(DEPENDENCY_DIR_ENV)
			.filter(|d| !d.is_empty())
			.map_or_else(|| PathBuf::from("."), PathBuf::from);

		Self {
			offline,
			dependency_dir,
			..Self::default()
		}
	}

	/// Instantiates the selected resolver.
	///
	/// Online resolution is cached unless the cache directory cannot be
	/// created, in which case every request goes to the remote repository.
	pub fn into_resolver(self) -> Arc<dyn ArtifactResolver> {
		if self.offline {
			info!(dir = %self.dependency_dir.display(), "Resolving artifacts offline");
			return Arc::new(LocalResolver::new(self.dependency_dir));
		}

		let remote = RemoteResolver::new(self.local_repository).with_repository_url(self.repository_url);
		match fs::create_dir_all(&self.cache_dir) {
			Ok(()) => Arc::new(CachingResolver::new(remote, self.cache_dir).with_ttl(self.ttl)),
			Err(e) => {
				warn!(dir = %self.cache_dir.display(), error = %e, "Artifact cache unavailable, resolving uncached");
				Arc::new(remote)
			}
		}
	}
}

fn parse_bool(value: &str) -> bool {
	let value = value.trim();
	value.eq_ignore_ascii_case("true") || value == "1"
}

//! TTL-bounded on-disk resolution cache.
//!
//! Each artifact gets one JSON record under the cache directory holding the
//! resolved path, when it was resolved, and the file's size and sha256. A
//! record younger than the TTL whose file is still intact is served without
//! touching the wrapped resolver.
//!
//! Concurrent misses for the same artifact are not deduplicated here; both
//! callers resolve and both write the record, last writer wins. Callers that
//! care memoize at the environment level.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use roboscope_primitives::ArtifactId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::fs::{digest_file, write_atomic};
use crate::{ArtifactResolver, ResolutionError, ResolvedArtifact, Result};

/// Default record lifetime: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// On-disk cache record for one artifact.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
	artifact: String,
	path: PathBuf,
	resolved_at: DateTime<Utc>,
	size: u64,
	sha256: String,
}

/// Wraps a resolver with a per-artifact record cache.
#[derive(Debug)]
pub struct CachingResolver<R> {
	inner: R,
	cache_dir: PathBuf,
	ttl: Duration,
	clock: Arc<dyn Clock>,
	verify_digests: bool,
}

impl<R: ArtifactResolver> CachingResolver<R> {
	/// Wraps `inner`, storing records in an existing `cache_dir`.
	pub fn new(inner: R, cache_dir: impl Into<PathBuf>) -> Self {
		Self {
			inner,
			cache_dir: cache_dir.into(),
			ttl: DEFAULT_TTL,
			clock: Arc::new(SystemClock),
			verify_digests: false,
		}
	}

	/// Like [`Self::new`], creating `cache_dir` first if it is absent.
	///
	/// # Errors
	///
	/// Returns [`ResolutionError::Io`] if the directory cannot be created.
	pub fn create(inner: R, cache_dir: impl Into<PathBuf>) -> Result<Self> {
		let cache_dir = cache_dir.into();
		fs::create_dir_all(&cache_dir).map_err(|e| ResolutionError::io(&cache_dir, e))?;
		Ok(Self::new(inner, cache_dir))
	}

	pub fn with_ttl(mut self, ttl: Duration) -> Self {
		self.ttl = ttl;
		self
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	/// Re-hashes cached files on every hit instead of only checking their size.
	pub fn with_digest_verification(mut self, verify: bool) -> Self {
		self.verify_digests = verify;
		self
	}

	pub fn cache_dir(&self) -> &Path {
		&self.cache_dir
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	pub fn inner(&self) -> &R {
		&self.inner
	}

	fn record_path(&self, artifact: &ArtifactId) -> PathBuf {
		self.cache_dir.join(format!("{}.json", artifact.cache_key()))
	}

	/// Returns a still-valid cached resolution, if any.
	fn lookup(&self, artifact: &ArtifactId) -> Option<ResolvedArtifact> {
		let record_path = self.record_path(artifact);
		let bytes = match fs::read(&record_path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
			Err(e) => {
				warn!(artifact = %artifact, path = %record_path.display(), error = %e, "Unreadable cache record");
				return None;
			}
		};

		let record: CacheRecord = match serde_json::from_slice(&bytes) {
			Ok(record) => record,
			Err(e) => {
				warn!(artifact = %artifact, path = %record_path.display(), error = %e, "Corrupt cache record");
				return None;
			}
		};

		if record.artifact != artifact.to_string() {
			warn!(artifact = %artifact, recorded = %record.artifact, "Cache record belongs to another artifact");
			return None;
		}

		let age = (self.clock.now() - record.resolved_at).to_std().unwrap_or_default();
		if age >= self.ttl {
			debug!(artifact = %artifact, age_secs = age.as_secs(), "Cache record expired");
			return None;
		}

		match fs::metadata(&record.path) {
			Ok(meta) if meta.is_file() && meta.len() == record.size => {}
			_ => {
				debug!(artifact = %artifact, path = %record.path.display(), "Cached artifact missing or resized");
				return None;
			}
		}

		if self.verify_digests {
			match digest_file(&record.path) {
				Ok((_, sha256)) if sha256 == record.sha256 => {}
				_ => {
					warn!(artifact = %artifact, path = %record.path.display(), "Cached artifact digest mismatch");
					return None;
				}
			}
		}

		Some(ResolvedArtifact {
			id: artifact.clone(),
			path: record.path,
			resolved_at: record.resolved_at,
		})
	}

	/// Writes a fresh record and returns its timestamp.
	fn store(&self, resolved: &ResolvedArtifact) -> Result<DateTime<Utc>> {
		let (size, sha256) = digest_file(&resolved.path).map_err(|e| ResolutionError::io(&resolved.path, e))?;
		let resolved_at = self.clock.now();
		let record = CacheRecord {
			artifact: resolved.id.to_string(),
			path: resolved.path.clone(),
			resolved_at,
			size,
			sha256,
		};

		let record_path = self.record_path(&resolved.id);
		let bytes = serde_json::to_vec_pretty(&record).map_err(|e| ResolutionError::io(&record_path, e.into()))?;
		write_atomic(&record_path, &bytes).map_err(|e| ResolutionError::io(&record_path, e))?;
		Ok(resolved_at)
	}
}

impl<R: ArtifactResolver> ArtifactResolver for CachingResolver<R> {
	fn resolve(&self, artifact: &ArtifactId) -> Result<ResolvedArtifact> {
		if let Some(hit) = self.lookup(artifact) {
			debug!(artifact = %artifact, path = %hit.path.display(), "Artifact cache hit");
			return Ok(hit);
		}

		let resolved = self.inner.resolve(artifact)?;
		match self.store(&resolved) {
			Ok(resolved_at) => Ok(ResolvedArtifact { resolved_at, ..resolved }),
			Err(e) => {
				warn!(artifact = %artifact, error = %e, "Failed to write cache record");
				Ok(resolved)
			}
		}
	}
}

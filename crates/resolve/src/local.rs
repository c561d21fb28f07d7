//! Resolution from a pre-provisioned directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use roboscope_primitives::ArtifactId;
use tracing::debug;

use crate::{ArtifactResolver, ResolutionError, ResolvedArtifact, Result};

/// Resolves artifacts from a flat directory of `artifact-version[-classifier].kind` files.
///
/// Intended for offline machines. A missing file fails immediately.
#[derive(Debug, Clone)]
pub struct LocalResolver {
	dir: PathBuf,
}

impl LocalResolver {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}
}

impl ArtifactResolver for LocalResolver {
	fn resolve(&self, artifact: &ArtifactId) -> Result<ResolvedArtifact> {
		let path = self.dir.join(artifact.file_name());
		if !path.is_file() {
			return Err(ResolutionError::Missing {
				artifact: artifact.clone(),
				path,
			});
		}

		debug!(artifact = %artifact, path = %path.display(), "Resolved artifact locally");
		Ok(ResolvedArtifact {
			id: artifact.clone(),
			path,
			resolved_at: Utc::now(),
		})
	}
}

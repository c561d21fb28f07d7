use std::path::PathBuf;

use roboscope_primitives::ArtifactId;
use thiserror::Error;

/// Errors that can occur while resolving an artifact.
#[derive(Debug, Error)]
pub enum ResolutionError {
	/// Artifact file absent from a local directory.
	#[error("artifact {artifact} not found at {}", path.display())]
	Missing { artifact: ArtifactId, path: PathBuf },

	/// Transport-level failure talking to a remote repository.
	#[error("failed to fetch {artifact} from {url}: {reason}")]
	Fetch {
		artifact: ArtifactId,
		url: String,
		reason: String,
	},

	/// Remote repository answered with a non-success status.
	#[error("fetching {artifact} from {url} returned HTTP {status}")]
	Status {
		artifact: ArtifactId,
		url: String,
		status: u16,
	},

	/// Filesystem I/O error.
	#[error("IO error at {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

impl ResolutionError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Io {
			path: path.into(),
			source,
		}
	}
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolutionError>;

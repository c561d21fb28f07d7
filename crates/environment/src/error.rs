use std::path::PathBuf;

use roboscope_primitives::VersionConfig;
use roboscope_resolve::ResolutionError;
use thiserror::Error;

/// Errors raised while constructing an environment or loading into it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
	/// Artifact is not a loadable archive.
	#[error("malformed artifact {}: {reason}", path.display())]
	MalformedArtifact { path: PathBuf, reason: String },

	/// Artifact could not be read.
	#[error("cannot read artifact {}: {message}", path.display())]
	Io { path: PathBuf, message: String },

	/// Class name is not a valid binary name.
	#[error("invalid class name {0:?}")]
	InvalidClassName(String),
}

/// Failure to obtain an environment.
///
/// Cloneable so one failed build can be reported to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
	#[error("artifact resolution failed: {0}")]
	Resolution(String),

	#[error(transparent)]
	Build(#[from] BuildError),

	/// The building thread unwound before publishing a result.
	#[error("environment build for sdk {0} was abandoned")]
	Abandoned(VersionConfig),
}

impl From<ResolutionError> for EnvironmentError {
	fn from(err: ResolutionError) -> Self {
		Self::Resolution(err.to_string())
	}
}

//! Resolution from a Maven-layout HTTP repository.

use std::path::{Path, PathBuf};

use chrono::Utc;
use reqwest::blocking::Client;
use roboscope_primitives::ArtifactId;
use tracing::{debug, info};

use crate::fs::write_atomic;
use crate::{ArtifactResolver, ResolutionError, ResolvedArtifact, Result};

/// Central repository used unless another URL is configured.
pub const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";

/// Fetches artifacts over HTTP into a local repository mirror.
///
/// Artifacts already present in the mirror are served without a request.
/// Downloads land through a temp file and rename, so concurrent fetches of the
/// same artifact are tolerated.
#[derive(Debug, Clone)]
pub struct RemoteResolver {
	repository_url: String,
	local_repository: PathBuf,
	client: Client,
}

impl RemoteResolver {
	pub fn new(local_repository: impl Into<PathBuf>) -> Self {
		Self {
			repository_url: MAVEN_CENTRAL.to_string(),
			local_repository: local_repository.into(),
			client: Client::new(),
		}
	}

	/// Resolver mirroring Maven Central into `~/.m2/repository`.
	pub fn maven_central() -> Self {
		Self::new(default_local_repository())
	}

	pub fn with_repository_url(mut self, url: impl Into<String>) -> Self {
		self.repository_url = url.into();
		self
	}

	pub fn repository_url(&self) -> &str {
		&self.repository_url
	}

	pub fn local_repository(&self) -> &Path {
		&self.local_repository
	}

	/// Remote URL of an artifact.
	pub fn url_for(&self, artifact: &ArtifactId) -> String {
		format!(
			"{}/{}/{}/{}/{}",
			self.repository_url.trim_end_matches('/'),
			artifact.group.replace('.', "/"),
			artifact.artifact,
			artifact.version,
			artifact.file_name()
		)
	}

	fn download(&self, artifact: &ArtifactId, target: &Path) -> Result<()> {
		let url = self.url_for(artifact);
		info!(artifact = %artifact, url = %url, "Downloading artifact");

		let fetch_err = |reason: String| ResolutionError::Fetch {
			artifact: artifact.clone(),
			url: url.clone(),
			reason,
		};

		let response = self.client.get(&url).send().map_err(|e| fetch_err(e.to_string()))?;
		let status = response.status();
		if !status.is_success() {
			return Err(ResolutionError::Status {
				artifact: artifact.clone(),
				url,
				status: status.as_u16(),
			});
		}

		let bytes = response.bytes().map_err(|e| fetch_err(e.to_string()))?;
		write_atomic(target, &bytes).map_err(|e| ResolutionError::io(target, e))?;

		debug!(artifact = %artifact, bytes = bytes.len(), path = %target.display(), "Stored artifact");
		Ok(())
	}
}

impl ArtifactResolver for RemoteResolver {
	fn resolve(&self, artifact: &ArtifactId) -> Result<ResolvedArtifact> {
		let target = self.local_repository.join(artifact.repository_path());
		if !target.is_file() {
			self.download(artifact, &target)?;
		}

		Ok(ResolvedArtifact {
			id: artifact.clone(),
			path: target,
			resolved_at: Utc::now(),
		})
	}
}

/// Returns `~/.m2/repository`, or a temp-dir mirror when no home is known.
pub(crate) fn default_local_repository() -> PathBuf {
	dirs::home_dir()
		.map(|home| home.join(".m2").join("repository"))
		.unwrap_or_else(|| std::env::temp_dir().join("roboscope").join("repository"))
}

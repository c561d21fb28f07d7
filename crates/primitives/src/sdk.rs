//! Platform release catalog.
//!
//! Maps each supported [`VersionConfig`] to the artifacts an environment for
//! that version is built from. The mapping is a pure function of the version,
//! so equal configs always yield equal [`ArtifactSet`]s.

use std::collections::BTreeMap;

use crate::artifact::{ArtifactId, ArtifactSet};
use crate::version::VersionConfig;

/// Group that publishes the instrumentable platform jars.
pub const PLATFORM_GROUP: &str = "org.robolectric";

/// Artifact name of the monolithic platform jar.
pub const PLATFORM_ARTIFACT: &str = "android-all";

/// Version used when neither the test class nor the descriptor picks one.
pub const FALLBACK_VERSION: VersionConfig = VersionConfig::new(18);

/// One published platform release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkRelease {
	/// Upstream platform version, e.g. `4.3_r2`.
	pub platform_version: String,
	/// Repackaging build number appended to the artifact version.
	pub build: String,
}

impl SdkRelease {
	pub fn new(platform_version: impl Into<String>, build: impl Into<String>) -> Self {
		Self {
			platform_version: platform_version.into(),
			build: build.into(),
		}
	}

	/// Coordinates of the platform jar for this release.
	pub fn platform_artifact(&self) -> ArtifactId {
		ArtifactId::new(
			PLATFORM_GROUP,
			PLATFORM_ARTIFACT,
			format!("{}-robolectric-{}", self.platform_version, self.build),
		)
	}
}

/// Supported releases and the session-wide default version.
#[derive(Debug, Clone)]
pub struct SdkCatalog {
	releases: BTreeMap<VersionConfig, SdkRelease>,
	default_version: VersionConfig,
}

impl Default for SdkCatalog {
	fn default() -> Self {
		Self::empty(FALLBACK_VERSION)
			.with_release(VersionConfig::new(16), SdkRelease::new("4.1.2_r1", "0"))
			.with_release(VersionConfig::new(17), SdkRelease::new("4.2.2_r1.2", "0"))
			.with_release(VersionConfig::new(18), SdkRelease::new("4.3_r2", "0"))
			.with_release(VersionConfig::new(19), SdkRelease::new("4.4_r1", "1"))
	}
}

impl SdkCatalog {
	/// Catalog with no releases. Every lookup fails until releases are added.
	pub fn empty(default_version: VersionConfig) -> Self {
		Self {
			releases: BTreeMap::new(),
			default_version,
		}
	}

	/// Adds or replaces a release.
	pub fn with_release(mut self, version: VersionConfig, release: SdkRelease) -> Self {
		self.releases.insert(version, release);
		self
	}

	/// Changes the default version.
	pub fn with_default_version(mut self, version: VersionConfig) -> Self {
		self.default_version = version;
		self
	}

	pub fn default_version(&self) -> VersionConfig {
		self.default_version
	}

	pub fn release(&self, version: VersionConfig) -> Option<&SdkRelease> {
		self.releases.get(&version)
	}

	pub fn supports(&self, version: VersionConfig) -> bool {
		self.releases.contains_key(&version)
	}

	/// Supported versions in ascending order.
	pub fn versions(&self) -> impl Iterator<Item = VersionConfig> + '_ {
		self.releases.keys().copied()
	}

	/// Classpath dependencies for `version`, or `None` if unsupported.
	pub fn artifacts(&self, version: VersionConfig) -> Option<ArtifactSet> {
		let release = self.release(version)?;
		Some(ArtifactSet::new(vec![
			release.platform_artifact(),
			ArtifactId::new("org.json", "json", "20080701"),
			ArtifactId::new("org.ccil.cowan.tagsoup", "tagsoup", "1.2"),
		]))
	}
}

//! Process-level manifest overrides.

use std::path::PathBuf;

/// Manifest path used when the configured manifest is `default`.
pub const MANIFEST_ENV: &str = "ROBOSCOPE_MANIFEST";
/// Resource directory accompanying [`MANIFEST_ENV`].
pub const RESOURCES_ENV: &str = "ROBOSCOPE_RESOURCES";
/// Asset directory accompanying [`MANIFEST_ENV`].
pub const ASSETS_ENV: &str = "ROBOSCOPE_ASSETS";
/// Package name forced onto every parsed descriptor.
pub const PACKAGE_ENV: &str = "ROBOSCOPE_PACKAGE";

/// Overrides normally supplied by the build tool through the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestOverrides {
	pub manifest: Option<PathBuf>,
	pub resources: Option<PathBuf>,
	pub assets: Option<PathBuf>,
	pub package: Option<String>,
}

impl ManifestOverrides {
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds overrides from an arbitrary variable lookup. Empty values are ignored.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
		Self {
			manifest: var(MANIFEST_ENV).map(PathBuf::from),
			resources: var(RESOURCES_ENV).map(PathBuf::from),
			assets: var(ASSETS_ENV).map(PathBuf::from),
			package: var(PACKAGE_ENV),
		}
	}
}

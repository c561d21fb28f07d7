//! Application descriptor lookup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use roboscope_environment::EnvironmentRegistry;
use roboscope_primitives::{DescriptorKey, VersionConfig};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, DEFAULT_MANIFEST, ManifestSetting};
use crate::overrides::ManifestOverrides;

const ASSET_DIR: &str = "assets";

/// Parsed application metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
	key: DescriptorKey,
	target_version: Option<VersionConfig>,
	package_name: Option<String>,
}

impl Descriptor {
	pub fn new(key: DescriptorKey) -> Self {
		Self {
			key,
			target_version: None,
			package_name: None,
		}
	}

	pub fn with_target_version(mut self, version: VersionConfig) -> Self {
		self.target_version = Some(version);
		self
	}

	pub fn with_package_name(mut self, package: impl Into<String>) -> Self {
		self.package_name = Some(package.into());
		self
	}

	pub fn key(&self) -> &DescriptorKey {
		&self.key
	}

	/// Platform version the application declares it targets.
	pub fn target_version(&self) -> Option<VersionConfig> {
		self.target_version
	}

	pub fn package_name(&self) -> Option<&str> {
		self.package_name.as_deref()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
	/// No descriptor at the expected location. Not fatal.
	#[error("no descriptor at {}", .0.display())]
	NotFound(PathBuf),

	#[error("malformed descriptor {}: {reason}", path.display())]
	Malformed { path: PathBuf, reason: String },
}

/// Reads application metadata from the files named by a [`DescriptorKey`].
pub trait DescriptorParser: Send + Sync {
	/// # Errors
	///
	/// [`DescriptorError::NotFound`] if the manifest is absent,
	/// [`DescriptorError::Malformed`] if it cannot be understood.
	fn parse(&self, key: &DescriptorKey) -> Result<Descriptor, DescriptorError>;
}

impl<T: DescriptorParser + ?Sized> DescriptorParser for Arc<T> {
	fn parse(&self, key: &DescriptorKey) -> Result<Descriptor, DescriptorError> {
		(**self).parse(key)
	}
}

/// Computes where the descriptor's files live, or `None` when the
/// configuration opts out of a manifest.
pub fn descriptor_key(config: &Config, base_dir: &Path, overrides: &ManifestOverrides) -> Option<DescriptorKey> {
	let (manifest, resources, assets) = match &config.manifest {
		ManifestSetting::None => return None,
		ManifestSetting::Default if overrides.manifest.is_some() => {
			let manifest = overrides.manifest.clone()?;
			let dir = parent_dir(&manifest);
			let resources = overrides
				.resources
				.clone()
				.unwrap_or_else(|| dir.join(&config.resource_dir));
			let assets = overrides.assets.clone().unwrap_or_else(|| dir.join(ASSET_DIR));
			(manifest, resources, assets)
		}
		setting => {
			let manifest = match setting {
				ManifestSetting::Path(path) => base_dir.join(path),
				_ => base_dir.join(DEFAULT_MANIFEST),
			};
			let dir = parent_dir(&manifest);
			(manifest, dir.join(&config.resource_dir), dir.join(ASSET_DIR))
		}
	};

	let dir = parent_dir(&manifest);
	let libraries: Vec<PathBuf> = config.libraries.iter().map(|lib| dir.join(lib)).collect();
	Some(DescriptorKey::new(manifest, resources, assets).with_library_dirs(libraries))
}

fn parent_dir(path: &Path) -> PathBuf {
	path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the memoized descriptor for `key`, parsing it on first use.
///
/// An absent manifest is reported at warn level and yields `None`.
///
/// # Errors
///
/// Returns [`DescriptorError::Malformed`] from the parser.
pub(crate) fn load_descriptor(
	registry: &EnvironmentRegistry<Descriptor>,
	parser: &dyn DescriptorParser,
	key: &DescriptorKey,
	overrides: &ManifestOverrides,
) -> Result<Option<Arc<Descriptor>>, DescriptorError> {
	registry.get_or_create_descriptor(key, || {
		if !key.manifest().exists() {
			warn_missing(key.manifest());
			return Ok(None);
		}
		match parser.parse(key) {
			Ok(descriptor) => {
				debug!(manifest = %key.manifest().display(), "Parsed descriptor");
				Ok(Some(match &overrides.package {
					Some(package) => descriptor.with_package_name(package.as_str()),
					None => descriptor,
				}))
			}
			Err(DescriptorError::NotFound(path)) => {
				warn_missing(&path);
				Ok(None)
			}
			Err(err) => Err(err),
		}
	})
}

fn warn_missing(path: &Path) {
	warn!(
		manifest = %path.display(),
		"No manifest found; running without a descriptor. Set manifest = \"none\" to silence this"
	);
}

//! Layered runner configuration.
//!
//! Layers, lowest to highest precedence:
//!
//! 1. [`Config::defaults`]
//! 2. the global `roboscope.toml` in the session's base directory
//! 3. the test class's own [`PartialConfig`]
//!
//! ```toml
//! emulate_sdk = 18
//! manifest = "app/AndroidManifest.xml"  # or "none" / "default"
//! resource_dir = "res"
//! libraries = ["../lib"]
//! qualifiers = "land"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use roboscope_primitives::VersionConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// File name of the global configuration layer.
pub const CONFIG_FILE: &str = "roboscope.toml";

/// Manifest file looked up when no explicit path is configured.
pub const DEFAULT_MANIFEST: &str = "AndroidManifest.xml";

pub const DEFAULT_RESOURCE_DIR: &str = "res";

/// Where the application manifest comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ManifestSetting {
	/// Environment override, else `<base dir>/AndroidManifest.xml`.
	#[default]
	Default,
	/// Run without a descriptor.
	None,
	/// Explicit path, relative to the base directory.
	Path(PathBuf),
}

impl From<String> for ManifestSetting {
	fn from(value: String) -> Self {
		match value.trim() {
			"" | "default" => Self::Default,
			"none" => Self::None,
			path => Self::Path(PathBuf::from(path)),
		}
	}
}

impl From<ManifestSetting> for String {
	fn from(setting: ManifestSetting) -> Self {
		match setting {
			ManifestSetting::Default => "default".into(),
			ManifestSetting::None => "none".into(),
			ManifestSetting::Path(path) => path.to_string_lossy().into_owned(),
		}
	}
}

/// One configuration layer. Unset fields defer to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfig {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub emulate_sdk: Option<VersionConfig>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub manifest: Option<ManifestSetting>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub resource_dir: Option<PathBuf>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub libraries: Option<Vec<PathBuf>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub qualifiers: Option<String>,
}

impl PartialConfig {
	pub fn with_emulate_sdk(mut self, version: VersionConfig) -> Self {
		self.emulate_sdk = Some(version);
		self
	}

	pub fn with_manifest(mut self, manifest: ManifestSetting) -> Self {
		self.manifest = Some(manifest);
		self
	}

	pub fn with_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.resource_dir = Some(dir.into());
		self
	}

	pub fn with_libraries(mut self, libraries: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
		self.libraries = Some(libraries.into_iter().map(Into::into).collect());
		self
	}

	pub fn with_qualifiers(mut self, qualifiers: impl Into<String>) -> Self {
		self.qualifiers = Some(qualifiers.into());
		self
	}

	/// Parses a layer from TOML text.
	///
	/// # Errors
	///
	/// Returns the TOML error for invalid syntax or unknown keys.
	pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(text)
	}

	/// Reads `<base_dir>/roboscope.toml`, if present.
	///
	/// # Errors
	///
	/// Returns [`ConfigError`] when the file exists but cannot be read or parsed.
	pub fn load_global(base_dir: &Path) -> Result<Option<Self>, ConfigError> {
		let path = base_dir.join(CONFIG_FILE);
		let text = match fs::read_to_string(&path) {
			Ok(text) => text,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(source) => return Err(ConfigError::Read { path, source }),
		};
		let layer = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
			path: path.clone(),
			source,
		})?;
		debug!(path = %path.display(), "Loaded global configuration");
		Ok(Some(layer))
	}
}

/// Fully merged configuration for one test class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// Explicit platform version; `None` defers to the descriptor or session default.
	pub emulate_sdk: Option<VersionConfig>,
	pub manifest: ManifestSetting,
	/// Resource directory, relative to the manifest's directory.
	pub resource_dir: PathBuf,
	/// Library project directories, relative to the manifest's directory.
	pub libraries: Vec<PathBuf>,
	/// Resource qualifiers, e.g. `land` or `fr-rCA`.
	pub qualifiers: String,
}

impl Default for Config {
	fn default() -> Self {
		Self::defaults()
	}
}

impl Config {
	pub fn defaults() -> Self {
		Self {
			emulate_sdk: None,
			manifest: ManifestSetting::Default,
			resource_dir: PathBuf::from(DEFAULT_RESOURCE_DIR),
			libraries: Vec::new(),
			qualifiers: String::new(),
		}
	}

	/// Applies `layer` on top of `self`.
	pub fn merge(self, layer: &PartialConfig) -> Self {
		Self {
			emulate_sdk: layer.emulate_sdk.or(self.emulate_sdk),
			manifest: layer.manifest.clone().unwrap_or(self.manifest),
			resource_dir: layer.resource_dir.clone().unwrap_or(self.resource_dir),
			libraries: layer.libraries.clone().unwrap_or(self.libraries),
			qualifiers: layer.qualifiers.clone().unwrap_or(self.qualifiers),
		}
	}

	/// Merges defaults, the global file under `base_dir`, and `class_layer`.
	///
	/// # Errors
	///
	/// Returns [`ConfigError`] if the global file is unreadable or invalid.
	pub fn load(base_dir: &Path, class_layer: Option<&PartialConfig>) -> Result<Self, ConfigError> {
		let mut config = Self::defaults();
		if let Some(global) = PartialConfig::load_global(base_dir)? {
			config = config.merge(&global);
		}
		if let Some(layer) = class_layer {
			config = config.merge(layer);
		}
		Ok(config)
	}
}

/// Failure loading the global configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("cannot read {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("invalid configuration in {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
}

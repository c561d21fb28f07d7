//! Platform version selection.

use roboscope_primitives::{SdkCatalog, VersionConfig};
use thiserror::Error;

/// The requested platform version cannot be run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedConfiguration {
	#[error("sdk {requested} is not supported (available: {available})")]
	UnknownVersion { requested: VersionConfig, available: String },

	#[error("sdk is pinned to {pinned}; emulate_sdk = {requested} cannot be honoured")]
	PinnedOverride {
		pinned: VersionConfig,
		requested: VersionConfig,
	},
}

/// Chooses the platform version for one test class.
///
/// Priority: `requested`, then `descriptor_target`, then the catalog default.
/// A `pinned` session rejects any explicit request and ignores the descriptor.
///
/// # Errors
///
/// Returns [`UnsupportedConfiguration`] if the chosen version is absent from
/// `catalog`, or if an override is requested while pinned.
pub fn pick_version(
	catalog: &SdkCatalog,
	requested: Option<VersionConfig>,
	descriptor_target: Option<VersionConfig>,
	pinned: Option<VersionConfig>,
) -> Result<VersionConfig, UnsupportedConfiguration> {
	let version = match (pinned, requested) {
		(Some(pinned), Some(requested)) => {
			return Err(UnsupportedConfiguration::PinnedOverride { pinned, requested });
		}
		(Some(pinned), None) => pinned,
		(None, requested) => requested
			.or(descriptor_target)
			.unwrap_or_else(|| catalog.default_version()),
	};

	if !catalog.supports(version) {
		let available = catalog.versions().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
		return Err(UnsupportedConfiguration::UnknownVersion {
			requested: version,
			available,
		});
	}
	Ok(version)
}

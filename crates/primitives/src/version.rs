use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target platform version, identified by API level.
///
/// Two configs are equal exactly when their levels are equal, which makes this
/// the key for environment memoization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionConfig(u32);

impl VersionConfig {
	/// Creates a config for the given API level.
	pub const fn new(api_level: u32) -> Self {
		Self(api_level)
	}

	/// Returns the API level.
	pub const fn api_level(self) -> u32 {
		self.0
	}
}

impl From<u32> for VersionConfig {
	fn from(api_level: u32) -> Self {
		Self(api_level)
	}
}

impl fmt::Display for VersionConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Error returned when a version string is not a decimal API level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid sdk version {0:?}: expected a decimal API level")]
pub struct ParseVersionError(pub String);

impl FromStr for VersionConfig {
	type Err = ParseVersionError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim()
			.parse::<u32>()
			.map(Self)
			.map_err(|_| ParseVersionError(s.to_string()))
	}
}

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Packaging used when coordinates omit one.
pub const DEFAULT_KIND: &str = "jar";

/// Maven-style artifact coordinates.
///
/// Accepted textual forms are `group:artifact:version`,
/// `group:artifact:kind:version` and `group:artifact:kind:classifier:version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId {
	/// Dotted group identifier, e.g. `org.robolectric`.
	pub group: String,
	/// Artifact name within the group.
	pub artifact: String,
	/// Exact version string. Ranges are not supported.
	pub version: String,
	/// Optional classifier such as `sources`.
	pub classifier: Option<String>,
	/// Packaging extension, `jar` unless stated otherwise.
	pub kind: String,
}

impl ArtifactId {
	/// Creates a `jar` artifact without classifier.
	pub fn new(group: impl Into<String>, artifact: impl Into<String>, version: impl Into<String>) -> Self {
		Self {
			group: group.into(),
			artifact: artifact.into(),
			version: version.into(),
			classifier: None,
			kind: DEFAULT_KIND.to_string(),
		}
	}

	/// Sets the classifier.
	pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
		self.classifier = Some(classifier.into());
		self
	}

	/// Sets the packaging kind.
	pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
		self.kind = kind.into();
		self
	}

	/// Deterministic file name: `artifact-version[-classifier].kind`.
	pub fn file_name(&self) -> String {
		match &self.classifier {
			Some(classifier) => format!("{}-{}-{}.{}", self.artifact, self.version, classifier, self.kind),
			None => format!("{}-{}.{}", self.artifact, self.version, self.kind),
		}
	}

	/// Repository layout path: `group/as/dirs/artifact/version/<file name>`.
	pub fn repository_path(&self) -> PathBuf {
		let mut path: PathBuf = self.group.split('.').collect();
		path.push(&self.artifact);
		path.push(&self.version);
		path.push(self.file_name());
		path
	}

	/// Filesystem-safe key, unique per coordinate set.
	pub fn cache_key(&self) -> String {
		format!("{}-{}", self.group, self.file_name())
			.chars()
			.map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
			.collect()
	}
}

impl fmt::Display for ArtifactId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}:{}", self.group, self.artifact, self.kind)?;
		if let Some(classifier) = &self.classifier {
			write!(f, ":{classifier}")?;
		}
		write!(f, ":{}", self.version)
	}
}

/// Error returned for malformed coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseArtifactError {
	#[error("expected 3 to 5 ':'-separated parts in {0:?}")]
	PartCount(String),
	#[error("empty coordinate component in {0:?}")]
	EmptyPart(String),
}

impl FromStr for ArtifactId {
	type Err = ParseArtifactError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let parts: Vec<&str> = s.split(':').collect();
		if parts.iter().any(|p| p.trim().is_empty()) {
			return Err(ParseArtifactError::EmptyPart(s.to_string()));
		}

		match parts.as_slice() {
			[group, artifact, version] => Ok(Self::new(*group, *artifact, *version)),
			[group, artifact, kind, version] => Ok(Self::new(*group, *artifact, *version).with_kind(*kind)),
			[group, artifact, kind, classifier, version] => Ok(Self::new(*group, *artifact, *version)
				.with_kind(*kind)
				.with_classifier(*classifier)),
			_ => Err(ParseArtifactError::PartCount(s.to_string())),
		}
	}
}

/// Ordered list of artifacts required by one platform version.
///
/// Order is significant: it is the classpath order of the built environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ArtifactSet {
	artifacts: Vec<ArtifactId>,
}

impl ArtifactSet {
	/// Creates a set preserving the given order.
	pub fn new(artifacts: Vec<ArtifactId>) -> Self {
		Self { artifacts }
	}

	pub fn iter(&self) -> std::slice::Iter<'_, ArtifactId> {
		self.artifacts.iter()
	}

	pub fn len(&self) -> usize {
		self.artifacts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.artifacts.is_empty()
	}
}

impl FromIterator<ArtifactId> for ArtifactSet {
	fn from_iter<T: IntoIterator<Item = ArtifactId>>(iter: T) -> Self {
		Self::new(iter.into_iter().collect())
	}
}

impl<'a> IntoIterator for &'a ArtifactSet {
	type Item = &'a ArtifactId;
	type IntoIter = std::slice::Iter<'a, ArtifactId>;

	fn into_iter(self) -> Self::IntoIter {
		self.artifacts.iter()
	}
}

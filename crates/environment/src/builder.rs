//! Environment construction.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use roboscope_primitives::VersionConfig;
use roboscope_resolve::ResolvedArtifacts;
use tracing::{debug, info};

use crate::{BuildError, ClassOrigin, Environment, InstrumentationRules, LoadingContext};

/// Local file header and empty-archive end record.
const ZIP_SIGNATURES: [[u8; 4]; 2] = [*b"PK\x03\x04", *b"PK\x05\x06"];

/// Builds an [`Environment`] from a version's resolved artifacts.
pub trait EnvironmentBuilder: Send + Sync {
	/// # Errors
	///
	/// Returns [`BuildError`] if any artifact is unusable.
	fn build(&self, version: VersionConfig, artifacts: &ResolvedArtifacts) -> Result<Environment, BuildError>;
}

impl<T: EnvironmentBuilder + ?Sized> EnvironmentBuilder for Arc<T> {
	fn build(&self, version: VersionConfig, artifacts: &ResolvedArtifacts) -> Result<Environment, BuildError> {
		(**self).build(version, artifacts)
	}
}

/// Default builder: validates each archive and wires an [`IsolatedContext`].
#[derive(Debug, Clone, Default)]
pub struct InstrumentingBuilder {
	rules: Arc<InstrumentationRules>,
}

impl InstrumentingBuilder {
	pub fn new(rules: InstrumentationRules) -> Self {
		Self { rules: Arc::new(rules) }
	}

	pub fn rules(&self) -> &InstrumentationRules {
		&self.rules
	}
}

impl EnvironmentBuilder for InstrumentingBuilder {
	fn build(&self, version: VersionConfig, artifacts: &ResolvedArtifacts) -> Result<Environment, BuildError> {
		let started = Instant::now();
		let mut bytes = 0u64;
		for artifact in artifacts.iter() {
			let size = inspect_archive(&artifact.path)?;
			debug!(artifact = %artifact.id, path = %artifact.path.display(), size, "Archive accepted");
			bytes += size;
		}

		let environment = Environment::new(
			version,
			IsolatedContext {
				classpath: artifacts.paths(),
				rules: Arc::clone(&self.rules),
			},
		);
		info!(
			sdk = %version,
			id = %environment.id(),
			artifacts = artifacts.len(),
			bytes,
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Built environment"
		);
		Ok(environment)
	}
}

/// Checks that `path` is a non-empty zip archive and returns its size.
fn inspect_archive(path: &Path) -> Result<u64, BuildError> {
	let io_err = |e: io::Error| BuildError::Io {
		path: path.to_path_buf(),
		message: e.to_string(),
	};
	let malformed = |reason: &str| BuildError::MalformedArtifact {
		path: path.to_path_buf(),
		reason: reason.to_string(),
	};

	let mut file = File::open(path).map_err(io_err)?;
	let size = file.metadata().map_err(io_err)?.len();
	if size == 0 {
		return Err(malformed("empty file"));
	}

	let mut magic = [0u8; 4];
	match file.read_exact(&mut magic) {
		Ok(()) => {}
		Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(malformed("truncated archive header")),
		Err(e) => return Err(io_err(e)),
	}
	if !ZIP_SIGNATURES.contains(&magic) {
		return Err(malformed("not a zip archive"));
	}
	Ok(size)
}

/// Loading context partitioned by [`InstrumentationRules`].
#[derive(Debug)]
pub struct IsolatedContext {
	classpath: Vec<PathBuf>,
	rules: Arc<InstrumentationRules>,
}

impl LoadingContext for IsolatedContext {
	fn classpath(&self) -> &[PathBuf] {
		&self.classpath
	}

	fn load(&self, class_name: &str) -> Result<ClassOrigin, BuildError> {
		if !self.rules.should_acquire(class_name) {
			return Ok(ClassOrigin::Host);
		}
		Ok(ClassOrigin::Isolated {
			instrumented: self.rules.should_instrument(class_name),
		})
	}
}

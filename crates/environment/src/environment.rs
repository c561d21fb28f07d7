use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use roboscope_primitives::VersionConfig;

use crate::BuildError;

static NEXT_ENVIRONMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a constructed environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnvironmentId(u64);

impl EnvironmentId {
	fn next() -> Self {
		Self(NEXT_ENVIRONMENT_ID.fetch_add(1, Ordering::Relaxed))
	}

	pub fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for EnvironmentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "env#{}", self.0)
	}
}

/// Where a class was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassOrigin {
	/// Delegated to the host loader and shared across environments.
	Host,
	/// Loaded inside the environment's isolated context.
	Isolated { instrumented: bool },
}

/// Code-loading context backing an [`Environment`].
pub trait LoadingContext: Send + Sync + fmt::Debug {
	/// Local artifact paths visible to the context, in lookup order.
	fn classpath(&self) -> &[PathBuf];

	/// Loads `class_name` into this context.
	///
	/// # Errors
	///
	/// Returns [`BuildError`] when the class cannot be loaded.
	fn load(&self, class_name: &str) -> Result<ClassOrigin, BuildError>;
}

/// A class handle bound to the environment that loaded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedClass {
	pub name: String,
	pub origin: ClassOrigin,
	pub environment: EnvironmentId,
	pub version: VersionConfig,
}

/// An isolated execution context for one platform version.
///
/// Expensive to build and shared through `Arc` between every test class
/// targeting the same version.
#[derive(Debug)]
pub struct Environment {
	id: EnvironmentId,
	version: VersionConfig,
	context: Box<dyn LoadingContext>,
}

impl Environment {
	pub fn new(version: VersionConfig, context: impl LoadingContext + 'static) -> Self {
		Self {
			id: EnvironmentId::next(),
			version,
			context: Box::new(context),
		}
	}

	pub fn id(&self) -> EnvironmentId {
		self.id
	}

	pub fn version(&self) -> VersionConfig {
		self.version
	}

	pub fn classpath(&self) -> &[PathBuf] {
		self.context.classpath()
	}

	/// Loads `class_name` through this environment's context.
	///
	/// # Errors
	///
	/// Returns [`BuildError::InvalidClassName`] for names that are not
	/// dotted Java binary names, or whatever the context reports.
	pub fn bootstrap(&self, class_name: &str) -> Result<LoadedClass, BuildError> {
		if !is_binary_name(class_name) {
			return Err(BuildError::InvalidClassName(class_name.to_string()));
		}
		let origin = self.context.load(class_name)?;
		Ok(LoadedClass {
			name: class_name.to_string(),
			origin,
			environment: self.id,
			version: self.version,
		})
	}
}

fn is_binary_name(name: &str) -> bool {
	!name.is_empty()
		&& name.split('.').all(|segment| {
			let mut chars = segment.chars();
			chars
				.next()
				.is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
				&& chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
		})
}

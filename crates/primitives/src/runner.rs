use std::fmt;
use std::sync::Arc;

/// Identity of a runner flavour.
///
/// Each distinct identity owns its own environment registry, and the retention
/// guard only short-circuits when the identity matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunnerId(Arc<str>);

impl RunnerId {
	pub fn new(name: impl AsRef<str>) -> Self {
		Self(Arc::from(name.as_ref()))
	}

	/// Identity derived from a Rust type name.
	pub fn of<T: ?Sized>() -> Self {
		Self::new(std::any::type_name::<T>())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for RunnerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

use std::path::{Path, PathBuf};

/// Identity of an application descriptor.
///
/// Two keys are equal when they point at the same manifest with the same
/// resource, asset and library roots. Used to memoize parsed descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorKey {
	manifest: PathBuf,
	resource_dir: PathBuf,
	asset_dir: PathBuf,
	library_dirs: Vec<PathBuf>,
}

impl DescriptorKey {
	pub fn new(manifest: impl Into<PathBuf>, resource_dir: impl Into<PathBuf>, asset_dir: impl Into<PathBuf>) -> Self {
		Self {
			manifest: manifest.into(),
			resource_dir: resource_dir.into(),
			asset_dir: asset_dir.into(),
			library_dirs: Vec::new(),
		}
	}

	/// Adds extra library directories, in declaration order.
	pub fn with_library_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
		self.library_dirs.extend(dirs);
		self
	}

	pub fn manifest(&self) -> &Path {
		&self.manifest
	}

	pub fn resource_dir(&self) -> &Path {
		&self.resource_dir
	}

	pub fn asset_dir(&self) -> &Path {
		&self.asset_dir
	}

	pub fn library_dirs(&self) -> &[PathBuf] {
		&self.library_dirs
	}
}

//! Filesystem helpers shared by the remote resolver and the record cache.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

static NEXT_TMP: AtomicU64 = AtomicU64::new(0);

/// Writes `bytes` to `path` through a sibling temp file and a rename.
///
/// Concurrent writers of the same path race on the rename; the last one wins.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
	let parent = path
		.parent()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
	fs::create_dir_all(parent)?;

	let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("artifact");
	let tmp = parent.join(format!(
		".{file_name}.{}.{}.tmp",
		std::process::id(),
		NEXT_TMP.fetch_add(1, Ordering::Relaxed)
	));

	let result = File::create(&tmp)
		.and_then(|mut file| {
			file.write_all(bytes)?;
			file.sync_all()
		})
		.and_then(|()| fs::rename(&tmp, path));

	if result.is_err() {
		let _ = fs::remove_file(&tmp);
	}
	result
}

/// Returns the size and lowercase hex sha256 of a file.
pub(crate) fn digest_file(path: &Path) -> io::Result<(u64, String)> {
	let mut file = File::open(path)?;
	let mut hasher = Sha256::new();
	let size = io::copy(&mut file, &mut hasher)?;
	Ok((size, format!("{:x}", hasher.finalize())))
}

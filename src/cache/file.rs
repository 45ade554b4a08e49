//! File-backed [`TenantCache`] for desktop and CLI hosts.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	cache::{CacheError, CachedEntry, TenantCache},
	obs::{self, ResolveStage},
	org::OrganizationReference,
};

/// Persists the cached organization to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileCache {
	path: PathBuf,
	lock: Arc<Mutex<()>>,
}
impl FileCache {
	/// Opens a cache at the provided path, creating the parent directory when needed.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		Ok(Self { path, lock: Default::default() })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), CacheError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| CacheError::Backend {
				message: format!("Failed to create cache directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn load(&self) -> Result<Option<CachedEntry>, CacheError> {
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) =>
				return Err(CacheError::Backend {
					message: format!("Failed to read {}: {e}", self.path.display()),
				}),
		};

		if bytes.is_empty() {
			return Ok(None);
		}

		CachedEntry::decode(&bytes).map(Some)
	}

	fn persist(&self, bytes: &[u8]) -> Result<(), CacheError> {
		Self::ensure_parent_exists(&self.path)?;

		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| CacheError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(bytes).map_err(|e| CacheError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| CacheError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| CacheError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn remove(&self) -> Result<(), CacheError> {
		match fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(CacheError::Backend {
				message: format!("Failed to remove {}: {e}", self.path.display()),
			}),
		}
	}
}
impl TenantCache for FileCache {
	fn read(&self) -> Option<OrganizationReference> {
		let _guard = self.lock.lock();

		match self.load() {
			Ok(entry) => entry.map(|entry| entry.reference),
			Err(e @ CacheError::Serialization { .. }) => {
				obs::warn_event(ResolveStage::Cache, &format_args!("Discarding cache file: {e}"));

				if let Err(e) = self.remove() {
					obs::warn_event(ResolveStage::Cache, &e);
				}

				None
			},
			Err(e) => {
				obs::warn_event(ResolveStage::Cache, &format_args!("Cache file unreadable: {e}"));

				None
			},
		}
	}

	fn write(&self, reference: &OrganizationReference) -> Result<(), CacheError> {
		let bytes = CachedEntry::new(reference)?.encode()?;
		let _guard = self.lock.lock();

		self.persist(&bytes)
	}

	fn clear(&self) -> Result<(), CacheError> {
		let _guard = self.lock.lock();

		self.remove()
	}
}

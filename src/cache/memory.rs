//! Thread-safe in-memory [`TenantCache`] for tests and embedded hosts.

// self
use crate::{
	_prelude::*,
	cache::{CACHE_KEY, CacheError, CachedEntry, TenantCache},
	obs::{self, ResolveStage},
	org::OrganizationReference,
};

type CacheMap = Arc<RwLock<HashMap<String, Vec<u8>>>>;

/// Process-local cache keeping serialized entries under [`CACHE_KEY`].
///
/// Clones share the same backing map, so a clone handed to a test observes every write the
/// resolver performs.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(CacheMap);
impl MemoryCache {
	/// Stores raw bytes under the well-known key, bypassing validation.
	pub fn insert_raw(&self, bytes: impl Into<Vec<u8>>) {
		self.0.write().insert(CACHE_KEY.to_owned(), bytes.into());
	}

	/// Returns `true` when an entry (valid or not) is present.
	pub fn contains_entry(&self) -> bool {
		self.0.read().contains_key(CACHE_KEY)
	}
}
impl TenantCache for MemoryCache {
	fn read(&self) -> Option<OrganizationReference> {
		let bytes = self.0.read().get(CACHE_KEY).cloned()?;

		match CachedEntry::decode(&bytes) {
			Ok(entry) => Some(entry.reference),
			Err(e) => {
				obs::warn_event(ResolveStage::Cache, &format_args!("Discarding cache entry: {e}"));
				self.0.write().remove(CACHE_KEY);

				None
			},
		}
	}

	fn write(&self, reference: &OrganizationReference) -> Result<(), CacheError> {
		let bytes = CachedEntry::new(reference)?.encode()?;

		self.0.write().insert(CACHE_KEY.to_owned(), bytes);

		Ok(())
	}

	fn clear(&self) -> Result<(), CacheError> {
		self.0.write().remove(CACHE_KEY);

		Ok(())
	}
}

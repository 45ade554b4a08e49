//! Durable last-used-organization cache contracts and built-in implementations.
//!
//! The cached value is a hint, never an authority: the resolver validates it against the
//! freshly fetched membership set before trusting it. Reads therefore never fail (corrupt or
//! missing entries read as `None`), and writes are best-effort.

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

// self
use crate::{_prelude::*, org::OrganizationReference};

/// Well-known key under which the active organization is stored.
pub const CACHE_KEY: &str = "org_context.active_org";

/// Storage contract for the last confirmed [`OrganizationReference`].
pub trait TenantCache
where
	Self: Send + Sync,
{
	/// Returns the cached reference; corrupt or missing entries read as `None`.
	fn read(&self) -> Option<OrganizationReference>;

	/// Persists `reference`, replacing any previous entry.
	fn write(&self, reference: &OrganizationReference) -> Result<(), CacheError>;

	/// Removes the cached entry, if any.
	fn clear(&self) -> Result<(), CacheError>;
}

/// Error type produced by [`TenantCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// The `UNASSIGNED` sentinel cannot be cached.
	#[error("The unassigned sentinel cannot be cached.")]
	Sentinel,
}

/// On-disk/in-memory envelope wrapping the cached reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedEntry {
	/// The cached reference.
	pub reference: OrganizationReference,
	/// Instant the entry was written.
	#[serde(with = "time::serde::rfc3339")]
	pub stored_at: OffsetDateTime,
}
impl CachedEntry {
	/// Wraps `reference`, rejecting the sentinel.
	pub fn new(reference: &OrganizationReference) -> Result<Self, CacheError> {
		if !reference.is_assigned() {
			return Err(CacheError::Sentinel);
		}

		Ok(Self { reference: reference.clone(), stored_at: OffsetDateTime::now_utc() })
	}

	/// Serializes the entry to JSON bytes.
	pub fn encode(&self) -> Result<Vec<u8>, CacheError> {
		serde_json::to_vec(self).map_err(|e| CacheError::Serialization {
			message: format!("Failed to serialize cached organization: {e}"),
		})
	}

	/// Parses JSON bytes into an entry.
	pub fn decode(bytes: &[u8]) -> Result<Self, CacheError> {
		serde_json::from_slice(bytes).map_err(|e| CacheError::Serialization {
			message: format!("Failed to parse cached organization: {e}"),
		})
	}
}

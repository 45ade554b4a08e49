//! Crate-level error types shared across the cache, directory, and resolver layers.

// self
use crate::{_prelude::*, org::TenantId};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
///
/// Nothing here is fatal to a host application; the resolver recovers every variant
/// locally and only surfaces [`Error::Directory`] as a display-only warning.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Tenant cache failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Membership directory failure.
	#[error(transparent)]
	Directory(#[from] crate::directory::DirectoryError),
	/// Identifier validation failure.
	#[error(transparent)]
	Identifier(#[from] crate::org::IdentifierError),
	/// Route configuration is invalid.
	#[error(transparent)]
	Routes(#[from] crate::policy::RouteTableError),

	/// No authenticated identity is attached to the resolver.
	#[error("No authenticated identity is available.")]
	Unauthenticated,
	/// Requested tenant is not part of the caller's membership set.
	#[error("The current user is not a member of organization `{org_id}`.")]
	NotAMember {
		/// Tenant the caller attempted to activate.
		org_id: TenantId,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{cache::CacheError, directory::DirectoryError};

	#[test]
	fn cache_error_converts_with_source() {
		let cache_error = CacheError::Backend { message: "disk full".into() };
		let error: Error = cache_error.clone().into();

		assert!(matches!(error, Error::Cache(_)));
		assert!(error.to_string().contains("disk full"));

		let source = StdError::source(&error)
			.expect("Crate error should expose the original cache error as its source.");

		assert_eq!(source.to_string(), cache_error.to_string());
	}

	#[test]
	fn not_a_member_names_the_tenant() {
		let org_id = TenantId::new("org-9").expect("Tenant fixture should be valid.");
		let error = Error::NotAMember { org_id };

		assert!(error.to_string().contains("org-9"));
	}

	#[test]
	fn directory_error_is_transparent() {
		let error: Error = DirectoryError::Status { status: 503 }.into();

		assert_eq!(error.to_string(), DirectoryError::Status { status: 503 }.to_string());
	}
}

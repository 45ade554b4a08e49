//! Membership directory contracts (the external source of truth for tenant memberships).
//!
//! The resolver only ever asks one question: which organizations does this user belong to
//! right now? [`MembershipDirectory`] is that single async call. [`FallbackDirectory`] pairs
//! a server-mediated primary with a directly authorized secondary that is only consulted
//! when the primary fails, and [`HttpMembershipDirectory`] (feature `reqwest`) talks to a
//! JSON endpoint.
//!
//! An empty [`MembershipSet`] is a meaningful answer ("no organizations yet"), never an
//! error.

pub mod fallback;
#[cfg(feature = "reqwest")] pub mod http;

pub use fallback::*;
#[cfg(feature = "reqwest")] pub use http::*;

// self
use crate::{
	_prelude::*,
	org::{MembershipDecodeError, MembershipSet, UserId},
};

type BoxError = Box<dyn StdError + Send + Sync>;

/// Boxed future returned by [`MembershipDirectory::fetch_memberships`].
pub type DirectoryFuture<'a> =
	Pin<Box<dyn Future<Output = Result<MembershipSet, DirectoryError>> + 'a + Send>>;

/// Source of the caller's tenant memberships.
///
/// Implementations must be idempotent and safe to call repeatedly, and should carry their
/// own timeout: the resolver stays `Resolving` for as long as the returned future is pending.
pub trait MembershipDirectory
where
	Self: Send + Sync,
{
	/// Short label used in logs.
	fn label(&self) -> &str {
		"directory"
	}

	/// Fetches every membership of `user_id`.
	fn fetch_memberships<'a>(&'a self, user_id: &'a UserId, email: &'a str) -> DirectoryFuture<'a>;
}

/// Failures reported by membership directories.
#[derive(Debug, ThisError)]
pub enum DirectoryError {
	/// Directory answered with a non-success HTTP status.
	#[error("Membership directory responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
	/// Network or transport failure (DNS, TCP, TLS, timeout).
	#[error("Network error occurred while calling the membership directory.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Directory returned a payload that could not be parsed.
	#[error("Membership directory returned a malformed payload.")]
	Decode {
		/// Structured parsing failure, including the failing path.
		#[source]
		source: MembershipDecodeError,
	},
	/// Directory-specific failure without a richer classification.
	#[error("Membership directory is unavailable: {message}.")]
	Unavailable {
		/// Human-readable reason.
		message: String,
	},
	/// Primary and fallback both failed.
	#[error("Membership directory exhausted: {}.", exhausted_summary(.primary, .fallback))]
	Exhausted {
		/// Primary directory failure.
		#[source]
		primary: Box<DirectoryError>,
		/// Fallback directory failure, when a fallback is configured.
		fallback: Option<Box<DirectoryError>>,
	},
}
impl DirectoryError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Builds an [`DirectoryError::Unavailable`] from any message.
	pub fn unavailable(message: impl Into<String>) -> Self {
		Self::Unavailable { message: message.into() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for DirectoryError {
	fn from(e: ReqwestError) -> Self {
		Self::transport(e)
	}
}

fn exhausted_summary(primary: &DirectoryError, fallback: &Option<Box<DirectoryError>>) -> String {
	match fallback {
		Some(e) => format!("primary failed ({primary}), fallback failed ({e})"),
		None => format!("primary failed ({primary}), no fallback configured"),
	}
}

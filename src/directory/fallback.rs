//! Primary + fallback directory composition.

// self
use crate::{
	_prelude::*,
	directory::{DirectoryError, DirectoryFuture, MembershipDirectory},
	obs::{self, ResolveStage},
	org::{MembershipSet, UserId},
};

/// Which directory produced a [`DirectoryReport`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectorySource {
	/// The server-mediated primary directory.
	Primary,
	/// The directly authorized fallback; may hold a subset of the real memberships.
	Fallback,
}

/// Successful fetch, tagged with the directory that served it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryReport {
	/// Memberships returned by the directory.
	pub memberships: MembershipSet,
	/// Directory that answered.
	pub source: DirectorySource,
}

/// Calls the primary directory and, only when it fails, the fallback.
#[derive(Clone)]
pub struct FallbackDirectory {
	primary: Arc<dyn MembershipDirectory>,
	fallback: Option<Arc<dyn MembershipDirectory>>,
}
impl FallbackDirectory {
	/// Wraps a primary directory with no fallback.
	pub fn new(primary: Arc<dyn MembershipDirectory>) -> Self {
		Self { primary, fallback: None }
	}

	/// Sets or replaces the fallback directory.
	pub fn with_fallback(mut self, fallback: Arc<dyn MembershipDirectory>) -> Self {
		self.fallback = Some(fallback);

		self
	}

	/// Fetches memberships, falling back once on primary failure.
	pub async fn fetch_report(
		&self,
		user_id: &UserId,
		email: &str,
	) -> Result<DirectoryReport, DirectoryError> {
		let primary_err = match self.primary.fetch_memberships(user_id, email).await {
			Ok(memberships) =>
				return Ok(DirectoryReport { memberships, source: DirectorySource::Primary }),
			Err(e) => e,
		};

		obs::warn_event(
			ResolveStage::Fetch,
			&format_args!("Primary directory `{}` failed: {primary_err}", self.primary.label()),
		);

		let Some(fallback) = self.fallback.as_ref() else {
			return Err(DirectoryError::Exhausted { primary: Box::new(primary_err), fallback: None });
		};

		match fallback.fetch_memberships(user_id, email).await {
			Ok(memberships) => Ok(DirectoryReport { memberships, source: DirectorySource::Fallback }),
			Err(e) => {
				obs::warn_event(
					ResolveStage::Fetch,
					&format_args!("Fallback directory `{}` failed: {e}", fallback.label()),
				);

				Err(DirectoryError::Exhausted {
					primary: Box::new(primary_err),
					fallback: Some(Box::new(e)),
				})
			},
		}
	}
}
impl MembershipDirectory for FallbackDirectory {
	fn label(&self) -> &str {
		self.primary.label()
	}

	fn fetch_memberships<'a>(&'a self, user_id: &'a UserId, email: &'a str) -> DirectoryFuture<'a> {
		Box::pin(async move { self.fetch_report(user_id, email).await.map(|report| report.memberships) })
	}
}
impl Debug for FallbackDirectory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FallbackDirectory")
			.field("primary", &self.primary.label())
			.field("fallback", &self.fallback.as_ref().map(|d| d.label()))
			.finish()
	}
}

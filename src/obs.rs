//! Observability helpers for resolution passes.
//!
//! # Feature Flags
//!
//! - `tracing` (default) emits spans named `org_context.resolve` with `stage` and `path` fields,
//!   plus `warn`/`debug` events for degraded fetches, cache failures, and discarded results.
//! - `metrics` increments the `org_context_resolution_total` counter for every finished pass,
//!   labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Resolver call sites tagged on spans and events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolveStage {
	/// Identity attach/detach.
	Identity,
	/// Navigation entry point (memo check, guard bookkeeping).
	Navigate,
	/// Membership directory fetch.
	Fetch,
	/// Applying a fetched membership set.
	Apply,
	/// Explicit organization switch.
	Select,
	/// Tenant cache access.
	Cache,
}
impl ResolveStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ResolveStage::Identity => "identity",
			ResolveStage::Navigate => "navigate",
			ResolveStage::Fetch => "fetch",
			ResolveStage::Apply => "apply",
			ResolveStage::Select => "select",
			ResolveStage::Cache => "cache",
		}
	}
}
impl Display for ResolveStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each resolution pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassOutcome {
	/// Served from the resolution memo without fetching.
	Memoized,
	/// Fetched and resolved normally.
	Resolved,
	/// Resolved after the directory was exhausted.
	Degraded,
	/// Sent the user to the selection route.
	Redirected,
	/// Result discarded because the session moved on.
	Superseded,
	/// No identity attached.
	Unauthenticated,
}
impl PassOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PassOutcome::Memoized => "memoized",
			PassOutcome::Resolved => "resolved",
			PassOutcome::Degraded => "degraded",
			PassOutcome::Redirected => "redirected",
			PassOutcome::Superseded => "superseded",
			PassOutcome::Unauthenticated => "unauthenticated",
		}
	}
}
impl Display for PassOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

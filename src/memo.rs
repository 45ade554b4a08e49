//! Resolver-internal memory: the last resolved path and the redirect-once guard.

/// Remembers the path for which resolution last completed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionMemo {
	path: Option<String>,
}
impl ResolutionMemo {
	/// Records `path` as resolved.
	pub fn record(&mut self, path: impl Into<String>) {
		self.path = Some(path.into());
	}

	/// Returns `true` when `path` is the last resolved path.
	pub fn matches(&self, path: &str) -> bool {
		self.path.as_deref() == Some(path)
	}

	/// Forgets the last resolved path.
	pub fn clear(&mut self) {
		self.path = None;
	}
}

/// "Already redirected to the selection route" flag, scoped to the gated primary route.
///
/// Armed on the first redirect decision and disarmed once navigation leaves both the gated
/// route and the selection route.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RedirectGuard {
	armed: bool,
}
impl RedirectGuard {
	/// Returns `true` once a redirect has been issued in this scope.
	pub fn is_armed(&self) -> bool {
		self.armed
	}

	/// Marks the redirect as issued.
	pub fn arm(&mut self) {
		self.armed = true;
	}

	/// Resets the guard.
	pub fn disarm(&mut self) {
		self.armed = false;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn memo_tracks_a_single_path() {
		let mut memo = ResolutionMemo::default();

		assert!(!memo.matches("/"));

		memo.record("/reports");

		assert!(memo.matches("/reports"));
		assert!(!memo.matches("/"));

		memo.record("/");

		assert!(memo.matches("/"));
		assert!(!memo.matches("/reports"));

		memo.clear();

		assert!(!memo.matches("/"));
	}

	#[test]
	fn guard_arms_and_disarms() {
		let mut guard = RedirectGuard::default();

		assert!(!guard.is_armed());

		guard.arm();
		guard.arm();

		assert!(guard.is_armed());

		guard.disarm();

		assert!(!guard.is_armed());
	}
}

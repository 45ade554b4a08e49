// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing resolver activity.
#[derive(Debug, Default)]
pub struct ResolverMetrics {
	fetches: AtomicU64,
	memo_hits: AtomicU64,
	redirects: AtomicU64,
	superseded: AtomicU64,
	degraded: AtomicU64,
}
impl ResolverMetrics {
	/// Returns the number of membership directory fetches issued.
	pub fn fetches(&self) -> u64 {
		self.fetches.load(Ordering::Relaxed)
	}

	/// Returns the number of navigations served without fetching.
	pub fn memo_hits(&self) -> u64 {
		self.memo_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of redirects to the selection route.
	pub fn redirects(&self) -> u64 {
		self.redirects.load(Ordering::Relaxed)
	}

	/// Returns the number of fetch results discarded as stale.
	pub fn superseded(&self) -> u64 {
		self.superseded.load(Ordering::Relaxed)
	}

	/// Returns the number of passes resolved after the directory was exhausted.
	pub fn degraded(&self) -> u64 {
		self.degraded.load(Ordering::Relaxed)
	}

	pub(crate) fn record_fetch(&self) {
		self.fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_memo_hit(&self) {
		self.memo_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_redirect(&self) {
		self.redirects.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_superseded(&self) {
		self.superseded.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_degraded(&self) {
		self.degraded.fetch_add(1, Ordering::Relaxed);
	}
}

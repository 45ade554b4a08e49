//! Read-only output boundary exposing the resolved organization context to the application.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	org::{MembershipSet, OrganizationReference, TenantId},
	policy::{Screen, UiMode},
	resolver::ResolutionState,
};

type Listener = Arc<dyn Fn(&ContextSnapshot) + Send + Sync>;

/// Point-in-time view of the session's organization context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextSnapshot {
	/// Active organization; the sentinel while nothing is chosen.
	pub active_reference: OrganizationReference,
	/// Active tenant id, `None` for the sentinel.
	pub org_id: Option<TenantId>,
	/// Resolver lifecycle state.
	pub resolution_state: ResolutionState,
	/// Memberships from the most recent fetch.
	pub membership_set: MembershipSet,
	/// UI mode, once one has been decided.
	pub mode: Option<UiMode>,
}
impl ContextSnapshot {
	/// Builds a snapshot, deriving `org_id` from `active_reference`.
	pub fn new(
		active_reference: OrganizationReference,
		resolution_state: ResolutionState,
		membership_set: MembershipSet,
		mode: Option<UiMode>,
	) -> Self {
		let org_id = active_reference.org_id().cloned();

		Self { active_reference, org_id, resolution_state, membership_set, mode }
	}

	/// Returns `true` when page content may be shown.
	pub fn is_resolved(&self) -> bool {
		self.resolution_state == ResolutionState::Resolved
	}

	/// Screen to render; `None` until a mode is decided.
	pub fn screen(&self) -> Option<Screen> {
		self.mode.map(UiMode::screen)
	}
}
impl Default for ContextSnapshot {
	fn default() -> Self {
		Self::new(
			OrganizationReference::unassigned(),
			ResolutionState::Unresolved,
			MembershipSet::default(),
			None,
		)
	}
}

/// Handle returned by [`ContextPublisher::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct PublisherInner {
	snapshot: RwLock<ContextSnapshot>,
	listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
	last_notified: Mutex<Option<TenantId>>,
	next_id: AtomicU64,
}

/// Cloneable, read-only handle to the current [`ContextSnapshot`].
///
/// Listeners fire only when the resolved active organization id changes while the resolver is
/// `Resolved`, so consumers never see a transient sentinel during a tenant switch.
#[derive(Clone, Default)]
pub struct ContextPublisher(Arc<PublisherInner>);
impl ContextPublisher {
	/// Returns a copy of the current snapshot.
	pub fn snapshot(&self) -> ContextSnapshot {
		self.0.snapshot.read().clone()
	}

	/// Registers a change listener.
	pub fn subscribe(
		&self,
		listener: impl 'static + Fn(&ContextSnapshot) + Send + Sync,
	) -> SubscriptionId {
		let id = SubscriptionId(self.0.next_id.fetch_add(1, Ordering::Relaxed));

		self.0.listeners.lock().push((id, Arc::new(listener)));

		id
	}

	/// Removes a listener; returns `false` when it was not registered.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		let mut listeners = self.0.listeners.lock();
		let before = listeners.len();

		listeners.retain(|(existing, _)| *existing != id);

		listeners.len() != before
	}

	/// Replaces the snapshot and reports whether listeners must be notified.
	///
	/// Callers invoke [`ContextPublisher::notify`] after releasing their own locks.
	pub(crate) fn store(&self, snapshot: ContextSnapshot) -> bool {
		let should_notify = snapshot.is_resolved() && {
			let mut last = self.0.last_notified.lock();
			let changed = last.as_ref() != Some(&snapshot.active_reference.id);

			if changed {
				*last = Some(snapshot.active_reference.id.clone());
			}

			changed
		};

		*self.0.snapshot.write() = snapshot;

		should_notify
	}

	/// Replaces the snapshot and forgets the last notified tenant.
	pub(crate) fn reset(&self, snapshot: ContextSnapshot) {
		*self.0.last_notified.lock() = None;
		*self.0.snapshot.write() = snapshot;
	}

	/// Invokes every listener with `snapshot`.
	pub(crate) fn notify(&self, snapshot: &ContextSnapshot) {
		let listeners: Vec<Listener> =
			self.0.listeners.lock().iter().map(|(_, listener)| listener.clone()).collect();

		for listener in listeners {
			listener(snapshot);
		}
	}
}
impl Debug for ContextPublisher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ContextPublisher")
			.field("snapshot", &*self.0.snapshot.read())
			.field("listeners", &self.0.listeners.lock().len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::AtomicUsize;
	// self
	use super::*;

	fn resolved(id: Option<&str>) -> ContextSnapshot {
		let reference = match id {
			Some(id) => OrganizationReference::new(
				TenantId::new(id).expect("Tenant fixture should be valid."),
				id,
				id,
			),
			None => OrganizationReference::unassigned(),
		};

		ContextSnapshot::new(
			reference,
			ResolutionState::Resolved,
			MembershipSet::default(),
			Some(UiMode::Content),
		)
	}

	#[test]
	fn notifies_only_on_resolved_id_changes() {
		let publisher = ContextPublisher::default();

		assert!(publisher.store(resolved(Some("org-1"))));
		assert!(!publisher.store(resolved(Some("org-1"))), "Same id must not renotify.");

		let mut resolving = resolved(None);

		resolving.resolution_state = ResolutionState::Resolving;

		assert!(!publisher.store(resolving), "Transient states must not notify.");
		assert!(publisher.store(resolved(Some("org-2"))));
		assert_eq!(publisher.snapshot().org_id.map(String::from), Some("org-2".into()));
	}

	#[test]
	fn reset_forgets_last_notified_tenant() {
		let publisher = ContextPublisher::default();

		assert!(publisher.store(resolved(Some("org-1"))));

		publisher.reset(ContextSnapshot::default());

		assert_eq!(publisher.snapshot(), ContextSnapshot::default());
		assert!(publisher.store(resolved(Some("org-1"))));
	}

	#[test]
	fn subscribe_and_unsubscribe() {
		let publisher = ContextPublisher::default();
		let hits = Arc::new(AtomicUsize::new(0));
		let counter = hits.clone();
		let id = publisher.subscribe(move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
		});
		let snapshot = resolved(Some("org-1"));

		publisher.notify(&snapshot);

		assert_eq!(hits.load(Ordering::SeqCst), 1);
		assert!(publisher.unsubscribe(id));
		assert!(!publisher.unsubscribe(id));

		publisher.notify(&snapshot);

		assert_eq!(hits.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn default_snapshot_is_unresolved_sentinel() {
		let snapshot = ContextSnapshot::default();

		assert_eq!(snapshot.org_id, None);
		assert!(!snapshot.is_resolved());
		assert_eq!(snapshot.screen(), None);
	}
}

//! Organization context resolution: the state machine that decides which single organization is
//! active for an authenticated user on a navigated path.
//!
//! A full pass ranks the candidates for the active organization, highest precedence first:
//!
//! 1. an explicit choice carried by the navigation (`?org=<id>`),
//! 2. the cached last-used organization from [`TenantCache`],
//! 3. otherwise the `UNASSIGNED` sentinel,
//!
//! with every candidate validated against the membership set fetched from the
//! [`MembershipDirectory`]. A [`ResolutionMemo`] short-circuits navigation between ordinary
//! secondary routes, and each in-flight fetch carries a generation number so results that no
//! longer match the session are discarded instead of applied.

pub mod navigation;

mod metrics;

pub use metrics::ResolverMetrics;
pub use navigation::*;

// self
use crate::{
	_prelude::*,
	cache::TenantCache,
	directory::{DirectoryError, DirectoryReport, FallbackDirectory, MembershipDirectory},
	memo::{RedirectGuard, ResolutionMemo},
	obs::{self, PassOutcome, ResolveSpan, ResolveStage},
	org::{MembershipSet, OrganizationReference, TenantId},
	policy::{self, PolicyInput, RouteTable, RouteTarget, UiMode, normalize_path},
	publisher::{ContextPublisher, ContextSnapshot},
};

/// Resolver lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
	/// No resolution for the current identity yet.
	#[default]
	Unresolved,
	/// A membership fetch is outstanding.
	Resolving,
	/// Active organization and mode are stable; content may render.
	Resolved,
}

/// Result of [`OrganizationContextResolver::navigate`].
#[derive(Debug)]
pub enum Resolution {
	/// No identity is attached; sign-in is the host's concern.
	Unauthenticated,
	/// Resolution reached a stable state.
	Resolved {
		/// Published context.
		snapshot: ContextSnapshot,
		/// Non-fatal directory failure to display, set on the pass whose fetch degraded to onboarding.
		warning: Option<DirectoryError>,
		/// The explicit query choice was applied; the host should strip it from the URL.
		clear_query: bool,
		/// A membership fetch was issued for this pass.
		fetched: bool,
	},
	/// The host must navigate to `target`; content must not render meanwhile.
	Redirect {
		/// Navigation to perform.
		target: RouteTarget,
		/// Published context while the navigation is pending.
		snapshot: ContextSnapshot,
	},
	/// The session changed while the fetch was in flight; the result was discarded.
	Superseded,
}
impl Resolution {
	/// Published snapshot, when the pass produced one.
	pub fn snapshot(&self) -> Option<&ContextSnapshot> {
		match self {
			Self::Resolved { snapshot, .. } | Self::Redirect { snapshot, .. } => Some(snapshot),
			Self::Unauthenticated | Self::Superseded => None,
		}
	}

	/// Mode decided by the pass.
	pub fn mode(&self) -> Option<UiMode> {
		self.snapshot().and_then(|snapshot| snapshot.mode)
	}

	/// Pending navigation, if any.
	pub fn redirect(&self) -> Option<&RouteTarget> {
		match self {
			Self::Redirect { target, .. } => Some(target),
			_ => None,
		}
	}

	/// Directory warning, if the pass degraded.
	pub fn warning(&self) -> Option<&DirectoryError> {
		match self {
			Self::Resolved { warning, .. } => warning.as_ref(),
			_ => None,
		}
	}

	/// Outcome label for observability.
	pub fn outcome(&self) -> PassOutcome {
		match self {
			Self::Unauthenticated => PassOutcome::Unauthenticated,
			Self::Superseded => PassOutcome::Superseded,
			Self::Redirect { .. } => PassOutcome::Redirected,
			Self::Resolved { warning: Some(_), .. } => PassOutcome::Degraded,
			Self::Resolved { fetched: false, .. } => PassOutcome::Memoized,
			Self::Resolved { .. } => PassOutcome::Resolved,
		}
	}
}

#[derive(Debug, Default)]
struct Session {
	identity: Option<AuthIdentity>,
	state: ResolutionState,
	generation: u64,
	memo: ResolutionMemo,
	guard: RedirectGuard,
	active: OrganizationReference,
	memberships: MembershipSet,
	mode: Option<UiMode>,
	degraded: bool,
}
impl Session {
	fn snapshot(&self) -> ContextSnapshot {
		ContextSnapshot::new(self.active.clone(), self.state, self.memberships.clone(), self.mode)
	}
}

/// Everything a full pass needs once the fetch completes.
struct FetchTicket {
	generation: u64,
	identity: AuthIdentity,
	hint: Option<OrganizationReference>,
	path: String,
}

/// Builder for [`OrganizationContextResolver`].
pub struct ResolverBuilder {
	directory: FallbackDirectory,
	cache: Arc<dyn TenantCache>,
	routes: RouteTable,
	publisher: ContextPublisher,
}
impl ResolverBuilder {
	/// Adds a fallback directory consulted only when the primary fails.
	pub fn fallback(mut self, fallback: Arc<dyn MembershipDirectory>) -> Self {
		self.directory = self.directory.with_fallback(fallback);

		self
	}

	/// Overrides the default route table.
	pub fn routes(mut self, routes: RouteTable) -> Self {
		self.routes = routes;

		self
	}

	/// Publishes through an existing publisher handle.
	pub fn publisher(mut self, publisher: ContextPublisher) -> Self {
		self.publisher = publisher;

		self
	}

	/// Finishes the resolver in the `Unresolved` state with no identity.
	pub fn build(self) -> OrganizationContextResolver {
		self.publisher.reset(ContextSnapshot::default());

		OrganizationContextResolver {
			directory: self.directory,
			cache: self.cache,
			routes: self.routes,
			publisher: self.publisher,
			metrics: Default::default(),
			session: Default::default(),
		}
	}
}
impl Debug for ResolverBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResolverBuilder")
			.field("directory", &self.directory)
			.field("routes", &self.routes)
			.finish()
	}
}

/// Owns the organization context of one host session.
///
/// Create one per session and hand [`ContextPublisher`] handles to consumers; the resolver is
/// the only writer of the resolution state. Locks are never held across the directory fetch,
/// so navigation and identity events may interleave with an outstanding pass.
pub struct OrganizationContextResolver {
	directory: FallbackDirectory,
	cache: Arc<dyn TenantCache>,
	routes: RouteTable,
	publisher: ContextPublisher,
	metrics: ResolverMetrics,
	session: Mutex<Session>,
}
impl OrganizationContextResolver {
	/// Starts a builder around the primary directory and the durable cache.
	pub fn builder(
		directory: Arc<dyn MembershipDirectory>,
		cache: Arc<dyn TenantCache>,
	) -> ResolverBuilder {
		ResolverBuilder {
			directory: FallbackDirectory::new(directory),
			cache,
			routes: RouteTable::default(),
			publisher: ContextPublisher::default(),
		}
	}

	/// Read-only handle for consumers.
	pub fn publisher(&self) -> ContextPublisher {
		self.publisher.clone()
	}

	/// Current published snapshot.
	pub fn snapshot(&self) -> ContextSnapshot {
		self.publisher.snapshot()
	}

	/// Activity counters.
	pub fn metrics(&self) -> &ResolverMetrics {
		&self.metrics
	}

	/// Route table in use.
	pub fn routes(&self) -> &RouteTable {
		&self.routes
	}

	/// Attaches, replaces, or removes the authenticated identity.
	///
	/// Any change resets the session to `Unresolved` with the sentinel active, forgets the memo
	/// and redirect guard, and invalidates in-flight fetches. Re-attaching the same identity is
	/// a no-op.
	pub fn set_identity(&self, identity: Option<AuthIdentity>) {
		let _span = ResolveSpan::new(ResolveStage::Identity, "").entered();
		let snapshot = {
			let mut session = self.session.lock();

			if session.identity == identity {
				return;
			}

			obs::debug_event(
				ResolveStage::Identity,
				&format_args!(
					"Identity changed to {:?}; resetting organization context",
					identity.as_ref().map(|identity| &identity.user_id)
				),
			);

			let generation = session.generation + 1;

			*session = Session { identity, generation, ..Session::default() };

			session.snapshot()
		};

		self.publisher.reset(snapshot);
	}

	/// Resolves the organization context for a navigation.
	pub async fn navigate(&self, navigation: NavigationContext) -> Resolution {
		let span = ResolveSpan::new(ResolveStage::Navigate, navigation.path());
		let resolution = span.instrument(self.navigate_inner(navigation)).await;

		obs::record_pass_outcome(resolution.outcome());

		resolution
	}

	/// Activates `org_id` from the last fetched membership set (the selection screen's action).
	pub fn select_organization(&self, org_id: &TenantId) -> Result<OrganizationReference> {
		let _span = ResolveSpan::new(ResolveStage::Select, org_id).entered();
		let (reference, snapshot, notify) = {
			let mut session = self.session.lock();

			if session.identity.is_none() {
				return Err(Error::Unauthenticated);
			}

			let reference = session
				.memberships
				.reference_for(org_id)
				.ok_or_else(|| Error::NotAMember { org_id: org_id.clone() })?;

			self.persist(&reference);

			// Results of an outstanding pass were computed from an older hint.
			session.generation += 1;
			session.active = reference.clone();
			session.mode = Some(UiMode::Content);
			session.state = ResolutionState::Resolved;
			session.degraded = false;
			session.guard.disarm();

			let snapshot = session.snapshot();
			let notify = self.publisher.store(snapshot.clone());

			(reference, snapshot, notify)
		};

		if notify {
			self.publisher.notify(&snapshot);
		}

		Ok(reference)
	}

	async fn navigate_inner(&self, navigation: NavigationContext) -> Resolution {
		let path = normalize_path(navigation.path());
		let query = navigation.query_tenant().cloned();
		let ticket = {
			let mut session = self.session.lock();
			let Some(identity) = session.identity.clone() else {
				return Resolution::Unauthenticated;
			};

			if !self.routes.is_primary(&path) && !self.routes.is_selection(&path) {
				session.guard.disarm();
			}
			if let Some(resolution) = self.short_circuit(&mut session, &path, query.as_ref()) {
				self.metrics.record_memo_hit();

				return resolution;
			}

			let hint = self.cache.read();

			session.generation += 1;
			session.state = ResolutionState::Resolving;
			self.publisher.store(session.snapshot());

			FetchTicket { generation: session.generation, identity, hint, path }
		};

		self.metrics.record_fetch();

		let fetched = ResolveSpan::new(ResolveStage::Fetch, &ticket.path)
			.instrument(self.directory.fetch_report(&ticket.identity.user_id, &ticket.identity.email))
			.await;
		let (resolution, notify) = {
			let mut session = self.session.lock();

			if session.generation != ticket.generation
				|| session.identity.as_ref() != Some(&ticket.identity)
			{
				self.metrics.record_superseded();
				obs::debug_event(
					ResolveStage::Apply,
					&format_args!("Discarding stale membership result for {}", ticket.path),
				);

				return Resolution::Superseded;
			}

			self.apply(&mut session, ticket, query.as_ref(), fetched)
		};

		if let Some(snapshot) = resolution.snapshot().filter(|_| notify) {
			self.publisher.notify(snapshot);
		}

		resolution
	}

	/// Serves the navigation from memory when nothing relevant changed.
	fn short_circuit(
		&self,
		session: &mut Session,
		path: &str,
		query: Option<&TenantId>,
	) -> Option<Resolution> {
		if session.state != ResolutionState::Resolved {
			return None;
		}

		// Choices outside the membership set are ignored by a full pass as well.
		let query = query.filter(|id| session.memberships.contains(id));

		if query.is_some_and(|id| *id != session.active.id) {
			return None;
		}
		if !session.memo.matches(path) {
			// An outage result only stands for the path it was fetched on.
			if session.degraded || self.routes.is_resolution_sensitive(path) {
				return None;
			}

			let hint = self.cache.read();

			if hint.as_ref().map(|hint| &hint.id) != session.active.org_id() {
				obs::debug_event(
					ResolveStage::Navigate,
					&"Cached organization diverged from the active one; re-resolving",
				);

				return None;
			}
		}

		let input = PolicyInput {
			is_authenticated: true,
			membership_count: session.memberships.len(),
			has_valid_active_tenant: session.active.is_assigned(),
			already_redirected_this_session: session.guard.is_armed(),
			..PolicyInput::for_path(&self.routes, path)
		};
		let decision = policy::decide(&input, &self.routes);

		if decision.redirect.is_some() {
			return None;
		}

		session.memo.record(path);
		session.mode = Some(decision.mode);
		self.publisher.store(session.snapshot());

		Some(Resolution::Resolved {
			snapshot: session.snapshot(),
			warning: None,
			clear_query: query.is_some(),
			fetched: false,
		})
	}

	/// Applies a completed fetch to the session; returns the resolution and whether listeners
	/// must be notified.
	fn apply(
		&self,
		session: &mut Session,
		ticket: FetchTicket,
		query: Option<&TenantId>,
		fetched: Result<DirectoryReport, DirectoryError>,
	) -> (Resolution, bool) {
		let (memberships, warning) = match fetched {
			Ok(report) => (report.memberships, None),
			Err(e) => {
				obs::warn_event(
					ResolveStage::Apply,
					&format_args!("Membership directory unavailable; degrading to onboarding: {e}"),
				);
				self.metrics.record_degraded();

				(MembershipSet::default(), Some(e))
			},
		};
		let degraded = warning.is_some();
		let mut clear_query = false;
		let active = if degraded {
			self.forget_cache();

			OrganizationReference::unassigned()
		} else {
			let from_query = query.and_then(|id| memberships.reference_for(id));
			let from_hint =
				ticket.hint.as_ref().and_then(|hint| memberships.reference_for(&hint.id));

			if let Some(id) = query.filter(|_| from_query.is_none()) {
				obs::debug_event(
					ResolveStage::Apply,
					&format_args!("Ignoring query organization {id}: not a membership"),
				);
			}
			if let Some(hint) = ticket.hint.as_ref().filter(|_| from_hint.is_none()) {
				obs::debug_event(
					ResolveStage::Apply,
					&format_args!("Cached organization {} is no longer a membership", hint.id),
				);
				self.forget_cache();
			}

			match (from_query, from_hint) {
				(Some(reference), _) => {
					clear_query = true;

					reference
				},
				(None, Some(reference)) => reference,
				(None, None) => OrganizationReference::unassigned(),
			}
		};
		let input = PolicyInput {
			is_authenticated: true,
			membership_count: memberships.len(),
			has_valid_active_tenant: active.is_assigned(),
			already_redirected_this_session: session.guard.is_armed(),
			..PolicyInput::for_path(&self.routes, &ticket.path)
		};
		let decision = policy::decide(&input, &self.routes);

		session.memberships = memberships;
		session.active = active;
		session.mode = Some(decision.mode);
		session.degraded = degraded;

		if decision.mark_redirected {
			session.guard.arm();
		}
		if let Some(target) = decision.redirect {
			self.metrics.record_redirect();
			session.memo.clear();

			let snapshot = session.snapshot();

			self.publisher.store(snapshot.clone());

			return (Resolution::Redirect { target, snapshot }, false);
		}

		if session.active.is_assigned() {
			self.persist(&session.active);
		}

		session.memo.record(ticket.path);
		session.state = ResolutionState::Resolved;

		let snapshot = session.snapshot();
		let notify = self.publisher.store(snapshot.clone());

		(Resolution::Resolved { snapshot, warning, clear_query, fetched: true }, notify)
	}

	fn persist(&self, reference: &OrganizationReference) {
		if let Err(e) = self.cache.write(reference) {
			obs::warn_event(
				ResolveStage::Cache,
				&format_args!("Failed to cache organization {}: {e}", reference.id),
			);
		}
	}

	fn forget_cache(&self) {
		if let Err(e) = self.cache.clear() {
			obs::warn_event(ResolveStage::Cache, &format_args!("Failed to clear cache: {e}"));
		}
	}
}
impl Debug for OrganizationContextResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OrganizationContextResolver")
			.field("directory", &self.directory)
			.field("routes", &self.routes)
			.field("snapshot", &self.publisher.snapshot())
			.finish()
	}
}

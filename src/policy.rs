//! Redirect policy: the pure decision table mapping resolution inputs to a UI mode.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. Unauthenticated: `Content`; sign-in redirects are the host's concern.
//! 2. No memberships, not on the join route: `Onboarding`.
//! 3. No memberships, on the join route: `Content`, so the join flow can render.
//! 4. Memberships but no valid active tenant, on the gated primary route, not on the
//!    selection/join route, not yet redirected: `Select` plus a redirect to the selection route.
//!    The caller must arm its redirect guard before the next evaluation.
//! 5. Memberships but no valid active tenant otherwise: `Content`. Only the primary route
//!    enforces selection, so deep links and invitation pages keep working.
//! 6. Valid active tenant: `Content`.

pub mod routes;

pub use routes::*;

// self
use crate::_prelude::*;

/// Mutually exclusive UI modes driven by the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiMode {
	/// The user belongs to no organization yet.
	Onboarding,
	/// The user must pick an organization.
	Select,
	/// Normal page content.
	Content,
}
impl UiMode {
	/// Screen the host should render for this mode.
	pub const fn screen(self) -> Screen {
		match self {
			UiMode::Onboarding => Screen::Onboarding,
			UiMode::Select => Screen::Selection,
			UiMode::Content => Screen::Children,
		}
	}

	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			UiMode::Onboarding => "onboarding",
			UiMode::Select => "select",
			UiMode::Content => "content",
		}
	}
}
impl Display for UiMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// What the host should render in place of (or as) the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
	/// Onboarding screen.
	Onboarding,
	/// Organization-selection screen.
	Selection,
	/// Render the routed children; no special screen.
	Children,
}

/// Navigation the host must perform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTarget {
	/// Screen reached by the navigation.
	pub screen: Screen,
	/// Route path to navigate to.
	pub path: String,
}

/// Inputs to [`decide`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PolicyInput {
	/// An identity is attached.
	pub is_authenticated: bool,
	/// Size of the fetched membership set.
	pub membership_count: usize,
	/// A validated, non-sentinel tenant is active.
	pub has_valid_active_tenant: bool,
	/// Current path is the selection route.
	pub is_on_selection_route: bool,
	/// Current path is under the join route.
	pub is_on_join_route: bool,
	/// Current path is the gated primary route.
	pub is_on_gated_primary_route: bool,
	/// The session already redirected to the selection route.
	pub already_redirected_this_session: bool,
}
impl PolicyInput {
	/// Fills the route flags for `path` from `routes`.
	pub fn for_path(routes: &RouteTable, path: &str) -> Self {
		Self {
			is_on_selection_route: routes.is_selection(path),
			is_on_join_route: routes.is_join(path),
			is_on_gated_primary_route: routes.is_primary(path),
			..Self::default()
		}
	}
}

/// Outcome of [`decide`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyDecision {
	/// Mode to render.
	pub mode: UiMode,
	/// Navigation to perform, if any.
	pub redirect: Option<RouteTarget>,
	/// Caller must arm its redirect guard before the next evaluation.
	pub mark_redirected: bool,
}
impl PolicyDecision {
	fn render(mode: UiMode) -> Self {
		Self { mode, redirect: None, mark_redirected: false }
	}
}

/// Evaluates the decision table.
pub fn decide(input: &PolicyInput, routes: &RouteTable) -> PolicyDecision {
	if !input.is_authenticated {
		return PolicyDecision::render(UiMode::Content);
	}
	if input.membership_count == 0 {
		return if input.is_on_join_route {
			PolicyDecision::render(UiMode::Content)
		} else {
			PolicyDecision::render(UiMode::Onboarding)
		};
	}
	if input.has_valid_active_tenant {
		return PolicyDecision::render(UiMode::Content);
	}
	if input.is_on_gated_primary_route
		&& !input.is_on_selection_route
		&& !input.is_on_join_route
		&& !input.already_redirected_this_session
	{
		return PolicyDecision {
			mode: UiMode::Select,
			redirect: Some(RouteTarget {
				screen: Screen::Selection,
				path: routes.selection().to_owned(),
			}),
			mark_redirected: true,
		};
	}

	PolicyDecision::render(UiMode::Content)
}

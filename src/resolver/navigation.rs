//! Per-navigation input and the authenticated identity supplied by the host.

// self
use crate::{
	_prelude::*,
	obs::{self, ResolveStage},
	org::{TenantId, UserId},
};

/// Query parameter carrying an explicit organization choice.
pub const DEFAULT_QUERY_PARAM: &str = "org";

/// Identity handed over by the external authentication collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthIdentity {
	/// Authenticated user id.
	pub user_id: UserId,
	/// Authenticated user email.
	pub email: String,
}
impl AuthIdentity {
	/// Creates an identity.
	pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
		Self { user_id, email: email.into() }
	}
}

/// Input for one navigation; created by the host router and not retained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationContext {
	path: String,
	query_tenant: Option<TenantId>,
}
impl NavigationContext {
	/// Navigation to `path` without an explicit organization choice.
	pub fn new(path: impl Into<String>) -> Self {
		Self { path: path.into(), query_tenant: None }
	}

	/// Attaches an explicit organization choice.
	pub fn with_query_tenant(mut self, tenant: TenantId) -> Self {
		self.query_tenant = Some(tenant);

		self
	}

	/// Extracts the path and the [`DEFAULT_QUERY_PARAM`] choice from `url`.
	pub fn from_url(url: &Url) -> Self {
		Self::from_url_with_param(url, DEFAULT_QUERY_PARAM)
	}

	/// Extracts the path and the `param` choice from `url`; malformed ids are ignored.
	pub fn from_url_with_param(url: &Url, param: &str) -> Self {
		let query_tenant = url
			.query_pairs()
			.find(|(key, _)| key == param)
			.and_then(|(_, value)| match TenantId::new(&value) {
				Ok(id) => Some(id),
				Err(e) => {
					obs::debug_event(
						ResolveStage::Navigate,
						&format_args!("Ignoring query tenant `{value}`: {e}"),
					);

					None
				},
			});

		Self { path: url.path().to_owned(), query_tenant }
	}

	/// Navigated path.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Explicit organization choice, if any.
	pub fn query_tenant(&self) -> Option<&TenantId> {
		self.query_tenant.as_ref()
	}
}

/// Returns `url` without the `param` query pair, dropping an emptied query entirely.
///
/// Hosts apply this once a resolution reports `clear_query`, so a reload does not replay the
/// explicit choice.
pub fn strip_query_param(url: &Url, param: &str) -> Url {
	let retained: Vec<(String, String)> = url
		.query_pairs()
		.filter(|(key, _)| key != param)
		.map(|(key, value)| (key.into_owned(), value.into_owned()))
		.collect();
	let mut stripped = url.clone();

	if retained.is_empty() {
		stripped.set_query(None);
	} else {
		stripped.query_pairs_mut().clear().extend_pairs(retained);
	}

	stripped
}

//! Route table describing the gated, selection, and join routes.

// self
use crate::_prelude::*;

const DEFAULT_JOIN: &str = "/join";
const DEFAULT_PRIMARY: &str = "/";
const DEFAULT_SELECTION: &str = "/select-organization";

/// Errors raised while constructing or validating a [`RouteTable`].
#[derive(Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum RouteTableError {
	/// Routes must be absolute paths.
	#[error("The {route} route must start with `/`: {path}.")]
	NotAbsolute {
		/// Which route failed validation.
		route: &'static str,
		/// Offending value.
		path: String,
	},
	/// Two routes that drive different rules share the same path.
	#[error("The {first} and {second} routes must differ (both are {path}).")]
	Collision {
		/// First colliding route.
		first: &'static str,
		/// Second colliding route.
		second: &'static str,
		/// Shared normalized path.
		path: String,
	},
}

/// Validated route table consumed by the redirect policy.
///
/// Matching ignores query strings, fragments, and trailing slashes. The join route matches its
/// own path and everything below it (`/join`, `/join/<token>`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RouteTableBuilder", into = "RouteTableBuilder")]
pub struct RouteTable {
	primary: String,
	selection: String,
	join_prefix: String,
}
impl RouteTable {
	/// Creates a builder seeded with the default routes.
	pub fn builder() -> RouteTableBuilder {
		RouteTableBuilder::default()
	}

	/// The gated primary (landing) route.
	pub fn primary(&self) -> &str {
		&self.primary
	}

	/// The organization-selection route.
	pub fn selection(&self) -> &str {
		&self.selection
	}

	/// The join-by-invitation route prefix.
	pub fn join_prefix(&self) -> &str {
		&self.join_prefix
	}

	/// Returns `true` when `path` is the gated primary route.
	pub fn is_primary(&self, path: &str) -> bool {
		normalize_path(path) == self.primary
	}

	/// Returns `true` when `path` is the selection route.
	pub fn is_selection(&self, path: &str) -> bool {
		normalize_path(path) == self.selection
	}

	/// Returns `true` when `path` is the join route or below it.
	pub fn is_join(&self, path: &str) -> bool {
		let path = normalize_path(path);

		match path.strip_prefix(self.join_prefix.as_str()) {
			Some(rest) => rest.is_empty() || rest.starts_with('/') || self.join_prefix == "/",
			None => false,
		}
	}

	/// Returns `true` when `path` forces a full resolution (primary, selection, or join).
	pub fn is_resolution_sensitive(&self, path: &str) -> bool {
		self.is_primary(path) || self.is_selection(path) || self.is_join(path)
	}
}
impl Default for RouteTable {
	fn default() -> Self {
		Self {
			primary: DEFAULT_PRIMARY.into(),
			selection: DEFAULT_SELECTION.into(),
			join_prefix: DEFAULT_JOIN.into(),
		}
	}
}
impl From<RouteTable> for RouteTableBuilder {
	fn from(table: RouteTable) -> Self {
		Self { primary: table.primary, selection: table.selection, join_prefix: table.join_prefix }
	}
}
impl TryFrom<RouteTableBuilder> for RouteTable {
	type Error = RouteTableError;

	fn try_from(builder: RouteTableBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}

/// Builder for [`RouteTable`] values; also the serde shape of route configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteTableBuilder {
	/// Gated primary route.
	pub primary: String,
	/// Selection route.
	pub selection: String,
	/// Join route prefix.
	pub join_prefix: String,
}
impl RouteTableBuilder {
	/// Sets the gated primary route.
	pub fn primary(mut self, path: impl Into<String>) -> Self {
		self.primary = path.into();

		self
	}

	/// Sets the selection route.
	pub fn selection(mut self, path: impl Into<String>) -> Self {
		self.selection = path.into();

		self
	}

	/// Sets the join route prefix.
	pub fn join_prefix(mut self, path: impl Into<String>) -> Self {
		self.join_prefix = path.into();

		self
	}

	/// Validates and normalizes the routes.
	pub fn build(self) -> Result<RouteTable, RouteTableError> {
		let primary = absolute("primary", &self.primary)?;
		let selection = absolute("selection", &self.selection)?;
		let join_prefix = absolute("join", &self.join_prefix)?;

		for (first, a, second, b) in [
			("primary", &primary, "selection", &selection),
			("primary", &primary, "join", &join_prefix),
			("selection", &selection, "join", &join_prefix),
		] {
			if a == b {
				return Err(RouteTableError::Collision { first, second, path: a.clone() });
			}
		}

		Ok(RouteTable { primary, selection, join_prefix })
	}
}
impl Default for RouteTableBuilder {
	fn default() -> Self {
		Self {
			primary: DEFAULT_PRIMARY.into(),
			selection: DEFAULT_SELECTION.into(),
			join_prefix: DEFAULT_JOIN.into(),
		}
	}
}

/// Strips query, fragment, and trailing slashes (the root stays `/`).
pub fn normalize_path(path: &str) -> String {
	let end = path.find(['?', '#']).unwrap_or(path.len());
	let trimmed = path[..end].trim_end_matches('/');

	if trimmed.is_empty() { "/".into() } else { trimmed.to_owned() }
}

fn absolute(route: &'static str, path: &str) -> Result<String, RouteTableError> {
	if !path.starts_with('/') {
		return Err(RouteTableError::NotAbsolute { route, path: path.to_owned() });
	}

	Ok(normalize_path(path))
}

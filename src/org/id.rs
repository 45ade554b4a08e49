//! Strongly typed identifiers enforced across the organization domain.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $reserved:expr) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view, $reserved)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value, $reserved)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Reserved identifier backing the `UNASSIGNED` organization sentinel.
pub const UNASSIGNED_ID: &str = "__unassigned__";

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (tenant, user).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (tenant, user).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (tenant, user).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// The identifier collides with a reserved sentinel value.
	#[error("{kind} identifier `{value}` is reserved.")]
	Reserved {
		/// Kind of identifier (tenant, user).
		kind: &'static str,
		/// Reserved value that was supplied.
		value: &'static str,
	},
}

def_id! { TenantId, "Unique identifier for an organization (tenant).", "Tenant", Some(UNASSIGNED_ID) }
def_id! { UserId, "Unique identifier for an authenticated user.", "User", None }

impl TenantId {
	/// Builds the reserved sentinel id, bypassing validation.
	pub(crate) fn unassigned() -> Self {
		Self(UNASSIGNED_ID.to_owned())
	}

	/// Returns `true` when this is the reserved sentinel id.
	pub fn is_unassigned(&self) -> bool {
		self.0 == UNASSIGNED_ID
	}
}

fn validate_view(
	kind: &'static str,
	view: &str,
	reserved: Option<&'static str>,
) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}
	if let Some(value) = reserved.filter(|value| *value == view) {
		return Err(IdentifierError::Reserved { kind, value });
	}

	Ok(())
}

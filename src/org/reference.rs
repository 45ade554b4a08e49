//! The active organization reference and its `UNASSIGNED` sentinel.

// self
use crate::{_prelude::*, org::TenantId};

/// Lifecycle status attached to an organization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgStatus {
	/// Organization is active.
	Active,
	/// Organization exists but is disabled.
	Inactive,
}
impl OrgStatus {
	/// Maps a directory status label, returning `None` for unknown labels.
	pub fn parse(label: &str) -> Option<Self> {
		match label.trim().to_ascii_lowercase().as_str() {
			"active" => Some(Self::Active),
			"inactive" => Some(Self::Inactive),
			_ => None,
		}
	}

	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Active => "active",
			Self::Inactive => "inactive",
		}
	}
}

/// Organization currently considered active for a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationReference {
	/// Tenant identifier; the reserved sentinel id for [`OrganizationReference::unassigned`].
	pub id: TenantId,
	/// Display name.
	pub name: String,
	/// URL-friendly slug.
	pub slug: String,
	/// Lifecycle status, when known.
	pub status: Option<OrgStatus>,
}
impl OrganizationReference {
	/// Creates a reference to a real organization.
	pub fn new(id: TenantId, name: impl Into<String>, slug: impl Into<String>) -> Self {
		Self { id, name: name.into(), slug: slug.into(), status: None }
	}

	/// Sets the lifecycle status.
	pub fn with_status(mut self, status: OrgStatus) -> Self {
		self.status = Some(status);

		self
	}

	/// The "no organization chosen yet" sentinel.
	pub fn unassigned() -> Self {
		Self { id: TenantId::unassigned(), name: String::new(), slug: String::new(), status: None }
	}

	/// Returns `true` unless this is the sentinel.
	pub fn is_assigned(&self) -> bool {
		!self.id.is_unassigned()
	}

	/// Returns the tenant id for real references and `None` for the sentinel.
	pub fn org_id(&self) -> Option<&TenantId> {
		self.is_assigned().then_some(&self.id)
	}
}
impl Default for OrganizationReference {
	fn default() -> Self {
		Self::unassigned()
	}
}

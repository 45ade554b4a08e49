//! Membership records returned by the directory and the per-cycle membership set.

// std
use std::slice::Iter;
// self
use crate::{
	_prelude::*,
	org::{OrgStatus, OrganizationReference, TenantId},
};

/// Parse failure for a directory membership payload, annotated with the failing path.
pub type MembershipDecodeError = serde_path_to_error::Error<serde_json::Error>;

/// One (user, organization) membership as reported by the directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRecord {
	/// Organization identifier.
	pub org_id: TenantId,
	/// Organization display name.
	pub org_name: String,
	/// Organization slug.
	pub org_slug: String,
	/// Raw membership status label.
	#[serde(default)]
	pub status: String,
}
impl MembershipRecord {
	/// Creates a record with an `active` status.
	pub fn new(org_id: TenantId, org_name: impl Into<String>, org_slug: impl Into<String>) -> Self {
		Self {
			org_id,
			org_name: org_name.into(),
			org_slug: org_slug.into(),
			status: OrgStatus::Active.as_str().into(),
		}
	}

	/// Overrides the status label.
	pub fn with_status(mut self, status: impl Into<String>) -> Self {
		self.status = status.into();

		self
	}

	/// Projects the record into an [`OrganizationReference`].
	pub fn to_reference(&self) -> OrganizationReference {
		OrganizationReference {
			id: self.org_id.clone(),
			name: self.org_name.clone(),
			slug: self.org_slug.clone(),
			status: OrgStatus::parse(&self.status),
		}
	}
}

/// Memberships fetched for one resolution cycle; the authority on which tenants the caller
/// may activate.
///
/// Order is irrelevant. Duplicate `org_id`s collapse onto the first record seen.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MembershipSet(Vec<MembershipRecord>);
impl MembershipSet {
	/// Builds a set from arbitrary records, dropping duplicate tenants.
	pub fn new(records: impl IntoIterator<Item = MembershipRecord>) -> Self {
		let mut deduped: Vec<MembershipRecord> = Vec::new();

		for record in records {
			if !deduped.iter().any(|existing| existing.org_id == record.org_id) {
				deduped.push(record);
			}
		}

		Self(deduped)
	}

	/// Parses a directory payload (a JSON array of records).
	pub fn from_json_slice(bytes: &[u8]) -> Result<Self, MembershipDecodeError> {
		let mut de = serde_json::Deserializer::from_slice(bytes);
		let records: Vec<MembershipRecord> = serde_path_to_error::deserialize(&mut de)?;

		Ok(Self::new(records))
	}

	/// Number of distinct memberships.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when the user belongs to no organization.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns `true` when the set contains a record for `id`.
	pub fn contains(&self, id: &str) -> bool {
		self.get(id).is_some()
	}

	/// Looks up the record for `id`.
	pub fn get(&self, id: &str) -> Option<&MembershipRecord> {
		self.0.iter().find(|record| record.org_id.as_ref() == id)
	}

	/// Returns the authoritative reference for `id`, if the user is a member.
	pub fn reference_for(&self, id: &str) -> Option<OrganizationReference> {
		self.get(id).map(MembershipRecord::to_reference)
	}

	/// Iterates over the records.
	pub fn iter(&self) -> Iter<'_, MembershipRecord> {
		self.0.iter()
	}
}
impl FromIterator<MembershipRecord> for MembershipSet {
	fn from_iter<T: IntoIterator<Item = MembershipRecord>>(iter: T) -> Self {
		Self::new(iter)
	}
}
impl<'a> IntoIterator for &'a MembershipSet {
	type IntoIter = Iter<'a, MembershipRecord>;
	type Item = &'a MembershipRecord;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

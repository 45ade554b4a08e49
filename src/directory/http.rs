//! reqwest-backed [`MembershipDirectory`] for JSON membership endpoints.
//!
//! The endpoint receives `GET <endpoint>?userId=<id>&email=<email>` and must answer with a JSON
//! array of membership records (`orgId`, `orgName`, `orgSlug`, `status`).

// std
use std::time::Duration as StdDuration;
// crates.io
use reqwest::header::ACCEPT;
// self
use crate::{
	_prelude::*,
	directory::{DirectoryError, DirectoryFuture, MembershipDirectory},
	org::{MembershipSet, UserId},
};

/// HTTP membership directory.
///
/// The same type serves both tiers: point the primary at the server-mediated endpoint and the
/// fallback at the directly authorized one.
#[derive(Clone)]
pub struct HttpMembershipDirectory {
	client: ReqwestClient,
	endpoint: Url,
	bearer: Option<String>,
	timeout: Option<StdDuration>,
	label: String,
}
impl HttpMembershipDirectory {
	/// Creates a directory for `endpoint` using a default reqwest client.
	pub fn new(endpoint: Url) -> Self {
		Self::with_client(ReqwestClient::default(), endpoint)
	}

	/// Creates a directory that reuses an existing reqwest client.
	pub fn with_client(client: ReqwestClient, endpoint: Url) -> Self {
		let label = endpoint.path().to_owned();

		Self { client, endpoint, bearer: None, timeout: None, label }
	}

	/// Attaches a bearer token to every request.
	pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
		self.bearer = Some(token.into());

		self
	}

	/// Bounds every request; an elapsed timeout surfaces as [`DirectoryError::Transport`].
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Overrides the label used in logs.
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();

		self
	}

	fn request_url(&self, user_id: &UserId, email: &str) -> Url {
		let mut url = self.endpoint.clone();

		url.query_pairs_mut().append_pair("userId", user_id).append_pair("email", email);

		url
	}

	async fn fetch(&self, user_id: &UserId, email: &str) -> Result<MembershipSet, DirectoryError> {
		let mut request =
			self.client.get(self.request_url(user_id, email)).header(ACCEPT, "application/json");

		if let Some(token) = self.bearer.as_deref() {
			request = request.bearer_auth(token);
		}
		if let Some(timeout) = self.timeout {
			request = request.timeout(timeout);
		}

		let response = request.send().await?;
		let status = response.status();

		if !status.is_success() {
			return Err(DirectoryError::Status { status: status.as_u16() });
		}

		let bytes = response.bytes().await?;

		MembershipSet::from_json_slice(&bytes).map_err(|source| DirectoryError::Decode { source })
	}
}
impl MembershipDirectory for HttpMembershipDirectory {
	fn label(&self) -> &str {
		&self.label
	}

	fn fetch_memberships<'a>(&'a self, user_id: &'a UserId, email: &'a str) -> DirectoryFuture<'a> {
		Box::pin(self.fetch(user_id, email))
	}
}
impl Debug for HttpMembershipDirectory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpMembershipDirectory")
			.field("endpoint", &self.endpoint.as_str())
			.field("bearer_set", &self.bearer.is_some())
			.field("timeout", &self.timeout)
			.finish()
	}
}

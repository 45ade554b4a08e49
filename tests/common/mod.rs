//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use parking_lot::Mutex;
use tokio::sync::Semaphore;
// self
use org_context::{
	cache::MemoryCache,
	directory::{DirectoryError, DirectoryFuture, MembershipDirectory},
	org::{MembershipRecord, MembershipSet, OrganizationReference, TenantId, UserId},
	resolver::{AuthIdentity, OrganizationContextResolver},
};

/// Scripted directory that counts calls and can be switched between answers or held open.
pub struct ScriptedDirectory {
	calls: AtomicUsize,
	answer: Mutex<Option<MembershipSet>>,
	gate: Option<Arc<Semaphore>>,
}
impl ScriptedDirectory {
	pub fn members(ids: &[&str]) -> Arc<Self> {
		Arc::new(Self { calls: AtomicUsize::new(0), answer: Mutex::new(Some(set(ids))), gate: None })
	}

	pub fn failing() -> Arc<Self> {
		Arc::new(Self { calls: AtomicUsize::new(0), answer: Mutex::new(None), gate: None })
	}

	/// Directory whose fetches wait until [`Semaphore::add_permits`] is called on the gate.
	pub fn gated(ids: &[&str]) -> (Arc<Self>, Arc<Semaphore>) {
		let gate = Arc::new(Semaphore::new(0));
		let directory = Arc::new(Self {
			calls: AtomicUsize::new(0),
			answer: Mutex::new(Some(set(ids))),
			gate: Some(gate.clone()),
		});

		(directory, gate)
	}

	pub fn set_members(&self, ids: &[&str]) {
		*self.answer.lock() = Some(set(ids));
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl MembershipDirectory for ScriptedDirectory {
	fn label(&self) -> &str {
		"scripted"
	}

	fn fetch_memberships<'a>(&'a self, _: &'a UserId, _: &'a str) -> DirectoryFuture<'a> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let gate = self.gate.clone();

		Box::pin(async move {
			if let Some(gate) = gate {
				let _permit = gate.acquire().await.map_err(DirectoryError::transport)?;
			}

			let answer = self.answer.lock().clone();

			answer.ok_or_else(|| DirectoryError::unavailable("scripted outage"))
		})
	}
}

pub fn tenant(id: &str) -> TenantId {
	TenantId::new(id).expect("Tenant fixture should be valid.")
}

pub fn reference(id: &str) -> OrganizationReference {
	OrganizationReference::new(tenant(id), format!("Org {id}"), id)
}

pub fn set(ids: &[&str]) -> MembershipSet {
	ids.iter().map(|id| MembershipRecord::new(tenant(id), format!("Org {id}"), *id)).collect()
}

pub fn identity(user: &str) -> AuthIdentity {
	AuthIdentity::new(
		UserId::new(user).expect("User fixture should be valid."),
		format!("{user}@example.com"),
	)
}

/// Resolver over `directory` and `cache`, with `user-1` already signed in.
pub fn signed_in(
	directory: Arc<ScriptedDirectory>,
	cache: &MemoryCache,
) -> OrganizationContextResolver {
	let resolver =
		OrganizationContextResolver::builder(directory, Arc::new(cache.clone())).build();

	resolver.set_identity(Some(identity("user-1")));

	resolver
}

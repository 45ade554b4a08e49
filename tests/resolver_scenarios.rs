//! End-to-end resolution scenarios against scripted directories and in-memory caches.

mod common;

// std
use std::sync::Arc;
// crates.io
use parking_lot::Mutex;
use url::Url;
// self
use common::*;
use org_context::{
	cache::{FileCache, MemoryCache, TenantCache},
	org::{OrgStatus, OrganizationReference, TenantId},
	policy::{RouteTable, Screen, UiMode},
	publisher::ContextSnapshot,
	resolver::{
		NavigationContext, OrganizationContextResolver, Resolution, ResolutionState,
		strip_query_param,
	},
};

fn nav(path: &str) -> NavigationContext {
	NavigationContext::new(path)
}

fn nav_with(path: &str, org: &str) -> NavigationContext {
	NavigationContext::new(path).with_query_tenant(tenant(org))
}

fn active(resolver: &OrganizationContextResolver) -> Option<TenantId> {
	resolver.snapshot().org_id
}

fn cached(cache: &MemoryCache) -> Option<TenantId> {
	cache.read().map(|reference| reference.id)
}

#[tokio::test]
async fn first_visit_redirects_once_then_renders_selection() {
	let directory = ScriptedDirectory::members(&["org-1", "org-2"]);
	let cache = MemoryCache::default();
	let resolver = signed_in(directory.clone(), &cache);
	let first = resolver.navigate(nav("/")).await;

	assert_eq!(first.mode(), Some(UiMode::Select));
	assert_eq!(first.redirect().map(|target| target.path.as_str()), Some("/select-organization"));
	assert_eq!(first.redirect().map(|target| target.screen), Some(Screen::Selection));
	assert_eq!(resolver.snapshot().resolution_state, ResolutionState::Resolving);
	assert_eq!(active(&resolver), None);
	assert!(!cache.contains_entry(), "A redirect must not write the cache.");

	let selection = resolver.navigate(nav("/select-organization")).await;

	assert_eq!(selection.redirect(), None);
	assert_eq!(selection.mode(), Some(UiMode::Content));
	assert!(resolver.snapshot().is_resolved());
	assert_eq!(resolver.snapshot().membership_set.len(), 2);

	let chosen = resolver
		.select_organization(&tenant("org-2"))
		.expect("Selecting a membership should succeed.");

	assert_eq!(chosen.id, tenant("org-2"));
	assert_eq!(active(&resolver), Some(tenant("org-2")));
	assert_eq!(cached(&cache), Some(tenant("org-2")));

	let landing = resolver.navigate(nav("/")).await;

	assert_eq!(landing.redirect(), None);
	assert_eq!(landing.mode(), Some(UiMode::Content));
	assert_eq!(resolver.metrics().redirects(), 1);
}

#[tokio::test]
async fn returning_visit_uses_cached_organization() {
	let directory = ScriptedDirectory::members(&["org-1", "org-2"]);
	let cache = MemoryCache::default();

	cache.write(&reference("org-2")).expect("Seeding the cache should succeed.");

	let resolver = signed_in(directory.clone(), &cache);
	let resolution = resolver.navigate(nav("/")).await;

	assert_eq!(resolution.mode(), Some(UiMode::Content));
	assert_eq!(resolution.redirect(), None);
	assert_eq!(active(&resolver), Some(tenant("org-2")));
	assert_eq!(directory.calls(), 1);
	assert_eq!(resolver.metrics().redirects(), 0);
}

#[tokio::test]
async fn explicit_query_choice_overrides_cache() {
	let directory = ScriptedDirectory::members(&["org-1", "org-2", "org-3"]);
	let cache = MemoryCache::default();

	cache.write(&reference("org-2")).expect("Seeding the cache should succeed.");

	let resolver = signed_in(directory, &cache);
	let resolution = resolver.navigate(nav_with("/", "org-3")).await;

	assert!(matches!(resolution, Resolution::Resolved { clear_query: true, .. }));
	assert_eq!(active(&resolver), Some(tenant("org-3")));
	assert_eq!(cached(&cache), Some(tenant("org-3")));

	let url = Url::parse("https://app.example.com/?org=org-3").expect("URL fixture should parse.");

	assert_eq!(strip_query_param(&url, "org").as_str(), "https://app.example.com/");
}

#[tokio::test]
async fn invalid_query_choice_falls_back_to_cache() {
	let directory = ScriptedDirectory::members(&["org-1", "org-2"]);
	let cache = MemoryCache::default();

	cache.write(&reference("org-1")).expect("Seeding the cache should succeed.");

	let resolver = signed_in(directory, &cache);
	let resolution = resolver.navigate(nav_with("/", "org-9")).await;

	assert!(matches!(resolution, Resolution::Resolved { clear_query: false, .. }));
	assert_eq!(active(&resolver), Some(tenant("org-1")));
	assert_eq!(cached(&cache), Some(tenant("org-1")));
}

#[tokio::test]
async fn non_member_query_choice_does_not_defeat_the_memo() {
	let directory = ScriptedDirectory::members(&["org-1"]);
	let resolver = signed_in(directory.clone(), &MemoryCache::default());

	for _ in 0..3 {
		let resolution = resolver.navigate(nav_with("/reports", "org-9")).await;

		assert!(matches!(resolution, Resolution::Resolved { clear_query: false, .. }));
	}

	assert_eq!(directory.calls(), 1);
	assert_eq!(resolver.metrics().memo_hits(), 2);
	assert_eq!(active(&resolver), None);
}

#[tokio::test]
async fn directory_outage_degrades_to_onboarding() {
	let cache = MemoryCache::default();

	cache.write(&reference("org-1")).expect("Seeding the cache should succeed.");

	let resolver = signed_in(ScriptedDirectory::failing(), &cache);
	let resolution = resolver.navigate(nav("/")).await;

	assert_eq!(resolution.mode(), Some(UiMode::Onboarding));
	assert!(resolution.warning().is_some());
	assert_eq!(active(&resolver), None);
	assert!(resolver.snapshot().is_resolved());
	assert!(!cache.contains_entry(), "A failed fetch must clear the cache.");
	assert_eq!(resolver.metrics().degraded(), 1);
}

#[tokio::test]
async fn outage_result_is_reused_until_the_path_changes() {
	let directory = ScriptedDirectory::failing();
	let cache = MemoryCache::default();
	let resolver = signed_in(directory.clone(), &cache);
	let first = resolver.navigate(nav("/reports")).await;

	assert!(first.warning().is_some());

	for _ in 0..2 {
		let again = resolver.navigate(nav("/reports")).await;

		assert!(matches!(again, Resolution::Resolved { fetched: false, .. }));
		assert_eq!(again.mode(), Some(UiMode::Onboarding));
	}

	assert_eq!(directory.calls(), 1);

	directory.set_members(&["org-1"]);

	let recovered = resolver.navigate(nav("/students")).await;

	assert_eq!(directory.calls(), 2);
	assert_eq!(recovered.warning().map(ToString::to_string), None);
	assert_eq!(recovered.mode(), Some(UiMode::Content));
}

#[tokio::test]
async fn fallback_directory_is_used_when_primary_fails() {
	let fallback = ScriptedDirectory::members(&["org-1"]);
	let cache = MemoryCache::default();

	cache.write(&reference("org-1")).expect("Seeding the cache should succeed.");

	let resolver = OrganizationContextResolver::builder(
		ScriptedDirectory::failing(),
		Arc::new(cache.clone()),
	)
	.fallback(fallback.clone())
	.build();

	resolver.set_identity(Some(identity("user-1")));

	let resolution = resolver.navigate(nav("/")).await;

	assert!(resolution.warning().is_none());
	assert_eq!(active(&resolver), Some(tenant("org-1")));
	assert_eq!(fallback.calls(), 1);
}

#[tokio::test]
async fn join_route_is_reachable_without_memberships() {
	let directory = ScriptedDirectory::members(&[]);
	let resolver = signed_in(directory, &MemoryCache::default());
	let join = resolver.navigate(nav("/join/invite-42")).await;

	assert_eq!(join.mode(), Some(UiMode::Content));
	assert_eq!(join.redirect(), None);

	let landing = resolver.navigate(nav("/")).await;

	assert_eq!(landing.mode(), Some(UiMode::Onboarding));
	assert_eq!(resolver.snapshot().screen(), Some(Screen::Onboarding));
}

#[tokio::test]
async fn repeated_navigation_is_served_from_memory() {
	let directory = ScriptedDirectory::members(&["org-1"]);
	let cache = MemoryCache::default();

	cache.write(&reference("org-1")).expect("Seeding the cache should succeed.");

	let resolver = signed_in(directory.clone(), &cache);

	resolver.navigate(nav("/reports")).await;

	let before = resolver.snapshot();
	let again = resolver.navigate(nav("/reports")).await;

	assert!(matches!(again, Resolution::Resolved { fetched: false, .. }));
	assert_eq!(resolver.snapshot(), before);

	resolver.navigate(nav("/students")).await;
	resolver.navigate(nav("/students/42")).await;

	assert_eq!(directory.calls(), 1);
	assert_eq!(resolver.metrics().memo_hits(), 3);
}

#[tokio::test]
async fn sensitive_routes_always_refetch() {
	let directory = ScriptedDirectory::members(&["org-1"]);
	let cache = MemoryCache::default();

	cache.write(&reference("org-1")).expect("Seeding the cache should succeed.");

	let resolver = signed_in(directory.clone(), &cache);

	resolver.navigate(nav("/reports")).await;
	resolver.navigate(nav("/")).await;
	resolver.navigate(nav("/join/abc")).await;

	assert_eq!(directory.calls(), 3);
}

#[tokio::test]
async fn cache_divergence_forces_a_full_pass() {
	let directory = ScriptedDirectory::members(&["org-1", "org-2"]);
	let cache = MemoryCache::default();

	cache.write(&reference("org-1")).expect("Seeding the cache should succeed.");

	let resolver = signed_in(directory.clone(), &cache);

	resolver.navigate(nav("/reports")).await;
	// Another tab switched organizations.
	cache.write(&reference("org-2")).expect("Overwriting the cache should succeed.");
	resolver.navigate(nav("/students")).await;

	assert_eq!(directory.calls(), 2);
	assert_eq!(active(&resolver), Some(tenant("org-2")));
}

#[tokio::test]
async fn stale_cache_entry_is_invalidated() {
	let directory = ScriptedDirectory::members(&["org-1", "org-2"]);
	let cache = MemoryCache::default();

	cache.write(&reference("org-9")).expect("Seeding the cache should succeed.");

	let resolver = signed_in(directory, &cache);
	let resolution = resolver.navigate(nav("/reports")).await;

	assert_eq!(resolution.mode(), Some(UiMode::Content));
	assert_eq!(active(&resolver), None);
	assert!(!cache.contains_entry());
}

#[tokio::test]
async fn corrupt_cache_entry_is_a_miss() {
	let directory = ScriptedDirectory::members(&["org-1"]);
	let cache = MemoryCache::default();

	cache.insert_raw("{not json");

	let resolver = signed_in(directory, &cache);
	let resolution = resolver.navigate(nav("/reports")).await;

	assert_eq!(resolution.mode(), Some(UiMode::Content));
	assert_eq!(active(&resolver), None);
	assert!(!cache.contains_entry());
}

#[tokio::test]
async fn secondary_routes_never_redirect() {
	let directory = ScriptedDirectory::members(&["org-1", "org-2"]);
	let resolver = signed_in(directory, &MemoryCache::default());

	for path in ["/reports", "/students/7", "/select-organization", "/join/token"] {
		let resolution = resolver.navigate(nav(path)).await;

		assert_eq!(resolution.redirect(), None, "{path} must not redirect.");
		assert_eq!(resolution.mode(), Some(UiMode::Content));
	}

	assert_eq!(resolver.metrics().redirects(), 0);
}

#[tokio::test]
async fn primary_route_redirects_at_most_once_per_visit() {
	let directory = ScriptedDirectory::members(&["org-1", "org-2"]);
	let resolver = signed_in(directory, &MemoryCache::default());

	assert!(resolver.navigate(nav("/")).await.redirect().is_some());
	assert!(resolver.navigate(nav("/")).await.redirect().is_none());
	assert!(resolver.navigate(nav("/select-organization")).await.redirect().is_none());
	assert_eq!(resolver.metrics().redirects(), 1);

	// Leaving both routes re-arms the redirect for the next visit.
	resolver.navigate(nav("/reports")).await;

	assert!(resolver.navigate(nav("/")).await.redirect().is_some());
	assert_eq!(resolver.metrics().redirects(), 2);
}

#[tokio::test]
async fn custom_routes_drive_the_policy() {
	let routes = RouteTable::builder()
		.primary("/dashboard")
		.selection("/pick")
		.build()
		.expect("Custom routes should validate.");
	let resolver = OrganizationContextResolver::builder(
		ScriptedDirectory::members(&["org-1", "org-2"]),
		Arc::new(MemoryCache::default()),
	)
	.routes(routes)
	.build();

	resolver.set_identity(Some(identity("user-1")));

	assert!(resolver.navigate(nav("/")).await.redirect().is_none());
	assert_eq!(
		resolver.navigate(nav("/dashboard")).await.redirect().map(|target| target.path.clone()),
		Some("/pick".into())
	);
}

#[tokio::test]
async fn identity_change_supersedes_in_flight_fetch() {
	let (directory, gate) = ScriptedDirectory::gated(&["org-1"]);
	let cache = MemoryCache::default();
	let resolver = signed_in(directory.clone(), &cache);
	let (first, ()) = tokio::join!(resolver.navigate(nav("/reports")), async {
		resolver.set_identity(Some(identity("user-2")));
		gate.add_permits(1);
	});

	assert!(matches!(first, Resolution::Superseded));
	assert_eq!(resolver.metrics().superseded(), 1);
	assert_eq!(resolver.snapshot(), ContextSnapshot::default());

	let second = resolver.navigate(nav("/reports")).await;

	assert!(matches!(second, Resolution::Resolved { fetched: true, .. }));
	assert_eq!(directory.calls(), 2);
}

#[tokio::test]
async fn newer_navigation_supersedes_older_one() {
	let (directory, gate) = ScriptedDirectory::gated(&["org-1"]);
	let resolver = signed_in(directory, &MemoryCache::default());
	let (older, newer, ()) = tokio::join!(
		resolver.navigate(nav("/reports")),
		resolver.navigate(nav_with("/students", "org-1")),
		async {
			gate.add_permits(2);
		}
	);

	assert!(matches!(older, Resolution::Superseded));
	assert!(matches!(newer, Resolution::Resolved { clear_query: true, .. }));
	assert_eq!(active(&resolver), Some(tenant("org-1")));
}

#[tokio::test]
async fn listeners_only_see_resolved_tenant_changes() {
	let directory = ScriptedDirectory::members(&["org-1", "org-2"]);
	let cache = MemoryCache::default();

	cache.write(&reference("org-1")).expect("Seeding the cache should succeed.");

	let resolver = signed_in(directory, &cache);
	let seen = Arc::new(Mutex::new(Vec::<Option<TenantId>>::new()));
	let sink = seen.clone();

	resolver.publisher().subscribe(move |snapshot| sink.lock().push(snapshot.org_id.clone()));
	resolver.navigate(nav("/reports")).await;
	resolver.navigate(nav("/students")).await;
	resolver.select_organization(&tenant("org-2")).expect("Switching tenants should succeed.");
	resolver.select_organization(&tenant("org-2")).expect("Reselecting should succeed.");
	resolver.navigate(nav("/")).await;

	assert_eq!(*seen.lock(), vec![Some(tenant("org-1")), Some(tenant("org-2"))]);
}

#[tokio::test]
async fn logout_resets_context_but_keeps_cache() {
	let directory = ScriptedDirectory::members(&["org-1"]);
	let cache = MemoryCache::default();
	let resolver = signed_in(directory.clone(), &cache);

	resolver.navigate(nav_with("/", "org-1")).await;
	resolver.set_identity(None);

	assert_eq!(resolver.snapshot(), ContextSnapshot::default());
	assert!(matches!(resolver.navigate(nav("/")).await, Resolution::Unauthenticated));
	assert_eq!(cached(&cache), Some(tenant("org-1")));

	resolver.set_identity(Some(identity("user-1")));
	resolver.navigate(nav("/")).await;

	assert_eq!(active(&resolver), Some(tenant("org-1")));
	assert_eq!(directory.calls(), 2);
}

#[tokio::test]
async fn file_cache_survives_resolver_restarts() -> color_eyre::Result<()> {
	let dir = std::env::temp_dir().join(format!("org-context-restart-{}", std::process::id()));
	let path = dir.join("active-org.json");
	let directory = ScriptedDirectory::members(&["org-1", "org-2"]);

	{
		let resolver = OrganizationContextResolver::builder(
			directory.clone(),
			Arc::new(FileCache::open(&path)?),
		)
		.build();

		resolver.set_identity(Some(identity("user-1")));
		resolver.navigate(nav("/select-organization")).await;
		resolver.select_organization(&tenant("org-2"))?;
	}

	let resolver =
		OrganizationContextResolver::builder(directory, Arc::new(FileCache::open(&path)?)).build();

	resolver.set_identity(Some(identity("user-1")));

	let resolution = resolver.navigate(nav("/")).await;

	assert_eq!(resolution.redirect(), None);
	assert_eq!(
		resolver.snapshot().active_reference,
		OrganizationReference::new(tenant("org-2"), "Org org-2", "org-2")
			.with_status(OrgStatus::Active)
	);

	std::fs::remove_dir_all(&dir)?;

	Ok(())
}

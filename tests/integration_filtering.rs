//! End-to-end filtering scenarios: content filter rules deciding which
//! repositories in a chain are queried at all.

use std::sync::Arc;

use repochain::chain::{ChainBuilder, RepositoryChain};
use repochain::filter::{FilterFaultPolicy, exclude_if};
use repochain::models::{AttributeSet, ModuleRequestContext, VersionConstraint};
use repochain::resolver::{ResolutionDispatcher, ResolutionOutcome};
use repochain::scope::ResolutionSession;
use repochain::test_utils::InMemoryRepository;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn request(module: &str, constraint: &str, consumer: &str, attributes: AttributeSet) -> ModuleRequestContext {
    ModuleRequestContext::new(
        module.parse().unwrap(),
        VersionConstraint::parse(constraint),
        consumer.into(),
        attributes,
    )
}

async fn resolve(
    chain: RepositoryChain,
    ctx: &ModuleRequestContext,
) -> repochain::core::Result<ResolutionOutcome> {
    let session = ResolutionSession::new();
    let scope = session.scope(ctx.consumer());
    ResolutionDispatcher::new(Arc::new(chain)).resolve(ctx, &scope).await
}

#[tokio::test]
async fn module_excluded_by_identifier_resolves_via_unfiltered_repository() {
    init_tracing();

    // Repository A excludes org:foo by identifier; B is unfiltered and
    // hosts it.
    let repo_a = Arc::new(InMemoryRepository::new().with_module("org:foo", &["1.0"]));
    let repo_b = Arc::new(InMemoryRepository::new().with_module("org:foo", &["1.0"]));
    let chain = ChainBuilder::new()
        .repository_with_rule(
            "repo-a",
            repo_a.clone(),
            exclude_if(|ctx| ctx.module().group() == "org" && ctx.module().name() == "foo"),
        )
        .repository("repo-b", repo_b.clone())
        .build();

    let ctx = request("org:foo", "1.0", "conf", AttributeSet::new());
    let outcome = resolve(chain, &ctx).await.unwrap();

    let ResolutionOutcome::Resolved { repository, version, metadata } = outcome else {
        panic!("expected resolution via repo-b");
    };
    assert_eq!(repository.as_str(), "repo-b");
    assert_eq!(version, "1.0");
    assert_eq!(metadata.value()["artifact"], "foo-1.0.jar");

    // Zero network calls were issued to the excluded repository.
    assert_eq!(repo_a.total_calls(), 0);
    assert_eq!(repo_b.metadata_calls(), 1);
}

#[tokio::test]
async fn attribute_based_rule_excludes_by_consumer_attributes() {
    init_tracing();

    let repo_a = Arc::new(InMemoryRepository::new().with_module("org:foo", &["1.0"]));
    let repo_b = Arc::new(InMemoryRepository::new().with_module("org:foo", &["1.0"]));
    let chain = ChainBuilder::new()
        .repository_with_rule(
            "repo-a",
            repo_a.clone(),
            exclude_if(|ctx| ctx.attributes().contains("colorAttribute", "blue")),
        )
        .repository("repo-b", repo_b.clone())
        .build();

    let attributes = AttributeSet::new().with("colorAttribute", "blue");
    let ctx = request("org:foo", "1.0", "conf", attributes);
    let outcome = resolve(chain, &ctx).await.unwrap();

    let ResolutionOutcome::Resolved { repository, .. } = outcome else {
        panic!("expected resolution via repo-b");
    };
    assert_eq!(repository.as_str(), "repo-b");
    assert_eq!(repo_a.total_calls(), 0);
}

#[tokio::test]
async fn attribute_rule_leaves_other_consumers_unaffected() {
    init_tracing();

    let repo_a = Arc::new(InMemoryRepository::new().with_module("org:foo", &["1.0"]));
    let chain = ChainBuilder::new()
        .repository_with_rule(
            "repo-a",
            repo_a.clone(),
            exclude_if(|ctx| ctx.attributes().contains("colorAttribute", "blue")),
        )
        .build();

    // A consumer without the attribute resolves straight from repo-a.
    let ctx = request("org:foo", "1.0", "conf", AttributeSet::new().with("colorAttribute", "red"));
    let outcome = resolve(chain, &ctx).await.unwrap();
    assert!(outcome.is_resolved());
    assert_eq!(repo_a.metadata_calls(), 1);
}

#[tokio::test]
async fn dynamic_constraint_skips_listing_on_excluded_repository() {
    init_tracing();

    let filtered = Arc::new(InMemoryRepository::new().with_module("org:foo", &["1.0", "2.0"]));
    let eligible = Arc::new(InMemoryRepository::new().with_module("org:foo", &["1.0", "1.1"]));
    let chain = ChainBuilder::new()
        .repository_with_rule("filtered", filtered.clone(), exclude_if(|ctx| ctx.module().name() == "foo"))
        .repository("eligible", eligible.clone())
        .build();

    let ctx = request("org:foo", "+", "conf", AttributeSet::new());
    let outcome = resolve(chain, &ctx).await.unwrap();

    let ResolutionOutcome::Resolved { version, metadata, .. } = outcome else {
        panic!("expected resolution via the eligible repository");
    };
    assert_eq!(version, "1.1");
    assert_eq!(metadata.value()["artifact"], "foo-1.1.jar");

    // No directory listing against the filtered-out repository; exactly one
    // listing followed by one metadata retrieval against the eligible one.
    assert_eq!(filtered.listing_calls(), 0);
    assert_eq!(filtered.metadata_calls(), 0);
    assert_eq!(eligible.listing_calls(), 1);
    assert_eq!(eligible.metadata_calls(), 1);
}

#[tokio::test]
async fn exclusion_everywhere_reports_unresolved() {
    init_tracing();

    let repo = Arc::new(InMemoryRepository::new().with_module("org:foo", &["1.0"]));
    let chain = ChainBuilder::new()
        .repository_with_rule("only", repo.clone(), exclude_if(|ctx| ctx.module().group() == "org"))
        .build();

    let ctx = request("org:foo", "1.0", "conf", AttributeSet::new());
    let outcome = resolve(chain, &ctx).await.unwrap();
    assert!(!outcome.is_resolved());
    assert_eq!(repo.total_calls(), 0);
}

#[tokio::test]
async fn faulting_rule_fails_open_by_default() {
    init_tracing();

    let repo = Arc::new(InMemoryRepository::new().with_module("org:foo", &["1.0"]));
    let faulting = |_: &repochain::filter::FilterContext<'_>| -> anyhow::Result<repochain::filter::FilterDecision> {
        anyhow::bail!("filter rule blew up")
    };
    let chain = ChainBuilder::new().repository_with_rule("only", repo.clone(), faulting).build();

    let ctx = request("org:foo", "1.0", "conf", AttributeSet::new());
    let outcome = resolve(chain, &ctx).await.unwrap();
    // Fail-open: the broken filter does not cost us the resolution.
    assert!(outcome.is_resolved());
}

#[tokio::test]
async fn faulting_rule_surfaces_when_fail_closed() {
    init_tracing();

    let repo = Arc::new(InMemoryRepository::new().with_module("org:foo", &["1.0"]));
    let faulting = |_: &repochain::filter::FilterContext<'_>| -> anyhow::Result<repochain::filter::FilterDecision> {
        anyhow::bail!("filter rule blew up")
    };
    let chain = ChainBuilder::new()
        .repository_with_rule("only", repo.clone(), faulting)
        .fault_policy(FilterFaultPolicy::FailClosed)
        .build();

    let ctx = request("org:foo", "1.0", "conf", AttributeSet::new());
    let err = resolve(chain, &ctx).await.unwrap_err();
    assert!(matches!(err, repochain::core::ResolveError::FilterFault { .. }));
    assert_eq!(repo.total_calls(), 0);
}

#[tokio::test]
async fn chain_order_is_precedence_even_for_dynamic_constraints() {
    init_tracing();

    let primary = Arc::new(InMemoryRepository::new().with_module("org:lib", &["1.2", "1.4"]));
    let mirror = Arc::new(InMemoryRepository::new().with_module("org:lib", &["1.9"]));
    let chain = ChainBuilder::new()
        .repository("primary", primary.clone())
        .repository("mirror", mirror.clone())
        .build();

    let ctx = request("org:lib", "1.+", "conf", AttributeSet::new());
    let outcome = resolve(chain, &ctx).await.unwrap();

    let ResolutionOutcome::Resolved { repository, version, .. } = outcome else {
        panic!("expected resolved");
    };
    assert_eq!(repository.as_str(), "primary");
    assert_eq!(version, "1.4");
    assert_eq!(mirror.total_calls(), 0);
}

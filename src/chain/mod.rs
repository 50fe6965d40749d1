//! Repository chain construction and lazy filtering.
//!
//! A [`RepositoryChain`] is the ordered list of configured repositories for
//! a resolution. Declaration order fixes lookup precedence: filtering only
//! ever removes repositories from the sequence, never reorders it.
//!
//! [`RepositoryChain::filter`] produces a lazy iterator: each step consults
//! the consumer scope's decision cache for the `(repository, module)` pair
//! and only invokes the repository's rule on a cache miss. Because the
//! dispatcher stops consuming once a lookup succeeds, unevaluated tail
//! repositories incur no filter cost at all.

use std::slice;
use std::sync::Arc;

use tracing::debug;

use crate::core::Result;
use crate::filter::{ContentFilterRule, FilterDecision, FilterFaultPolicy};
use crate::models::ModuleRequestContext;
use crate::repository::{RepositoryDescriptor, RepositoryId, RepositoryTransport};
use crate::scope::ConsumerScope;

/// Builds a [`RepositoryChain`] at configuration time.
///
/// Repositories are appended in declaration order; the position becomes the
/// descriptor's rank. Rules are attached before any resolution session
/// starts and are immutable once [`build`](Self::build) completes.
#[derive(Default)]
pub struct ChainBuilder {
    repositories: Vec<Arc<RepositoryDescriptor>>,
    fault_policy: FilterFaultPolicy,
}

impl ChainBuilder {
    /// Starts an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an unfiltered repository (always eligible).
    #[must_use]
    pub fn repository(
        self,
        id: impl Into<RepositoryId>,
        transport: Arc<dyn RepositoryTransport>,
    ) -> Self {
        self.push(id.into(), None, transport)
    }

    /// Appends a repository with a content filter rule.
    #[must_use]
    pub fn repository_with_rule(
        self,
        id: impl Into<RepositoryId>,
        transport: Arc<dyn RepositoryTransport>,
        rule: impl ContentFilterRule + 'static,
    ) -> Self {
        self.push(id.into(), Some(Box::new(rule)), transport)
    }

    /// Sets how filter rule faults are handled for this chain.
    #[must_use]
    pub fn fault_policy(mut self, policy: FilterFaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    fn push(
        mut self,
        id: RepositoryId,
        rule: Option<Box<dyn ContentFilterRule>>,
        transport: Arc<dyn RepositoryTransport>,
    ) -> Self {
        let rank = self.repositories.len();
        self.repositories.push(Arc::new(RepositoryDescriptor::new(id, rank, rule, transport)));
        self
    }

    /// Finalizes the chain. Descriptors are immutable from here on.
    #[must_use]
    pub fn build(self) -> RepositoryChain {
        RepositoryChain {
            repositories: self.repositories,
            fault_policy: self.fault_policy,
        }
    }
}

/// The ordered repository list for a resolution, shared read-only across
/// all concurrent sessions.
pub struct RepositoryChain {
    repositories: Vec<Arc<RepositoryDescriptor>>,
    fault_policy: FilterFaultPolicy,
}

impl RepositoryChain {
    /// The configured repositories in declaration order.
    #[must_use]
    pub fn repositories(&self) -> &[Arc<RepositoryDescriptor>] {
        &self.repositories
    }

    /// Number of configured repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    /// Whether the chain has no repositories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// The chain's filter fault policy.
    #[must_use]
    pub fn fault_policy(&self) -> FilterFaultPolicy {
        self.fault_policy
    }

    /// Produces the eligible subsequence of this chain for one module
    /// request, in declaration order, evaluating filters lazily through the
    /// scope's decision cache.
    pub fn filter<'a>(
        &'a self,
        ctx: &'a ModuleRequestContext,
        scope: &'a ConsumerScope,
    ) -> FilteredChain<'a> {
        FilteredChain {
            inner: self.repositories.iter(),
            ctx,
            scope,
            policy: self.fault_policy,
        }
    }
}

impl std::fmt::Debug for RepositoryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryChain")
            .field("repositories", &self.repositories)
            .field("fault_policy", &self.fault_policy)
            .finish()
    }
}

/// Lazy iterator over the repositories eligible for one module request.
///
/// Yields `Err` only when the chain is fail-closed and a rule faults;
/// otherwise each item is an eligible descriptor in rank order.
pub struct FilteredChain<'a> {
    inner: slice::Iter<'a, Arc<RepositoryDescriptor>>,
    ctx: &'a ModuleRequestContext,
    scope: &'a ConsumerScope,
    policy: FilterFaultPolicy,
}

impl Iterator for FilteredChain<'_> {
    type Item = Result<Arc<RepositoryDescriptor>>;

    fn next(&mut self) -> Option<Self::Item> {
        for descriptor in self.inner.by_ref() {
            match self.scope.filter_decision(descriptor, self.ctx, self.policy) {
                Ok(FilterDecision::Eligible) => return Some(Ok(Arc::clone(descriptor))),
                Ok(FilterDecision::Excluded) => {
                    debug!(
                        repository = %descriptor.id(),
                        module = %self.ctx.module(),
                        consumer = %self.ctx.consumer(),
                        "repository excluded by content filter"
                    );
                }
                Err(fault) => return Some(Err(fault)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::filter::exclude_if;
    use crate::models::{AttributeSet, VersionConstraint};
    use crate::scope::ResolutionSession;
    use crate::test_utils::InMemoryRepository;

    fn context(module: &str) -> ModuleRequestContext {
        ModuleRequestContext::new(
            module.parse().unwrap(),
            VersionConstraint::parse("1.0"),
            "conf".into(),
            AttributeSet::new(),
        )
    }

    fn transport() -> Arc<InMemoryRepository> {
        Arc::new(InMemoryRepository::new())
    }

    fn ids(chain: &RepositoryChain, ctx: &ModuleRequestContext, scope: &ConsumerScope) -> Vec<String> {
        chain
            .filter(ctx, scope)
            .map(|item| item.unwrap().id().to_string())
            .collect()
    }

    #[test]
    fn ranks_follow_declaration_order() {
        let chain = ChainBuilder::new()
            .repository("first", transport())
            .repository("second", transport())
            .repository("third", transport())
            .build();
        let ranks: Vec<usize> = chain.repositories().iter().map(|d| d.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn filtering_removes_without_reordering() {
        let chain = ChainBuilder::new()
            .repository("first", transport())
            .repository_with_rule("second", transport(), exclude_if(|ctx| ctx.module().group() == "org"))
            .repository("third", transport())
            .build();

        let session = ResolutionSession::new();
        let scope = session.scope(&"conf".into());
        let ctx = context("org:foo");
        assert_eq!(ids(&chain, &ctx, &scope), vec!["first", "third"]);
    }

    #[test]
    fn repositories_without_rules_are_never_excluded() {
        let chain = ChainBuilder::new()
            .repository("plain-a", transport())
            .repository("plain-b", transport())
            .build();

        let session = ResolutionSession::new();
        let scope = session.scope(&"conf".into());
        for module in ["org:foo", "com.example:bar", "net:baz"] {
            let ctx = context(module);
            assert_eq!(ids(&chain, &ctx, &scope), vec!["plain-a", "plain-b"]);
        }
    }

    #[test]
    fn filtering_is_idempotent_for_an_unchanged_context() {
        let chain = ChainBuilder::new()
            .repository_with_rule("a", transport(), exclude_if(|ctx| ctx.module().name() == "foo"))
            .repository("b", transport())
            .build();

        let session = ResolutionSession::new();
        let scope = session.scope(&"conf".into());
        let ctx = context("org:foo");

        let first = ids(&chain, &ctx, &scope);
        let second = ids(&chain, &ctx, &scope);
        assert_eq!(first, second);
        assert_eq!(first, vec!["b"]);
    }

    #[test]
    fn tail_filters_are_not_evaluated_when_iteration_stops_early() {
        let tail_evaluations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&tail_evaluations);
        let counting_rule = move |_: &crate::filter::FilterContext<'_>| -> anyhow::Result<FilterDecision> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(FilterDecision::Eligible)
        };

        let chain = ChainBuilder::new()
            .repository("head", transport())
            .repository_with_rule("tail", transport(), counting_rule)
            .build();

        let session = ResolutionSession::new();
        let scope = session.scope(&"conf".into());
        let ctx = context("org:foo");

        // Take only the first eligible repository, as the dispatcher does on
        // a successful lookup.
        let first = chain.filter(&ctx, &scope).next().unwrap().unwrap();
        assert_eq!(first.id().as_str(), "head");
        assert_eq!(tail_evaluations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn version_is_not_visible_to_rules() {
        // A rule keyed on module identity applies to every version of the
        // module; the decision is cached at module-identifier granularity.
        let chain = ChainBuilder::new()
            .repository_with_rule("a", transport(), exclude_if(|ctx| ctx.module().name() == "foo"))
            .build();

        let session = ResolutionSession::new();
        let scope = session.scope(&"conf".into());

        let exact = context("org:foo");
        assert!(ids(&chain, &exact, &scope).is_empty());

        let dynamic = ModuleRequestContext::new(
            "org:foo".parse().unwrap(),
            VersionConstraint::parse("+"),
            "conf".into(),
            AttributeSet::new(),
        );
        assert!(ids(&chain, &dynamic, &scope).is_empty());
    }
}

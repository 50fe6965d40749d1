//! Per-session consumer scopes and filter-decision caching.
//!
//! A [`ResolutionSession`] represents one resolve run. It hands out
//! [`ConsumerScope`]s idempotently: asking for the same consumer twice
//! within a session returns the same scope, and thus the same decision
//! cache. Asking across *different* sessions never shares state, even for
//! the same consumer name - isolation is guaranteed by scoping cache
//! ownership to the session object, not to the consumer id value. Two
//! configurations resolving against an identical repository set therefore
//! filter and resolve independently, even concurrently within one build
//! invocation.
//!
//! The cache memoizes filter outcomes per `(repository id, module
//! identifier)`. Within a session the cache supports concurrent reads, and
//! an uncached key is populated at-most-once: concurrent lookups racing on
//! the same key serialize on its vacant entry, so one rule evaluation wins
//! and the cache never returns inconsistent decisions for one key.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;

use crate::core::Result;
use crate::filter::{self, FilterContext, FilterDecision, FilterFaultPolicy};
use crate::models::{ConsumerId, ModuleIdentifier, ModuleRequestContext};
use crate::repository::{RepositoryDescriptor, RepositoryId};

/// One resolution run. Owns the consumer scopes created during the run and
/// the cancellation flag shared with in-flight dispatches.
#[derive(Debug, Default)]
pub struct ResolutionSession {
    scopes: DashMap<ConsumerId, Arc<ConsumerScope>>,
    cancelled: Arc<AtomicBool>,
}

impl ResolutionSession {
    /// Starts a fresh session with no cached decisions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scope for a consumer, creating it on first use.
    ///
    /// Idempotent within this session: repeated calls with the same consumer
    /// id return the same scope and share its cache.
    #[must_use]
    pub fn scope(&self, consumer: &ConsumerId) -> Arc<ConsumerScope> {
        self.scopes
            .entry(consumer.clone())
            .or_insert_with(|| {
                Arc::new(ConsumerScope::new(consumer.clone(), Arc::clone(&self.cancelled)))
            })
            .clone()
    }

    /// Aborts the session. In-flight module resolutions stop issuing further
    /// repository lookups at the next chain-step boundary; nothing needs to
    /// be rolled back since descriptors and cached decisions are read-only
    /// or additive.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A consumer's view of one resolution session: owns the filter evaluation
/// cache for that consumer.
///
/// Lifetime equals the session's; dropped with it. Never shared across
/// sessions.
#[derive(Debug)]
pub struct ConsumerScope {
    consumer: ConsumerId,
    decisions: DashMap<(RepositoryId, ModuleIdentifier), FilterDecision>,
    cancelled: Arc<AtomicBool>,
}

impl ConsumerScope {
    fn new(consumer: ConsumerId, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            consumer,
            decisions: DashMap::new(),
            cancelled,
        }
    }

    /// The consumer this scope belongs to.
    #[must_use]
    pub fn consumer(&self) -> &ConsumerId {
        &self.consumer
    }

    /// Whether the owning session has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// The cached decision for a `(repository, module)` pair, if one exists.
    /// Diagnostic accessor; resolution goes through the chain instead.
    #[must_use]
    pub fn cached_decision(
        &self,
        repository: &RepositoryId,
        module: &ModuleIdentifier,
    ) -> Option<FilterDecision> {
        self.decisions
            .get(&(repository.clone(), module.clone()))
            .map(|entry| *entry.value())
    }

    /// Returns the filter decision for one repository/request pair,
    /// evaluating and caching on miss.
    pub(crate) fn filter_decision(
        &self,
        descriptor: &RepositoryDescriptor,
        ctx: &ModuleRequestContext,
        policy: FilterFaultPolicy,
    ) -> Result<FilterDecision> {
        let key = (descriptor.id().clone(), ctx.module().clone());
        match self.decisions.entry(key) {
            Entry::Occupied(cached) => {
                trace!(
                    repository = %descriptor.id(),
                    module = %ctx.module(),
                    consumer = %self.consumer,
                    "filter decision served from cache"
                );
                Ok(*cached.get())
            }
            Entry::Vacant(slot) => {
                // Rules are synchronous and non-blocking, so evaluating
                // under the entry keeps population at-most-once per key.
                let filter_ctx = FilterContext::new(ctx.module(), ctx.consumer(), ctx.attributes());
                let decision =
                    filter::evaluate(descriptor.id(), descriptor.rule(), &filter_ctx, policy)?;
                slot.insert(decision);
                Ok(decision)
            }
        }
    }
}

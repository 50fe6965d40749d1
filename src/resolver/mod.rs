//! Chain traversal and short-circuit dispatch.
//!
//! The [`ResolutionDispatcher`] walks the filtered repository chain for one
//! module request, issuing lookups strictly sequentially: repository N+1 is
//! only tried after repository N's definitive non-match. First eligible
//! repository to produce a result wins - this is an ordering guarantee
//! observable by callers, not merely a performance optimization, so
//! attempts are never reordered or parallelized.
//!
//! # Outcome semantics
//!
//! - A repository that resolves the constraint short-circuits the rest of
//!   the chain
//! - A clean "not present" continues to the next repository
//! - A transport fault propagates verbatim ([`crate::core::ResolveError::LookupFault`]);
//!   swallowing it would mask infrastructure problems as missing modules
//! - Exhaustion (every repository filtered out or reporting not-present)
//!   yields [`ResolutionOutcome::Unresolved`] - a normal outcome, not an
//!   error, indistinguishable at the graph level from "excluded everywhere"
//!   (the distinction lives in the logs only)
//!
//! Cancelling the owning session stops the walk at the next chain-step
//! boundary with [`crate::core::ResolveError::Cancelled`].

use std::sync::Arc;

use tracing::{debug, trace};

use crate::chain::RepositoryChain;
use crate::core::{ResolveError, Result};
use crate::models::ModuleRequestContext;
use crate::repository::{self, LookupOutcome, MetadataHandle, RepositoryId};
use crate::scope::ConsumerScope;

/// Terminal state of one module resolution against a chain.
#[derive(Debug, Clone)]
pub enum ResolutionOutcome {
    /// A repository produced a definitive result.
    Resolved {
        /// The winning repository
        repository: RepositoryId,
        /// The concrete version the constraint resolved to
        version: String,
        /// Metadata retrieved for that version
        metadata: MetadataHandle,
    },
    /// The chain was exhausted without a result. Reported upward as an
    /// unresolved dependency, not as a fault.
    Unresolved,
}

impl ResolutionOutcome {
    /// Whether a repository produced a result.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// Walks filtered chains and reports resolution outcomes.
///
/// Holds the shared chain; all per-request and per-consumer state lives in
/// the [`ModuleRequestContext`] and [`ConsumerScope`] passed to
/// [`resolve`](Self::resolve), so one dispatcher serves any number of
/// concurrent sessions.
#[derive(Debug, Clone)]
pub struct ResolutionDispatcher {
    chain: Arc<RepositoryChain>,
}

impl ResolutionDispatcher {
    /// Creates a dispatcher over a configured chain.
    #[must_use]
    pub fn new(chain: Arc<RepositoryChain>) -> Self {
        Self { chain }
    }

    /// The chain this dispatcher walks.
    #[must_use]
    pub fn chain(&self) -> &Arc<RepositoryChain> {
        &self.chain
    }

    /// Resolves one module request against the chain.
    ///
    /// Eligible repositories are tried in declaration order until one
    /// yields a result; excluded repositories receive no transport calls at
    /// all, version listing included.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::LookupFault`] when a transport reports a failure
    ///   that is not a clean "not found"
    /// - [`ResolveError::FilterFault`] when the chain is fail-closed and a
    ///   rule faults
    /// - [`ResolveError::Cancelled`] when the session is aborted mid-walk
    pub async fn resolve(
        &self,
        ctx: &ModuleRequestContext,
        scope: &ConsumerScope,
    ) -> Result<ResolutionOutcome> {
        debug!(
            module = %ctx.module(),
            constraint = %ctx.constraint(),
            consumer = %ctx.consumer(),
            "resolving module against repository chain"
        );

        let mut candidates = self.chain.filter(ctx, scope);
        loop {
            if scope.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
            let Some(candidate) = candidates.next() else {
                break;
            };
            let descriptor = candidate?;

            trace!(repository = %descriptor.id(), module = %ctx.module(), "attempting repository");
            match repository::lookup(&descriptor, ctx.module(), ctx.constraint()).await? {
                LookupOutcome::Resolved(resolved) => {
                    debug!(
                        repository = %descriptor.id(),
                        module = %ctx.module(),
                        version = %resolved.version,
                        "module resolved"
                    );
                    return Ok(ResolutionOutcome::Resolved {
                        repository: descriptor.id().clone(),
                        version: resolved.version,
                        metadata: resolved.metadata,
                    });
                }
                LookupOutcome::NotFound => {
                    trace!(
                        repository = %descriptor.id(),
                        module = %ctx.module(),
                        "module not present, continuing down the chain"
                    );
                }
            }
        }

        debug!(module = %ctx.module(), consumer = %ctx.consumer(), "chain exhausted, module unresolved");
        Ok(ResolutionOutcome::Unresolved)
    }
}

//! Content filter rules and the eligibility decision protocol.
//!
//! A content filter rule is a user-registered predicate bound to one
//! repository. It sees a [`FilterContext`] - the module identifier, the
//! consumer, and the consumer's attributes - and decides whether the
//! repository is even worth querying for that module. The context
//! deliberately omits the version constraint: the canonical use case is
//! skipping a repository *before* any version listing happens, so the
//! decision must be reachable without knowing a version.
//!
//! Decisions must be pure with respect to outcome: re-evaluating with an
//! identical context must yield the same decision (diagnostic side effects
//! are tolerated). This is what allows the engine to cache decisions per
//! `(repository, module identifier)` within a session.
//!
//! # Fault policy
//!
//! A rule that raises a fault is handled per [`FilterFaultPolicy`]. The
//! default is fail-open: the repository is treated as eligible and the fault
//! is reported as a non-fatal diagnostic, since a broken filter must not
//! silently corrupt an otherwise resolvable dependency graph. Chains can opt
//! into fail-closed via [`crate::chain::ChainBuilder::fault_policy`], which
//! turns the fault into [`crate::core::ResolveError::FilterFault`].

use tracing::{trace, warn};

use crate::core::{ResolveError, Result};
use crate::models::{AttributeSet, ConsumerId, ModuleIdentifier};
use crate::repository::RepositoryId;

/// The outcome of evaluating a filter rule for one module request.
///
/// Exactly one decision exists per `(repository, module identifier)` pair
/// within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// The repository may be queried for this module.
    Eligible,
    /// The repository must not be queried for this module; no listing or
    /// metadata call will be issued.
    Excluded,
}

impl FilterDecision {
    /// Whether this decision allows the repository to be queried.
    #[must_use]
    pub fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// The view of a module request exposed to filter rules.
///
/// Narrower than [`crate::models::ModuleRequestContext`]: no version
/// constraint, since exclusion must be decidable before any version is
/// known.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    module: &'a ModuleIdentifier,
    consumer: &'a ConsumerId,
    attributes: &'a AttributeSet,
}

impl<'a> FilterContext<'a> {
    pub(crate) fn new(
        module: &'a ModuleIdentifier,
        consumer: &'a ConsumerId,
        attributes: &'a AttributeSet,
    ) -> Self {
        Self {
            module,
            consumer,
            attributes,
        }
    }

    /// The module being resolved (group and name only).
    #[must_use]
    pub fn module(&self) -> &ModuleIdentifier {
        self.module
    }

    /// The configuration on whose behalf resolution runs.
    #[must_use]
    pub fn consumer(&self) -> &ConsumerId {
        self.consumer
    }

    /// The consumer's declared resolution attributes.
    #[must_use]
    pub fn attributes(&self) -> &AttributeSet {
        self.attributes
    }
}

/// A user-registered predicate deciding repository eligibility for a module
/// request.
///
/// Implementations must be side-effect-free with respect to the decision:
/// the same context always yields the same decision. Rules are registered at
/// configuration time, before any resolution session starts, and are
/// immutable afterwards.
///
/// Closures implement this trait directly:
///
/// ```rust
/// use repochain::filter::{ContentFilterRule, FilterContext, FilterDecision};
///
/// let rule = |ctx: &FilterContext<'_>| -> anyhow::Result<FilterDecision> {
///     if ctx.module().group() == "com.internal" {
///         Ok(FilterDecision::Excluded)
///     } else {
///         Ok(FilterDecision::Eligible)
///     }
/// };
/// # fn assert_rule(_: impl ContentFilterRule) {}
/// # assert_rule(rule);
/// ```
pub trait ContentFilterRule: Send + Sync {
    /// Evaluates the rule for one module request.
    ///
    /// # Errors
    ///
    /// A returned error is a rule fault, handled per the chain's
    /// [`FilterFaultPolicy`]; it is never treated as an exclusion under the
    /// default policy.
    fn evaluate(&self, ctx: &FilterContext<'_>) -> anyhow::Result<FilterDecision>;
}

impl<F> ContentFilterRule for F
where
    F: Fn(&FilterContext<'_>) -> anyhow::Result<FilterDecision> + Send + Sync,
{
    fn evaluate(&self, ctx: &FilterContext<'_>) -> anyhow::Result<FilterDecision> {
        self(ctx)
    }
}

/// Builds a rule that excludes a request when `predicate` returns `true`.
///
/// Convenience for the common case where the user only states the exclusion
/// condition.
pub fn exclude_if<F>(predicate: F) -> impl ContentFilterRule
where
    F: Fn(&FilterContext<'_>) -> bool + Send + Sync,
{
    move |ctx: &FilterContext<'_>| {
        if predicate(ctx) {
            Ok(FilterDecision::Excluded)
        } else {
            Ok(FilterDecision::Eligible)
        }
    }
}

/// How the engine reacts when a filter rule raises a fault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterFaultPolicy {
    /// Treat the repository as eligible, report the fault as a non-fatal
    /// diagnostic, and continue. The default.
    #[default]
    FailOpen,
    /// Surface the fault as [`ResolveError::FilterFault`], aborting the
    /// module's resolution.
    FailClosed,
}

/// Engine-side rule evaluation: applies the registered rule (if any) and the
/// chain's fault policy.
pub(crate) fn evaluate(
    repository: &RepositoryId,
    rule: Option<&dyn ContentFilterRule>,
    ctx: &FilterContext<'_>,
    policy: FilterFaultPolicy,
) -> Result<FilterDecision> {
    let Some(rule) = rule else {
        // No registered rule behaves as an always-eligible rule.
        return Ok(FilterDecision::Eligible);
    };

    match rule.evaluate(ctx) {
        Ok(decision) => {
            trace!(
                repository = %repository,
                module = %ctx.module(),
                consumer = %ctx.consumer(),
                ?decision,
                "content filter evaluated"
            );
            Ok(decision)
        }
        Err(fault) => match policy {
            FilterFaultPolicy::FailOpen => {
                warn!(
                    repository = %repository,
                    module = %ctx.module(),
                    fault = %fault,
                    "content filter faulted; treating repository as eligible"
                );
                Ok(FilterDecision::Eligible)
            }
            FilterFaultPolicy::FailClosed => Err(ResolveError::FilterFault {
                repository: repository.clone(),
                module: ctx.module().clone(),
                source: fault,
            }),
        },
    }
}

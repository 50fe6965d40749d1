//! Repochain - Repository Content Filtering and Selection
//!
//! A library that decides, for each requested module and version, which of
//! several configured artifact repositories are eligible to be queried, and
//! in what order, before any network I/O happens. It sits on the critical
//! path of a dependency resolver: wrong filtering silently drops or wrongly
//! resolves dependencies, and the entire point of filtering is to avoid
//! expensive listing and metadata calls against repositories known not to
//! host a given module.
//!
//! # Architecture Overview
//!
//! Repochain follows a chain/session model where:
//! - A [`chain::RepositoryChain`] holds the configured repositories in
//!   declaration order, each with an optional content filter rule
//! - A [`scope::ResolutionSession`] scopes filter-decision caching to one
//!   resolution run, so concurrent consumers never observe each other's
//!   decisions
//! - A [`resolver::ResolutionDispatcher`] walks the filtered chain and stops
//!   at the first repository that yields a result
//!
//! ## Key Properties
//!
//! - **Order preserving**: filtering removes repositories, never reorders
//!   them; first eligible repository wins
//! - **I/O avoiding**: an excluded repository receives no transport calls at
//!   all, version listing for dynamic constraints included
//! - **Consumer isolated**: two sessions over the same repository set share
//!   no cached decisions, even for the same consumer name
//! - **Fail-open**: a faulting filter rule does not break resolution of an
//!   otherwise resolvable module (configurable per chain)
//!
//! # Core Modules
//!
//! - [`chain`] - Repository chain construction and lazy filtering
//! - [`core`] - Error types shared across the crate
//! - [`filter`] - Content filter rules, decisions, and fault policy
//! - [`models`] - Immutable request/identifier data model
//! - [`repository`] - Repository descriptors and the transport seam
//! - [`resolver`] - Chain traversal and short-circuit dispatch
//! - [`scope`] - Per-session consumer scopes and decision caching
//! - [`version`] - Dynamic selector matching and version ordering
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use repochain::chain::ChainBuilder;
//! use repochain::filter::exclude_if;
//! use repochain::models::{ModuleRequestContext, VersionConstraint};
//! use repochain::repository::RepositoryTransport;
//! use repochain::resolver::ResolutionDispatcher;
//! use repochain::scope::ResolutionSession;
//!
//! # async fn example(maven: Arc<dyn RepositoryTransport>, ivy: Arc<dyn RepositoryTransport>) -> anyhow::Result<()> {
//! // Configuration time: declare repositories in lookup order.
//! let chain = ChainBuilder::new()
//!     .repository_with_rule(
//!         "maven-central",
//!         maven,
//!         exclude_if(|ctx| ctx.module().group() == "com.internal"),
//!     )
//!     .repository("internal-mirror", ivy)
//!     .build();
//!
//! // Resolution time: one session per resolve run.
//! let session = ResolutionSession::new();
//! let scope = session.scope(&"compileClasspath".into());
//! let context = Arc::new(ModuleRequestContext::new(
//!     "com.internal:widget".parse()?,
//!     VersionConstraint::parse("1.0"),
//!     "compileClasspath".into(),
//!     Default::default(),
//! ));
//!
//! let dispatcher = ResolutionDispatcher::new(Arc::new(chain));
//! let outcome = dispatcher.resolve(&context, &scope).await?;
//! # Ok(())
//! # }
//! ```

// Core functionality modules
pub mod chain;
pub mod core;
pub mod filter;
pub mod repository;
pub mod resolver;
pub mod scope;

// Supporting modules
pub mod models;
pub mod version;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

//! Repository descriptors and the transport seam.
//!
//! A [`RepositoryDescriptor`] is one configured repository: a stable id, an
//! ordering rank fixed by declaration order, an optional content filter
//! rule, and an opaque transport handle. Descriptors are created at
//! configuration time and shared read-only across all concurrent sessions.
//!
//! The [`RepositoryTransport`] trait is the boundary to the metadata layer
//! (the only place network I/O happens). The engine calls it through
//! [`lookup`], which guarantees the call pattern the filtering properties
//! depend on: an exact constraint costs one metadata retrieval, a dynamic
//! constraint costs exactly one version listing followed by one metadata
//! retrieval for the selected version, and an excluded repository is never
//! reached at all (the dispatcher only walks the filtered chain).

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{ResolveError, Result};
use crate::filter::ContentFilterRule;
use crate::models::{ModuleIdentifier, VersionConstraint};
use crate::version;

/// Stable identifier of a configured repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryId(String);

impl RepositoryId {
    /// The repository id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RepositoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RepositoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to retrieved module metadata.
///
/// The engine never inspects the payload; it is handed through to the graph
/// builder so no second retrieval is needed after resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataHandle(Arc<serde_json::Value>);

impl MetadataHandle {
    /// Wraps a metadata payload produced by a transport.
    #[must_use]
    pub fn new(value: serde_json::Value) -> Self {
        Self(Arc::new(value))
    }

    /// The raw metadata payload.
    #[must_use]
    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// A module resolved against one repository: the selected version plus its
/// metadata.
#[derive(Debug, Clone)]
pub struct ResolvedModule {
    /// The concrete version the constraint resolved to
    pub version: String,
    /// Metadata retrieved for that version
    pub metadata: MetadataHandle,
}

/// Outcome of one repository lookup. Transport faults are reported as
/// [`ResolveError::LookupFault`], not as a variant here.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    /// The repository hosts the module; constraint resolved.
    Resolved(ResolvedModule),
    /// Clean negative: the repository does not host a matching module.
    NotFound,
}

/// The external metadata/transport collaborator for one repository.
///
/// Implementations perform the actual (network) I/O. Both operations return
/// `Ok(None)` for a clean "not present" and `Err` for transport faults,
/// which the engine propagates verbatim.
pub trait RepositoryTransport: Send + Sync {
    /// Lists the versions the repository publishes for a module.
    ///
    /// Only invoked for dynamic constraints. `Ok(None)` means the repository
    /// has no listing for the module at all.
    fn list_versions<'a>(
        &'a self,
        module: &'a ModuleIdentifier,
    ) -> BoxFuture<'a, anyhow::Result<Option<Vec<String>>>>;

    /// Retrieves metadata for one concrete version of a module.
    ///
    /// `Ok(None)` means the repository does not host that version.
    fn fetch_metadata<'a>(
        &'a self,
        module: &'a ModuleIdentifier,
        version: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<Option<MetadataHandle>>>;
}

/// One configured repository: id, declaration rank, optional filter rule,
/// transport handle. Immutable after configuration; shared read-only across
/// sessions.
pub struct RepositoryDescriptor {
    id: RepositoryId,
    rank: usize,
    rule: Option<Box<dyn ContentFilterRule>>,
    transport: Arc<dyn RepositoryTransport>,
}

impl RepositoryDescriptor {
    pub(crate) fn new(
        id: RepositoryId,
        rank: usize,
        rule: Option<Box<dyn ContentFilterRule>>,
        transport: Arc<dyn RepositoryTransport>,
    ) -> Self {
        Self {
            id,
            rank,
            rule,
            transport,
        }
    }

    /// The repository's stable id.
    #[must_use]
    pub fn id(&self) -> &RepositoryId {
        &self.id
    }

    /// Declaration order rank; lower ranks are attempted first.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// The registered content filter rule, if any.
    #[must_use]
    pub fn rule(&self) -> Option<&dyn ContentFilterRule> {
        self.rule.as_deref()
    }

    /// The repository's transport handle.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn RepositoryTransport> {
        &self.transport
    }
}

impl fmt::Debug for RepositoryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryDescriptor")
            .field("id", &self.id)
            .field("rank", &self.rank)
            .field("filtered", &self.rule.is_some())
            .finish_non_exhaustive()
    }
}

/// Resolves a constraint against one repository.
///
/// Exact constraints fetch metadata directly. Dynamic constraints list the
/// published versions once, select the best match, then fetch metadata for
/// it; a listing with no matching candidate is a clean [`LookupOutcome::NotFound`].
pub(crate) async fn lookup(
    descriptor: &RepositoryDescriptor,
    module: &ModuleIdentifier,
    constraint: &VersionConstraint,
) -> Result<LookupOutcome> {
    let transport = descriptor.transport();
    match constraint {
        VersionConstraint::Exact(requested) => {
            let metadata = transport
                .fetch_metadata(module, requested)
                .await
                .map_err(|fault| lookup_fault(descriptor, module, fault))?;
            match metadata {
                Some(metadata) => Ok(LookupOutcome::Resolved(ResolvedModule {
                    version: requested.clone(),
                    metadata,
                })),
                None => {
                    trace!(repository = %descriptor.id(), module = %module, version = %requested, "version not present");
                    Ok(LookupOutcome::NotFound)
                }
            }
        }
        VersionConstraint::Dynamic(selector) => {
            let listing = transport
                .list_versions(module)
                .await
                .map_err(|fault| lookup_fault(descriptor, module, fault))?;
            let Some(versions) = listing else {
                trace!(repository = %descriptor.id(), module = %module, "no version listing");
                return Ok(LookupOutcome::NotFound);
            };
            let Some(selected) = version::select_best(selector, versions.iter().map(String::as_str))
            else {
                trace!(repository = %descriptor.id(), module = %module, "listing has no matching version");
                return Ok(LookupOutcome::NotFound);
            };
            let selected = selected.to_string();
            let metadata = transport
                .fetch_metadata(module, &selected)
                .await
                .map_err(|fault| lookup_fault(descriptor, module, fault))?;
            match metadata {
                Some(metadata) => Ok(LookupOutcome::Resolved(ResolvedModule {
                    version: selected,
                    metadata,
                })),
                None => {
                    // Listed but metadata missing; treated as a per-repository miss.
                    trace!(repository = %descriptor.id(), module = %module, version = %selected, "listed version has no metadata");
                    Ok(LookupOutcome::NotFound)
                }
            }
        }
    }
}

fn lookup_fault(
    descriptor: &RepositoryDescriptor,
    module: &ModuleIdentifier,
    fault: anyhow::Error,
) -> ResolveError {
    ResolveError::LookupFault {
        repository: descriptor.id().clone(),
        module: module.clone(),
        source: fault,
    }
}

//! Test fixtures for exercising the filtering and selection engine.
//!
//! [`InMemoryRepository`] is a [`RepositoryTransport`] backed by a map of
//! published versions. It records every listing and metadata call, which is
//! how tests assert the engine's central property: an excluded repository
//! receives zero transport calls.
//!
//! This module is available to unit tests and, via the `test-utils`
//! feature, to integration tests.

use std::collections::{BTreeMap, HashMap};
use std::future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;
use serde_json::json;

use crate::models::ModuleIdentifier;
use crate::repository::{MetadataHandle, RepositoryTransport};

/// The conventional artifact file name for a module version, e.g.
/// `foo-1.0.jar` for `org:foo` at `1.0`.
#[must_use]
pub fn artifact_name(module: &ModuleIdentifier, version: &str) -> String {
    format!("{}-{}.jar", module.name(), version)
}

/// An in-memory repository transport with call accounting.
///
/// Versions are published per module; metadata is synthesized as a small
/// JSON document carrying the conventional artifact name.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    modules: HashMap<ModuleIdentifier, BTreeMap<String, MetadataHandle>>,
    listing_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
}

impl InMemoryRepository {
    /// Creates an empty repository hosting no modules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the given versions of a module (`"group:name"` form).
    #[must_use]
    pub fn with_module(mut self, module: &str, versions: &[&str]) -> Self {
        let module: ModuleIdentifier = module.parse().expect("valid module id in fixture");
        let entry = self.modules.entry(module.clone()).or_default();
        for version in versions {
            let metadata = MetadataHandle::new(json!({
                "artifact": artifact_name(&module, version),
                "version": version,
            }));
            entry.insert((*version).to_string(), metadata);
        }
        self
    }

    /// Number of version listings issued against this repository.
    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    /// Number of metadata retrievals issued against this repository.
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    /// Total transport calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.listing_calls() + self.metadata_calls()
    }
}

impl RepositoryTransport for InMemoryRepository {
    fn list_versions<'a>(
        &'a self,
        module: &'a ModuleIdentifier,
    ) -> BoxFuture<'a, anyhow::Result<Option<Vec<String>>>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        let listing = self
            .modules
            .get(module)
            .map(|versions| versions.keys().cloned().collect());
        Box::pin(future::ready(Ok(listing)))
    }

    fn fetch_metadata<'a>(
        &'a self,
        module: &'a ModuleIdentifier,
        version: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<Option<MetadataHandle>>> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        let metadata = self.modules.get(module).and_then(|versions| versions.get(version)).cloned();
        Box::pin(future::ready(Ok(metadata)))
    }
}

/// A transport whose every call fails, for fault propagation tests.
#[derive(Debug)]
pub struct FailingRepository {
    message: String,
}

impl FailingRepository {
    /// Creates a transport that fails with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl RepositoryTransport for FailingRepository {
    fn list_versions<'a>(
        &'a self,
        _module: &'a ModuleIdentifier,
    ) -> BoxFuture<'a, anyhow::Result<Option<Vec<String>>>> {
        Box::pin(future::ready(Err(anyhow::anyhow!(self.message.clone()))))
    }

    fn fetch_metadata<'a>(
        &'a self,
        _module: &'a ModuleIdentifier,
        _version: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<Option<MetadataHandle>>> {
        Box::pin(future::ready(Err(anyhow::anyhow!(self.message.clone()))))
    }
}

//! Error handling for repochain.
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** for precise handling in code
//! 2. **Containment by category**: faults raised by user-supplied filter
//!    rules are contained locally (fail-open by default), while faults from
//!    the repository transport propagate verbatim, since only the caller can
//!    decide whether a partial dependency graph is acceptable
//!
//! # Error Categories
//!
//! - [`ResolveError::FilterFault`] - a content filter rule raised an error
//!   during evaluation; only surfaced when the chain is configured
//!   fail-closed, otherwise contained and logged
//! - [`ResolveError::LookupFault`] - the transport reported a transient or
//!   hard failure that is not a clean "not found"; never swallowed, since
//!   treating it as unresolved would mask real infrastructure problems
//! - [`ResolveError::InvalidModuleIdentifier`] - a module identifier string
//!   did not have the `group:name` shape
//! - [`ResolveError::Cancelled`] - the resolution session was aborted;
//!   in-flight modules stop at the next chain-step boundary
//!
//! A clean "not found" from a repository and an exhausted chain are *not*
//! errors; they surface as [`crate::resolver::ResolutionOutcome::Unresolved`].

use thiserror::Error;

use crate::models::ModuleIdentifier;
use crate::repository::RepositoryId;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// The main error type for repository selection and resolution.
///
/// Faults originating in user-supplied code (filter rules, transports) carry
/// the underlying [`anyhow::Error`] so callers keep the full causal chain.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A content filter rule raised an error while evaluating a module
    /// request. Only returned when the owning chain uses
    /// [`crate::filter::FilterFaultPolicy::FailClosed`]; the default
    /// fail-open policy contains the fault and treats the repository as
    /// eligible.
    #[error("content filter for repository '{repository}' failed while evaluating '{module}'")]
    FilterFault {
        /// Repository whose rule faulted
        repository: RepositoryId,
        /// Module request being evaluated
        module: ModuleIdentifier,
        /// The underlying fault from the rule
        #[source]
        source: anyhow::Error,
    },

    /// The repository transport reported a failure that is not a clean
    /// "module not present" result.
    #[error("lookup against repository '{repository}' failed for '{module}'")]
    LookupFault {
        /// Repository whose transport faulted
        repository: RepositoryId,
        /// Module request being looked up
        module: ModuleIdentifier,
        /// The underlying transport fault
        #[source]
        source: anyhow::Error,
    },

    /// A module identifier string could not be parsed as `group:name`.
    #[error("invalid module identifier '{input}': expected 'group:name'")]
    InvalidModuleIdentifier {
        /// The rejected input
        input: String,
    },

    /// The resolution session was cancelled while this module was in flight.
    #[error("resolution session was cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_fault_display_names_repository_and_module() {
        let err = ResolveError::FilterFault {
            repository: RepositoryId::from("maven-central"),
            module: "org:foo".parse().unwrap(),
            source: anyhow::anyhow!("rule panicked"),
        };
        let message = err.to_string();
        assert!(message.contains("maven-central"));
        assert!(message.contains("org:foo"));
    }

    #[test]
    fn lookup_fault_preserves_source_chain() {
        let err = ResolveError::LookupFault {
            repository: RepositoryId::from("repo-a"),
            module: "org:foo".parse().unwrap(),
            source: anyhow::anyhow!("connection reset"),
        };
        let source = std::error::Error::source(&err).expect("source preserved");
        assert_eq!(source.to_string(), "connection reset");
    }

    #[test]
    fn invalid_identifier_reports_input() {
        let err = ResolveError::InvalidModuleIdentifier {
            input: "no-colon".to_string(),
        };
        assert!(err.to_string().contains("no-colon"));
    }
}

//! Core types and error handling for repochain.
//!
//! This module provides the error taxonomy shared across the crate. The
//! taxonomy deliberately keeps "module absent" out of the error space:
//! a clean negative from a repository and chain exhaustion are both normal
//! outcomes, reported through [`crate::resolver::ResolutionOutcome`] rather
//! than through [`ResolveError`].

pub mod error;

pub use error::{ResolveError, Result};

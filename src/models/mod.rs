//! Immutable data model for module requests.
//!
//! This module provides the value types that describe one module lookup:
//! what is being resolved ([`ModuleIdentifier`], [`VersionConstraint`]), on
//! whose behalf ([`ConsumerId`], [`AttributeSet`]), and the combined
//! [`ModuleRequestContext`] that travels, by reference, across every
//! repository evaluated for that lookup.
//!
//! All types here are value-equal and immutable: a context is created once
//! per lookup attempt and never mutated, which is what makes filter-decision
//! caching sound.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::ResolveError;

/// Identifies a module irrespective of version: a `(group, name)` pair.
///
/// Displayed and parsed as `group:name`, e.g. `org.slf4j:slf4j-api`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleIdentifier {
    group: String,
    name: String,
}

impl ModuleIdentifier {
    /// Creates a module identifier from its group and name components.
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// The module's group (organization) component.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The module's name component.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

impl FromStr for ModuleIdentifier {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((group, name)) if !group.is_empty() && !name.is_empty() && !name.contains(':') => {
                Ok(Self::new(group, name))
            }
            _ => Err(ResolveError::InvalidModuleIdentifier {
                input: s.to_string(),
            }),
        }
    }
}

/// A version constraint: either an exact version or a dynamic selector that
/// requires a version listing before it can be satisfied.
///
/// Dynamic constraints are the reason filter rules never see versions:
/// a repository must be excludable *before* any listing happens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionConstraint {
    /// Matches exactly one version string (e.g. `"1.0"`).
    Exact(String),
    /// Matches a set of versions; resolution picks the highest candidate
    /// from the repository's listing.
    Dynamic(DynamicSelector),
}

/// The dynamic selector forms understood by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DynamicSelector {
    /// `+` - any version; highest available wins.
    Any,
    /// `1.+` style prefix wildcard; the stored string is the literal prefix
    /// (here `"1."`) that candidate versions must start with.
    Prefix(String),
    /// `latest` marker; equivalent to [`DynamicSelector::Any`] for selection
    /// but kept distinct so diagnostics can echo the user's spelling.
    Latest,
}

impl VersionConstraint {
    /// Parses a constraint string.
    ///
    /// `+` and `latest` select any version, a trailing `.+` selects by
    /// prefix, and everything else is an exact version. Parsing never fails:
    /// an unrecognized string is an exact version that simply won't match
    /// anything the repository does not literally publish.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "+" => Self::Dynamic(DynamicSelector::Any),
            "latest" => Self::Dynamic(DynamicSelector::Latest),
            _ => match s.strip_suffix('+') {
                Some(prefix) if prefix.ends_with('.') => {
                    Self::Dynamic(DynamicSelector::Prefix(prefix.to_string()))
                }
                _ => Self::Exact(s.to_string()),
            },
        }
    }

    /// Whether satisfying this constraint requires a version listing.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(version) => f.write_str(version),
            Self::Dynamic(DynamicSelector::Any) => f.write_str("+"),
            Self::Dynamic(DynamicSelector::Latest) => f.write_str("latest"),
            Self::Dynamic(DynamicSelector::Prefix(prefix)) => write!(f, "{prefix}+"),
        }
    }
}

/// Opaque name of the configuration on whose behalf resolution runs.
///
/// The engine only ever compares these for equality; it never interprets
/// the contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConsumerId(String);

impl ConsumerId {
    /// The consumer name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConsumerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConsumerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed attribute value carried in a consumer's [`AttributeSet`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Textual attribute value
    String(String),
    /// Boolean attribute value
    Bool(bool),
    /// Integral attribute value
    Integer(i64),
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

/// The consumer's resolution requirements as an ordered name/value mapping.
///
/// Snapshot taken at resolution start; the engine treats it as opaque beyond
/// name lookup and equality. Iteration order is deterministic (sorted by
/// attribute name).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSet {
    entries: BTreeMap<String, AttributeValue>,
}

impl AttributeSet {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this set with one attribute added or replaced.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries.get(name)
    }

    /// Whether the set contains the given name/value pair.
    #[must_use]
    pub fn contains(&self, name: &str, value: impl Into<AttributeValue>) -> bool {
        self.entries.get(name) == Some(&value.into())
    }

    /// Iterates attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of attributes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Immutable description of one module lookup attempt.
///
/// Created once per lookup and shared by reference across all repositories
/// evaluated for it. Filter rules see a narrowed view of this context
/// ([`crate::filter::FilterContext`]) that omits the version constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRequestContext {
    module: ModuleIdentifier,
    constraint: VersionConstraint,
    consumer: ConsumerId,
    attributes: AttributeSet,
}

impl ModuleRequestContext {
    /// Creates a request context for one module lookup.
    pub fn new(
        module: ModuleIdentifier,
        constraint: VersionConstraint,
        consumer: ConsumerId,
        attributes: AttributeSet,
    ) -> Self {
        Self {
            module,
            constraint,
            consumer,
            attributes,
        }
    }

    /// The module being resolved.
    #[must_use]
    pub fn module(&self) -> &ModuleIdentifier {
        &self.module
    }

    /// The requested version constraint.
    #[must_use]
    pub fn constraint(&self) -> &VersionConstraint {
        &self.constraint
    }

    /// The configuration on whose behalf resolution runs.
    #[must_use]
    pub fn consumer(&self) -> &ConsumerId {
        &self.consumer
    }

    /// The consumer's declared resolution attributes.
    #[must_use]
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }
}

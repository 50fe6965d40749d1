//! Version ordering and dynamic selector matching.
//!
//! Repositories publish version strings, not parsed versions, so ordering
//! has to cope with tags that are not valid semver - two-component versions
//! like `1.0` and `1.10` are the norm for the coordinates this engine
//! filters. The rules here mirror common resolver behavior:
//!
//! - A leading `v` is tolerated (`v1.2.0` orders like `1.2.0`)
//! - Two parseable versions order by semantic version precedence
//! - Everything else orders by dot-separated segments: numeric segments
//!   compare numerically (`1.10` ranks above `1.9`), missing segments count
//!   as zero, numeric segments rank above non-numeric ones, and a plain
//!   lexicographic comparison is only the final tiebreak
//!
//! Dynamic selectors ([`DynamicSelector`]) are matched against raw version
//! strings; [`select_best`] picks the highest matching candidate from a
//! repository listing.

use std::cmp::Ordering;

use semver::Version;

use crate::models::DynamicSelector;

/// Attempts a lenient semver parse, tolerating a leading `v`.
fn parse_lenient(version: &str) -> Option<Version> {
    Version::parse(version.strip_prefix('v').unwrap_or(version)).ok()
}

/// Orders two version strings.
///
/// Two parseable semantic versions order by precedence. Otherwise the
/// strings are compared as dot-separated segments, numerically where both
/// segments are numeric (so `1.10` ranks above `1.9`), padding missing
/// segments with zero. Total and deterministic for any pair of inputs.
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse_lenient(a), parse_lenient(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        _ => compare_segments(a, b),
    }
}

/// Dot-separated segment comparison for version strings that are not both
/// valid semver. Numeric segments rank above non-numeric ones (a release
/// outranks a suffixed tag at the same position).
fn compare_segments(a: &str, b: &str) -> Ordering {
    let mut left = a.strip_prefix('v').unwrap_or(a).split('.');
    let mut right = b.strip_prefix('v').unwrap_or(b).split('.');
    loop {
        let (sa, sb) = match (left.next(), right.next()) {
            (None, None) => break,
            (sa, sb) => (sa.unwrap_or("0"), sb.unwrap_or("0")),
        };
        let ord = match (sa.parse::<u64>(), sb.parse::<u64>()) {
            (Ok(na), Ok(nb)) => na.cmp(&nb),
            (Ok(_), Err(_)) => Ordering::Greater,
            (Err(_), Ok(_)) => Ordering::Less,
            (Err(_), Err(_)) => sa.cmp(sb),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.cmp(b)
}

/// Whether a published version string satisfies a dynamic selector.
#[must_use]
pub fn matches(selector: &DynamicSelector, version: &str) -> bool {
    match selector {
        DynamicSelector::Any | DynamicSelector::Latest => true,
        DynamicSelector::Prefix(prefix) => version
            .strip_prefix('v')
            .unwrap_or(version)
            .starts_with(prefix),
    }
}

/// Selects the highest version from `candidates` that satisfies `selector`.
///
/// Returns `None` when no candidate matches, which callers treat as a clean
/// "not present in this repository" result.
#[must_use]
pub fn select_best<'a, I>(selector: &DynamicSelector, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter(|candidate| matches(selector, candidate))
        .max_by(|a, b| compare(a, b))
}

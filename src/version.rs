//! Version string normalization and comparison.
//!
//! Release pages express versions inconsistently: `v12.0`,
//! `Version 12.0.1-beta`, `12`, `131.0.6778.86`. Everything here funnels
//! those strings into a [`SemanticVersion`], a plain `major.minor.patch`
//! triple, so that any two versions can be ordered.
//!
//! Normalization is total: it never fails, and garbage becomes `0.0.0`.
//! Use [`is_valid`] to tell a real `0.0.0` apart from input that had no
//! digits at all.
//!
//! # Example
//!
//! ```
//! use upwatch::version::{is_newer, normalize};
//!
//! assert_eq!(normalize("v12.0").to_string(), "12.0.0");
//! assert_eq!(normalize("Version 12.0.1-beta").to_string(), "12.0.1");
//! assert!(is_newer("115.0", "100.0.0"));
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

/// Number of components kept after normalization.
const COMPONENTS: usize = 3;

/// Free-text version patterns, most specific first.
static VERSION_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"\d+\.\d+\.\d+\.\d+").expect("valid regex"),
        Regex::new(r"\d+\.\d+\.\d+").expect("valid regex"),
        Regex::new(r"\d+\.\d+").expect("valid regex"),
    ]
});

/// A canonical `major.minor.patch` version.
///
/// Always exactly three components and never carries pre-release or build
/// metadata, so ordering is plain lexicographic order on the triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct SemanticVersion(semver::Version);

impl SemanticVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Borrows the underlying [`semver::Version`].
    pub fn as_semver(&self) -> &semver::Version {
        &self.0
    }
}

impl Default for SemanticVersion {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0.major, self.0.minor, self.0.patch)
    }
}

impl From<&semver::Version> for SemanticVersion {
    fn from(version: &semver::Version) -> Self {
        Self::new(version.major, version.minor, version.patch)
    }
}

impl From<String> for SemanticVersion {
    fn from(raw: String) -> Self {
        normalize(&raw)
    }
}

impl From<SemanticVersion> for String {
    fn from(version: SemanticVersion) -> Self {
        version.to_string()
    }
}

/// Keeps only ASCII digits and dots.
fn clean(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Normalizes an arbitrary version string into a [`SemanticVersion`].
///
/// Every character that is not a digit or `.` is dropped, the rest is split
/// on `.`, padded with zeros to three components and truncated to three.
/// Empty or unparseable components become `0`.
///
/// ```
/// use upwatch::version::normalize;
///
/// assert_eq!(normalize("").to_string(), "0.0.0");
/// assert_eq!(normalize("131.0.6778.86").to_string(), "131.0.6778");
/// ```
pub fn normalize(raw: &str) -> SemanticVersion {
    let cleaned = clean(raw);
    let mut parts = [0u64; COMPONENTS];

    for (slot, segment) in parts.iter_mut().zip(cleaned.split('.')) {
        *slot = segment.parse().unwrap_or(0);
    }

    SemanticVersion::new(parts[0], parts[1], parts[2])
}

/// Returns `false` when the input contains no digits at all.
pub fn is_valid(raw: &str) -> bool {
    raw.chars().any(|c| c.is_ascii_digit())
}

/// Compares two version strings after normalization.
///
/// Returns [`Ordering::Equal`] if either side is invalid.
pub fn compare(a: &str, b: &str) -> Ordering {
    if !is_valid(a) || !is_valid(b) {
        return Ordering::Equal;
    }
    normalize(a).cmp(&normalize(b))
}

/// Returns true if `candidate` is strictly newer than `baseline`.
///
/// Invalid input on either side is never newer.
pub fn is_newer(candidate: &str, baseline: &str) -> bool {
    compare(candidate, baseline) == Ordering::Greater
}

/// Pulls the first version-looking token out of free text.
///
/// Four-part versions win over three-part, which win over two-part.
pub fn extract_version(text: &str) -> Option<&str> {
    VERSION_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map(|m| m.as_str())
}

//! Prefix-tolerant semantic version handling for release tags
//!
//! Release tags usually look like `v1.2.3`, but the leading character is
//! only decoration. Every function here splits off one optional non-digit
//! prefix, parses the rest as a strict semver version and orders by semver
//! precedence. Build metadata never affects ordering.

use std::cmp::Ordering;
use std::fmt;

use semver::Version;

/// A release tag whose body is a valid semantic version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
    prefix: String,
    version: Version,
}

impl VersionTag {
    /// Parse a tag, returning `None` if the body is not valid semver.
    ///
    /// Examples:
    /// - "v1.2.3" -> prefix "v", version 1.2.3
    /// - "1.2.3-rc.1" -> no prefix, version 1.2.3-rc.1
    /// - "v1.2" -> None (partial versions are not accepted)
    pub fn parse(tag: &str) -> Option<Self> {
        let (prefix, body) = normalize(tag);
        let version = Version::parse(body).ok()?;
        Some(Self {
            prefix: prefix.to_string(),
            version,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn is_prerelease(&self) -> bool {
        !self.version.pre.is_empty()
    }

    /// Order two tags by semver precedence, ignoring prefix and build metadata.
    pub fn precedence(&self, other: &Self) -> Ordering {
        let a = &self.version;
        let b = &other.version;
        (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.version)
    }
}

/// Split a tag into `(prefix, body)`.
///
/// A single leading non-digit character is treated as the prefix.
pub fn normalize(tag: &str) -> (&str, &str) {
    match tag.chars().next() {
        Some(c) if !c.is_ascii_digit() => tag.split_at(c.len_utf8()),
        _ => ("", tag),
    }
}

pub fn is_valid(tag: &str) -> bool {
    VersionTag::parse(tag).is_some()
}

/// True only for valid tags carrying a prerelease component.
pub fn is_prerelease(tag: &str) -> bool {
    VersionTag::parse(tag).is_some_and(|t| t.is_prerelease())
}

/// Compare two tags. Invalid or empty tags sort below every valid tag and
/// equal to each other.
pub fn compare(a: &str, b: &str) -> Ordering {
    compare_parsed(VersionTag::parse(a).as_ref(), VersionTag::parse(b).as_ref())
}

pub(crate) fn compare_parsed(a: Option<&VersionTag>, b: Option<&VersionTag>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.precedence(b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

//! Semantic version ordering on specifier cores

use std::fmt;

use semver::Version;

/// Kind of bump between a current version and a newer one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateType {
    Major,
    Minor,
    Patch,
    Prerelease,
    None,
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateType::Major => "major",
            UpdateType::Minor => "minor",
            UpdateType::Patch => "patch",
            UpdateType::Prerelease => "prerelease",
            UpdateType::None => "none",
        };
        f.write_str(s)
    }
}

fn strip_operator(version: &str) -> &str {
    let version = version.trim();
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('='))
        .unwrap_or(version)
}

/// Parse a complete `major.minor.patch` version, with optional prerelease
/// and build metadata. A leading `v` or `=` is stripped.
pub fn parse_exact(version: &str) -> Option<Version> {
    Version::parse(strip_operator(version)).ok()
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// A leading `v` or `=` is stripped and partial versions are padded with zeros.
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "v1.2.3" -> Version(1, 2, 3)
pub fn parse_semver(version: &str) -> Option<Version> {
    let version = strip_operator(version);

    let core_end = version.find(['-', '+']).unwrap_or(version.len());
    let (core, rest) = version.split_at(core_end);
    let normalized = match core.split('.').count() {
        1 => format!("{core}.0.0{rest}"),
        2 => format!("{core}.0{rest}"),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// `a < b` under semantic-version precedence.
///
/// Both sides must be complete versions. Anything else (a partial version,
/// a range, a tag name) yields `false`, so callers never report an upgrade
/// for it.
pub fn lt(a: &str, b: &str) -> bool {
    match (parse_exact(a), parse_exact(b)) {
        (Some(a), Some(b)) => a < b,
        _ => false,
    }
}

/// First prerelease identifier when it is alphanumeric (`beta` in `2.0.0-beta.1`)
pub fn prerelease_id(version: &str) -> Option<String> {
    let parsed = parse_exact(version)?;
    let first = parsed.pre.as_str().split('.').next()?;
    if first.is_empty() || first.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(first.to_string())
}

/// Classify the jump from `current` to `latest` on the numeric triple.
///
/// Partial versions are padded, so `4` against `4.17.21` is a minor bump.
///
/// A prerelease of the same triple moving to its release is `Prerelease`;
/// anything that is not a step forward is `None`.
pub fn update_type(current: &str, latest: &str) -> UpdateType {
    let (Some(cur), Some(lat)) = (parse_semver(current), parse_semver(latest)) else {
        return UpdateType::None;
    };

    if lat.major != cur.major {
        return if lat.major > cur.major {
            UpdateType::Major
        } else {
            UpdateType::None
        };
    }
    if lat.minor != cur.minor {
        return if lat.minor > cur.minor {
            UpdateType::Minor
        } else {
            UpdateType::None
        };
    }
    if lat.patch != cur.patch {
        return if lat.patch > cur.patch {
            UpdateType::Patch
        } else {
            UpdateType::None
        };
    }

    if !cur.pre.is_empty() && lat.pre.is_empty() {
        UpdateType::Prerelease
    } else {
        UpdateType::None
    }
}

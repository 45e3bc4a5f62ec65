//! Dependency specifier grammar
//!
//! A specifier is the raw string written next to a dependency name, e.g.
//! `^1.2.3`, `npm:~2.0.0`, `workspace:*`, `catalog:react18` or `jsr:^1.1.4`.
//! It is decomposed into an optional protocol, a range prefix and the
//! remaining core string.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// URL-like specifiers are not backed by a registry and are never parsed
const URL_PREFIXES: [&str; 4] = ["http://", "https://", "git://", "git+"];

static DIST_TAG_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][\w.-]*$").expect("valid dist-tag pattern"));

static V_PREFIXED_SEMVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+\.\d+\.\d+").expect("valid semver pattern"));

/// Leading `xxx:` qualifier of a specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Npm,
    Workspace,
    Catalog,
    Jsr,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Npm => "npm",
            Protocol::Workspace => "workspace",
            Protocol::Catalog => "catalog",
            Protocol::Jsr => "jsr",
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "npm" => Ok(Protocol::Npm),
            "workspace" => Ok(Protocol::Workspace),
            "catalog" => Ok(Protocol::Catalog),
            "jsr" => Ok(Protocol::Jsr),
            _ => Err(()),
        }
    }
}

/// Range operator directly preceding the semver core
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RangePrefix {
    #[default]
    None,
    Caret,
    Tilde,
}

impl RangePrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangePrefix::None => "",
            RangePrefix::Caret => "^",
            RangePrefix::Tilde => "~",
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            '^' => Some(RangePrefix::Caret),
            '~' => Some(RangePrefix::Tilde),
            _ => None,
        }
    }
}

/// Canonical decomposition of a specifier string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedVersion {
    pub protocol: Option<Protocol>,
    pub prefix: RangePrefix,
    /// Remaining core: a semver string, a dist-tag, a catalog name, `*`...
    pub semver: String,
}

impl ParsedVersion {
    /// Same protocol and prefix, different core
    pub fn with_semver(&self, semver: impl Into<String>) -> Self {
        Self {
            protocol: self.protocol,
            prefix: self.prefix,
            semver: semver.into(),
        }
    }

    /// Whether version completion, upgrade and deprecation checks apply
    pub fn is_supported(&self) -> bool {
        is_supported_protocol(self.protocol)
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(protocol) = self.protocol {
            write!(f, "{}:", protocol.as_str())?;
        }
        write!(f, "{}{}", self.prefix.as_str(), self.semver)
    }
}

/// Parse a raw specifier.
///
/// Returns `None` for URL-like specifiers and for unknown `xxx:` qualifiers
/// (`file:`, `link:`, `github:`...).
pub fn parse_version(raw: &str) -> Option<ParsedVersion> {
    let raw = raw.trim();

    if URL_PREFIXES.iter().any(|prefix| raw.starts_with(prefix)) {
        return None;
    }

    let (protocol, rest) = match raw.split_once(':') {
        Some((candidate, rest)) => (Some(candidate.parse::<Protocol>().ok()?), rest),
        None => (None, raw),
    };

    let mut chars = rest.chars();
    let (prefix, semver) = match chars.next().and_then(RangePrefix::from_char) {
        Some(prefix) => (prefix, chars.as_str()),
        None => (RangePrefix::None, rest),
    };

    Some(ParsedVersion {
        protocol,
        prefix,
        semver: semver.to_string(),
    })
}

/// Inverse of [`parse_version`]
pub fn format_version(parsed: &ParsedVersion) -> String {
    parsed.to_string()
}

/// `true` for registry-backed specifiers (no protocol or `npm:`)
pub fn is_supported_protocol(protocol: Option<Protocol>) -> bool {
    matches!(protocol, None | Some(Protocol::Npm))
}

/// Whether a specifier core looks like a dist-tag name (`latest`, `next`, `edge-channel`)
///
/// A `v`-prefixed exact version such as `v1.2.3` is not tag-like. Wildcards
/// like `*` never match.
pub fn is_dist_tag_like(semver: &str) -> bool {
    DIST_TAG_LIKE.is_match(semver) && !V_PREFIXED_SEMVER.is_match(semver)
}

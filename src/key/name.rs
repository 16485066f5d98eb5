//! Key name model: namespaces, path segments, and placeholder syntax.

use crate::error::KeyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Namespace root of a key name
///
/// A cascading name (leading `/`) carries no namespace of its own and is
/// matched against the namespace roots in priority order during lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    User,
    System,
    Cascade,
}

impl Namespace {
    /// Prefix as written in the textual form of a name
    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::User => "user:",
            Namespace::System => "system:",
            Namespace::Cascade => "",
        }
    }

    /// Lookup priority for cascading names, highest first
    pub fn cascade_order() -> [Namespace; 2] {
        [Namespace::User, Namespace::System]
    }
}

/// One path segment of a key name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Plain identifier, passed through resolution unchanged
    Literal(String),
    /// Named placeholder `%tag%`, substituted from the active layer set
    Placeholder(String),
    /// Anonymous wildcard `%`, also the degraded form of an unresolved tag
    Wildcard,
}

impl Segment {
    fn parse(text: &str) -> Result<Self, KeyError> {
        if text.is_empty() {
            return Err(KeyError::InvalidName("empty path segment".to_string()));
        }
        let normalized: String = text.nfc().collect();
        if normalized == "%" {
            return Ok(Segment::Wildcard);
        }
        if normalized.len() > 2 && normalized.starts_with('%') && normalized.ends_with('%') {
            let tag = normalized[1..normalized.len() - 1].to_string();
            return Ok(Segment::Placeholder(tag));
        }
        if normalized == "%%" {
            return Err(KeyError::InvalidName("empty placeholder tag".to_string()));
        }
        Ok(Segment::Literal(normalized))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => write!(f, "{}", text),
            Segment::Placeholder(tag) => write!(f, "%{}%", tag),
            Segment::Wildcard => write!(f, "%"),
        }
    }
}

/// Structured key name: a namespace plus a non-empty segment sequence
///
/// Parsing normalizes segment text to Unicode NFC and strips trailing
/// separators, so two spellings of the same name compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyName {
    namespace: Namespace,
    segments: Vec<Segment>,
}

impl KeyName {
    /// Parse a textual name such as `/path/%tag%/leaf` or `user:/path/leaf`
    pub fn parse(text: &str) -> Result<Self, KeyError> {
        let (namespace, rest) = if let Some(rest) = text.strip_prefix("user:") {
            (Namespace::User, rest)
        } else if let Some(rest) = text.strip_prefix("system:") {
            (Namespace::System, rest)
        } else {
            (Namespace::Cascade, text)
        };

        let rest = rest
            .strip_prefix('/')
            .ok_or_else(|| KeyError::InvalidName(format!("name must be rooted: {}", text)))?;
        let rest = rest.trim_end_matches('/');
        if rest.is_empty() {
            return Err(KeyError::InvalidName(format!("name has no segments: {}", text)));
        }

        let segments = rest
            .split('/')
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(KeyName {
            namespace,
            segments,
        })
    }

    /// Build a name from already-validated parts (resolver output)
    pub(crate) fn from_parts(namespace: Namespace, segments: Vec<Segment>) -> Self {
        debug_assert!(!segments.is_empty());
        KeyName {
            namespace,
            segments,
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Rendered text of the final segment, used for layer-tag derivation
    pub fn base_name(&self) -> String {
        self.segments
            .last()
            .map(|s| s.to_string())
            .unwrap_or_default()
    }

    /// Whether any segment is a named placeholder or wildcard
    pub fn is_templated(&self) -> bool {
        self.segments
            .iter()
            .any(|s| !matches!(s, Segment::Literal(_)))
    }

    pub fn is_cascading(&self) -> bool {
        self.namespace == Namespace::Cascade
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace.prefix())?;
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for KeyName {
    type Error = KeyError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        KeyName::parse(&text)
    }
}

impl From<KeyName> for String {
    fn from(name: KeyName) -> String {
        name.to_string()
    }
}

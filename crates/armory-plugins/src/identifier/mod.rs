//! Parsed plugin identifiers.
//!
//! A [`PluginIdentifier`] is the external name of a plugin class, taken from
//! a URL path segment such as `shell/reverse_tcp`. Identifiers are one or
//! more segments of `[a-z0-9_-]` joined by `/`. No case folding is applied:
//! input outside that alphabet, including uppercase letters, dots, and
//! backslashes, is rejected before the registry is consulted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::IdentifierError;

/// Upper bound on identifier length in bytes.
pub const MAX_IDENTIFIER_LEN: usize = 256;

/// Normalised, validated plugin identifier.
///
/// # Example
///
/// ```
/// use armory_plugins::PluginIdentifier;
///
/// let id = PluginIdentifier::parse("shell/reverse_tcp").expect("valid identifier");
/// assert_eq!(id.as_str(), "shell/reverse_tcp");
/// assert_eq!(id.segments().collect::<Vec<_>>(), ["shell", "reverse_tcp"]);
///
/// assert!(PluginIdentifier::parse("../../etc/passwd").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PluginIdentifier(String);

impl PluginIdentifier {
    /// Parses and validates an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when the input is empty, too long, contains
    /// an empty segment, or contains a byte outside `[a-z0-9_-/]`.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        if raw.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if raw.len() > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong {
                len: raw.len(),
                max: MAX_IDENTIFIER_LEN,
            });
        }
        for (position, segment) in raw.split('/').enumerate() {
            if segment.is_empty() {
                return Err(IdentifierError::EmptySegment {
                    identifier: raw.to_owned(),
                    position,
                });
            }
            if let Some(character) = segment.chars().find(|c| !is_segment_char(*c)) {
                return Err(IdentifierError::InvalidCharacter {
                    identifier: raw.to_owned(),
                    character,
                });
            }
        }
        Ok(Self(raw.to_owned()))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Consumes the identifier, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Iterates over the `/`-separated namespace segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

const fn is_segment_char(character: char) -> bool {
    matches!(character, 'a'..='z' | '0'..='9' | '_' | '-')
}

impl fmt::Display for PluginIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PluginIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PluginIdentifier {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for PluginIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PluginIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

//! Key parsing and key-code derivation.
//!
//! A binding is attached to exactly one character key. Keys are normalized to
//! uppercase, and the index is keyed by the [`KeyCode`] derived from that
//! character. For ASCII letters and digits the code matches the virtual-key
//! code hosts report for the physical key (`'E'` -> 69).

use crate::error::KeybindError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Integer code used as the dispatch index key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u32);

impl KeyCode {
    /// Derive the code of a key string.
    ///
    /// The code is taken from the first character of the uppercased string.
    /// Returns `None` for an empty string. Longer strings are not rejected here;
    /// use [`Key::parse`] when the input must be a single character.
    pub fn from_key_str(key: &str) -> Option<Self> {
        key.chars()
            .flat_map(char::to_uppercase)
            .next()
            .map(Self::from)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<char> for KeyCode {
    fn from(value: char) -> Self {
        Self(value as u32)
    }
}

impl From<u32> for KeyCode {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single, uppercase character key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(char);

impl Key {
    /// Parse a key from a string that must contain exactly one character.
    ///
    /// Examples:
    /// - `"e"` -> `E`
    /// - `"7"` -> `7`
    /// - `""` / `"ef"` -> [`KeybindError::InvalidKey`]
    pub fn parse(input: &str) -> Result<Self, KeybindError> {
        let mut chars = input.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Self::from_char(c)),
            _ => Err(KeybindError::InvalidKey {
                key: input.to_string(),
                chars: input.chars().count(),
            }),
        }
    }

    /// Normalize a character to its uppercase key.
    ///
    /// Characters whose uppercase form spans several characters (`'ß'` -> `"SS"`)
    /// keep the first one.
    pub fn from_char(c: char) -> Self {
        Self(c.to_uppercase().next().unwrap_or(c))
    }

    pub fn as_char(self) -> char {
        self.0
    }

    /// Code under which bindings for this key are indexed.
    pub fn code(self) -> KeyCode {
        KeyCode::from(self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Key::parse(&value).map_err(serde::de::Error::custom)
    }
}

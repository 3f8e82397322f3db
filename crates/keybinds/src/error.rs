use thiserror::Error;

/// Errors reported by the strict registration path.
///
/// The plain registry operations never surface these; they swallow invalid
/// input and return `None`/`false` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeybindError {
    #[error("invalid key {key:?}: expected exactly one character, got {chars}")]
    InvalidKey { key: String, chars: usize },
}

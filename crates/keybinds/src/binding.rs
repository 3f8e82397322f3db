//! Binding record and its identifiers.
//!
//! A [`Binding`] connects one [`Key`] to a release handler and, for
//! [`BindMode::Hold`], an optional press handler. The record also carries the
//! mutable dispatch state: the disabled flag, the held flag and the timestamp
//! of the last accepted release.

use crate::key::{Key, KeyCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Callback invoked by dispatch. Takes no arguments.
pub type Handler = Rc<dyn Fn()>;

/// Identifier assigned to a binding at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BindingId(pub u64);

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a binding reacts to key transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindMode {
    /// Only the release fires (`on_release`).
    #[default]
    PressRelease,
    /// Press fires `on_press` and marks the binding held; release fires
    /// `on_release` and clears the held flag.
    Hold,
}

impl BindMode {
    pub fn from_hold(hold: bool) -> Self {
        if hold { Self::Hold } else { Self::PressRelease }
    }

    pub fn is_hold(self) -> bool {
        matches!(self, Self::Hold)
    }
}

/// A registered keybind.
pub(crate) struct Binding {
    pub id: BindingId,
    pub key: Key,
    pub mode: BindMode,
    pub debounce_ms: u64,
    pub last_release_ms: u64,
    pub disabled: bool,
    pub held: bool,
    pub on_release: Handler,
    pub on_press: Option<Handler>,
}

impl Binding {
    pub fn code(&self) -> KeyCode {
        self.key.code()
    }

    /// Apply a key-down. Returns `true` if the press was accepted.
    pub fn press(&mut self) -> bool {
        if self.disabled || !self.mode.is_hold() {
            return false;
        }
        self.held = true;
        true
    }

    /// Apply a key-up at `now_ms`. Returns `true` if the release was accepted.
    ///
    /// A release arriving less than `debounce_ms` after the last accepted one is
    /// dropped and leaves the timestamp untouched.
    pub fn release(&mut self, now_ms: u64) -> bool {
        if self.disabled {
            return false;
        }
        if now_ms.saturating_sub(self.last_release_ms) < self.debounce_ms {
            return false;
        }
        self.last_release_ms = now_ms;
        if self.mode.is_hold() {
            self.held = false;
        }
        true
    }

    pub fn info(&self) -> BindingInfo {
        BindingInfo {
            id: self.id,
            key: self.key,
            code: self.code(),
            mode: self.mode,
            debounce_ms: self.debounce_ms,
            disabled: self.disabled,
            held: self.mode.is_hold() && self.held,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("mode", &self.mode)
            .field("debounce_ms", &self.debounce_ms)
            .field("last_release_ms", &self.last_release_ms)
            .field("disabled", &self.disabled)
            .field("held", &self.held)
            .field("has_press_handler", &self.on_press.is_some())
            .finish()
    }
}

/// Read-only snapshot of a binding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BindingInfo {
    pub id: BindingId,
    pub key: Key,
    pub code: KeyCode,
    pub mode: BindMode,
    pub debounce_ms: u64,
    pub disabled: bool,
    pub held: bool,
}

//! Builder describing a single registration.

use crate::binding::{BindMode, Handler};
use std::fmt;
use std::rc::Rc;

/// Everything needed to register one binding.
///
/// ```ignore
/// let id = registry.register_request(
///     BindRequest::hold("E", || println!("released"))
///         .on_press(|| println!("pressed"))
///         .debounce_ms(150),
/// );
/// ```
pub struct BindRequest {
    pub(crate) key: String,
    pub(crate) mode: BindMode,
    pub(crate) debounce_ms: Option<u64>,
    pub(crate) disabled: bool,
    pub(crate) on_release: Handler,
    pub(crate) on_press: Option<Handler>,
}

impl BindRequest {
    /// Create a request with an explicit mode.
    pub fn new(key: impl Into<String>, mode: BindMode, on_release: impl Fn() + 'static) -> Self {
        Self {
            key: key.into(),
            mode,
            debounce_ms: None,
            disabled: false,
            on_release: Rc::new(on_release),
            on_press: None,
        }
    }

    /// A binding that only fires on release.
    pub fn press_release(key: impl Into<String>, on_release: impl Fn() + 'static) -> Self {
        Self::new(key, BindMode::PressRelease, on_release)
    }

    /// A binding that tracks the held state and fires on press and release.
    pub fn hold(key: impl Into<String>, on_release: impl Fn() + 'static) -> Self {
        Self::new(key, BindMode::Hold, on_release)
    }

    /// Set the press handler. Ignored unless the mode is [`BindMode::Hold`].
    pub fn on_press(mut self, on_press: impl Fn() + 'static) -> Self {
        self.on_press = Some(Rc::new(on_press));
        self
    }

    pub fn with_press_handler(mut self, on_press: Option<Handler>) -> Self {
        self.on_press = on_press;
        self
    }

    /// Minimum time between two accepted releases. Falls back to the registry
    /// default when not set.
    pub fn debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = Some(debounce_ms);
        self
    }

    /// Register the binding in the disabled state.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn mode(&self) -> BindMode {
        self.mode
    }
}

impl fmt::Debug for BindRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindRequest")
            .field("key", &self.key)
            .field("mode", &self.mode)
            .field("debounce_ms", &self.debounce_ms)
            .field("disabled", &self.disabled)
            .field("has_press_handler", &self.on_press.is_some())
            .finish()
    }
}

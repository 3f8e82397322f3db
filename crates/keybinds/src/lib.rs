//! Keybind registry for game-client scripting.
//!
//! Scripts register a single-character key together with a mode and a
//! debounce interval, and get called back when the host reports the key going
//! down or up. The registry owns the bindings, indexes them by key code and
//! applies hold-state and debounce rules during dispatch.
//!
//! # Example
//!
//! ```ignore
//! use keybinds::{BindMode, KeyCode, KeybindRegistry};
//! use std::rc::Rc;
//!
//! let registry = KeybindRegistry::new();
//! let id = registry
//!     .register(
//!         "e",
//!         BindMode::Hold,
//!         0,
//!         || println!("released"),
//!         Some(Rc::new(|| println!("pressed"))),
//!     )
//!     .unwrap();
//!
//! registry.key_down(KeyCode::from('E'));
//! assert!(registry.is_held(id));
//! registry.key_up(KeyCode::from('E'));
//! ```

pub mod binding;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod key;
pub mod registry;
pub mod request;

// Re-export main types
pub use binding::{BindMode, BindingId, BindingInfo, Handler};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::KeybindConfig;
pub use error::KeybindError;
pub use event::KeyEvent;
pub use key::{Key, KeyCode};
pub use registry::{KeybindRegistry, KeybindRegistryBuilder};
pub use request::BindRequest;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

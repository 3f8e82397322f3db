//! Keybind registry: ownership, indexing and dispatch of bindings.
//!
//! Bindings live in a flat id-keyed map, and a second map indexes the ids by
//! [`KeyCode`] so a raw key event reaches its bindings without a scan. A key
//! code has an entry in the index only while at least one binding uses it.
//!
//! All operations take `&self`. State sits behind a `RefCell` that is never
//! borrowed while a handler runs, so handlers may freely call back into the
//! registry (register, unregister, toggle, query, even dispatch again).

use crate::binding::{BindMode, Binding, BindingId, BindingInfo, Handler};
use crate::clock::{Clock, SystemClock};
use crate::config::KeybindConfig;
use crate::error::KeybindError;
use crate::event::KeyEvent;
use crate::key::{Key, KeyCode};
use crate::request::BindRequest;
use anyhow::Result;
use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, trace};

type Snapshot = SmallVec<[BindingId; 4]>;

/// Builder for creating a [`KeybindRegistry`].
pub struct KeybindRegistryBuilder {
    config_path: Option<PathBuf>,
    config: KeybindConfig,
    clock: Option<Box<dyn Clock>>,
}

impl KeybindRegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config_path: None,
            config: KeybindConfig::default(),
            clock: None,
        }
    }

    /// Load the configuration from a JSON file when building.
    ///
    /// Takes precedence over [`with_config`](Self::with_config).
    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_config(mut self, config: KeybindConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the time source used for debounce.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Build the [`KeybindRegistry`].
    pub fn build(self) -> Result<KeybindRegistry> {
        let config = match self.config_path {
            Some(path) => KeybindConfig::load(path)?,
            None => self.config,
        };
        let clock = self
            .clock
            .unwrap_or_else(|| Box::new(SystemClock::new()));

        Ok(KeybindRegistry {
            config,
            clock,
            inner: RefCell::new(RegistryInner::default()),
        })
    }
}

impl Default for KeybindRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct RegistryInner {
    last_id: u64,
    bindings: IndexMap<BindingId, Binding>,
    index: IndexMap<KeyCode, IndexSet<BindingId>>,
}

impl RegistryInner {
    fn snapshot(&self, code: KeyCode) -> Snapshot {
        self.index
            .get(&code)
            .map(|bucket| bucket.iter().copied().collect())
            .unwrap_or_default()
    }

    fn remove(&mut self, id: BindingId) -> Option<Binding> {
        let binding = self.bindings.shift_remove(&id)?;
        let code = binding.code();
        if let Some(bucket) = self.index.get_mut(&code) {
            bucket.shift_remove(&id);
            if bucket.is_empty() {
                self.index.shift_remove(&code);
            }
        }
        Some(binding)
    }
}

/// Owns every registered binding and dispatches raw key events to them.
pub struct KeybindRegistry {
    config: KeybindConfig,
    clock: Box<dyn Clock>,
    inner: RefCell<RegistryInner>,
}

impl KeybindRegistry {
    /// Create a registry with default configuration and the system clock.
    pub fn new() -> Self {
        Self {
            config: KeybindConfig::default(),
            clock: Box::new(SystemClock::new()),
            inner: RefCell::new(RegistryInner::default()),
        }
    }

    /// Create a new builder.
    pub fn builder() -> KeybindRegistryBuilder {
        KeybindRegistryBuilder::new()
    }

    pub fn config(&self) -> &KeybindConfig {
        &self.config
    }

    /// Register a binding.
    ///
    /// Returns `None` and leaves the registry untouched when `key` is not exactly
    /// one character.
    pub fn register(
        &self,
        key: &str,
        mode: BindMode,
        debounce_ms: u64,
        on_release: impl Fn() + 'static,
        on_press: Option<Handler>,
    ) -> Option<BindingId> {
        self.register_request(
            BindRequest::new(key, mode, on_release)
                .debounce_ms(debounce_ms)
                .with_press_handler(on_press),
        )
    }

    /// Register a binding described by a [`BindRequest`].
    pub fn register_request(&self, request: BindRequest) -> Option<BindingId> {
        self.try_register(request).ok()
    }

    /// Register a binding, reporting invalid keys as an error.
    pub fn try_register(&self, request: BindRequest) -> Result<BindingId, KeybindError> {
        let key = Key::parse(&request.key)?;
        let created_ms = self.clock.now_ms();
        let debounce_ms = request
            .debounce_ms
            .unwrap_or(self.config.default_debounce_ms);
        let disabled = request.disabled || self.config.is_key_disabled(key);

        let mut inner = self.inner.borrow_mut();
        inner.last_id += 1;
        let id = BindingId(inner.last_id);

        inner.index.entry(key.code()).or_default().insert(id);
        inner.bindings.insert(
            id,
            Binding {
                id,
                key,
                mode: request.mode,
                debounce_ms,
                last_release_ms: created_ms,
                disabled,
                held: false,
                on_release: request.on_release,
                on_press: request.on_press,
            },
        );

        debug!(%id, %key, mode = ?request.mode, debounce_ms, disabled, "registered keybind");
        Ok(id)
    }

    /// Remove a binding. Unknown ids are ignored.
    pub fn unregister(&self, id: BindingId) {
        let removed = self.inner.borrow_mut().remove(id);
        if let Some(binding) = removed {
            debug!(%id, key = %binding.key, "unregistered keybind");
        }
    }

    /// Whether a hold binding is currently held down.
    ///
    /// Always `false` for unknown ids and press/release bindings.
    pub fn is_held(&self, id: BindingId) -> bool {
        self.inner
            .borrow()
            .bindings
            .get(&id)
            .is_some_and(|binding| binding.mode.is_hold() && binding.held)
    }

    /// Ids of all bindings registered for `key`, in registration order.
    ///
    /// The key is normalized to uppercase and only its first character is
    /// considered; an empty string yields no ids.
    pub fn bindings_for_key(&self, key: &str) -> Vec<BindingId> {
        KeyCode::from_key_str(key)
            .map(|code| self.bindings_for_code(code))
            .unwrap_or_default()
    }

    pub fn bindings_for_code(&self, code: KeyCode) -> Vec<BindingId> {
        self.inner.borrow().snapshot(code).into_vec()
    }

    /// Enable or disable a single binding. Unknown ids are ignored.
    pub fn set_disabled(&self, id: BindingId, disabled: bool) {
        if let Some(binding) = self.inner.borrow_mut().bindings.get_mut(&id) {
            binding.disabled = disabled;
        }
    }

    /// Enable or disable every binding registered for `key`.
    pub fn set_key_disabled(&self, key: &str, disabled: bool) {
        let Some(code) = KeyCode::from_key_str(key) else {
            return;
        };

        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let Some(bucket) = inner.index.get(&code) else {
            return;
        };
        for id in bucket {
            if let Some(binding) = inner.bindings.get_mut(id) {
                binding.disabled = disabled;
            }
        }
    }

    /// Disabled flag of a binding, or `None` if it does not exist.
    pub fn is_disabled(&self, id: BindingId) -> Option<bool> {
        self.inner
            .borrow()
            .bindings
            .get(&id)
            .map(|binding| binding.disabled)
    }

    /// Dispatch a host key event.
    pub fn dispatch(&self, event: KeyEvent) -> usize {
        match event {
            KeyEvent::Down(code) => self.key_down(code),
            KeyEvent::Up(code) => self.key_up(code),
        }
    }

    /// Handle a raw key-down. Returns how many bindings accepted the press.
    ///
    /// Only enabled hold bindings react: they become held and their press
    /// handler, if any, is invoked.
    pub fn key_down(&self, code: KeyCode) -> usize {
        let snapshot = self.inner.borrow().snapshot(code);
        trace!(%code, bindings = snapshot.len(), "key down");

        let mut accepted = 0;
        for id in snapshot {
            let handler = {
                let mut inner = self.inner.borrow_mut();
                let Some(binding) = inner.bindings.get_mut(&id) else {
                    continue;
                };
                if !binding.press() {
                    continue;
                }
                binding.on_press.clone()
            };

            accepted += 1;
            if let Some(handler) = handler {
                handler();
            }
        }
        accepted
    }

    /// Handle a raw key-up. Returns how many bindings accepted the release.
    ///
    /// Enabled bindings outside their debounce window record the release time,
    /// drop their held state and invoke the release handler.
    pub fn key_up(&self, code: KeyCode) -> usize {
        let snapshot = self.inner.borrow().snapshot(code);
        trace!(%code, bindings = snapshot.len(), "key up");

        let mut accepted = 0;
        for id in snapshot {
            let handler = {
                let mut inner = self.inner.borrow_mut();
                let Some(binding) = inner.bindings.get_mut(&id) else {
                    continue;
                };
                let now_ms = self.clock.now_ms();
                if !binding.release(now_ms) {
                    if !binding.disabled {
                        trace!(%id, now_ms, last_release_ms = binding.last_release_ms, "release debounced");
                    }
                    continue;
                }
                binding.on_release.clone()
            };

            accepted += 1;
            handler();
        }
        accepted
    }

    /// Snapshot of a single binding.
    pub fn binding(&self, id: BindingId) -> Option<BindingInfo> {
        self.inner.borrow().bindings.get(&id).map(Binding::info)
    }

    /// Snapshots of all bindings, in registration order.
    pub fn bindings(&self) -> Vec<BindingInfo> {
        self.inner
            .borrow()
            .bindings
            .values()
            .map(Binding::info)
            .collect()
    }

    pub fn contains(&self, id: BindingId) -> bool {
        self.inner.borrow().bindings.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().bindings.is_empty()
    }

    /// Key codes that currently have at least one binding.
    pub fn key_codes(&self) -> Vec<KeyCode> {
        self.inner.borrow().index.keys().copied().collect()
    }

    /// Remove every binding. Ids handed out so far are not reused.
    pub fn clear(&self) {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            inner.index.clear();
            std::mem::take(&mut inner.bindings)
        };
        debug!(count = removed.len(), "cleared keybinds");
    }
}

impl Default for KeybindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeybindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("KeybindRegistry");
        debug.field("config", &self.config);
        if let Ok(inner) = self.inner.try_borrow() {
            let bindings: Vec<&Binding> = inner.bindings.values().collect();
            let key_codes: Vec<&KeyCode> = inner.index.keys().collect();
            debug.field("bindings", &bindings);
            debug.field("key_codes", &key_codes);
        } else {
            debug.field("bindings", &"<borrowed>");
        }
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::cell::Cell;
    use std::rc::Rc;

    fn registry_with_clock() -> (KeybindRegistry, ManualClock) {
        let clock = ManualClock::new(1_000);
        let registry = KeybindRegistry::builder()
            .with_clock(clock.clone())
            .build()
            .unwrap();
        (registry, clock)
    }

    #[test]
    fn ids_are_sequential_per_registry() {
        let first = KeybindRegistry::new();
        let second = KeybindRegistry::new();

        assert_eq!(
            first.register("E", BindMode::Hold, 0, || {}, None),
            Some(BindingId(1))
        );
        assert_eq!(
            first.register("F", BindMode::Hold, 0, || {}, None),
            Some(BindingId(2))
        );
        assert_eq!(
            second.register("E", BindMode::Hold, 0, || {}, None),
            Some(BindingId(1))
        );
    }

    #[test]
    fn invalid_key_registers_nothing() {
        let registry = KeybindRegistry::new();

        assert_eq!(registry.register("", BindMode::Hold, 0, || {}, None), None);
        assert_eq!(
            registry.register("EF", BindMode::PressRelease, 0, || {}, None),
            None
        );
        assert!(registry.is_empty());
        assert!(registry.key_codes().is_empty());

        // The next valid registration still gets the first id.
        assert_eq!(
            registry.register("E", BindMode::Hold, 0, || {}, None),
            Some(BindingId(1))
        );
    }

    #[test]
    fn try_register_reports_invalid_key() {
        let registry = KeybindRegistry::new();
        let err = registry
            .try_register(BindRequest::hold("abc", || {}))
            .unwrap_err();
        assert_eq!(
            err,
            KeybindError::InvalidKey {
                key: "abc".into(),
                chars: 3
            }
        );
    }

    #[test]
    fn unregister_prunes_empty_bucket() {
        let registry = KeybindRegistry::new();
        let a = registry
            .register("e", BindMode::Hold, 0, || {}, None)
            .unwrap();
        let b = registry
            .register("E", BindMode::PressRelease, 0, || {}, None)
            .unwrap();
        let code = KeyCode::from('E');

        registry.unregister(a);
        assert_eq!(registry.key_codes(), vec![code]);
        assert_eq!(registry.bindings_for_code(code), vec![b]);

        registry.unregister(b);
        assert!(registry.key_codes().is_empty());
        assert!(registry.bindings_for_key("e").is_empty());

        registry.unregister(b);
        assert!(registry.is_empty());
    }

    #[test]
    fn bindings_for_key_keeps_registration_order() {
        let registry = KeybindRegistry::new();
        let ids: Vec<_> = (0..5)
            .map(|_| {
                registry
                    .register("q", BindMode::PressRelease, 0, || {}, None)
                    .unwrap()
            })
            .collect();

        registry.unregister(ids[2]);
        assert_eq!(
            registry.bindings_for_key("Q"),
            vec![ids[0], ids[1], ids[3], ids[4]]
        );
    }

    #[test]
    fn config_applies_defaults() {
        let clock = ManualClock::new(0);
        let config = KeybindConfig {
            default_debounce_ms: 250,
            disabled_keys: vec![Key::parse("G").unwrap()],
        };
        let registry = KeybindRegistry::builder()
            .with_config(config)
            .with_clock(clock)
            .build()
            .unwrap();

        let e = registry
            .register_request(BindRequest::press_release("e", || {}))
            .unwrap();
        let g = registry
            .register_request(BindRequest::press_release("g", || {}).debounce_ms(5))
            .unwrap();

        let e_info = registry.binding(e).unwrap();
        assert_eq!(e_info.debounce_ms, 250);
        assert!(!e_info.disabled);

        let g_info = registry.binding(g).unwrap();
        assert_eq!(g_info.debounce_ms, 5);
        assert!(g_info.disabled);
    }

    #[test]
    fn release_within_debounce_of_creation_is_suppressed() {
        let (registry, clock) = registry_with_clock();
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        registry
            .register(
                "R",
                BindMode::PressRelease,
                100,
                move || counter.set(counter.get() + 1),
                None,
            )
            .unwrap();

        assert_eq!(registry.key_up(KeyCode::from('R')), 0);
        clock.advance(100);
        assert_eq!(registry.key_up(KeyCode::from('R')), 1);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn press_release_binding_ignores_key_down() {
        let (registry, _clock) = registry_with_clock();
        let pressed = Rc::new(Cell::new(false));
        let flag = pressed.clone();
        let id = registry
            .register(
                "T",
                BindMode::PressRelease,
                0,
                || {},
                Some(Rc::new(move || flag.set(true))),
            )
            .unwrap();

        assert_eq!(registry.key_down(KeyCode::from('T')), 0);
        assert!(!pressed.get());
        assert!(!registry.is_held(id));
    }

    #[test]
    fn clear_removes_everything_without_reusing_ids() {
        let registry = KeybindRegistry::new();
        registry.register("A", BindMode::Hold, 0, || {}, None);
        registry.register("B", BindMode::Hold, 0, || {}, None);

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.key_codes().is_empty());

        assert_eq!(
            registry.register("A", BindMode::Hold, 0, || {}, None),
            Some(BindingId(3))
        );
    }

    #[test]
    fn dispatch_routes_events() {
        let (registry, _clock) = registry_with_clock();
        let id = registry
            .register_request(BindRequest::hold("w", || {}))
            .unwrap();
        let code = KeyCode::from('W');

        assert_eq!(registry.dispatch(KeyEvent::Down(code)), 1);
        assert!(registry.is_held(id));
        assert_eq!(registry.dispatch(KeyEvent::Up(code)), 1);
        assert!(!registry.is_held(id));
    }

    #[test]
    fn unknown_ids_are_quiet() {
        let registry = KeybindRegistry::new();
        let ghost = BindingId(42);

        registry.unregister(ghost);
        registry.set_disabled(ghost, true);
        assert!(!registry.is_held(ghost));
        assert_eq!(registry.is_disabled(ghost), None);
        assert!(registry.binding(ghost).is_none());
        assert!(!registry.contains(ghost));
    }
}

//! Drives a registry with a scripted stream of host key events.
//!
//! Run with `RUST_LOG=keybinds=trace` to see registration and dispatch logs.

use keybinds::{BindRequest, KeyCode, KeyEvent, KeybindRegistry, ManualClock};
use std::cell::Cell;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let clock = ManualClock::new(0);
    let registry = Rc::new(KeybindRegistry::builder().with_clock(clock.clone()).build()?);

    let sprinting = Rc::new(Cell::new(false));
    let sprint = {
        let start = sprinting.clone();
        let stop = sprinting.clone();
        BindRequest::hold("s", move || stop.set(false))
            .on_press(move || start.set(true))
    };
    let sprint_id = registry.register_request(sprint);

    // Interact key with a debounce so a bouncing switch only counts once.
    let interactions = Rc::new(Cell::new(0u32));
    let interact = {
        let interactions = interactions.clone();
        BindRequest::press_release("e", move || interactions.set(interactions.get() + 1))
            .debounce_ms(250)
    };
    registry.register_request(interact);

    // Toggle the interact key off from a third binding.
    let toggle = {
        let registry = Rc::downgrade(&registry);
        BindRequest::press_release("x", move || {
            if let Some(registry) = registry.upgrade() {
                let disabled = registry
                    .bindings_for_key("e")
                    .first()
                    .and_then(|id| registry.is_disabled(*id))
                    .unwrap_or(false);
                registry.set_key_disabled("e", !disabled);
            }
        })
    };
    registry.register_request(toggle);

    let s = KeyCode::from('S');
    let e = KeyCode::from('E');
    let x = KeyCode::from('X');
    let script = [
        (300, KeyEvent::Down(s)),
        (0, KeyEvent::Up(e)),
        (20, KeyEvent::Up(e)),
        (400, KeyEvent::Up(s)),
        (0, KeyEvent::Up(x)),
        (300, KeyEvent::Up(e)),
    ];

    for (delay_ms, event) in script {
        clock.advance(delay_ms);
        let accepted = registry.dispatch(event);
        println!(
            "t={:>4}ms {:?} -> {} binding(s), sprinting={}, interactions={}",
            keybinds::Clock::now_ms(&clock),
            event,
            accepted,
            sprinting.get(),
            interactions.get(),
        );
    }

    if let Some(id) = sprint_id {
        println!("sprint held at exit: {}", registry.is_held(id));
    }
    println!("{:#?}", registry.bindings());
    Ok(())
}

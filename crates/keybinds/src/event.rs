use crate::key::KeyCode;

/// Raw key transition delivered by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyEvent {
    Down(KeyCode),
    Up(KeyCode),
}

impl KeyEvent {
    pub fn code(self) -> KeyCode {
        match self {
            Self::Down(code) | Self::Up(code) => code,
        }
    }
}

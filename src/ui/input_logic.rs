//! Pure keypad input helpers (no I/O, host-testable).

use crate::keypad::Key;

/// Turns raw scan samples into press edges.
///
/// A sample is reported when it differs from the previous one and is not
/// idle, so a key held across many scans counts once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyEdge {
    last: Option<Key>,
}

impl KeyEdge {
    pub fn update(&mut self, sample: Option<Key>) -> Option<Key> {
        let edge = match sample {
            Some(key) if self.last != Some(key) => Some(key),
            _ => None,
        };
        self.last = sample;
        edge
    }
}

/// Keys that may appear in a keypad-entered piece id.
pub fn is_id_key(key: Key) -> bool {
    key.is_digit() || key.is_letter()
}

/// Keys that may appear in the maintenance password (`D` is excluded).
pub fn is_password_key(key: Key) -> bool {
    key.is_digit() || matches!(key, Key::A | Key::B | Key::C)
}

/// Append the key's symbol if there is room. Returns whether it was added.
pub fn push_key<const N: usize>(buf: &mut heapless::String<N>, key: Key) -> bool {
    buf.push(key.symbol()).is_ok()
}

/// Password echo: one `*` once anything has been typed.
pub fn password_mask(len: usize) -> &'static str {
    if len == 0 {
        ""
    } else {
        "*"
    }
}

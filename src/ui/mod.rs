//! Operator console - 16×2 character LCD + 4×4 keypad.
//!
//! Every screen in the station is two lines of at most [`LCD_COLUMNS`]
//! characters. The [`Console`] owns the display, the keypad and the delay,
//! and is the only thing that writes to the screen or waits on keys, so a
//! single [`KeyEdge`] tracker sees every scan.
//!
//! ## Components
//!
//! - **Display**: anything implementing [`LineDisplay`] (HD44780 on hardware)
//! - **Keypad**: anything implementing [`KeySource`]
//! - **Input logic**: pure helpers in [`input_logic`]

pub mod input_logic;

use crate::config::{KEYPAD_POLL_MS, LCD_COLUMNS};
use crate::keypad::{Key, KeySource};
use embedded_hal_async::delay::DelayNs;
use input_logic::KeyEdge;

/// Display rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    Top = 0,
    Bottom = 1,
}

/// Minimal character display interface.
///
/// `clear_line` blanks a row and leaves the cursor at its first column;
/// `write` prints at the cursor. Display faults are the driver's concern.
pub trait LineDisplay {
    fn clear_line(&mut self, line: Line);
    fn write(&mut self, text: &str);
}

/// Cut or pad `text` to exactly one display row (byte-sized; the LCD
/// character ROM is ASCII).
pub fn fit(text: &str) -> heapless::String<LCD_COLUMNS> {
    let mut row = heapless::String::new();
    for c in text.chars().take(LCD_COLUMNS) {
        if row.push(c).is_err() {
            break;
        }
    }
    while row.len() < LCD_COLUMNS {
        if row.push(' ').is_err() {
            break;
        }
    }
    row
}

pub struct Console<K, L, D> {
    keys: K,
    display: L,
    delay: D,
    edge: KeyEdge,
}

impl<K, L, D> Console<K, L, D>
where
    K: KeySource,
    L: LineDisplay,
    D: DelayNs,
{
    pub fn new(keys: K, display: L, delay: D) -> Self {
        Self {
            keys,
            display,
            delay,
            edge: KeyEdge::default(),
        }
    }

    /// Replace one row.
    pub fn show(&mut self, line: Line, text: &str) {
        self.display.clear_line(line);
        self.display.write(fit(text).as_str());
    }

    /// Replace both rows.
    pub fn screen(&mut self, top: &str, bottom: &str) {
        self.show(Line::Top, top);
        self.show(Line::Bottom, bottom);
    }

    pub fn clear(&mut self) {
        self.screen("", "");
    }

    pub async fn pause(&mut self, ms: u32) {
        self.delay.delay_ms(ms).await;
    }

    /// One keypad scan; `Some` only on a new press.
    pub async fn poll_press(&mut self) -> Option<Key> {
        let sample = self.keys.scan().await;
        self.edge.update(sample)
    }

    /// Poll every [`KEYPAD_POLL_MS`] until a new press.
    pub async fn wait_press(&mut self) -> Key {
        loop {
            if let Some(key) = self.poll_press().await {
                return key;
            }
            self.pause(KEYPAD_POLL_MS).await;
        }
    }

    /// Delay shared with the serial readers.
    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }
}

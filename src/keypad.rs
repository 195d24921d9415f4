//! 4×4 matrix keypad scanning with debouncing.
//!
//! Rows are outputs, columns are inputs with pull-ups (active-low).
//! A scan drives one row low at a time and samples every column; a low
//! column is confirmed after [`KEYPAD_DEBOUNCE_MS`] before it is reported.
//!
//! ```text
//!            col0 col1 col2 col3
//!   row0      1    4    7    *
//!   row1      2    5    8    0
//!   row2      3    6    9    #
//!   row3      A    B    C    D
//! ```

use crate::config::KEYPAD_DEBOUNCE_MS;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;

/// One of the sixteen keypad symbols.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    A,
    B,
    C,
    D,
    Star,
    Hash,
}

/// Symbol layout addressed `[row][col]`.
pub const KEY_MAP: [[Key; 4]; 4] = [
    [Key::Num1, Key::Num4, Key::Num7, Key::Star],
    [Key::Num2, Key::Num5, Key::Num8, Key::Num0],
    [Key::Num3, Key::Num6, Key::Num9, Key::Hash],
    [Key::A, Key::B, Key::C, Key::D],
];

impl Key {
    /// Printed symbol on the key cap.
    pub const fn symbol(self) -> char {
        match self {
            Key::Num0 => '0',
            Key::Num1 => '1',
            Key::Num2 => '2',
            Key::Num3 => '3',
            Key::Num4 => '4',
            Key::Num5 => '5',
            Key::Num6 => '6',
            Key::Num7 => '7',
            Key::Num8 => '8',
            Key::Num9 => '9',
            Key::A => 'A',
            Key::B => 'B',
            Key::C => 'C',
            Key::D => 'D',
            Key::Star => '*',
            Key::Hash => '#',
        }
    }

    /// Inverse of [`Key::symbol`].
    pub fn from_symbol(c: char) -> Option<Self> {
        KEY_MAP
            .iter()
            .flat_map(|row| row.iter())
            .copied()
            .find(|k| k.symbol() == c)
    }

    pub const fn is_digit(self) -> bool {
        matches!(
            self,
            Key::Num0
                | Key::Num1
                | Key::Num2
                | Key::Num3
                | Key::Num4
                | Key::Num5
                | Key::Num6
                | Key::Num7
                | Key::Num8
                | Key::Num9
        )
    }

    pub const fn is_letter(self) -> bool {
        matches!(self, Key::A | Key::B | Key::C | Key::D)
    }
}

/// Anything that can report the key currently held down.
///
/// One call is one scan cycle; `None` means no key is pressed.
#[allow(async_fn_in_trait)]
pub trait KeySource {
    async fn scan(&mut self) -> Option<Key>;
}

/// Keypad wired directly to GPIO.
pub struct MatrixKeypad<R, C, D> {
    rows: [R; 4],
    cols: [C; 4],
    delay: D,
}

impl<R, C, D> MatrixKeypad<R, C, D>
where
    R: OutputPin,
    C: InputPin,
    D: DelayNs,
{
    pub fn new(rows: [R; 4], cols: [C; 4], delay: D) -> Self {
        Self { rows, cols, delay }
    }

    fn drive_row(&mut self, active: usize) {
        for row in self.rows.iter_mut() {
            let _ = row.set_high();
        }
        let _ = self.rows[active].set_low();
    }
}

impl<R, C, D> KeySource for MatrixKeypad<R, C, D>
where
    R: OutputPin,
    C: InputPin,
    D: DelayNs,
{
    async fn scan(&mut self) -> Option<Key> {
        for r in 0..4 {
            self.drive_row(r);
            for c in 0..4 {
                // A pin error reads as "not pressed".
                if self.cols[c].is_low().unwrap_or(false) {
                    self.delay.delay_ms(KEYPAD_DEBOUNCE_MS).await;
                    if self.cols[c].is_low().unwrap_or(false) {
                        return Some(KEY_MAP[r][c]);
                    }
                }
            }
        }
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════

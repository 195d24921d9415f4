//! 16x2 character LCD behind a PCF8574 I2C backpack.

use defmt::warn;
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C1;
use embassy_time::Delay;
use hd44780_driver::bus::I2CBus;
use hd44780_driver::{Cursor, CursorBlink, Display, DisplayMode, HD44780};
use weighstation::config::LCD_I2C_ADDR;
use weighstation::{Line, LineDisplay};

type Driver = HD44780<I2CBus<I2c<'static, I2C1, Blocking>>>;

/// DDRAM address of the first cell of each row.
const ROW_START: [u8; 2] = [0x00, 0x40];

const BLANK_ROW: &str = "                ";

pub struct Lcd {
    driver: Driver,
    delay: Delay,
}

impl Lcd {
    pub fn new(i2c: I2c<'static, I2C1, Blocking>) -> Result<Self, hd44780_driver::error::Error> {
        let mut delay = Delay;
        let mut driver = HD44780::new_i2c(i2c, LCD_I2C_ADDR, &mut delay)?;
        driver.reset(&mut delay)?;
        driver.clear(&mut delay)?;
        driver.set_display_mode(
            DisplayMode {
                display: Display::On,
                cursor_visibility: Cursor::Invisible,
                cursor_blink: CursorBlink::Off,
            },
            &mut delay,
        )?;
        Ok(Self { driver, delay })
    }
}

impl LineDisplay for Lcd {
    fn clear_line(&mut self, line: Line) {
        let start = ROW_START[line as usize];
        let cleared = self
            .driver
            .set_cursor_pos(start, &mut self.delay)
            .and_then(|_| self.driver.write_str(BLANK_ROW, &mut self.delay))
            .and_then(|_| self.driver.set_cursor_pos(start, &mut self.delay));
        if cleared.is_err() {
            warn!("lcd: i2c write failed");
        }
    }

    fn write(&mut self, text: &str) {
        if self.driver.write_str(text, &mut self.delay).is_err() {
            warn!("lcd: i2c write failed");
        }
    }
}

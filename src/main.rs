//! Weigh station firmware for the Raspberry Pi Pico W.
//!
//! Wiring:
//!
//! | Signal            | Pin(s)              |
//! |-------------------|---------------------|
//! | Scale RX (UART0)  | GP1, 9600 baud      |
//! | Scanner RX (UART1)| GP5, 115200 baud    |
//! | LCD I2C1 SDA/SCL  | GP14 / GP15         |
//! | Keypad rows       | GP9, GP8, GP7, GP6  |
//! | Keypad columns    | GP13, GP12, GP11, GP10 (pull-up) |
//!
//! Build: `cargo run --release --features embedded --target thumbv6m-none-eabi`

#![no_std]
#![no_main]

extern crate alloc;

mod board;

use board::http::HttpEndpoint;
use board::lcd::Lcd;
use board::ota::OtaUpdater;
use board::wifi::{PicoRadio, RadioPeripherals};
use board::Irqs;
use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::uart::{self, BufferedUartRx};
use embassy_time::Delay;
use panic_probe as _;
use static_cell::StaticCell;
use weighstation::config::{LCD_I2C_FREQ, SCALE_BAUD, SCANNER_BAUD, STATION_NAME};
use weighstation::{Console, Kiosk, MatrixKeypad, Settings};

const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

const UART_RX_BUF_LEN: usize = 256;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    board::init_heap();
    let p = embassy_rp::init(Default::default());
    info!("{=str} firmware {=str}", STATION_NAME, FIRMWARE_VERSION);

    let (flash, unique_id) = board::ota::init_flash(p.FLASH);
    board::ota::confirm_boot(flash);
    let seed = board::seed(unique_id);

    // - Display -------------------------------------------------------
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = LCD_I2C_FREQ;
    let i2c = I2c::new_blocking(p.I2C1, p.PIN_15, p.PIN_14, i2c_config);
    let lcd = match Lcd::new(i2c) {
        Ok(lcd) => lcd,
        Err(_) => defmt::panic!("lcd: no response at the backpack address"),
    };

    // - Keypad --------------------------------------------------------
    let rows = [
        Output::new(p.PIN_9, Level::High),
        Output::new(p.PIN_8, Level::High),
        Output::new(p.PIN_7, Level::High),
        Output::new(p.PIN_6, Level::High),
    ];
    let cols = [
        Input::new(p.PIN_13, Pull::Up),
        Input::new(p.PIN_12, Pull::Up),
        Input::new(p.PIN_11, Pull::Up),
        Input::new(p.PIN_10, Pull::Up),
    ];
    let keypad = MatrixKeypad::new(rows, cols, Delay);

    // - Serial inputs -------------------------------------------------
    static SCALE_BUF: StaticCell<[u8; UART_RX_BUF_LEN]> = StaticCell::new();
    static SCANNER_BUF: StaticCell<[u8; UART_RX_BUF_LEN]> = StaticCell::new();

    let mut scale_config = uart::Config::default();
    scale_config.baudrate = SCALE_BAUD;
    let scale = BufferedUartRx::new(
        p.UART0,
        Irqs,
        p.PIN_1,
        SCALE_BUF.init([0; UART_RX_BUF_LEN]),
        scale_config,
    );

    let mut scanner_config = uart::Config::default();
    scanner_config.baudrate = SCANNER_BAUD;
    let scanner = BufferedUartRx::new(
        p.UART1,
        Irqs,
        p.PIN_5,
        SCANNER_BUF.init([0; UART_RX_BUF_LEN]),
        scanner_config,
    );

    // - Network -------------------------------------------------------
    let radio = PicoRadio::start(
        spawner,
        RadioPeripherals {
            pwr: p.PIN_23,
            cs: p.PIN_25,
            dio: p.PIN_24,
            clk: p.PIN_29,
            pio: p.PIO0,
            dma: p.DMA_CH0,
        },
        seed,
    )
    .await;
    let stack = radio.stack();

    let settings = Settings::default();
    let endpoint = HttpEndpoint::new(stack, settings.endpoint_url.clone());
    let updater = OtaUpdater::new(stack, flash, FIRMWARE_VERSION, seed);

    let console = Console::new(keypad, lcd, Delay);
    let mut kiosk = Kiosk::new(console, scale, scanner, radio, endpoint, updater, settings);

    kiosk.boot(Some(FIRMWARE_VERSION)).await;
    kiosk.run().await
}

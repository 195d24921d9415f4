//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

// Station identity

/// Name shown on the splash screen.
pub const STATION_NAME: &str = "Ta4feya";

// Display

/// Character columns per LCD line.
pub const LCD_COLUMNS: usize = 16;

/// I²C address of the PCF8574 backpack.
pub const LCD_I2C_ADDR: u8 = 0x27;

/// I²C bus frequency for the LCD (Hz).
pub const LCD_I2C_FREQ: u32 = 400_000;

// GPIO pin assignments (Pico W)
//
// These are logical names; the actual `embassy_rp::peripherals::PIN_*`
// types are selected in `main.rs`.
//
//   LCD SDA / SCL      → GP14 / GP15 (I2C1)
//   Scale TX / RX      → GP0 / GP1   (UART0)
//   Scanner TX / RX    → GP4 / GP5   (UART1)
//   Keypad rows 0..3   → GP9, GP8, GP7, GP6   (outputs)
//   Keypad cols 0..3   → GP13, GP12, GP11, GP10 (inputs, pull-up)

// Keypad

/// Re-check delay after a column reads low (ms).
pub const KEYPAD_DEBOUNCE_MS: u32 = 20;

/// Poll interval for keypad-driven menus and text entry (ms).
pub const KEYPAD_POLL_MS: u32 = 100;

/// Maximum characters accepted for a keypad piece id.
pub const PIECE_ID_MAX_LEN: usize = 16;

/// Maximum characters accepted for the maintenance password buffer.
pub const PASSWORD_MAX_LEN: usize = 16;

// Serial channels

/// Scale UART baud rate.
pub const SCALE_BAUD: u32 = 9600;

/// Barcode scanner UART baud rate.
pub const SCANNER_BAUD: u32 = 115_200;

/// Scale frames end with carriage return.
pub const WEIGHT_TERMINATOR: u8 = b'\r';

/// Barcode frames end with a literal `=`.
pub const BARCODE_TERMINATOR: u8 = b'=';

/// Sleep between serial availability checks (ms).
pub const SERIAL_POLL_MS: u32 = 10;

/// Longest frame accepted before the partial frame is dropped.
pub const MAX_FRAME_LEN: usize = 128;

/// Scale read timeout (ms). `None` waits forever for the scale.
pub const WEIGHT_FRAME_TIMEOUT_MS: Option<u32> = None;

/// Weight reported when the scale frame cannot be split into fields.
pub const WEIGHT_FALLBACK: &str = "0.00";

// WiFi

/// Network name, overridable at build time with `STATION_WIFI_SSID`.
pub const WIFI_SSID: &str = match option_env!("STATION_WIFI_SSID") {
    Some(ssid) => ssid,
    None => "SYS-Horizon",
};

/// Network passphrase, overridable at build time with `STATION_WIFI_PASSWORD`.
pub const WIFI_PASSWORD: &str = match option_env!("STATION_WIFI_PASSWORD") {
    Some(password) => password,
    None => "9078@horiz",
};

/// Link checks after an initial connect request.
pub const WIFI_CONNECT_ATTEMPTS: u32 = 20;

/// Link checks after a reconnect request.
pub const WIFI_RECONNECT_ATTEMPTS: u32 = 10;

/// Interval between link checks (ms).
pub const WIFI_POLL_MS: u32 = 500;

/// Wait between boot-time connection rounds (ms).
pub const WIFI_BOOT_RETRY_MS: u32 = 3000;

// Submission endpoint

/// Scan submission endpoint (query string is appended).
pub const SCAN_ENDPOINT_URL: &str = "http://shatat-ue.runasp.net/api/Devices/ScanForDevice3";

/// Technician id sent with every scan.
pub const TECH_ID: &str = "123";

/// Machine id sent with every scan.
pub const MACHINE_ID: &str = "1";

/// Characters of a transport error shown after the `fail` prefix.
pub const TRANSPORT_DETAIL_LEN: usize = 12;

// Maintenance

/// Password that unlocks the firmware update.
pub const MAINTENANCE_PASSWORD: &str = "1234";

/// Where firmware updates are fetched from.
pub const FIRMWARE_SOURCE_URL: &str = "https://raw.githubusercontent.com/mahmoudrizkk/Ta4feya-M1/main/";

/// Firmware image name under [`FIRMWARE_SOURCE_URL`].
pub const FIRMWARE_TARGET_FILE: &str = "weighstation.bin";

/// Characters of an update error shown under "OTA Failed".
pub const UPDATE_DETAIL_LEN: usize = 6;

// Dwell times (ms)

pub const SPLASH_MS: u32 = 2000;
pub const WIFI_READY_MS: u32 = 1000;
pub const WEIGHT_SETTLE_MS: u32 = 2000;
pub const OUTCOME_DWELL_MS: u32 = 2000;
pub const REPLY_HOLD_MS: u32 = 3000;
pub const CYCLE_PAUSE_MS: u32 = 1000;
pub const READ_ERROR_MS: u32 = 2000;
pub const MAINTENANCE_ENTRY_MS: u32 = 500;
pub const WRONG_PASSWORD_MS: u32 = 2000;
pub const CANCEL_NOTICE_MS: u32 = 2000;
pub const UPDATE_RESULT_MS: u32 = 3000;

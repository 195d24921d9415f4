//! Weigh station core - everything except the board wiring.
//!
//! The embedded binary (`main.rs`, feature `embedded`) only builds the Pico W
//! peripherals and hands them to [`workflow::Kiosk`]. All behaviour lives
//! here, generic over `embedded-hal`, `embedded-hal-async`, `embedded-io`
//! and a few small port traits, so it runs unchanged under host tests.
//!
//! Usage: `cargo test` (host) / `cargo run --release --features embedded --target thumbv6m-none-eabi` (Pico W)
//!
//! ## Modules
//!
//! - [`keypad`]: 4×4 matrix scan with debounce
//! - [`serial`]: terminator framing and the scale protocol
//! - [`ui`]: two-line console and keypad edge tracking
//! - [`net`]: WiFi reconnect and status reporting
//! - [`submit`]: scan request/reply handling
//! - [`maintenance`]: password-gated firmware update
//! - [`workflow`]: the operator state machine

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod keypad;
pub mod maintenance;
pub mod net;
pub mod serial;
pub mod submit;
pub mod ui;
pub mod workflow;

#[cfg(test)]
mod mock;

pub use error::{FrameError, TransportError, UpdateError};
pub use keypad::{Key, KeySource, MatrixKeypad};
pub use maintenance::{FirmwareUpdater, MaintenanceOutcome, UpdateRequest, UpdateStatus};
pub use net::{ConnectivityStatus, NetworkReconciler, Radio, WifiCredentials};
pub use serial::weight::WeightReading;
pub use serial::FrameReader;
pub use submit::{
    HttpReply, InputMethod, PieceType, ReplyBody, ScanEndpoint, ScanRequest, SubmissionOutcome,
};
pub use ui::{Console, Line, LineDisplay};
pub use workflow::{Event, Kiosk, Settings, State};

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests - cross-module checks
// ═══════════════════════════════════════════════════════════════════════════

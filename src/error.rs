//! Error types for the station core.
//!
//! Nothing here is fatal: every error is a value the caller turns into a
//! screen message before carrying on with the workflow. Variants carry
//! only what the display needs.
//! Implements `defmt::Format` (behind the `defmt` feature) for on-target logging.

use alloc::string::String;
use core::fmt;

/// Failure while assembling a frame from a serial channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The UART reported an error (framing, overrun, ...).
    Serial(embedded_io::ErrorKind),

    /// No terminator arrived within the configured timeout.
    Timeout,

    /// The frame grew past `MAX_FRAME_LEN` without a terminator.
    Overflow,
}

impl From<embedded_io::ErrorKind> for FrameError {
    fn from(kind: embedded_io::ErrorKind) -> Self {
        FrameError::Serial(kind)
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Serial(_) => f.write_str("serial fault"),
            FrameError::Timeout => f.write_str("timeout"),
            FrameError::Overflow => f.write_str("frame too long"),
        }
    }
}

/// The scan request never produced an HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportError {
    /// Human-readable cause, shown (truncated) on the LCD.
    pub detail: String,
}

impl TransportError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TransportError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "TransportError({=str})", self.detail.as_str())
    }
}

/// The firmware update could not be fetched or installed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateError {
    pub detail: String,
}

impl UpdateError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for UpdateError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "UpdateError({=str})", self.detail.as_str())
    }
}

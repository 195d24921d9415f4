//! Scale line protocol.
//!
//! The indicator streams `<status>,<mode>,<weight>,<unit>` frames, e.g.
//! `ST,GS,+  12.34,kg`. Only the weight field is used; status and mode are
//! not checked.

use crate::config::WEIGHT_FALLBACK;
use alloc::string::String;

/// Numeric weight text exactly as it will be displayed and submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightReading(String);

impl WeightReading {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for WeightReading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for WeightReading {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.0.as_str())
    }
}

/// Extract the weight from one scale frame.
///
/// Frames with fewer than three fields yield [`WEIGHT_FALLBACK`].
pub fn parse(frame: &[u8]) -> WeightReading {
    let text = String::from_utf8_lossy(frame);
    let Some(field) = text.trim().split(',').nth(2) else {
        debug!("scale: short frame, using fallback");
        return WeightReading::new(WEIGHT_FALLBACK);
    };
    let weight: String = field
        .trim()
        .replace("kg", "")
        .chars()
        .filter(|&c| c != '+' && c != ' ')
        .collect();
    WeightReading(weight)
}

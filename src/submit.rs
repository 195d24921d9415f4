//! Scan submission: request building, reply classification, outcome screens.
//!
//! One scan is one HTTP POST with an empty JSON body; everything the
//! service needs travels in the query string:
//!
//! ```text
//! <base>?pieceId=<id>&weight=<w>&TechId=<tech>&status=<1|2>&MachId=<machine>
//! ```
//!
//! The reply is JSON. A 200 with a usable object carries
//! `pieceWeight_InZ`; a rejection carries `statusCode` and `message`.

use crate::config::{OUTCOME_DWELL_MS, REPLY_HOLD_MS, TRANSPORT_DETAIL_LEN};
use crate::error::TransportError;
use crate::keypad::{Key, KeySource};
use crate::serial::weight::WeightReading;
use crate::ui::{Console, LineDisplay};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use embedded_hal_async::delay::DelayNs;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::{Map, Value};

/// RFC 3986 unreserved characters pass through; everything else is escaped.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Operation selected on the first menu. The discriminant is the wire `status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PieceType {
    Out = 1,
    Cutting = 2,
}

impl PieceType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Num1 => Some(PieceType::Out),
            Key::Num2 => Some(PieceType::Cutting),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputMethod {
    Keypad,
    Barcode,
}

impl InputMethod {
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Num1 => Some(InputMethod::Keypad),
            Key::Num2 => Some(InputMethod::Barcode),
            _ => None,
        }
    }
}

/// Everything one submission sends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanRequest {
    pub piece_id: String,
    pub weight: WeightReading,
    pub piece_type: PieceType,
    pub tech_id: String,
    pub machine_id: String,
}

impl ScanRequest {
    /// Full request URL for the endpoint at `base`.
    pub fn url(&self, base: &str) -> String {
        format!(
            "{}?pieceId={}&weight={}&TechId={}&status={}&MachId={}",
            base,
            utf8_percent_encode(&self.piece_id, QUERY_VALUE),
            utf8_percent_encode(self.weight.as_str(), QUERY_VALUE),
            utf8_percent_encode(&self.tech_id, QUERY_VALUE),
            self.piece_type.code(),
            utf8_percent_encode(&self.machine_id, QUERY_VALUE),
        )
    }
}

/// Raw HTTP response as seen by the core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The remote scan service.
#[allow(async_fn_in_trait)]
pub trait ScanEndpoint {
    /// POST the scan. `Err` means no HTTP response was obtained at all.
    async fn post(&mut self, request: &ScanRequest) -> Result<HttpReply, TransportError>;
}

/// Fields of a JSON reply the station cares about.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ReplyBody {
    #[serde(rename = "pieceWeight_InZ")]
    pub incoming_weight: Option<Value>,
    #[serde(rename = "statusCode")]
    pub status_code: Option<Value>,
    pub message: Option<Value>,
}

impl ReplyBody {
    /// A body counts only when it is a JSON object with at least one member.
    pub fn parse(body: &[u8]) -> Option<Self> {
        let object: Map<String, Value> = serde_json::from_slice(body).ok()?;
        if object.is_empty() {
            return None;
        }
        serde_json::from_value(Value::Object(object)).ok()
    }
}

/// JSON scalar as display text: strings bare, everything else as JSON.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First `max` characters of `text`.
pub fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success { incoming_weight: String },
    KnownError { code: String, message: String },
    UnknownError { status_code: u16 },
    TransportFailure { detail: String },
}

impl SubmissionOutcome {
    pub fn map(status: u16, body: Option<&ReplyBody>) -> Self {
        match body {
            Some(body) if status == 200 => SubmissionOutcome::Success {
                incoming_weight: body
                    .incoming_weight
                    .as_ref()
                    .map(scalar_text)
                    .unwrap_or_default(),
            },
            Some(body) => SubmissionOutcome::KnownError {
                code: body
                    .status_code
                    .as_ref()
                    .map(scalar_text)
                    .unwrap_or_else(|| status.to_string()),
                message: body
                    .message
                    .as_ref()
                    .map(scalar_text)
                    .unwrap_or_else(|| String::from("Error")),
            },
            None => SubmissionOutcome::UnknownError {
                status_code: status,
            },
        }
    }

    pub fn from_reply(reply: &HttpReply) -> Self {
        Self::map(reply.status, ReplyBody::parse(&reply.body).as_ref())
    }

    pub fn transport_failure(err: &TransportError) -> Self {
        SubmissionOutcome::TransportFailure {
            detail: truncate(&err.detail, TRANSPORT_DETAIL_LEN),
        }
    }

    pub fn from_result(result: &Result<HttpReply, TransportError>) -> Self {
        match result {
            Ok(reply) => Self::from_reply(reply),
            Err(err) => Self::transport_failure(err),
        }
    }

    /// An HTTP response came back (as opposed to a transport failure).
    pub fn is_reply(&self) -> bool {
        !matches!(self, SubmissionOutcome::TransportFailure { .. })
    }

    /// Short on-screen text for a rejection message.
    pub fn rejection_text(message: &str) -> &str {
        match message {
            "NO3" => "Not found",
            "NO1" => "Wrong type(1)",
            "NO2" => "Wrong type(2)",
            "Insufficient stock in store" => "No stock",
            other => other,
        }
    }

    /// Show the outcome, including every dwell, on the console.
    pub async fn render<K, L, D>(&self, console: &mut Console<K, L, D>, weight: &WeightReading)
    where
        K: KeySource,
        L: LineDisplay,
        D: DelayNs,
    {
        match self {
            SubmissionOutcome::Success { incoming_weight } => {
                console.screen("Success", &format!("InZ:{}", incoming_weight));
                console.pause(OUTCOME_DWELL_MS).await;
                console.screen(
                    &format!("In:{}", incoming_weight),
                    &format!("Out:{}", weight),
                );
                console.pause(OUTCOME_DWELL_MS).await;
            }
            SubmissionOutcome::KnownError { code, message } => {
                console.screen(&format!("Err:{}", code), Self::rejection_text(message));
                console.pause(OUTCOME_DWELL_MS).await;
            }
            SubmissionOutcome::UnknownError { status_code } => {
                console.screen("Unknown error", &status_code.to_string());
                console.pause(OUTCOME_DWELL_MS).await;
            }
            SubmissionOutcome::TransportFailure { detail } => {
                console.screen(&format!("fail{}", detail), "");
                console.pause(OUTCOME_DWELL_MS).await;
            }
        }
        if self.is_reply() {
            console.pause(REPLY_HOLD_MS).await;
        }
    }
}

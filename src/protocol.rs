/// JSON wire protocol between the host and the hub's cross-validation app.
///
/// Each message is a `(kind, body)` pair; the body is compact JSON encoded
/// with `serde_json_core` into a fixed-size `heapless` buffer.
use core::fmt;

use heapless::{String, Vec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::PayloadDecoder;
use crate::error::ValidationError;
use crate::scanner::BandSet;

/// Maximum size of a serialized message body
pub const MAX_MSG_LEN: usize = 512;

/// Buffer type for serialized message bodies
pub type MsgBuffer = Vec<u8, MAX_MSG_LEN>;

/// Maximum length of an SSID on the wire (32 bytes + slack)
pub type NameString = String<33>;

// ── Message kinds ──────────────────────────────────────────────────────

/// Declared kind of a message, carried outside the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MessageKind {
    /// host → hub: begin a step
    StepStart = 0,
    /// hub → host: pass/fail for SETUP or VALIDATE
    StepResult = 1,
    /// hub → host: capability bitset
    Capabilities = 2,
    /// host → hub: one host scan record
    ScanResult = 3,
}

impl MessageKind {
    pub fn from_raw(kind: u32) -> Option<Self> {
        match kind {
            0 => Some(Self::StepStart),
            1 => Some(Self::StepResult),
            2 => Some(Self::Capabilities),
            3 => Some(Self::ScanResult),
            _ => None,
        }
    }

    pub const fn raw(self) -> u32 {
        self as u32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StepStart => "step start",
            Self::StepResult => "step result",
            Self::Capabilities => "capabilities",
            Self::ScanResult => "scan result",
        }
    }
}

// ── Steps ──────────────────────────────────────────────────────────────

/// Protocol phase. Only the host advances it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Init,
    Capabilities,
    Setup,
    Validate,
}

impl Step {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Capabilities,
            2 => Self::Setup,
            3 => Self::Validate,
            _ => Self::Init,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Capabilities => "CAPABILITIES",
            Self::Setup => "SETUP",
            Self::Validate => "VALIDATE",
        }
    }

    /// Whether the hub may answer this step with a STEP_RESULT.
    pub fn expects_step_result(&self) -> bool {
        matches!(self, Self::Setup | Self::Validate)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Payloads ───────────────────────────────────────────────────────────

/// Body of a STEP_START message.
#[derive(Debug, Serialize)]
pub struct StepStart {
    pub step: Step,
    /// Number of records the hub should buffer (SETUP only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u16>,
}

/// Body of a SCAN_RESULT message.
#[derive(Debug, Serialize)]
pub struct ScanResult<'a> {
    pub ssid: &'a str,
    pub bssid: [u8; 6],
    /// Number of records in the whole stream
    pub total: u32,
    /// Position of this record in the stream
    pub index: u32,
}

/// Decoded STEP_RESULT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub passed: bool,
    pub error: Option<std::string::String>,
}

/// Decoded CAPABILITIES report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub bits: u32,
    /// Bands the hub can observe, if it declared them
    pub bands: Option<BandSet>,
}

impl Capabilities {
    pub fn has_all(&self, required: u32) -> bool {
        self.bits & required == required
    }
}

/// Wire format for STEP_RESULT.
#[derive(Deserialize)]
pub(crate) struct RawStepResult {
    pub passed: bool,
    /// Unbounded; the hub's text is reported as sent.
    #[serde(default)]
    pub error: Option<std::string::String>,
}

/// Wire format for CAPABILITIES.
#[derive(Deserialize)]
pub(crate) struct RawCapabilities {
    pub capabilities: u32,
    #[serde(default)]
    pub bands: Option<u8>,
}

// ── Outbound messages ──────────────────────────────────────────────────

/// An encoded message ready to hand to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubMessage {
    pub kind: MessageKind,
    pub body: MsgBuffer,
}

impl HubMessage {
    /// Body as text, for logging and tests.
    pub fn body_str(&self) -> &str {
        core::str::from_utf8(&self.body).unwrap_or("")
    }
}

/// Serialize a payload into a new message of the given kind.
pub fn encode<T: Serialize>(kind: MessageKind, payload: &T) -> Result<HubMessage, ValidationError> {
    let mut body = MsgBuffer::new();
    body.resize_default(MAX_MSG_LEN).ok();
    let len = serde_json_core::to_slice(payload, &mut body)
        .map_err(|_| ValidationError::Encode("payload does not fit in a message buffer"))?;
    body.truncate(len);
    Ok(HubMessage { kind, body })
}

/// Build the STEP_START message for a step.
pub fn step_start(step: Step, capacity: Option<u16>) -> Result<HubMessage, ValidationError> {
    encode(MessageKind::StepStart, &StepStart { step, capacity })
}

// ── Inbound decoding ───────────────────────────────────────────────────

/// Decoder for the JSON bodies above. Shared by every sensor domain that
/// uses the common STEP_RESULT / CAPABILITIES shapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPayloads;

impl PayloadDecoder for JsonPayloads {
    fn decode_step_result(&self, body: &[u8]) -> Result<StepResult, ValidationError> {
        let raw: RawStepResult = decode_body(MessageKind::StepResult, body)?;
        Ok(StepResult {
            passed: raw.passed,
            error: raw.error,
        })
    }

    fn decode_capabilities(&self, body: &[u8]) -> Result<Capabilities, ValidationError> {
        let raw: RawCapabilities = decode_body(MessageKind::Capabilities, body)?;
        Ok(Capabilities {
            bits: raw.capabilities,
            bands: raw.bands.map(BandSet::from_bits),
        })
    }
}

/// Decode a JSON body, unescaping strings. An unescaped string is never
/// longer than its escaped form, so a body-sized scratch buffer suffices.
fn decode_body<T: DeserializeOwned>(kind: MessageKind, body: &[u8]) -> Result<T, ValidationError> {
    let trimmed = trim_trailing_whitespace(body);
    if trimmed.is_empty() {
        return Err(ValidationError::Decode {
            kind: kind.as_str(),
            reason: "empty body",
        });
    }
    let mut unescape = vec![0u8; trimmed.len()];
    serde_json_core::from_slice_escaped::<T>(trimmed, &mut unescape)
        .map(|(value, _)| value)
        .map_err(|_| ValidationError::Decode {
            kind: kind.as_str(),
            reason: "malformed payload",
        })
}

fn trim_trailing_whitespace(data: &[u8]) -> &[u8] {
    let mut end = data.len();
    while end > 0 && data[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    &data[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Band;

    // ── Kinds and steps ─────────────────────────────────────────────

    #[test]
    fn message_kind_raw_values() {
        for kind in [
            MessageKind::StepStart,
            MessageKind::StepResult,
            MessageKind::Capabilities,
            MessageKind::ScanResult,
        ] {
            assert_eq!(MessageKind::from_raw(kind.raw()), Some(kind));
        }
        assert_eq!(MessageKind::from_raw(99), None);
    }

    #[test]
    fn step_round_trips_through_u8() {
        for step in [Step::Init, Step::Capabilities, Step::Setup, Step::Validate] {
            assert_eq!(Step::from_u8(step.as_u8()), step);
        }
    }

    #[test]
    fn only_setup_and_validate_expect_step_results() {
        assert!(!Step::Init.expects_step_result());
        assert!(!Step::Capabilities.expects_step_result());
        assert!(Step::Setup.expects_step_result());
        assert!(Step::Validate.expects_step_result());
    }

    // ── Outbound encoding ───────────────────────────────────────────

    #[test]
    fn step_start_without_capacity_omits_field() {
        let msg = step_start(Step::Capabilities, None).unwrap();
        assert_eq!(msg.kind, MessageKind::StepStart);
        assert_eq!(msg.body_str(), r#"{"step":"capabilities"}"#);
    }

    #[test]
    fn setup_step_start_carries_capacity() {
        let msg = step_start(Step::Setup, Some(100)).unwrap();
        assert_eq!(msg.body_str(), r#"{"step":"setup","capacity":100}"#);
    }

    #[test]
    fn scan_result_serializes_index_and_total() {
        let payload = ScanResult {
            ssid: "HomeNet",
            bssid: [0xaa, 0xbb, 0xcc, 0x00, 0x11, 0x22],
            total: 3,
            index: 1,
        };
        let msg = encode(MessageKind::ScanResult, &payload).unwrap();
        let json = msg.body_str();
        assert!(json.contains(r#""ssid":"HomeNet""#));
        assert!(json.contains(r#""bssid":[170,187,204,0,17,34]"#));
        assert!(json.contains(r#""total":3"#));
        assert!(json.contains(r#""index":1"#));
    }

    // ── Inbound decoding ────────────────────────────────────────────

    #[test]
    fn decode_passing_step_result() {
        let result = JsonPayloads.decode_step_result(br#"{"passed":true}"#).unwrap();
        assert!(result.passed);
        assert_eq!(result.error, None);
    }

    #[test]
    fn decode_failing_step_result_with_diagnostic() {
        let result = JsonPayloads
            .decode_step_result(b"{\"passed\":false,\"error\":\"missing bssid\"}\n")
            .unwrap();
        assert!(!result.passed);
        assert_eq!(result.error.as_deref(), Some("missing bssid"));
    }

    #[test]
    fn long_diagnostic_is_kept_whole() {
        let diag = "x".repeat(200);
        let body = format!(r#"{{"passed":false,"error":"{}"}}"#, diag);
        let result = JsonPayloads.decode_step_result(body.as_bytes()).unwrap();
        assert!(!result.passed);
        assert_eq!(result.error.as_deref(), Some(diag.as_str()));
    }

    #[test]
    fn escaped_diagnostic_is_unescaped() {
        let body = br#"{"passed":false,"error":"ssid \"Cafe\" missing\nat index 2"}"#;
        let result = JsonPayloads.decode_step_result(body).unwrap();
        assert_eq!(result.error.as_deref(), Some("ssid \"Cafe\" missing\nat index 2"));
    }

    #[test]
    fn decode_capabilities_with_and_without_bands() {
        let caps = JsonPayloads.decode_capabilities(br#"{"capabilities":3}"#).unwrap();
        assert_eq!(caps.bits, 0b11);
        assert_eq!(caps.bands, None);
        assert!(caps.has_all(0b11));

        let caps = JsonPayloads
            .decode_capabilities(br#"{"capabilities":1,"bands":1}"#)
            .unwrap();
        assert!(!caps.has_all(0b11));
        let bands = caps.bands.unwrap();
        assert!(bands.contains(Band::Ghz2_4));
        assert!(!bands.contains(Band::Ghz5));
    }

    #[test]
    fn malformed_bodies_are_decode_errors() {
        assert_eq!(
            JsonPayloads.decode_step_result(b"").unwrap_err(),
            ValidationError::Decode {
                kind: "step result",
                reason: "empty body"
            }
        );
        assert!(matches!(
            JsonPayloads.decode_step_result(b"\x01\x02garbage"),
            Err(ValidationError::Decode { .. })
        ));
        assert!(matches!(
            JsonPayloads.decode_capabilities(br#"{"bands":1}"#),
            Err(ValidationError::Decode { .. })
        ));
    }
}

//! Failure taxonomy for a validation run.
//!
//! Every variant is fatal. A missing hub capability is not an error; it ends
//! the run as [`Outcome::Skipped`](crate::validator::Outcome::Skipped).

use std::time::Duration;

use thiserror::Error;

use crate::comm::SendResult;
use crate::protocol::Step;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("timed out waiting for step result in {step} step")]
    StepTimeout { step: Step },

    #[error("timed out after {}s waiting for host scan results", .timeout.as_secs())]
    CollectionTimeout { timeout: Duration },

    #[error("protocol violation: received a {kind} message during step {step}")]
    ProtocolViolation { step: Step, kind: &'static str },

    #[error("received message with unexpected type: {kind}")]
    UnexpectedMessage { kind: u32 },

    #[error("failed to decode {kind} message: {reason}")]
    Decode {
        kind: &'static str,
        reason: &'static str,
    },

    #[error("sending {step} message to hub failed with result {result}")]
    Send { step: Step, result: SendResult },

    #[error("host collection failed: {0}")]
    CollectionFailed(&'static str),

    #[error("host collection failed: no scan results left after band filtering")]
    NoScanResults,

    #[error("bssid did not match expected format ff:ff:ff:ff:ff:ff, bssid = {0}")]
    InvalidAddress(String),

    #[error("{step} step failed: {message}")]
    StepFailed { step: Step, message: String },

    #[error("hub reset occurred")]
    PeerReset,

    #[error("failed to encode outbound message: {0}")]
    Encode(&'static str),

    #[error("hub acknowledged the CAPABILITIES step without reporting capabilities")]
    MissingCapabilities,
}

impl ValidationError {
    /// Short category name, used when logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::StepTimeout { .. } | Self::CollectionTimeout { .. } => "timeout",
            Self::ProtocolViolation { .. } | Self::UnexpectedMessage { .. } => "protocol_violation",
            Self::Decode { .. } | Self::MissingCapabilities => "decode_failure",
            Self::Send { .. } => "send_failure",
            Self::CollectionFailed(_) | Self::NoScanResults | Self::InvalidAddress(_) => {
                "collection_failure"
            }
            Self::StepFailed { .. } => "validation_failure",
            Self::PeerReset => "peer_reset",
            Self::Encode(_) => "encode_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_names_the_step() {
        let err = ValidationError::StepTimeout { step: Step::Setup };
        assert_eq!(err.to_string(), "timed out waiting for step result in SETUP step");
        assert_eq!(err.category(), "timeout");
    }

    #[test]
    fn step_failure_carries_diagnostic_verbatim() {
        let err = ValidationError::StepFailed {
            step: Step::Validate,
            message: "bssid 3 missing".into(),
        };
        assert_eq!(err.to_string(), "VALIDATE step failed: bssid 3 missing");
    }

    #[test]
    fn send_failure_names_result_code() {
        let err = ValidationError::Send {
            step: Step::Capabilities,
            result: SendResult::Busy,
        };
        assert!(err.to_string().contains("RESULT_FAILED_BUSY"));
        assert!(err.to_string().contains("CAPABILITIES"));
    }
}

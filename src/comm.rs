/// Communication layer: the duplex channel to the hub.
///
/// The transport itself (loading the hub app, framing, delivery threads) lives
/// outside this crate. An adapter implements [`HubChannel`] and forwards every
/// inbound message and reset to the [`Inbox`] it was attached to.
use core::fmt;

use crate::interpreter::Inbox;
use crate::protocol::HubMessage;

/// Outcome of handing a message to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendResult {
    Success,
    FailedUnknown,
    BadParams,
    Uninitialized,
    Busy,
    FailedAtHub,
    Timeout,
    ServiceInternalFailure,
    TransportUnavailable,
}

impl SendResult {
    /// Map a numeric transport result code. Unknown codes become
    /// `FailedUnknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            2 => Self::BadParams,
            3 => Self::Uninitialized,
            4 => Self::Busy,
            5 => Self::FailedAtHub,
            6 => Self::Timeout,
            7 => Self::ServiceInternalFailure,
            8 => Self::TransportUnavailable,
            _ => Self::FailedUnknown,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "RESULT_SUCCESS",
            Self::FailedUnknown => "RESULT_FAILED_UNKNOWN",
            Self::BadParams => "RESULT_FAILED_BAD_PARAMS",
            Self::Uninitialized => "RESULT_FAILED_UNINITIALIZED",
            Self::Busy => "RESULT_FAILED_BUSY",
            Self::FailedAtHub => "RESULT_FAILED_AT_HUB",
            Self::Timeout => "RESULT_FAILED_TIMEOUT",
            Self::ServiceInternalFailure => "RESULT_FAILED_SERVICE_INTERNAL_FAILURE",
            Self::TransportUnavailable => "RESULT_FAILED_HAL_UNAVAILABLE",
        }
    }
}

impl fmt::Display for SendResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Id of the hub app that sent it
    pub peer_id: u64,
    /// Raw declared kind; may be one this crate does not know
    pub kind: u32,
    pub body: Vec<u8>,
}

impl InboundMessage {
    pub fn new(peer_id: u64, kind: u32, body: &[u8]) -> Self {
        Self {
            peer_id,
            kind,
            body: body.to_vec(),
        }
    }
}

/// Duplex channel to the hub.
///
/// `attach` is called once at the start of every run, before anything is
/// sent; the adapter must route deliveries to that inbox until the next
/// `attach`. `close` is called exactly once per run, at teardown.
pub trait HubChannel {
    fn attach(&mut self, inbox: Inbox);

    fn send(&mut self, message: &HubMessage) -> SendResult;

    fn close(&mut self);
}

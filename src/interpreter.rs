//! Inbound message interpretation.
//!
//! [`RunContext`] is the per-run shared state: current step, "message
//! received" flag, sticky error, reported capabilities, and the releaser for
//! the active step's barrier. The driver thread is its only writer of the step;
//! the channel's delivery context writes everything else through [`Inbox`].

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::barrier::{Barrier, Releaser};
use crate::comm::InboundMessage;
use crate::domain::PayloadDecoder;
use crate::error::ValidationError;
use crate::protocol::{Capabilities, MessageKind, Step};

pub struct RunContext {
    peer_id: u64,
    step: AtomicU8,
    received: AtomicBool,
    error: Mutex<Option<ValidationError>>,
    capabilities: Mutex<Option<Capabilities>>,
    releaser: Mutex<Releaser>,
}

impl RunContext {
    pub fn new(peer_id: u64) -> Self {
        let (_, releaser) = Barrier::pair();
        Self {
            peer_id,
            step: AtomicU8::new(Step::Init.as_u8()),
            received: AtomicBool::new(false),
            error: Mutex::new(None),
            capabilities: Mutex::new(None),
            releaser: Mutex::new(releaser),
        }
    }

    pub fn peer_id(&self) -> u64 {
        self.peer_id
    }

    pub fn step(&self) -> Step {
        Step::from_u8(self.step.load(Ordering::Acquire))
    }

    /// Install a fresh barrier for `step`, clear the received flag, and make
    /// `step` current. Must be called before the step's trigger is sent.
    pub fn arm(&self, step: Step) -> Barrier {
        let (barrier, releaser) = Barrier::pair();
        *self.releaser.lock().unwrap_or_else(PoisonError::into_inner) = releaser;
        self.received.store(false, Ordering::Release);
        self.step.store(step.as_u8(), Ordering::Release);
        barrier
    }

    /// Release whichever barrier is current.
    pub fn release(&self) {
        self.releaser
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .release();
    }

    pub fn message_received(&self) -> bool {
        self.received.load(Ordering::Acquire)
    }

    fn mark_received(&self) {
        self.received.store(true, Ordering::Release);
    }

    /// Record a fatal error and unblock the waiter. The first error is kept
    /// for reporting; later ones are only logged.
    pub fn fail(&self, err: ValidationError) {
        log::error!("{} step: {} ({})", self.step(), err, err.category());
        {
            let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(err);
            }
        }
        self.release();
    }

    pub fn error(&self) -> Option<ValidationError> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `Err` with the sticky error if one has been recorded.
    pub fn check(&self) -> Result<(), ValidationError> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn capabilities(&self) -> Option<Capabilities> {
        *self
            .capabilities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn store_capabilities(&self, capabilities: Capabilities) {
        *self
            .capabilities
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(capabilities);
    }
}

/// Entry point for the channel adapter's delivery callbacks.
///
/// Cheap to clone; never blocks beyond short uncontended locks.
#[derive(Clone)]
pub struct Inbox {
    ctx: Arc<RunContext>,
    decoder: Arc<dyn PayloadDecoder>,
}

impl Inbox {
    pub fn new(ctx: Arc<RunContext>, decoder: Arc<dyn PayloadDecoder>) -> Self {
        Self { ctx, decoder }
    }

    /// Interpret one hub message. Every message from the hub app marks the
    /// step as answered and releases the current barrier exactly once.
    pub fn on_message(&self, message: &InboundMessage) {
        if message.peer_id != self.ctx.peer_id() {
            log::debug!(
                "Ignoring message kind {} from peer {:#x}",
                message.kind,
                message.peer_id
            );
            return;
        }

        self.ctx.mark_received();
        if let Err(err) = self.dispatch(message.kind, &message.body) {
            self.ctx.fail(err);
        }
        self.ctx.release();
    }

    /// The hub restarted; the run cannot continue.
    pub fn on_reset(&self) {
        self.ctx.fail(ValidationError::PeerReset);
    }

    fn dispatch(&self, kind: u32, body: &[u8]) -> Result<(), ValidationError> {
        let step = self.ctx.step();
        match MessageKind::from_raw(kind) {
            Some(MessageKind::StepResult) => {
                if !step.expects_step_result() {
                    return Err(ValidationError::ProtocolViolation {
                        step,
                        kind: MessageKind::StepResult.as_str(),
                    });
                }
                let result = self.decoder.decode_step_result(body)?;
                if result.passed {
                    log::info!("{} step success", step);
                    Ok(())
                } else {
                    Err(ValidationError::StepFailed {
                        step,
                        message: result.error.unwrap_or_default(),
                    })
                }
            }
            Some(MessageKind::Capabilities) => {
                // Out-of-step reports are still decoded and kept.
                let misplaced = step != Step::Capabilities;
                if misplaced {
                    self.ctx.fail(ValidationError::ProtocolViolation {
                        step,
                        kind: MessageKind::Capabilities.as_str(),
                    });
                }
                let capabilities = self.decoder.decode_capabilities(body)?;
                log::info!("Hub capabilities: {:#b}", capabilities.bits);
                self.ctx.store_capabilities(capabilities);
                Ok(())
            }
            _ => Err(ValidationError::UnexpectedMessage { kind }),
        }
    }
}

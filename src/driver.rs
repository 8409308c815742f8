//! Step protocol driver.
//!
//! Sends step triggers and blocks on the step's barrier. Starting a step hands
//! back a [`PendingStep`] that owns the step's barrier; awaiting consumes it,
//! so a barrier is waited on exactly once and never carried into the next step.

use std::sync::Arc;
use std::time::Duration;

use crate::barrier::{Barrier, GateStatus};
use crate::comm::HubChannel;
use crate::error::ValidationError;
use crate::interpreter::RunContext;
use crate::protocol::{HubMessage, Step};

/// A step whose trigger has been sent and whose answer is outstanding.
#[must_use = "a started step must be awaited"]
pub struct PendingStep {
    step: Step,
    barrier: Barrier,
}

#[cfg(test)]
impl PendingStep {
    fn step(&self) -> Step {
        self.step
    }
}

pub struct StepDriver<'a, C: HubChannel> {
    channel: &'a mut C,
    ctx: Arc<RunContext>,
}

impl<'a, C: HubChannel> StepDriver<'a, C> {
    pub fn new(channel: &'a mut C, ctx: Arc<RunContext>) -> Self {
        Self { channel, ctx }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Arm a fresh barrier, make `step` current, and send its trigger.
    ///
    /// Fails without sending if an error is already recorded.
    pub fn start_step(&mut self, step: Step, trigger: &HubMessage) -> Result<PendingStep, ValidationError> {
        self.ctx.check()?;
        let barrier = self.ctx.arm(step);
        log::info!("Starting {} step", step);
        self.send(trigger)?;
        Ok(PendingStep { step, barrier })
    }

    /// Send one message within the current step.
    pub fn send(&mut self, message: &HubMessage) -> Result<(), ValidationError> {
        let result = self.channel.send(message);
        if result.is_success() {
            Ok(())
        } else {
            let err = ValidationError::Send {
                step: self.ctx.step(),
                result,
            };
            log::error!("{}", err);
            Err(err)
        }
    }

    /// Close the channel. Only called at teardown.
    pub fn close(&mut self) {
        self.channel.close();
    }

    /// Block until the hub answers `pending` or `timeout` elapses.
    ///
    /// A recorded error takes precedence over a timeout, so a fault raised
    /// while waiting is reported by its own category.
    pub fn await_step_completion(&self, pending: PendingStep, timeout: Duration) -> Result<(), ValidationError> {
        let PendingStep { step, barrier } = pending;
        let status = barrier.wait(timeout);
        self.ctx.check()?;
        match status {
            GateStatus::Released if self.ctx.message_received() => Ok(()),
            _ => Err(ValidationError::StepTimeout { step }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{InboundMessage, SendResult};
    use crate::interpreter::Inbox;
    use crate::protocol::{self, JsonPayloads, MessageKind};

    #[derive(Default)]
    struct RecordingChannel {
        sent: Vec<HubMessage>,
        result: Option<SendResult>,
    }

    impl HubChannel for RecordingChannel {
        fn attach(&mut self, _inbox: Inbox) {}

        fn send(&mut self, message: &HubMessage) -> SendResult {
            self.sent.push(message.clone());
            self.result.unwrap_or(SendResult::Success)
        }

        fn close(&mut self) {}
    }

    fn setup() -> (Arc<RunContext>, Inbox) {
        let ctx = Arc::new(RunContext::new(1));
        let inbox = Inbox::new(ctx.clone(), Arc::new(JsonPayloads));
        (ctx, inbox)
    }

    #[test]
    fn start_step_sends_trigger_and_sets_step() {
        let (ctx, _inbox) = setup();
        let mut channel = RecordingChannel::default();
        let mut driver = StepDriver::new(&mut channel, ctx.clone());
        let trigger = protocol::step_start(Step::Capabilities, None).unwrap();
        let pending = driver.start_step(Step::Capabilities, &trigger).unwrap();
        assert_eq!(pending.step(), Step::Capabilities);
        assert_eq!(ctx.step(), Step::Capabilities);
        drop(pending);
        assert_eq!(channel.sent.len(), 1);
        assert_eq!(channel.sent[0].kind, MessageKind::StepStart);
    }

    #[test]
    fn answered_step_completes() {
        let (ctx, inbox) = setup();
        let mut channel = RecordingChannel::default();
        let mut driver = StepDriver::new(&mut channel, ctx);
        let trigger = protocol::step_start(Step::Setup, Some(10)).unwrap();
        let pending = driver.start_step(Step::Setup, &trigger).unwrap();
        inbox.on_message(&InboundMessage::new(1, 1, br#"{"passed":true}"#));
        assert_eq!(driver.await_step_completion(pending, Duration::from_secs(1)), Ok(()));
    }

    #[test]
    fn unanswered_step_times_out_naming_step() {
        let (ctx, _inbox) = setup();
        let mut channel = RecordingChannel::default();
        let mut driver = StepDriver::new(&mut channel, ctx);
        let trigger = protocol::step_start(Step::Setup, Some(10)).unwrap();
        let pending = driver.start_step(Step::Setup, &trigger).unwrap();
        assert_eq!(
            driver.await_step_completion(pending, Duration::from_millis(30)),
            Err(ValidationError::StepTimeout { step: Step::Setup })
        );
    }

    #[test]
    fn send_failure_aborts_before_waiting() {
        let (ctx, _inbox) = setup();
        let mut channel = RecordingChannel {
            result: Some(SendResult::TransportUnavailable),
            ..Default::default()
        };
        let mut driver = StepDriver::new(&mut channel, ctx);
        let trigger = protocol::step_start(Step::Capabilities, None).unwrap();
        assert_eq!(
            driver.start_step(Step::Capabilities, &trigger).err(),
            Some(ValidationError::Send {
                step: Step::Capabilities,
                result: SendResult::TransportUnavailable
            })
        );
    }

    #[test]
    fn reset_during_wait_reports_reset_promptly() {
        let (ctx, inbox) = setup();
        let mut channel = RecordingChannel::default();
        let mut driver = StepDriver::new(&mut channel, ctx);
        let trigger = protocol::step_start(Step::Capabilities, None).unwrap();
        let pending = driver.start_step(Step::Capabilities, &trigger).unwrap();
        inbox.on_reset();
        assert_eq!(
            driver.await_step_completion(pending, Duration::from_secs(5)),
            Err(ValidationError::PeerReset)
        );
    }

    #[test]
    fn recorded_error_blocks_next_step() {
        let (ctx, inbox) = setup();
        inbox.on_reset();
        let mut channel = RecordingChannel::default();
        let mut driver = StepDriver::new(&mut channel, ctx);
        let trigger = protocol::step_start(Step::Setup, Some(10)).unwrap();
        assert_eq!(
            driver.start_step(Step::Setup, &trigger).err(),
            Some(ValidationError::PeerReset)
        );
        assert!(channel.sent.is_empty());
    }
}

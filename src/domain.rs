//! Per-sensor-domain hooks plugged into the fixed step protocol.
//!
//! The orchestrator owns sequencing, barriers and the sticky error; a domain
//! only says how to decode hub payloads, how to collect host data, and how to
//! turn that data into the comparison stream.

use std::sync::Arc;
use std::time::Duration;

use crate::error::ValidationError;
use crate::protocol::{self, Capabilities, HubMessage, Step, StepResult};

/// Decodes hub payloads. Runs on the channel's delivery context, so it must
/// not block.
pub trait PayloadDecoder: Send + Sync {
    fn decode_step_result(&self, body: &[u8]) -> Result<StepResult, ValidationError>;

    fn decode_capabilities(&self, body: &[u8]) -> Result<Capabilities, ValidationError>;
}

pub trait SensorDomain {
    /// Host-side observation, complete before it is compared.
    type Dataset;

    /// Short name used in logs ("wifi", "accel", ...).
    fn name(&self) -> &'static str;

    /// Capability bits the hub must report for the run to proceed.
    fn required_capabilities(&self) -> u32;

    /// Decoder handed to the interpreter for this run.
    fn decoder(&self) -> Arc<dyn PayloadDecoder>;

    /// Parameter sent with the SETUP step start.
    fn setup_capacity(&self) -> Option<u16> {
        None
    }

    /// STEP_START message for `step`.
    fn start_message(&self, step: Step) -> Result<HubMessage, ValidationError> {
        let capacity = match step {
            Step::Setup => self.setup_capacity(),
            _ => None,
        };
        protocol::step_start(step, capacity)
    }

    /// Trigger and await the host platform's own collection.
    fn collect_host_data(
        &mut self,
        capabilities: &Capabilities,
        timeout: Duration,
    ) -> Result<Self::Dataset, ValidationError>;

    /// Messages that hand the host dataset to the hub for comparison.
    fn comparison_messages(&self, dataset: &Self::Dataset) -> Result<Vec<HubMessage>, ValidationError>;

    /// Unregister host-side listeners. Called once per run at teardown.
    fn release(&mut self) {}
}

//! Validation orchestrator.
//!
//! Runs CAPABILITIES → SETUP → VALIDATE against the hub for one sensor domain
//! and reduces the run to a single [`Outcome`]. Each run gets fresh shared
//! state; the channel is closed and host listeners released exactly once per
//! run, whichever step ends it.

use std::sync::Arc;

use crate::comm::HubChannel;
use crate::config::ValidatorConfig;
use crate::domain::SensorDomain;
use crate::driver::StepDriver;
use crate::error::ValidationError;
use crate::interpreter::{Inbox, RunContext};
use crate::protocol::Step;

/// Terminal result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// The hub lacks a required capability; not a failure.
    Skipped(String),
    Failed(ValidationError),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Human-readable reason for a skip or failure.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Passed => None,
            Self::Skipped(reason) => Some(reason.clone()),
            Self::Failed(err) => Some(err.to_string()),
        }
    }
}

/// Where the orchestrator is in its run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    Capabilities,
    Setup,
    Validating,
    Done(Outcome),
}

pub struct Validator<C: HubChannel, D: SensorDomain> {
    channel: C,
    domain: D,
    config: ValidatorConfig,
    phase: RunPhase,
}

impl<C: HubChannel, D: SensorDomain> Validator<C, D> {
    pub fn new(channel: C, domain: D, config: ValidatorConfig) -> Self {
        Self {
            channel,
            domain,
            config,
            phase: RunPhase::NotStarted,
        }
    }

    pub fn phase(&self) -> &RunPhase {
        &self.phase
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn domain(&self) -> &D {
        &self.domain
    }

    pub fn into_parts(self) -> (C, D) {
        (self.channel, self.domain)
    }

    /// Run the full protocol once. A new call starts over from scratch.
    pub fn run(&mut self) -> Outcome {
        self.phase = RunPhase::NotStarted;
        let ctx = Arc::new(RunContext::new(self.config.peer_id));
        self.channel
            .attach(Inbox::new(ctx.clone(), self.domain.decoder()));
        log::info!("Starting {} cross-validation", self.domain.name());

        let result = {
            let mut session = Session {
                driver: StepDriver::new(&mut self.channel, ctx.clone()),
                domain: &mut self.domain,
                config: self.config,
                phase: &mut self.phase,
                closed: false,
            };
            let result = session.drive();
            session.teardown();
            result
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            // An error recorded by the interpreter predates anything raised
            // locally afterwards.
            Err(err) => Outcome::Failed(ctx.error().unwrap_or(err)),
        };
        match &outcome {
            Outcome::Passed => log::info!("{} cross-validation passed", self.domain.name()),
            Outcome::Skipped(reason) => log::warn!("{} cross-validation skipped: {}", self.domain.name(), reason),
            Outcome::Failed(err) => log::error!(
                "{} cross-validation failed ({}): {}",
                self.domain.name(),
                err.category(),
                err
            ),
        }
        self.phase = RunPhase::Done(outcome.clone());
        outcome
    }
}

/// One run's borrowed resources. Tears down on drop if the run did not get
/// that far, so an unwinding step still closes the channel.
struct Session<'a, C: HubChannel, D: SensorDomain> {
    driver: StepDriver<'a, C>,
    domain: &'a mut D,
    config: ValidatorConfig,
    phase: &'a mut RunPhase,
    closed: bool,
}

impl<'a, C: HubChannel, D: SensorDomain> Session<'a, C, D> {
    fn enter(&mut self, phase: RunPhase) {
        log::debug!("Run phase {:?} -> {:?}", self.phase, phase);
        *self.phase = phase;
    }

    fn drive(&mut self) -> Result<Outcome, ValidationError> {
        let timeout = self.config.step_timeout;

        // ── CAPABILITIES ───────────────────────────────────────────────
        self.enter(RunPhase::Capabilities);
        let trigger = self.domain.start_message(Step::Capabilities)?;
        let pending = self.driver.start_step(Step::Capabilities, &trigger)?;
        self.driver.await_step_completion(pending, timeout)?;

        let capabilities = self
            .driver
            .context()
            .capabilities()
            .ok_or(ValidationError::MissingCapabilities)?;
        let required = self.domain.required_capabilities();
        if !capabilities.has_all(required) {
            return Ok(Outcome::Skipped(format!(
                "hub {} capabilities {:#b} lack required bits {:#b}",
                self.domain.name(),
                capabilities.bits,
                required
            )));
        }

        // ── SETUP ──────────────────────────────────────────────────────
        self.enter(RunPhase::Setup);
        let trigger = self.domain.start_message(Step::Setup)?;
        let pending = self.driver.start_step(Step::Setup, &trigger)?;
        self.driver.await_step_completion(pending, timeout)?;

        // ── VALIDATE ───────────────────────────────────────────────────
        self.enter(RunPhase::Validating);
        let trigger = self.domain.start_message(Step::Validate)?;
        let pending = self.driver.start_step(Step::Validate, &trigger)?;

        let dataset = self
            .domain
            .collect_host_data(&capabilities, self.config.collection_timeout)?;
        let messages = self.domain.comparison_messages(&dataset)?;
        for message in &messages {
            self.driver.send(message)?;
        }
        log::info!("Sent {} comparison messages to hub", messages.len());

        self.driver.await_step_completion(pending, timeout)?;
        Ok(Outcome::Passed)
    }

    fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.driver.close();
        self.domain.release();
        log::info!("Closed hub channel for {} cross-validation", self.domain.name());
    }
}

impl<'a, C: HubChannel, D: SensorDomain> Drop for Session<'a, C, D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

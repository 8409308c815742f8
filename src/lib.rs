//! hubcheck: host-side cross-validation of sensor hub data.
//!
//! A host and a sensor hub each observe the same environment. This crate
//! drives a fixed three-step protocol over a duplex message channel to the
//! hub's validation app, streams the host's own observation to the hub, and
//! reports whether the hub judged the two consistent. WiFi scan results are
//! the implemented domain; others plug in through [`domain::SensorDomain`].
//!
//! The crate carries no transport and no platform scan API. Consumers provide
//! both by implementing [`comm::HubChannel`] and [`collector::ScanSource`]:
//! - **Protocol**: `protocol`, `interpreter`, `driver`, `barrier`, `validator`
//! - **WiFi domain**: `wifi`, `collector`, `scanner`, `compare`
//! - **Support**: `comm`, `config`, `defaults`, `domain`, `error`

pub mod barrier;
pub mod collector;
pub mod comm;
pub mod compare;
pub mod config;
pub mod defaults;
pub mod domain;
pub mod driver;
pub mod error;
pub mod interpreter;
pub mod protocol;
pub mod scanner;
pub mod validator;
pub mod wifi;

pub use config::{ValidatorConfig, WifiSettings};
pub use error::ValidationError;
pub use validator::{Outcome, RunPhase, Validator};
pub use wifi::WifiDomain;

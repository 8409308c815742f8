//! Runtime configuration for a validation run.

use std::time::Duration;

use crate::defaults;
use crate::scanner::{Band, BandSet};

/// Timing and addressing for the step protocol. Sensor-domain agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Budget for each hub step round-trip.
    pub step_timeout: Duration,
    /// Budget for the host-side collection during VALIDATE.
    pub collection_timeout: Duration,
    /// Only messages from this peer are interpreted.
    pub peer_id: u64,
}

impl ValidatorConfig {
    pub const fn new() -> Self {
        Self {
            step_timeout: defaults::STEP_TIMEOUT,
            collection_timeout: defaults::COLLECTION_TIMEOUT,
            peer_id: defaults::PEER_ID,
        }
    }

    pub const fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub const fn with_collection_timeout(mut self, timeout: Duration) -> Self {
        self.collection_timeout = timeout;
        self
    }

    pub const fn with_peer_id(mut self, peer_id: u64) -> Self {
        self.peer_id = peer_id;
        self
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// WiFi-specific knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WifiSettings {
    /// Sent to the hub in the SETUP step.
    pub scan_capacity: u16,
    /// Bands assumed supported when the hub does not declare its own set.
    /// The hub firmware has no 6 GHz support, so that band is left out.
    pub fallback_bands: BandSet,
}

impl WifiSettings {
    pub const fn new() -> Self {
        Self {
            scan_capacity: defaults::SCAN_CAPACITY,
            fallback_bands: BandSet::EMPTY.with(Band::Ghz2_4).with(Band::Ghz5),
        }
    }
}

impl Default for WifiSettings {
    fn default() -> Self {
        Self::new()
    }
}

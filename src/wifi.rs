//! WiFi scan cross-validation domain.
//!
//! The hub buffers its own scan, the host streams its scan to the hub, and the
//! hub decides whether the two agree.

use std::sync::Arc;
use std::time::Duration;

use crate::collector::{ScanSource, WifiCollector};
use crate::compare;
use crate::config::WifiSettings;
use crate::defaults::WIFI_REQUIRED_CAPABILITIES;
use crate::domain::{PayloadDecoder, SensorDomain};
use crate::error::ValidationError;
use crate::protocol::{Capabilities, HubMessage, JsonPayloads};
use crate::scanner::ScanRecord;

pub struct WifiDomain<S: ScanSource> {
    collector: WifiCollector<S>,
    settings: WifiSettings,
}

impl<S: ScanSource> WifiDomain<S> {
    pub fn new(source: S, settings: WifiSettings) -> Self {
        Self {
            collector: WifiCollector::new(source),
            settings,
        }
    }

    pub fn source(&self) -> &S {
        self.collector.source()
    }
}

impl<S: ScanSource> SensorDomain for WifiDomain<S> {
    type Dataset = Vec<ScanRecord>;

    fn name(&self) -> &'static str {
        "wifi"
    }

    fn required_capabilities(&self) -> u32 {
        WIFI_REQUIRED_CAPABILITIES
    }

    fn decoder(&self) -> Arc<dyn PayloadDecoder> {
        Arc::new(JsonPayloads)
    }

    fn setup_capacity(&self) -> Option<u16> {
        Some(self.settings.scan_capacity)
    }

    fn collect_host_data(
        &mut self,
        capabilities: &Capabilities,
        timeout: Duration,
    ) -> Result<Vec<ScanRecord>, ValidationError> {
        let bands = capabilities.bands.unwrap_or(self.settings.fallback_bands);
        self.collector.collect(bands, timeout)
    }

    fn comparison_messages(&self, dataset: &Self::Dataset) -> Result<Vec<HubMessage>, ValidationError> {
        compare::scan_result_messages(dataset)
    }

    fn release(&mut self) {
        self.collector.release();
    }
}

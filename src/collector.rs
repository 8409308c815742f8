//! Host-side WiFi collection.
//!
//! The host platform's scan API is abstracted as a [`ScanSource`]: it accepts
//! a scan request and later reports completion through a [`ScanListener`]
//! registered once up front. [`WifiCollector`] turns that into a blocking,
//! timeout-bounded `collect` using the same one-shot gate as the hub steps.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::barrier::{Barrier, GateStatus, Releaser};
use crate::error::ValidationError;
use crate::scanner::{self, Band, BandSet, ScanRecord};

/// The host platform's scan facility.
pub trait ScanSource {
    /// Register for scan-completion notifications.
    fn register(&mut self, listener: ScanListener);

    /// Request a scan. `false` means the request was refused outright.
    fn start_scan(&mut self) -> bool;

    /// Results of the last completed scan.
    fn scan_results(&mut self) -> Vec<ScanRecord>;

    fn unregister(&mut self);
}

#[derive(Debug, Default)]
struct ListenerState {
    success: AtomicBool,
    releaser: Mutex<Option<Releaser>>,
}

/// Completion callback handed to a [`ScanSource`]. May be invoked from any
/// thread; notifications outside a `collect` are dropped.
#[derive(Debug, Clone, Default)]
pub struct ScanListener {
    state: Arc<ListenerState>,
}

impl ScanListener {
    pub fn on_scan_complete(&self, success: bool) {
        log::info!("Host scan completed (success: {})", success);
        self.state.success.store(success, Ordering::Release);
        if let Some(releaser) = self
            .state
            .releaser
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            releaser.release();
        }
    }

    fn arm(&self) -> Barrier {
        let (barrier, releaser) = Barrier::pair();
        self.state.success.store(false, Ordering::Release);
        *self
            .state
            .releaser
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(releaser);
        barrier
    }

    fn disarm(&self) {
        *self
            .state
            .releaser
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn succeeded(&self) -> bool {
        self.state.success.load(Ordering::Acquire)
    }
}

pub struct WifiCollector<S: ScanSource> {
    source: S,
    listener: ScanListener,
    registered: bool,
}

impl<S: ScanSource> WifiCollector<S> {
    pub fn new(mut source: S) -> Self {
        let listener = ScanListener::default();
        source.register(listener.clone());
        Self {
            source,
            listener,
            registered: true,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one host scan and return the records inside `bands`.
    ///
    /// Registers with the source again if a previous run released it.
    /// Records outside `bands` are dropped and logged. Fails if the scan is
    /// refused, reports failure, times out, or leaves nothing after filtering.
    pub fn collect(&mut self, bands: BandSet, timeout: Duration) -> Result<Vec<ScanRecord>, ValidationError> {
        if !self.registered {
            self.source.register(self.listener.clone());
            self.registered = true;
        }
        let barrier = self.listener.arm();
        let result = self.scan(&barrier, timeout);
        self.listener.disarm();
        let records = result?;

        if records.is_empty() {
            return Err(ValidationError::CollectionFailed("no wifi scan results returned by host"));
        }

        let total = records.len();
        let (kept, dropped): (Vec<ScanRecord>, Vec<ScanRecord>) =
            records.into_iter().partition(|r| bands.admits(r));
        for record in &dropped {
            log::debug!(
                "Dropping {} on {}",
                record.bssid,
                record.band().map_or("unknown band", |band| band.as_str())
            );
        }
        if !dropped.is_empty() {
            log::info!(
                "Filtering out scan results outside hub bands {:#05b}, total={} of {}",
                bands.bits(),
                dropped.len(),
                total
            );
        }
        if kept.is_empty() {
            return Err(ValidationError::NoScanResults);
        }
        Ok(kept)
    }

    fn scan(&mut self, barrier: &Barrier, timeout: Duration) -> Result<Vec<ScanRecord>, ValidationError> {
        if !self.source.start_scan() {
            return Err(ValidationError::CollectionFailed("host scan request was refused"));
        }
        if barrier.wait(timeout) == GateStatus::TimedOut {
            return Err(ValidationError::CollectionTimeout { timeout });
        }
        if !self.listener.succeeded() {
            return Err(ValidationError::CollectionFailed("host scan failed asynchronously"));
        }
        Ok(self.source.scan_results())
    }

    /// Unregister from the source. Idempotent.
    pub fn release(&mut self) {
        if self.registered {
            self.source.unregister();
            self.registered = false;
        }
    }
}

// ── Frame-capture source ───────────────────────────────────────────────

/// A [`ScanSource`] backed by captured 802.11 management frames.
///
/// Each scan reports the distinct BSSs seen in the beacon and probe-response
/// frames fed so far; completion is signalled as soon as the scan starts.
#[derive(Debug, Default)]
pub struct CaptureScanSource {
    records: Vec<ScanRecord>,
    seen: HashSet<String>,
    listener: Option<ScanListener>,
}

impl CaptureScanSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw frame captured on `channel` of `band`. Returns whether it
    /// added a new BSS. Frames on a channel the band does not have are dropped.
    pub fn feed(&mut self, frame: &[u8], channel: u8, band: Band) -> bool {
        let Some(frequency_mhz) = scanner::channel_frequency(channel, band) else {
            return false;
        };
        match scanner::parse_bss_frame(frame, frequency_mhz) {
            Some(record) if self.seen.insert(record.bssid.clone()) => {
                self.records.push(record);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ScanSource for CaptureScanSource {
    fn register(&mut self, listener: ScanListener) {
        self.listener = Some(listener);
    }

    fn start_scan(&mut self) -> bool {
        match &self.listener {
            Some(listener) => {
                listener.on_scan_complete(true);
                true
            }
            None => false,
        }
    }

    fn scan_results(&mut self) -> Vec<ScanRecord> {
        self.records.clone()
    }

    fn unregister(&mut self) {
        self.listener = None;
    }
}

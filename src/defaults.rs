//! Compiled-in protocol constants for the WiFi cross-validation run.
//!
//! Timeouts and capacities follow what the hub firmware has been observed to
//! tolerate: message round-trips complete in a few seconds, a host radio scan
//! can take tens of seconds.

use std::time::Duration;

/// Id of the cross-validation app running on the hub.
pub const PEER_ID: u64 = 0x476f_6f67_5400_0005;

/// How long to wait for the hub to answer a step start.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(7);

/// How long to wait for the host platform to finish its own scan.
pub const COLLECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of scan records the hub is told to buffer during SETUP.
pub const SCAN_CAPACITY: u16 = 100;

/// Hub capability bit: passive scan monitoring.
pub const CAP_SCAN_MONITORING: u32 = 1 << 0;

/// Hub capability bit: on-demand scan requests.
pub const CAP_ON_DEMAND_SCAN: u32 = 1 << 1;

/// Both capability bits must be present for a WiFi run to proceed.
pub const WIFI_REQUIRED_CAPABILITIES: u32 = CAP_SCAN_MONITORING | CAP_ON_DEMAND_SCAN;

/// Number of bytes in a BSSID.
pub const BSSID_LEN: usize = 6;

/// Length of a BSSID in "aa:bb:cc:dd:ee:ff" form.
pub const BSSID_STR_LEN: usize = BSSID_LEN * 3 - 1;

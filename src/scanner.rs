//! Host-side WiFi scan data: records, frequency bands, and frame parsing.
//!
//! Records come from the host platform's scan API, or are built from captured
//! 802.11 beacon / probe-response frames with the `ieee80211` crate.

use ieee80211::match_frames;
use ieee80211::mgmt_frame::{BeaconFrame, ProbeResponseFrame};

use crate::compare::format_mac;
use crate::protocol::NameString;

/// One access point as observed by the host.
///
/// `bssid` is kept in the platform's textual form and only validated when it
/// is encoded for the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    pub ssid: String,
    pub bssid: String,
    pub frequency_mhz: u32,
}

impl ScanRecord {
    pub fn new(ssid: &str, bssid: &str, frequency_mhz: u32) -> Self {
        Self {
            ssid: ssid.into(),
            bssid: bssid.into(),
            frequency_mhz,
        }
    }

    pub fn band(&self) -> Option<Band> {
        Band::from_frequency(self.frequency_mhz)
    }
}

// ── Bands ──────────────────────────────────────────────────────────────

/// WiFi frequency band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Ghz2_4,
    Ghz5,
    Ghz6,
}

impl Band {
    /// Classify a center frequency. Returns None outside the WiFi bands.
    pub fn from_frequency(mhz: u32) -> Option<Self> {
        match mhz {
            2400..=2500 => Some(Self::Ghz2_4),
            4900..=5899 => Some(Self::Ghz5),
            5925..=7125 => Some(Self::Ghz6),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ghz2_4 => "2.4GHz",
            Self::Ghz5 => "5GHz",
            Self::Ghz6 => "6GHz",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Ghz2_4 => 1 << 0,
            Self::Ghz5 => 1 << 1,
            Self::Ghz6 => 1 << 2,
        }
    }
}

/// Set of bands, stored as the same bitmask the hub reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BandSet {
    bits: u8,
}

impl BandSet {
    pub const EMPTY: Self = Self { bits: 0 };

    /// Unknown bits are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self { bits: bits & 0b111 }
    }

    pub const fn bits(&self) -> u8 {
        self.bits
    }

    pub const fn with(self, band: Band) -> Self {
        Self {
            bits: self.bits | band.bit(),
        }
    }

    pub const fn contains(&self, band: Band) -> bool {
        self.bits & band.bit() != 0
    }

    /// Whether a record falls inside one of the bands in this set.
    pub fn admits(&self, record: &ScanRecord) -> bool {
        record.band().is_some_and(|band| self.contains(band))
    }
}

/// Center frequency in MHz for a channel number in the given band.
pub fn channel_frequency(channel: u8, band: Band) -> Option<u32> {
    let ch = channel as u32;
    match band {
        Band::Ghz2_4 => match channel {
            1..=13 => Some(2407 + 5 * ch),
            14 => Some(2484),
            _ => None,
        },
        Band::Ghz5 => match channel {
            32..=177 => Some(5000 + 5 * ch),
            _ => None,
        },
        Band::Ghz6 => match channel {
            2 => Some(5935),
            1..=233 => Some(5950 + 5 * ch),
            _ => None,
        },
    }
}

// ── Frame parsing ──────────────────────────────────────────────────────

/// Build a scan record from a raw 802.11 beacon or probe-response frame.
///
/// Other frame types carry no BSS description and yield None, as do frames
/// the parser rejects.
pub fn parse_bss_frame(frame: &[u8], frequency_mhz: u32) -> Option<ScanRecord> {
    let result = match_frames! {
        frame,
        beacon = BeaconFrame<'_> => {
            build_record(
                &beacon.header.transmitter_address.0,
                beacon.body.ssid().unwrap_or(""),
                frequency_mhz,
            )
        }
        probe_resp = ProbeResponseFrame<'_> => {
            build_record(
                &probe_resp.header.transmitter_address.0,
                probe_resp.body.ssid().unwrap_or(""),
                frequency_mhz,
            )
        }
    };

    result.ok()
}

fn build_record(mac: &[u8; 6], ssid: &str, frequency_mhz: u32) -> ScanRecord {
    let mut ssid_str = NameString::new();
    for ch in ssid.chars() {
        if ssid_str.push(ch).is_err() {
            break;
        }
    }
    let mut bssid = crate::compare::MacString::new();
    format_mac(mac, &mut bssid);
    ScanRecord {
        ssid: ssid_str.as_str().into(),
        bssid: bssid.as_str().into(),
        frequency_mhz,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal beacon: header, fixed fields, one SSID element.
    pub(crate) fn beacon_frame(bssid: [u8; 6], ssid: &str) -> Vec<u8> {
        let mut frame = vec![0x80, 0x00, 0x00, 0x00];
        frame.extend_from_slice(&[0xff; 6]); // receiver: broadcast
        frame.extend_from_slice(&bssid); // transmitter
        frame.extend_from_slice(&bssid); // bssid
        frame.extend_from_slice(&[0x00, 0x00]); // sequence control
        frame.extend_from_slice(&[0u8; 8]); // timestamp
        frame.extend_from_slice(&[0x64, 0x00]); // beacon interval
        frame.extend_from_slice(&[0x01, 0x04]); // capabilities
        frame.push(0x00);
        frame.push(ssid.len() as u8);
        frame.extend_from_slice(ssid.as_bytes());
        frame
    }

    #[test]
    fn band_classification() {
        assert_eq!(Band::from_frequency(2412), Some(Band::Ghz2_4));
        assert_eq!(Band::from_frequency(5180), Some(Band::Ghz5));
        assert_eq!(Band::from_frequency(5955), Some(Band::Ghz6));
        assert_eq!(Band::from_frequency(900), None);
    }

    #[test]
    fn channel_to_frequency() {
        assert_eq!(channel_frequency(1, Band::Ghz2_4), Some(2412));
        assert_eq!(channel_frequency(6, Band::Ghz2_4), Some(2437));
        assert_eq!(channel_frequency(14, Band::Ghz2_4), Some(2484));
        assert_eq!(channel_frequency(36, Band::Ghz5), Some(5180));
        assert_eq!(channel_frequency(1, Band::Ghz6), Some(5955));
        assert_eq!(channel_frequency(0, Band::Ghz2_4), None);
    }

    #[test]
    fn band_set_membership() {
        let set = BandSet::EMPTY.with(Band::Ghz2_4);
        assert!(set.contains(Band::Ghz2_4));
        assert!(!set.contains(Band::Ghz5));
        assert_eq!(BandSet::from_bits(0xff).bits(), 0b111);

        assert!(set.admits(&ScanRecord::new("a", "00:11:22:33:44:55", 2437)));
        assert!(!set.admits(&ScanRecord::new("b", "00:11:22:33:44:55", 5180)));
        assert!(!set.admits(&ScanRecord::new("c", "00:11:22:33:44:55", 0)));
    }

    #[test]
    fn parses_beacon_into_record() {
        let frame = beacon_frame([0xB4, 0x1E, 0x52, 0xAB, 0xCD, 0xEF], "HomeNet");
        let record = parse_bss_frame(&frame, 2437).unwrap();
        assert_eq!(record.ssid, "HomeNet");
        assert_eq!(record.bssid, "B4:1E:52:AB:CD:EF");
        assert_eq!(record.frequency_mhz, 2437);
    }

    #[test]
    fn short_frames_are_rejected() {
        assert_eq!(parse_bss_frame(&[0x80, 0x00, 0x00], 2412), None);
        assert_eq!(parse_bss_frame(&[], 2412), None);
    }
}

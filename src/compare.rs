/// WiFi comparison: the hub does the actual matching, so this side only
/// validates BSSIDs and turns the host dataset into an ordered stream of
/// SCAN_RESULT messages tagged with index and total.
use core::fmt::Write;

use crate::defaults::{BSSID_LEN, BSSID_STR_LEN};
use crate::error::ValidationError;
use crate::protocol::{self, HubMessage, MessageKind, ScanResult};
use crate::scanner::ScanRecord;

/// Maximum length for MAC address strings ("AA:BB:CC:DD:EE:FF")
pub type MacString = heapless::String<18>;

/// Parse a colon-separated BSSID ("aa:bb:cc:dd:ee:ff") into bytes.
///
/// Exactly six two-digit hex pairs with a colon between each pair. Either
/// hex case is accepted.
pub fn parse_mac(bssid: &str) -> Result<[u8; BSSID_LEN], ValidationError> {
    let invalid = || ValidationError::InvalidAddress(bssid.into());
    let raw = bssid.as_bytes();
    if raw.len() != BSSID_STR_LEN {
        return Err(invalid());
    }

    let mut mac = [0u8; BSSID_LEN];
    for (i, byte) in mac.iter_mut().enumerate() {
        let pos = i * 3;
        let hi = hex_value(raw[pos]).ok_or_else(invalid)?;
        let lo = hex_value(raw[pos + 1]).ok_or_else(invalid)?;
        if i + 1 < BSSID_LEN && raw[pos + 2] != b':' {
            return Err(invalid());
        }
        *byte = (hi << 4) | lo;
    }
    Ok(mac)
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Format a 6-byte MAC address into "AA:BB:CC:DD:EE:FF" string
pub fn format_mac(mac: &[u8; 6], buf: &mut MacString) {
    let _ = write!(
        buf,
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );
}

/// Encode every record as a SCAN_RESULT, in dataset order.
///
/// All addresses are validated before any message is built, so a malformed
/// BSSID anywhere in the dataset means nothing is sent.
pub fn scan_result_messages(records: &[ScanRecord]) -> Result<Vec<HubMessage>, ValidationError> {
    let bssids = records
        .iter()
        .map(|r| parse_mac(&r.bssid))
        .collect::<Result<Vec<_>, _>>()?;

    let total = u32::try_from(records.len())
        .map_err(|_| ValidationError::Encode("too many scan records"))?;

    records
        .iter()
        .zip(bssids)
        .enumerate()
        .map(|(index, (record, bssid))| {
            let payload = ScanResult {
                ssid: &record.ssid,
                bssid,
                total,
                index: index as u32,
            };
            protocol::encode(MessageKind::ScanResult, &payload)
        })
        .collect()
}

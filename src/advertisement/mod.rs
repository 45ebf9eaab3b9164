//! Advertisement decoding and Grantor-side discovery.

mod continuity;

pub use continuity::*;

use tracing::{debug, info, warn};

use crate::pairing::{ConfigFlag, GrantorShareInfo, SessionConfig};

/// Filters scanned manufacturer data for password requests a Grantor can
/// answer.
#[derive(Debug, Clone)]
pub struct Discovery {
    ssid_hash: ShortHash,
    check_ssid: bool,
}

impl Discovery {
    /// Discovery for a Grantor sharing `share` under `config`.
    pub fn new(share: &GrantorShareInfo, config: &SessionConfig) -> Self {
        Self {
            ssid_hash: share.ssid_hash(),
            check_ssid: !config.has(ConfigFlag::NoSsidCheck),
        }
    }

    /// Check a decoded request against the shared network.
    pub fn matches(&self, adv: &PwsAdvertisement) -> bool {
        !self.check_ssid || adv.ssid_hash == self.ssid_hash
    }

    /// Examine one scanned manufacturer-data report.
    ///
    /// Non-Apple data is skipped silently and malformed data is logged and
    /// skipped. Returns the request when it matches.
    pub fn observe(&self, manufacturer_data: &[u8]) -> Option<PwsAdvertisement> {
        let adv = match AppleAdvertisement::parse(manufacturer_data) {
            Ok(Some(adv)) => adv,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "skipping malformed advertisement");
                return None;
            }
        };
        let pws = *adv.pws()?;
        if self.matches(&pws) {
            info!(ssid_hash = %hex::encode(pws.ssid_hash), "password request matched");
            Some(pws)
        } else {
            debug!(ssid_hash = %hex::encode(pws.ssid_hash), "password request for another network");
            None
        }
    }

    /// First matching request in a stream of reports.
    pub fn first_match<'a, I>(&self, reports: I) -> Option<PwsAdvertisement>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        reports.into_iter().find_map(|report| self.observe(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(ssid: &str) -> Vec<u8> {
        let pws = PwsAdvertisement::for_request("user@example.com", ssid);
        AppleAdvertisement {
            messages: vec![ContinuityMessage::NearbyAction(
                NearbyActionFrame::password_request(pws),
            )],
        }
        .encode()
    }

    #[test]
    fn test_matches_own_ssid_only() {
        let share = GrantorShareInfo::new("lambda", "secret");
        let discovery = Discovery::new(&share, &SessionConfig::default());

        assert!(discovery.observe(&request("lambda")).is_some());
        assert!(discovery.observe(&request("other")).is_none());
    }

    #[test]
    fn test_no_ssid_check_accepts_any() {
        let share = GrantorShareInfo::new("lambda", "secret");
        let config = SessionConfig::default().with_flag(ConfigFlag::NoSsidCheck);
        let discovery = Discovery::new(&share, &config);
        assert!(discovery.observe(&request("other")).is_some());
    }

    #[test]
    fn test_skips_garbage_and_foreign_reports() {
        let share = GrantorShareInfo::new("lambda", "secret");
        let discovery = Discovery::new(&share, &SessionConfig::default());
        let garbage = vec![0x4c, 0x00, 0x0f, 0x40];
        let foreign = vec![0x06, 0x00, 0x01, 0x09];
        let good = request("lambda");

        let reports = vec![garbage.as_slice(), foreign.as_slice(), good.as_slice()];
        assert!(discovery.first_match(reports).is_some());
    }
}

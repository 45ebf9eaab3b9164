//! What each role brings to, and takes from, a session.

use crate::advertisement::{PwsAdvertisement, ShortHash, short_hash};
use crate::encoding::Dictionary;

use super::error::ProtocolError;
use super::messages::keys;

/// Network credentials a Grantor offers.
#[derive(Clone, PartialEq, Eq)]
pub struct GrantorShareInfo {
    /// Network name.
    pub ssid: String,
    /// Pre-shared key.
    pub psk: String,
    /// Mail hash sent as `eh`.
    pub mail_hash: Option<String>,
    /// Phone hash sent as `ph`.
    pub phone_hash: Option<String>,
}

impl GrantorShareInfo {
    /// Share `psk` for `ssid`.
    pub fn new(ssid: &str, psk: &str) -> Self {
        Self {
            ssid: ssid.to_owned(),
            psk: psk.to_owned(),
            mail_hash: None,
            phone_hash: None,
        }
    }

    /// Attach a mail hash.
    pub fn with_mail_hash(mut self, hash: &str) -> Self {
        self.mail_hash = Some(hash.to_owned());
        self
    }

    /// Attach a phone hash.
    pub fn with_phone_hash(mut self, hash: &str) -> Self {
        self.phone_hash = Some(hash.to_owned());
        self
    }

    /// Truncated SHA-256 of the SSID, as advertised by Requestors.
    pub fn ssid_hash(&self) -> ShortHash {
        short_hash(self.ssid.as_bytes())
    }
}

impl std::fmt::Debug for GrantorShareInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantorShareInfo")
            .field("ssid", &self.ssid)
            .field("psk", &"[redacted]")
            .field("mail_hash", &self.mail_hash)
            .field("phone_hash", &self.phone_hash)
            .finish()
    }
}

/// Who a Requestor is and where it is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestorShareInfo {
    /// Account the Requestor's identity belongs to.
    pub apple_account_id: String,
    /// Address of the transport endpoint (e.g. the GATT relay).
    pub transport_address: String,
    /// Network being asked for. PWS3 naming another network is rejected.
    pub ssid: Option<String>,
}

impl RequestorShareInfo {
    /// Create share info.
    pub fn new(apple_account_id: &str, transport_address: &str) -> Self {
        Self {
            apple_account_id: apple_account_id.to_owned(),
            transport_address: transport_address.to_owned(),
            ssid: None,
        }
    }

    /// Ask for `ssid`.
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = Some(ssid.to_owned());
        self
    }

    /// Advertisement parameters asking for the requested network.
    pub fn advertisement(&self) -> Option<PwsAdvertisement> {
        let ssid = self.ssid.as_deref()?;
        Some(PwsAdvertisement::for_request(&self.apple_account_id, ssid))
    }

    /// Check that received credentials are for the requested network.
    ///
    /// Credentials without a network name are accepted.
    pub(crate) fn check_network(&self, received: &ReceivedCredentials) -> Result<(), ProtocolError> {
        match (&self.ssid, &received.ssid) {
            (Some(requested), Some(got)) if requested != got => {
                Err(ProtocolError::UnexpectedNetwork {
                    requested: requested.clone(),
                    received: got.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Credentials a Requestor received in PWS3.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ReceivedCredentials {
    /// Network name (`nw`).
    pub ssid: Option<String>,
    /// Pre-shared key (`psk`).
    pub psk: Option<String>,
    /// Mail hash (`eh`).
    pub mail_hash: Option<String>,
    /// Phone hash (`ph`).
    pub phone_hash: Option<String>,
}

impl ReceivedCredentials {
    /// Pick the credential fields out of a decrypted PWS3 dictionary.
    pub fn from_dict(dict: &Dictionary) -> Self {
        let text = |key: &str| dict.get_str(key).map(str::to_owned);
        Self {
            ssid: text(keys::NETWORK),
            psk: text(keys::PSK),
            mail_hash: text(keys::MAIL_HASH),
            phone_hash: text(keys::PHONE_HASH),
        }
    }
}

impl std::fmt::Debug for ReceivedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceivedCredentials")
            .field("ssid", &self.ssid)
            .field("psk", &self.psk.as_ref().map(|_| "[redacted]"))
            .field("mail_hash", &self.mail_hash)
            .field("phone_hash", &self.phone_hash)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};

    #[test]
    fn test_ssid_hash() {
        let share = GrantorShareInfo::new("lambda", "secret");
        let digest = Sha256::digest(b"lambda");
        assert_eq!(share.ssid_hash()[..], digest[..3]);
    }

    #[test]
    fn test_debug_redacts_psk() {
        let share = GrantorShareInfo::new("lambda", "secret");
        assert!(!format!("{share:?}").contains("secret"));

        let creds = ReceivedCredentials {
            psk: Some("secret".into()),
            ..Default::default()
        };
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[test]
    fn test_requestor_advertisement_targets_ssid() {
        let info = RequestorShareInfo::new("user@example.com", "127.0.0.1:8080");
        assert!(info.advertisement().is_none());

        let adv = info.with_ssid("lambda").advertisement().unwrap();
        assert_eq!(adv.ssid_hash, GrantorShareInfo::new("lambda", "").ssid_hash());
    }

    #[test]
    fn test_check_network() {
        let creds = |ssid: Option<&str>| ReceivedCredentials {
            ssid: ssid.map(str::to_owned),
            ..Default::default()
        };
        let any = RequestorShareInfo::new("user@example.com", "relay");
        assert!(any.check_network(&creds(Some("lambda"))).is_ok());

        let lambda = any.with_ssid("lambda");
        assert!(lambda.check_network(&creds(Some("lambda"))).is_ok());
        assert!(lambda.check_network(&creds(None)).is_ok());
        assert_eq!(
            lambda.check_network(&creds(Some("omega"))),
            Err(ProtocolError::UnexpectedNetwork {
                requested: "lambda".into(),
                received: "omega".into(),
            })
        );
    }
}

//! Message contents.
//!
//! PWS1, PWS2 and the pair-verify envelopes travel as encoded dictionaries.
//! Pair-verify data sits under `pd` as TLV8. PWS3 and PWS4 are dictionaries
//! encrypted with the session cipher.

use crate::core::{
    M1_PAIRING_FLAGS, PWS1_SESSION_ID, PWS_OPERATION, PWS_REPLY_ACCEPTED, PwsResult,
    SHARING_VERSION,
};
use crate::encoding::{Dictionary, Tlv8Box};

use super::config::{ConfigFlag, SessionConfig};
use super::error::ProtocolError;
use super::share::GrantorShareInfo;

/// Dictionary keys.
pub mod keys {
    /// PWS1 session identifier.
    pub const SESSION_ID: &str = "sid";
    /// Sharing protocol version.
    pub const SHARING_VERSION: &str = "shv";
    /// M1 pairing flags.
    pub const PAIRING_FLAGS: &str = "pf";
    /// Pair-verify TLV8 data.
    pub const PAIRING_DATA: &str = "pd";
    /// Operation code.
    pub const OPERATION: &str = "op";
    /// Reply code.
    pub const REPLY: &str = "re";
    /// Mail hash.
    pub const MAIL_HASH: &str = "eh";
    /// Phone hash.
    pub const PHONE_HASH: &str = "ph";
    /// Network name.
    pub const NETWORK: &str = "nw";
    /// Pre-shared key.
    pub const PSK: &str = "psk";
}

/// Pair-verify TLV8 item types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PairVerifyTlv {
    /// Ephemeral X25519 public key.
    PublicKey = 0x03,
    /// AEAD output.
    EncryptedData = 0x05,
    /// Message number (1..4).
    State = 0x06,
    /// Compressed account certificate.
    Certificate = 0x09,
    /// Account signature over both public keys.
    Signature = 0x0a,
    /// Compressed validation record.
    ValidationRecord = 0x14,
}

impl PairVerifyTlv {
    /// Convert to the TLV type byte.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Pair-verify message numbers carried in [`PairVerifyTlv::State`].
pub mod pv_state {
    /// M1.
    pub const M1: u8 = 1;
    /// M2.
    pub const M2: u8 = 2;
    /// M3.
    pub const M3: u8 = 3;
    /// M4.
    pub const M4: u8 = 4;
}

/// PWS1 contents.
pub fn pws1() -> Dictionary {
    Dictionary::new()
        .with(keys::SESSION_ID, PWS1_SESSION_ID)
        .with(keys::SHARING_VERSION, SHARING_VERSION)
}

/// PWS2 contents.
pub fn pws2() -> Dictionary {
    Dictionary::new().with(keys::SHARING_VERSION, SHARING_VERSION)
}

/// Wrap pair-verify TLV8 data. M1 additionally carries the pairing flags.
pub fn pair_verify_envelope(tlv: &Tlv8Box, include_flags: bool) -> Dictionary {
    let dict = Dictionary::new().with(keys::PAIRING_DATA, tlv.serialize());
    if include_flags {
        dict.with(keys::PAIRING_FLAGS, M1_PAIRING_FLAGS)
    } else {
        dict
    }
}

/// Unwrap pair-verify TLV8 data.
pub fn open_pair_verify_envelope(dict: &Dictionary) -> PwsResult<Tlv8Box> {
    let pd = dict
        .get_data(keys::PAIRING_DATA)
        .ok_or(ProtocolError::MissingField("pd"))?;
    Ok(Tlv8Box::deserialize(pd)?)
}

/// Message number of a pair-verify TLV.
pub fn pair_verify_state(tlv: &Tlv8Box) -> Result<u8, ProtocolError> {
    tlv.get_u8(PairVerifyTlv::State.as_byte())
        .ok_or(ProtocolError::MissingField("state"))
}

/// Required TLV item.
pub fn require(tlv: &Tlv8Box, item: PairVerifyTlv, name: &'static str) -> Result<Vec<u8>, ProtocolError> {
    tlv.get_value(item.as_byte())
        .ok_or(ProtocolError::MissingField(name))
}

/// PWS3 contents for `share` under `config`.
pub fn pws3(share: &GrantorShareInfo, config: &SessionConfig) -> Dictionary {
    let mut dict = Dictionary::new().with(keys::OPERATION, PWS_OPERATION);
    if !config.has(ConfigFlag::NoMailHash) {
        if let Some(hash) = &share.mail_hash {
            dict.insert(keys::MAIL_HASH, hash.as_str());
        }
    }
    if !config.has(ConfigFlag::NoPhoneHash) {
        if let Some(hash) = &share.phone_hash {
            dict.insert(keys::PHONE_HASH, hash.as_str());
        }
    }
    if !config.has(ConfigFlag::NoSsid) {
        dict.insert(keys::NETWORK, share.ssid.as_str());
    }
    if !config.has(ConfigFlag::NoPsk) {
        dict.insert(keys::PSK, share.psk.as_str());
    }
    dict
}

/// PWS4 contents.
pub fn pws4() -> Dictionary {
    Dictionary::new()
        .with(keys::REPLY, PWS_REPLY_ACCEPTED)
        .with(keys::OPERATION, PWS_OPERATION)
}

/// Require PWS4 to acknowledge the share.
pub fn check_pws4(dict: &Dictionary) -> Result<(), ProtocolError> {
    let op = dict.get_int(keys::OPERATION);
    let re = dict.get_int(keys::REPLY);
    if op == Some(PWS_OPERATION) && re == Some(PWS_REPLY_ACCEPTED) {
        Ok(())
    } else {
        Err(ProtocolError::UnexpectedReply { op, re })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PwsError;

    #[test]
    fn test_item_type_bytes() {
        let types = [
            PairVerifyTlv::PublicKey,
            PairVerifyTlv::EncryptedData,
            PairVerifyTlv::State,
            PairVerifyTlv::Certificate,
            PairVerifyTlv::Signature,
            PairVerifyTlv::ValidationRecord,
        ];
        let bytes: Vec<u8> = types.iter().map(|t| t.as_byte()).collect();
        assert_eq!(bytes, vec![0x03, 0x05, 0x06, 0x09, 0x0a, 0x14]);
    }

    #[test]
    fn test_session_start_dictionaries() {
        let d = pws1();
        assert_eq!(d.get_int("sid"), Some(1_576_046_130));
        assert_eq!(d.get_str("shv"), Some("1476.17"));
        assert_eq!(pws2().keys().collect::<Vec<_>>(), vec!["shv"]);
    }

    #[test]
    fn test_envelope_round_trip() {
        let mut tlv = Tlv8Box::new();
        tlv.add_int(PairVerifyTlv::State.as_byte(), pv_state::M1);
        let env = pair_verify_envelope(&tlv, true);
        assert_eq!(env.get_int("pf"), Some(1_052_676));

        let opened = open_pair_verify_envelope(&env).unwrap();
        assert_eq!(pair_verify_state(&opened).unwrap(), 1);
        assert!(!pair_verify_envelope(&tlv, false).contains_key("pf"));
    }

    #[test]
    fn test_envelope_without_pd() {
        assert!(matches!(
            open_pair_verify_envelope(&Dictionary::new()),
            Err(PwsError::Protocol(ProtocolError::MissingField("pd")))
        ));
        assert_eq!(
            pair_verify_state(&Tlv8Box::new()),
            Err(ProtocolError::MissingField("state"))
        );
    }

    #[test]
    fn test_pws3_fields_follow_flags() {
        let share = GrantorShareInfo::new("lambda", "secret")
            .with_mail_hash("mail")
            .with_phone_hash("phone");

        let all = pws3(&share, &SessionConfig::default());
        assert_eq!(all.get_int("op"), Some(5));
        assert_eq!(all.get_str("eh"), Some("mail"));
        assert_eq!(all.get_str("ph"), Some("phone"));
        assert_eq!(all.get_str("nw"), Some("lambda"));
        assert_eq!(all.get_str("psk"), Some("secret"));

        let config = SessionConfig::default().with_flags([
            ConfigFlag::NoMailHash,
            ConfigFlag::NoPhoneHash,
            ConfigFlag::NoSsid,
            ConfigFlag::NoPsk,
        ]);
        assert_eq!(pws3(&share, &config).keys().collect::<Vec<_>>(), vec!["op"]);
    }

    #[test]
    fn test_pws3_skips_absent_hashes() {
        let share = GrantorShareInfo::new("lambda", "secret");
        let dict = pws3(&share, &SessionConfig::default());
        assert!(!dict.contains_key("eh"));
        assert!(!dict.contains_key("ph"));
    }

    #[test]
    fn test_pws4_check() {
        assert_eq!(check_pws4(&pws4()), Ok(()));
        assert_eq!(
            check_pws4(&Dictionary::new().with("op", 5)),
            Err(ProtocolError::UnexpectedReply {
                op: Some(5),
                re: None
            })
        );
        assert_eq!(
            check_pws4(&Dictionary::new().with("op", 5).with("re", 0)),
            Err(ProtocolError::UnexpectedReply {
                op: Some(5),
                re: Some(0)
            })
        );
    }
}

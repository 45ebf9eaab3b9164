//! Session configuration.

use std::collections::BTreeSet;

use crate::core::{PwsError, SESSION_HEADER_SIZE};

/// Behaviour switches of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigFlag {
    /// Omit `psk` from PWS3.
    NoPsk,
    /// Omit `nw` from PWS3.
    NoSsid,
    /// Omit `ph` from PWS3.
    NoPhoneHash,
    /// Omit `eh` from PWS3.
    NoMailHash,
    /// Accept password requests for any SSID.
    NoSsidCheck,
    /// Continue the handshake when the Requestor's identity does not verify.
    ///
    /// # Security
    /// With this flag any peer that completes the key exchange receives the
    /// credentials. Lab use only.
    IgnoreInvalidPeerValidation,
}

/// Immutable session configuration.
///
/// Built once, then moved into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    flags: BTreeSet<ConfigFlag>,
    mix_ephemeral_entropy: bool,
    max_frame_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            flags: BTreeSet::new(),
            mix_ephemeral_entropy: true,
            max_frame_len: u16::MAX as usize,
        }
    }
}

impl SessionConfig {
    /// Configuration with no flags set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag.
    pub fn with_flag(mut self, flag: ConfigFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    /// Set several flags.
    pub fn with_flags(mut self, flags: impl IntoIterator<Item = ConfigFlag>) -> Self {
        self.flags.extend(flags);
        self
    }

    /// Pass ephemeral secrets through HKDF before use (default `true`).
    pub fn with_entropy_mixing(mut self, enabled: bool) -> Self {
        self.mix_ephemeral_entropy = enabled;
        self
    }

    /// Largest nearby frame body accepted from the peer.
    pub fn with_max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    /// Check if `flag` is set.
    pub fn has(&self, flag: ConfigFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// All set flags.
    pub fn flags(&self) -> impl Iterator<Item = ConfigFlag> + '_ {
        self.flags.iter().copied()
    }

    /// Whether ephemeral secrets are mixed through HKDF.
    pub fn mix_ephemeral_entropy(&self) -> bool {
        self.mix_ephemeral_entropy
    }

    /// Largest nearby frame body accepted from the peer.
    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Reject values no session can run with.
    ///
    /// `max_frame_len` must fit a session header and the LE16 length prefix.
    pub fn validate(&self) -> Result<(), PwsError> {
        if !(SESSION_HEADER_SIZE..=u16::MAX as usize).contains(&self.max_frame_len) {
            return Err(PwsError::Config(format!(
                "max_frame_len {} outside {SESSION_HEADER_SIZE}..={}",
                self.max_frame_len,
                u16::MAX
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.flags().count(), 0);
        assert!(config.mix_ephemeral_entropy());
        assert_eq!(config.max_frame_len(), 65535);
    }

    #[test]
    fn test_flags_accumulate() {
        let config = SessionConfig::new()
            .with_flags([ConfigFlag::NoPhoneHash, ConfigFlag::NoMailHash])
            .with_flag(ConfigFlag::NoPhoneHash);
        assert!(config.has(ConfigFlag::NoMailHash));
        assert!(config.has(ConfigFlag::NoPhoneHash));
        assert!(!config.has(ConfigFlag::NoPsk));
        assert_eq!(config.flags().count(), 2);
    }

    #[test]
    fn test_validate_frame_len() {
        assert!(SessionConfig::default().validate().is_ok());
        assert!(SessionConfig::new().with_max_frame_len(2).validate().is_ok());
        for len in [0, 1, 65536] {
            let err = SessionConfig::new().with_max_frame_len(len).validate();
            assert!(matches!(err, Err(PwsError::Config(_))), "len {len}");
        }
    }
}

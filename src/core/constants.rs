//! Protocol constants for password sharing.
//!
//! These values are fixed by the wire protocol and MUST NOT be changed.

// =============================================================================
// CRYPTOGRAPHIC CONSTANTS
// =============================================================================

/// Poly1305 authentication tag size.
pub const AEAD_TAG_SIZE: usize = 16;

/// IETF ChaCha20 nonce size.
pub const AEAD_NONCE_SIZE: usize = 12;

/// Size of a handshake nonce label before padding to [`AEAD_NONCE_SIZE`].
pub const HANDSHAKE_NONCE_LABEL_SIZE: usize = 8;

/// X25519 public key size.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// X25519 private key size.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Symmetric key size produced by every HKDF derivation.
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Length of the truncated SHA-256 identity hashes carried in advertisements.
pub const SHORT_HASH_SIZE: usize = 3;

// =============================================================================
// KEY SCHEDULE LABELS (HKDF-SHA512 salt / info pairs)
// =============================================================================

/// Optional entropy-mixing pass over the random ephemeral secret.
pub const ECDH_SALT: &[u8] = b"Pair-Verify-ECDH-Salt";
/// Info for the entropy-mixing pass.
pub const ECDH_INFO: &[u8] = b"Pair-Verify-ECDH-Info";

/// Pair-verify handshake key.
pub const PAIR_VERIFY_SALT: &[u8] = b"Pair-Verify-Encrypt-Salt";
/// Info for the pair-verify handshake key.
pub const PAIR_VERIFY_INFO: &[u8] = b"Pair-Verify-Encrypt-Info";

/// Application key used for PWS3 (Grantor to Requestor).
pub const WRITE_KEY_SALT: &[u8] = b"WriteKeySalt";
/// Info for the write key.
pub const WRITE_KEY_INFO: &[u8] = b"WriteKeyInfo";

/// Application key used for PWS4 (Requestor to Grantor).
pub const READ_KEY_SALT: &[u8] = b"ReadKeySalt";
/// Info for the read key.
pub const READ_KEY_INFO: &[u8] = b"ReadKeyInfo";

/// Nonce label sealing the M2 identity proof.
pub const PV_MSG02_NONCE: &[u8] = b"PV-Msg02";
/// Nonce label for the M3 empty-plaintext authenticator.
pub const PV_MSG03_NONCE: &[u8] = b"PV-Msg03";

// =============================================================================
// SESSION DICTIONARY VALUES
// =============================================================================

/// Session identifier carried in PWS1 (`sid`). Never checked by the peer.
pub const PWS1_SESSION_ID: i64 = 1_576_046_130;

/// Sharing protocol version string carried in PWS1 and PWS2 (`shv`).
pub const SHARING_VERSION: &str = "1476.17";

/// Pairing flags carried in M1 (`pf`).
pub const M1_PAIRING_FLAGS: i64 = 1_052_676;

/// Operation code for a password share (`op`).
pub const PWS_OPERATION: i64 = 5;

/// Reply code the Requestor returns in PWS4 (`re`).
pub const PWS_REPLY_ACCEPTED: i64 = 1;

// =============================================================================
// ADVERTISEMENT CONSTANTS
// =============================================================================

/// Apple company identifier as it appears in manufacturer data (LE16 0x004C).
pub const APPLE_COMPANY_ID: [u8; 2] = [0x4c, 0x00];

/// Continuity message type of a nearby-action frame.
pub const NEARBY_ACTION_TYPE: u8 = 0x0f;

/// Nearby-action type of a Wi-Fi password request.
pub const PWS_ACTION_TYPE: u8 = 0x08;

/// Minimum nearby-action frame: flags, action type, three-byte auth tag.
pub const MIN_NEARBY_ACTION_SIZE: usize = 5;

/// Minimum PWS advertisement parameter block: four three-byte hashes.
pub const MIN_PWS_PARAMETER_SIZE: usize = 4 * SHORT_HASH_SIZE;

/// Minimum manufacturer data: company identifier plus one type byte.
pub const MIN_MANUFACTURER_DATA_SIZE: usize = 3;

// =============================================================================
// TRANSPORT CONSTANTS
// =============================================================================

/// Size of the little-endian nearby frame length prefix.
pub const NEARBY_LENGTH_PREFIX_SIZE: usize = 2;

/// Size of the session frame header (frame type, service type).
pub const SESSION_HEADER_SIZE: usize = 2;

/// Chunk size used for GATT characteristic writes.
pub const GATT_WRITE_CHUNK: usize = 99;

/// Chunk size used for writes to the TCP GATT relay.
pub const TCP_BRIDGE_CHUNK: usize = 101;

/// Fixed record size of relay-to-client TCP bridge records.
pub const TCP_BRIDGE_RECORD_SIZE: usize = 256;

/// Default TCP port of the GATT relay.
pub const DEFAULT_BRIDGE_PORT: u16 = 8080;

/// GATT service UUID of the sharing service.
pub const SHARING_SERVICE_UUID: &str = "9FA480E0-4967-4542-9390-D343DC5D04AE";

/// GATT characteristic UUID used for nearby frames.
pub const SHARING_CHARACTERISTIC_UUID: &str = "AF0BADB1-5B99-43CD-917A-A77BC549E3CC";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_labels_fit_label_size() {
        assert_eq!(PV_MSG02_NONCE.len(), HANDSHAKE_NONCE_LABEL_SIZE);
        assert_eq!(PV_MSG03_NONCE.len(), HANDSHAKE_NONCE_LABEL_SIZE);
    }

    #[test]
    fn test_chunk_sizes_leave_room_for_header() {
        assert!(GATT_WRITE_CHUNK > NEARBY_LENGTH_PREFIX_SIZE + SESSION_HEADER_SIZE);
        assert!(TCP_BRIDGE_CHUNK < TCP_BRIDGE_RECORD_SIZE);
    }
}

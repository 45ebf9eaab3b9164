//! Error types for the password sharing protocol.
//!
//! Each layer owns its error enum; [`PwsError`] aggregates them. Every error
//! raised while a handshake is in progress is terminal for that session.

use thiserror::Error;

use crate::advertisement::AdvertisementError;
use crate::encoding::TlvError;
use crate::pairing::ProtocolError;
use crate::transport::{FrameError, TransportError};

/// Errors in the crypto layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Random key material could not be produced.
    #[error("key generation failed")]
    KeyGeneration,

    /// HKDF expansion failed.
    #[error("key derivation failed")]
    KeyDerivationFailed,

    /// AEAD encryption failed.
    #[error("AEAD encryption failed")]
    EncryptionFailed,

    /// AEAD decryption failed (invalid tag or corrupted).
    #[error("AEAD decryption failed (invalid tag or corrupted)")]
    DecryptionFailed,

    /// A handshake nonce label longer than eight bytes was supplied.
    #[error("invalid nonce length: {0}")]
    InvalidNonceLength(usize),

    /// A public key or key pair has the wrong size or does not match.
    #[error("invalid key material")]
    InvalidPublicKey,

    /// Nonce counter exhausted - session must terminate.
    #[error("nonce counter exhausted - session must terminate")]
    CounterExhaustion,
}

/// Errors raised while proving or checking an account identity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The peer's signature over the handshake keys did not verify.
    #[error("invalid signature")]
    InvalidSignature,

    /// The certificate subject does not carry the verified account id.
    #[error("identity mismatch: subject {subject:?} does not end with {ds_id:?}")]
    IdentityMismatch {
        /// Certificate subject name.
        subject: String,
        /// Account id from the validation record.
        ds_id: String,
    },

    /// The validation record is not signed by a trusted anchor.
    #[error("untrusted validation record: {0}")]
    UntrustedRecord(String),

    /// The certificate is not signed by a trusted anchor.
    #[error("untrusted certificate: {0}")]
    UntrustedCertificate(String),

    /// The certificate could not be parsed.
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    /// The validation record lacks a required field.
    #[error("validation record missing field: {0}")]
    MissingRecordField(&'static str),

    /// The local account identity could not produce a signature.
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Errors from the object codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A dictionary could not be serialized.
    #[error("object encode failed: {0}")]
    Encode(String),

    /// Bytes did not decode into a dictionary.
    #[error("object decode failed: {0}")]
    Decode(String),
}

/// Errors from compression operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompressionError {
    /// Compression failed.
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    /// Decompression failed.
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// Decompressed size exceeds safety limit.
    #[error("decompressed size exceeded limit: {size} > {limit}")]
    SizeExceeded {
        /// Actual decompressed size.
        size: usize,
        /// Maximum allowed size.
        limit: usize,
    },
}

/// Top-level password sharing errors.
#[derive(Debug, Error)]
pub enum PwsError {
    /// TLV8 parsing error.
    #[error("tlv error: {0}")]
    Tlv(#[from] TlvError),

    /// Nearby or session frame error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Advertisement decoding error.
    #[error("advertisement error: {0}")]
    Advertisement(#[from] AdvertisementError),

    /// Crypto error.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Identity verification error.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Object codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Compression error.
    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),

    /// Handshake state machine error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PwsError {
    /// Check if this error ends the session.
    ///
    /// Advertisement errors only disqualify a single report and configuration
    /// errors occur before any session exists; everything else is terminal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PwsError::Advertisement(_) | PwsError::Config(_))
    }
}

/// Result type for password sharing operations.
pub type PwsResult<T> = Result<T, PwsError>;

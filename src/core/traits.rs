//! Collaborator traits.
//!
//! The pairing engine depends on these seams rather than on concrete
//! implementations: the session-dictionary codec, blob compression, the
//! Grantor's identity verifier, the Requestor's account identity and the
//! byte transport.

use crate::core::{CodecError, CompressionError, IdentityError};
use crate::encoding::Dictionary;
use crate::identity::ValidationRecord;
use crate::transport::TransportError;

/// Encodes session dictionaries (PWS1..PWS4, M1..M4 envelopes) as bytes.
pub trait ObjectCodec: Send + Sync {
    /// Serialize a dictionary.
    fn encode(&self, dict: &Dictionary) -> Result<Vec<u8>, CodecError>;

    /// Parse bytes into a dictionary.
    fn decode(&self, bytes: &[u8]) -> Result<Dictionary, CodecError>;
}

/// Reversible compression applied to the certificate and validation record
/// carried in M2.
pub trait Compressor: Send + Sync {
    /// Compress a blob.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;

    /// Restore a blob produced by [`Compressor::compress`].
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;
}

/// Grantor-side checks of the Requestor's account identity.
pub trait IdentityVerifier: Send + Sync {
    /// Verify `signature` over `message` with the key bound in `certificate`.
    ///
    /// Returns `Ok(false)` for a well-formed but wrong signature and `Err`
    /// when the inputs cannot be interpreted at all.
    fn verify_signature(
        &self,
        certificate: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, IdentityError>;

    /// Check the trust chain of a validation record and return its fields.
    fn verify_signed_record(&self, record: &[u8]) -> Result<ValidationRecord, IdentityError>;

    /// Subject common name of `certificate`.
    fn certificate_subject(&self, certificate: &[u8]) -> Result<String, IdentityError>;
}

/// The Requestor's account identity: a signing key plus the certificate and
/// validation record that bind it to an account.
pub trait AccountIdentity: Send + Sync {
    /// Sign `message` with the account key.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError>;

    /// Certificate bytes (uncompressed).
    fn certificate(&self) -> Result<Vec<u8>, IdentityError>;

    /// Signed validation record bytes (uncompressed).
    fn validation_record(&self) -> Result<Vec<u8>, IdentityError>;
}

/// Outbound half of a byte-stream transport.
///
/// Inbound notifications arrive separately as
/// [`TransportEvent`](crate::transport::TransportEvent)s. A transport must
/// report [`ChunkDelivered`](crate::transport::TransportEvent::ChunkDelivered)
/// once for every chunk accepted by [`Transport::send`].
pub trait Transport {
    /// Queue one chunk for delivery. Chunks never exceed
    /// [`Transport::chunk_size`].
    fn send(&mut self, chunk: Vec<u8>) -> Result<(), TransportError>;

    /// Largest chunk this transport accepts in a single write.
    fn chunk_size(&self) -> usize;
}

//! Validation records.
//!
//! A validation record is a field map signed by a trust anchor. The field
//! that matters to pairing is `encDsID`, the account id the certificate
//! subject must end with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::IdentityError;

/// Record field holding the account id.
pub const ENC_DS_ID_FIELD: &str = "encDsID";

/// Verified contents of a validation record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationRecord {
    fields: BTreeMap<String, String>,
}

impl ValidationRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insert.
    pub fn with_field(mut self, key: &str, value: &str) -> Self {
        self.fields.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Value of a field.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// The account id.
    pub fn enc_ds_id(&self) -> Result<&str, IdentityError> {
        self.field(ENC_DS_ID_FIELD)
            .ok_or(IdentityError::MissingRecordField(ENC_DS_ID_FIELD))
    }
}

/// Wire form of a signed validation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SignedRecord {
    /// Public key of the issuing anchor.
    #[serde(with = "hex::serde")]
    pub issuer: Vec<u8>,
    /// JSON-encoded [`ValidationRecord`].
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
    /// Anchor signature over `payload`.
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

impl SignedRecord {
    pub fn to_bytes(&self) -> Result<Vec<u8>, IdentityError> {
        serde_json::to_vec(self).map_err(|e| IdentityError::UntrustedRecord(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityError> {
        serde_json::from_slice(bytes).map_err(|e| IdentityError::UntrustedRecord(e.to_string()))
    }
}

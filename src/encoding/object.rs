//! Session dictionaries.
//!
//! PWS1..PWS4 and the M1..M4 envelopes are string-keyed dictionaries handed
//! to an [`ObjectCodec`]. [`JsonObjectCodec`] is an in-process codec used by
//! tests, the loopback transport and the lab CLI. It is not OPACK and does
//! not interoperate with devices that expect OPACK.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{CodecError, ObjectCodec};

/// A dictionary value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    /// Signed integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    String(String),
    /// Raw bytes.
    Data(#[serde(with = "hex::serde")] Vec<u8>),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Data(v)
    }
}

/// String-keyed dictionary with deterministic key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dictionary(BTreeMap<String, Value>);

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace `key`.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_owned(), value.into());
    }

    /// Raw value of `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Check if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Integer value of `key`. Booleans read as 0/1.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Int(v) => Some(*v),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// String value of `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Byte value of `key`.
    pub fn get_data(&self, key: &str) -> Option<&[u8]> {
        match self.0.get(key)? {
            Value::Data(v) => Some(v),
            _ => None,
        }
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// JSON-backed [`ObjectCodec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonObjectCodec;

impl ObjectCodec for JsonObjectCodec {
    fn encode(&self, dict: &Dictionary) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(dict).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Dictionary, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let dict = Dictionary::new()
            .with("op", 5)
            .with("nw", "lambda")
            .with("pd", vec![0x06u8, 0x01, 0x01])
            .with("re", true);

        assert_eq!(dict.get_int("op"), Some(5));
        assert_eq!(dict.get_int("re"), Some(1));
        assert_eq!(dict.get_str("nw"), Some("lambda"));
        assert_eq!(dict.get_data("pd"), Some(&[0x06, 0x01, 0x01][..]));
        assert_eq!(dict.get_int("nw"), None);
        assert_eq!(dict.get_str("missing"), None);
    }

    #[test]
    fn test_json_codec_preserves_value_kinds() {
        let codec = JsonObjectCodec;
        let dict = Dictionary::new()
            .with("sid", 1_576_046_130)
            .with("shv", "1476.17")
            .with("pd", vec![0xdeu8, 0xad]);

        let bytes = codec.encode(&dict).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), dict);
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        let codec = JsonObjectCodec;
        assert!(matches!(codec.decode(b"\x00\x01"), Err(CodecError::Decode(_))));
    }
}

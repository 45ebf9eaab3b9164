//! Byte-level encodings: TLV8, session dictionaries, blob compression.

mod compression;
mod object;
mod tlv8;

pub use compression::*;
pub use object::{Dictionary, JsonObjectCodec, Value};
pub use tlv8::{MAX_ITEM_LEN, Tlv8Box, Tlv8Entry, TlvError};

//! TLV8 container.
//!
//! Wire format is a sequence of `type (1) | length (1) | value (length)`
//! items. Values longer than 255 bytes are carried as consecutive items of
//! the same type, each at most 255 bytes; readers concatenate every item of
//! a type in order.

use std::collections::BTreeMap;

use thiserror::Error;

/// Largest value a single TLV8 item can carry.
pub const MAX_ITEM_LEN: usize = 255;

/// Errors from TLV8 encoding and decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TlvError {
    /// An item header or value runs past the end of the input.
    #[error("tlv parsing failed")]
    ParsingFailed,

    /// [`Tlv8Box::add`] was given more than [`MAX_ITEM_LEN`] bytes.
    #[error("tlv value too long for a single item: {0} bytes")]
    ValueTooLong(usize),
}

/// A single TLV8 item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv8Entry {
    /// Item type.
    pub tag: u8,
    /// Item value (at most 255 bytes).
    pub value: Vec<u8>,
}

/// Ordered TLV8 container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tlv8Box {
    entries: Vec<Tlv8Entry>,
}

impl Tlv8Box {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one item of at most 255 bytes.
    pub fn add(&mut self, tag: u8, value: &[u8]) -> Result<(), TlvError> {
        if value.len() > MAX_ITEM_LEN {
            return Err(TlvError::ValueTooLong(value.len()));
        }
        self.entries.push(Tlv8Entry {
            tag,
            value: value.to_vec(),
        });
        Ok(())
    }

    /// Append a value of any length, split into 255-byte items.
    ///
    /// An empty value is stored as a single zero-length item.
    pub fn add_big_value(&mut self, tag: u8, value: &[u8]) {
        if value.is_empty() {
            self.entries.push(Tlv8Entry { tag, value: Vec::new() });
            return;
        }
        for chunk in value.chunks(MAX_ITEM_LEN) {
            self.entries.push(Tlv8Entry {
                tag,
                value: chunk.to_vec(),
            });
        }
    }

    /// Append a one-byte value.
    pub fn add_int(&mut self, tag: u8, value: u8) {
        self.entries.push(Tlv8Entry {
            tag,
            value: vec![value],
        });
    }

    /// Concatenation of every item of `tag`, or `None` if there is none.
    pub fn get_value(&self, tag: u8) -> Option<Vec<u8>> {
        let mut found = false;
        let mut value = Vec::new();
        for entry in self.entries.iter().filter(|e| e.tag == tag) {
            found = true;
            value.extend_from_slice(&entry.value);
        }
        found.then_some(value)
    }

    /// First byte of the value of `tag`.
    pub fn get_u8(&self, tag: u8) -> Option<u8> {
        self.entries
            .iter()
            .find(|e| e.tag == tag)
            .and_then(|e| e.value.first().copied())
    }

    /// Distinct item types in first-appearance order.
    pub fn get_types(&self) -> Vec<u8> {
        let mut types = Vec::new();
        for entry in &self.entries {
            if !types.contains(&entry.tag) {
                types.push(entry.tag);
            }
        }
        types
    }

    /// All items, in order.
    pub fn entries(&self) -> &[Tlv8Entry] {
        &self.entries
    }

    /// Check if the container holds no items.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map of type to concatenated value.
    pub fn to_map(&self) -> BTreeMap<u8, Vec<u8>> {
        let mut map: BTreeMap<u8, Vec<u8>> = BTreeMap::new();
        for entry in &self.entries {
            map.entry(entry.tag).or_default().extend_from_slice(&entry.value);
        }
        map
    }

    /// Encode to wire bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let size = self.entries.iter().map(|e| 2 + e.value.len()).sum();
        let mut out = Vec::with_capacity(size);
        for entry in &self.entries {
            out.push(entry.tag);
            // add/add_big_value/add_int cap every value at MAX_ITEM_LEN
            out.push(entry.value.len() as u8);
            out.extend_from_slice(&entry.value);
        }
        out
    }

    /// Decode wire bytes.
    pub fn deserialize(data: &[u8]) -> Result<Self, TlvError> {
        let mut entries = Vec::new();
        let mut offset = 0;
        while offset < data.len() {
            if offset + 2 > data.len() {
                return Err(TlvError::ParsingFailed);
            }
            let tag = data[offset];
            let len = data[offset + 1] as usize;
            let start = offset + 2;
            let end = start + len;
            if end > data.len() {
                return Err(TlvError::ParsingFailed);
            }
            entries.push(Tlv8Entry {
                tag,
                value: data[start..end].to_vec(),
            });
            offset = end;
        }
        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_item_wire_format() {
        let mut tlv = Tlv8Box::new();
        tlv.add(0x03, &[0xaa, 0xbb]).unwrap();
        tlv.add_int(0x06, 1);
        assert_eq!(tlv.serialize(), vec![0x03, 0x02, 0xaa, 0xbb, 0x06, 0x01, 0x01]);
    }

    #[test]
    fn test_add_rejects_long_value() {
        let mut tlv = Tlv8Box::new();
        assert_eq!(tlv.add(0x01, &[0u8; 256]), Err(TlvError::ValueTooLong(256)));
        assert!(tlv.is_empty());
    }

    #[test]
    fn test_big_value_splits_at_255() {
        let value: Vec<u8> = (0..600u32).map(|i| i as u8).collect();
        let mut tlv = Tlv8Box::new();
        tlv.add_big_value(0x05, &value);

        let lens: Vec<usize> = tlv.entries().iter().map(|e| e.value.len()).collect();
        assert_eq!(lens, vec![255, 255, 90]);

        let decoded = Tlv8Box::deserialize(&tlv.serialize()).unwrap();
        assert_eq!(decoded.get_value(0x05).unwrap(), value);
    }

    #[test]
    fn test_concatenates_interleaved_types() {
        let data = [0x01, 0x01, 0xaa, 0x02, 0x01, 0xff, 0x01, 0x01, 0xbb];
        let tlv = Tlv8Box::deserialize(&data).unwrap();
        assert_eq!(tlv.get_value(0x01).unwrap(), vec![0xaa, 0xbb]);
        assert_eq!(tlv.get_types(), vec![0x01, 0x02]);
        assert_eq!(tlv.to_map().get(&0x02), Some(&vec![0xff]));
    }

    #[test]
    fn test_full_item_then_same_type_stays_two_items() {
        let full = vec![0x5a; 255];
        let mut tlv = Tlv8Box::new();
        tlv.add(0x09, &full).unwrap();
        tlv.add(0x09, &[1, 2, 3]).unwrap();

        let wire = tlv.serialize();
        assert_eq!(&wire[..2], &[0x09, 0xff]);
        assert_eq!(&wire[257..], &[0x09, 0x03, 1, 2, 3]);

        let decoded = Tlv8Box::deserialize(&wire).unwrap();
        assert_eq!(decoded.entries().len(), 2);
        assert_eq!(decoded.entries()[0].value, full);
        assert_eq!(decoded.entries()[1].value, vec![1, 2, 3]);

        let mut joined = full;
        joined.extend_from_slice(&[1, 2, 3]);
        assert_eq!(decoded.get_value(0x09).unwrap(), joined);
    }

    #[test]
    fn test_missing_type_is_none() {
        let tlv = Tlv8Box::deserialize(&[0x06, 0x01, 0x02]).unwrap();
        assert_eq!(tlv.get_value(0x03), None);
        assert_eq!(tlv.get_u8(0x06), Some(2));
    }

    #[test]
    fn test_overrun_fails() {
        assert_eq!(
            Tlv8Box::deserialize(&[0x03, 0x05, 0x00, 0x01]),
            Err(TlvError::ParsingFailed)
        );
        // lone type byte without a length
        assert_eq!(
            Tlv8Box::deserialize(&[0x06, 0x01, 0x01, 0x09]),
            Err(TlvError::ParsingFailed)
        );
    }

    #[test]
    fn test_empty_input_is_empty_box() {
        assert!(Tlv8Box::deserialize(&[]).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn test_distinct_types_survive_encoding(
            items in proptest::collection::btree_map(any::<u8>(), proptest::collection::vec(any::<u8>(), 0..700), 0..8)
        ) {
            let mut tlv = Tlv8Box::new();
            for (tag, value) in &items {
                tlv.add_big_value(*tag, value);
            }
            let decoded = Tlv8Box::deserialize(&tlv.serialize()).unwrap();
            prop_assert_eq!(decoded.to_map(), items);
        }

        #[test]
        fn test_entry_order_survives_encoding(
            items in proptest::collection::vec(
                (0u8..4, proptest::collection::vec(any::<u8>(), 0..=MAX_ITEM_LEN)),
                0..12,
            )
        ) {
            let mut tlv = Tlv8Box::new();
            for (tag, value) in &items {
                tlv.add(*tag, value).unwrap();
            }
            let decoded = Tlv8Box::deserialize(&tlv.serialize()).unwrap();
            let entries: Vec<(u8, Vec<u8>)> = decoded
                .entries()
                .iter()
                .map(|e| (e.tag, e.value.clone()))
                .collect();
            prop_assert_eq!(entries, items);
            prop_assert_eq!(decoded, tlv);
        }
    }
}

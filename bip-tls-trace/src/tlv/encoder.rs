//! BER-TLV Encoder
//!
//! Builds TLV byte strings. Used to synthesise envelopes and proactive
//! commands when replaying captures.

use super::TLV;

/// Comprehension-required flag of a single-byte simple-TLV tag
pub const CR: u32 = 0x80;

pub struct TLVEncoder;

impl TLVEncoder {
    /// Encode a tag-value pair to bytes
    pub fn encode(tag: u32, value: &[u8]) -> Vec<u8> {
        let mut result = Self::encode_tag(tag);
        result.extend(Self::encode_length(value.len()));
        result.extend_from_slice(value);
        result
    }

    /// Encode just the tag bytes
    pub fn encode_tag(tag: u32) -> Vec<u8> {
        if tag > 0xFFFF {
            vec![(tag >> 16) as u8, (tag >> 8) as u8, tag as u8]
        } else if tag > 0xFF {
            vec![(tag >> 8) as u8, tag as u8]
        } else {
            vec![tag as u8]
        }
    }

    /// Encode the length in the shortest BER form
    pub fn encode_length(length: usize) -> Vec<u8> {
        match length {
            0..=0x7F => vec![length as u8],
            0x80..=0xFF => vec![0x81, length as u8],
            0x100..=0xFFFF => vec![0x82, (length >> 8) as u8, length as u8],
            0x1_0000..=0xFF_FFFF => vec![0x83, (length >> 16) as u8, (length >> 8) as u8, length as u8],
            _ => vec![
                0x84,
                (length >> 24) as u8,
                (length >> 16) as u8,
                (length >> 8) as u8,
                length as u8,
            ],
        }
    }

    /// Re-encode a decoded TLV tree
    pub fn encode_tlv(tlv: &TLV) -> Vec<u8> {
        if tlv.subs.is_empty() {
            return Self::encode(tlv.tag, &tlv.value);
        }
        let children: Vec<u8> = tlv.subs.iter().flat_map(Self::encode_tlv).collect();
        Self::encode(tlv.tag, &children)
    }
}

/// Builder for nested TLV structures
#[derive(Default)]
pub struct TLVBuilder {
    data: Vec<u8>,
}

impl TLVBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a TLV element
    pub fn add(mut self, tag: u32, value: &[u8]) -> Self {
        self.data.extend(TLVEncoder::encode(tag, value));
        self
    }

    /// Add a simple-TLV with the comprehension-required bit set
    pub fn add_required(self, tag: u32, value: &[u8]) -> Self {
        self.add(tag | CR, value)
    }

    /// Add pre-encoded bytes
    pub fn add_raw(mut self, data: &[u8]) -> Self {
        self.data.extend_from_slice(data);
        self
    }

    /// Wrap current content in a constructed tag
    pub fn wrap(self, tag: u32) -> Self {
        Self {
            data: TLVEncoder::encode(tag, &self.data),
        }
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::{read_list, TagContext};

    #[test]
    fn test_encode_length_forms() {
        assert_eq!(TLVEncoder::encode_length(0), vec![0x00]);
        assert_eq!(TLVEncoder::encode_length(127), vec![0x7F]);
        assert_eq!(TLVEncoder::encode_length(128), vec![0x81, 0x80]);
        assert_eq!(TLVEncoder::encode_length(255), vec![0x81, 0xFF]);
        assert_eq!(TLVEncoder::encode_length(300), vec![0x82, 0x01, 0x2C]);
        assert_eq!(TLVEncoder::encode_length(0x10000), vec![0x83, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_two_byte_tag() {
        let encoded = TLVEncoder::encode(0x5F50, b"test");
        assert_eq!(encoded, vec![0x5F, 0x50, 0x04, b't', b'e', b's', b't']);
    }

    #[test]
    fn test_builder_proactive_command() {
        let data = TLVBuilder::new()
            .add_required(0x01, &[0x01, 0x41, 0x00])
            .add_required(0x02, &[0x81, 0x82])
            .wrap(0xD0)
            .build();
        assert_eq!(hex::encode_upper(&data), "D00981030141008202818200");

        let tlvs = read_list(&data, TagContext::Toolkit);
        assert_eq!(tlvs.len(), 1);
        assert_eq!(tlvs[0].name, "Proactive Command: CLOSE CHANNEL");
        assert_eq!(tlvs[0].subs.len(), 2);
    }

    #[test]
    fn test_reencode_decoded_tree() {
        let raw = hex::decode("D00981030143018202812100").unwrap();
        let tlvs = read_list(&raw, TagContext::Toolkit);
        // Trailing filler is not part of the element
        assert_eq!(TLVEncoder::encode_tlv(&tlvs[0]), raw[..raw.len() - 1].to_vec());
    }
}

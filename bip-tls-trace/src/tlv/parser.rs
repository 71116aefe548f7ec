//! BER-TLV Parser
//!
//! Parses BER-TLV and CAT simple-TLV structures. The walker is lenient: a
//! malformed element ends the list and everything decoded before it is kept.

use log::debug;
use serde::Serialize;
use thiserror::Error;

use super::encoder::TLVEncoder;
use super::tags::{self, TagContext};
use super::values::DecodedValue;

/// Errors that can occur during TLV parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TLVError {
    #[error("Unexpected end of data while parsing tag")]
    UnexpectedEndTag,

    #[error("Unexpected end of data while parsing length")]
    UnexpectedEndLength,

    #[error("Unexpected end of data while parsing value (need {needed}, have {available})")]
    UnexpectedEndValue { needed: usize, available: usize },

    #[error("Invalid length encoding")]
    InvalidLength,

    #[error("Length too large: {0}")]
    LengthTooLarge(usize),
}

/// A decoded TLV element
///
/// - `tag`: 1-3 tag bytes packed into a u32
/// - `length`: the declared length, which can exceed `value.len()` for a
///   truncated container
/// - `subs`: child elements of a constructed tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TLV {
    pub tag: u32,
    pub name: String,
    pub length: usize,
    #[serde(skip)]
    pub header_len: usize,
    #[serde(with = "crate::base64_bytes")]
    pub value: Vec<u8>,
    pub decoded: DecodedValue,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subs: Vec<TLV>,
}

impl TLV {
    /// Create a primitive TLV, named and decoded in the toolkit context
    pub fn new(tag: u32, value: Vec<u8>) -> Self {
        let context = TagContext::Toolkit;
        Self {
            tag,
            name: tags::tag_name(tag, context),
            length: value.len(),
            header_len: header_len(tag, value.len()),
            decoded: tags::decode_value(tag, &value, context),
            value,
            truncated: false,
            subs: Vec::new(),
        }
    }

    /// Create a constructed TLV with children
    pub fn constructed(tag: u32, children: Vec<TLV>) -> Self {
        let name = tags::rename_container(tag, &children)
            .unwrap_or_else(|| tags::tag_name(tag, TagContext::Toolkit));
        let value: Vec<u8> = children.iter().flat_map(TLVEncoder::encode_tlv).collect();
        Self {
            tag,
            name,
            length: value.len(),
            header_len: header_len(tag, value.len()),
            value,
            decoded: DecodedValue::Constructed { children: children.len() },
            truncated: false,
            subs: children,
        }
    }

    /// Check if this TLV has nested children
    pub fn if_recursive(&self) -> bool {
        !self.subs.is_empty()
    }

    /// Check the BER constructed bit of the first tag byte
    pub fn is_constructed(&self) -> bool {
        (first_tag_byte(self.tag) & 0x20) != 0
    }

    /// Tag with the comprehension-required bit cleared (single-byte tags)
    pub fn base_tag(&self) -> u32 {
        if self.tag <= 0xFF {
            self.tag & 0x7F
        } else {
            self.tag
        }
    }

    /// Whether the CR flag (bit 8 of a single-byte tag) is set
    pub fn comprehension_required(&self) -> bool {
        self.tag <= 0xFF && self.tag & 0x80 != 0
    }

    /// Whether this element carries `tag`, ignoring the CR bit of single-byte tags
    pub fn has_tag(&self, tag: u32) -> bool {
        if tag <= 0xFF {
            self.tag <= 0xFF && self.base_tag() == tag & 0x7F
        } else {
            self.tag == tag
        }
    }

    /// Find a tag depth-first, ignoring the CR bit
    pub fn find(&self, tag: u32) -> Option<&TLV> {
        if self.has_tag(tag) {
            return Some(self);
        }
        self.subs.iter().find_map(|child| child.find(tag))
    }

    /// Find a direct child by tag, ignoring the CR bit
    pub fn find_child(&self, tag: u32) -> Option<&TLV> {
        find_simple(&self.subs, tag)
    }

    /// Bytes this element occupied in its parent buffer
    pub fn total_len(&self) -> usize {
        self.header_len + self.value.len()
    }

    pub fn children(&self) -> &[TLV] {
        &self.subs
    }
}

/// Find a simple-TLV tag in a list, ignoring the CR bit
pub fn find_simple(list: &[TLV], tag: u32) -> Option<&TLV> {
    list.iter().find(|t| t.has_tag(tag))
}

fn header_len(tag: u32, length: usize) -> usize {
    TLVEncoder::encode_tag(tag).len() + TLVEncoder::encode_length(length).len()
}

fn first_tag_byte(tag: u32) -> u8 {
    if tag > 0xFFFF {
        ((tag >> 16) & 0xFF) as u8
    } else if tag > 0xFF {
        ((tag >> 8) & 0xFF) as u8
    } else {
        (tag & 0xFF) as u8
    }
}

/// Parse multiple TLVs from raw bytes
///
/// Filler bytes (0x00, 0xFF) between elements are skipped. The walk stops
/// at the first element that cannot be decoded.
pub fn read_list(data: &[u8], context: TagContext) -> Vec<TLV> {
    let mut result = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        if data[offset] == 0x00 || data[offset] == 0xFF {
            offset += 1;
            continue;
        }

        match read_single(&data[offset..], context) {
            Ok((tlv, consumed)) => {
                result.push(tlv);
                offset += consumed;
            }
            Err(e) => {
                debug!("TLV walk stopped at offset {}: {}", offset, e);
                break;
            }
        }
    }

    result
}

/// Parse a list that must cover `data` exactly, with no filler and no tail
fn read_exact(data: &[u8], context: TagContext) -> Option<Vec<TLV>> {
    let mut result = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let (tlv, consumed) = read_single(&data[offset..], context).ok()?;
        if tlv.truncated {
            return None;
        }
        result.push(tlv);
        offset += consumed;
    }
    Some(result)
}

/// Parse a single TLV, returning it and the number of bytes consumed
///
/// A container tag whose declared length overruns the buffer is still
/// returned, marked `truncated`, with children decoded from what is present.
pub fn read_single(data: &[u8], context: TagContext) -> Result<(TLV, usize), TLVError> {
    let mut offset = 0;

    let (tag, tag_len) = parse_tag(data)?;
    offset += tag_len;

    let (length, len_len) = parse_length(&data[offset..])?;
    offset += len_len;

    let available = data.len() - offset;
    let container = tags::is_container(tag);
    let truncated = length > available;
    if truncated && !container {
        return Err(TLVError::UnexpectedEndValue {
            needed: length,
            available,
        });
    }
    let take = length.min(available);
    let value = &data[offset..offset + take];
    offset += take;

    let child_context = tags::child_context(tag, context);
    let subs = if container {
        read_list(value, child_context)
    } else if first_tag_byte(tag) & 0x20 != 0
        && !value.is_empty()
        && !tags::is_toolkit_primitive(tag, context)
    {
        read_exact(value, child_context).unwrap_or_default()
    } else {
        Vec::new()
    };

    let name = tags::rename_container(tag, &subs).unwrap_or_else(|| tags::tag_name(tag, context));
    let decoded = if subs.is_empty() {
        tags::decode_value(tag, value, context)
    } else {
        DecodedValue::Constructed { children: subs.len() }
    };

    let tlv = TLV {
        tag,
        name,
        length,
        header_len: tag_len + len_len,
        value: value.to_vec(),
        decoded,
        truncated,
        subs,
    };
    Ok((tlv, offset))
}

/// Parse a BER tag (1-3 bytes)
pub fn parse_tag(data: &[u8]) -> Result<(u32, usize), TLVError> {
    if data.is_empty() {
        return Err(TLVError::UnexpectedEndTag);
    }

    let first = data[0];

    // Low 5 bits all set means the tag continues
    if (first & 0x1F) != 0x1F {
        return Ok((first as u32, 1));
    }

    if data.len() < 2 {
        return Err(TLVError::UnexpectedEndTag);
    }

    let second = data[1];

    if (second & 0x80) == 0 {
        let tag = ((first as u32) << 8) | (second as u32);
        return Ok((tag, 2));
    }

    if data.len() < 3 {
        return Err(TLVError::UnexpectedEndTag);
    }

    let third = data[2];
    let tag = ((first as u32) << 16) | ((second as u32) << 8) | (third as u32);
    Ok((tag, 3))
}

/// Parse a BER length (1-5 bytes)
pub fn parse_length(data: &[u8]) -> Result<(usize, usize), TLVError> {
    if data.is_empty() {
        return Err(TLVError::UnexpectedEndLength);
    }

    let first = data[0];

    // Short form (0-127)
    if (first & 0x80) == 0 {
        return Ok((first as usize, 1));
    }

    let num_bytes = (first & 0x7F) as usize;

    if num_bytes == 0 {
        // Indefinite length
        return Err(TLVError::InvalidLength);
    }

    if num_bytes > 4 {
        return Err(TLVError::LengthTooLarge(num_bytes));
    }

    if data.len() < 1 + num_bytes {
        return Err(TLVError::UnexpectedEndLength);
    }

    let mut length: usize = 0;
    for i in 0..num_bytes {
        length = (length << 8) | (data[1 + i] as usize);
    }

    Ok((length, 1 + num_bytes))
}

//! TLV (Tag-Length-Value) decoding
//!
//! Handles the BER-TLV structures found in SELECT responses and the CAT
//! simple-TLV structures carried by proactive commands, terminal responses
//! and envelopes. Every element is named from a context-dependent tag table
//! and its value decoded into a [`DecodedValue`].
//!
//! # Example
//! ```
//! use bip_tls_trace::tlv::{decode, DecodedValue};
//!
//! let tlvs = decode(&[0xB8, 0x02, 0x81, 0x00]);
//! assert_eq!(tlvs[0].name, "Channel Status");
//! assert!(matches!(tlvs[0].decoded, DecodedValue::ChannelStatus { open: true, .. }));
//! ```

mod encoder;
mod parser;
pub mod tags;
pub mod values;

pub use encoder::{TLVBuilder, TLVEncoder, CR};
pub use parser::{find_simple, parse_length, parse_tag, read_single, TLVError, TLV};
pub use tags::TagContext;
pub use values::{hexify, DecodedValue, TextClass};

/// Decode a buffer as a toolkit TLV list
pub fn decode(data: &[u8]) -> Vec<TLV> {
    parser::read_list(data, TagContext::Toolkit)
}

/// Decode a buffer with an explicit tag context
pub fn read_list(data: &[u8], context: TagContext) -> Vec<TLV> {
    parser::read_list(data, context)
}

/// Walk a TLV forest depth-first
pub fn walk<'a>(list: &'a [TLV], visit: &mut impl FnMut(&'a TLV)) {
    for tlv in list {
        visit(tlv);
        walk(&tlv.subs, visit);
    }
}

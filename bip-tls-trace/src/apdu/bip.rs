//! Bearer Independent Protocol channel payloads
//!
//! SEND DATA proactive commands carry bytes the card writes to the channel
//! and RECEIVE DATA terminal responses carry bytes read from it. Both end up
//! in a [`ChannelPayload`] that the TLS reassembler can consume.

use serde::Serialize;

use super::command::{cmd, tag};
use super::{APDURecord, ApduKind};
use crate::direction::Direction;
use crate::tlv::find_simple;

/// Bytes moved over a BIP channel by one APDU
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelPayload {
    pub direction: Direction,
    /// Channel number from device identities (1-7), when present
    pub channel: Option<u8>,
    #[serde(with = "crate::base64_bytes")]
    pub data: Vec<u8>,
}

/// Extract the channel data carried by a SEND DATA or RECEIVE DATA exchange
pub fn extract_channel_payload(record: &APDURecord) -> Option<ChannelPayload> {
    let details = record.proactive.as_ref()?;
    let direction = match (record.kind, details.command_type) {
        (ApduKind::Response, cmd::SEND_DATA) => Direction::SimToMe,
        (ApduKind::Command, cmd::RECEIVE_DATA) => Direction::MeToSim,
        _ => return None,
    };
    let data = find_simple(record.toolkit_tlvs(), tag::CHANNEL_DATA as u32)?;
    if data.value.is_empty() {
        return None;
    }
    let channel = [details.destination, details.source]
        .into_iter()
        .flatten()
        .find(|id| (0x21..=0x27).contains(id))
        .map(|id| id - 0x20);
    Some(ChannelPayload {
        direction,
        channel,
        data: data.value.clone(),
    })
}

/// Collect every channel payload from an ordered list of records
pub fn extract_payloads(records: &[APDURecord]) -> Vec<ChannelPayload> {
    records.iter().filter_map(extract_channel_payload).collect()
}

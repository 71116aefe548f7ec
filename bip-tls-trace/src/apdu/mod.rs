//! APDU (Application Protocol Data Unit) decoding
//!
//! Classifies a raw trace frame as a command or a response, works out its
//! ISO 7816-4 case, decodes any toolkit TLVs it carries and infers who sent
//! it and which functional area it belongs to.
//!
//! # Example
//! ```
//! use bip_tls_trace::apdu::{parse, ApduKind, Domain};
//! use bip_tls_trace::Direction;
//!
//! // FETCH response carrying a CLOSE CHANNEL proactive command
//! let raw = [0xD0, 0x09, 0x81, 0x03, 0x01, 0x41, 0x00, 0x82, 0x02, 0x81, 0x21, 0x90, 0x00];
//! let record = parse(&raw).unwrap();
//! assert_eq!(record.kind, ApduKind::Response);
//! assert_eq!(record.direction, Direction::SimToMe);
//! assert_eq!(record.domain, Domain::BearerIndependentProtocol);
//! ```

pub mod bip;
pub mod command;
mod response;
pub mod status;

pub use command::{ins, Domain};
pub use response::Response;
pub use status::SW;

use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::direction::Direction;
use crate::tlv::{self, find_simple, DecodedValue, TagContext, TLV};

/// Errors that can occur during APDU parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum APDUError {
    #[error("Empty APDU")]
    Empty,

    #[error("APDU too short: expected at least 4 bytes, got {0}")]
    TooShort(usize),

    #[error("Invalid APDU length")]
    InvalidLength,

    #[error("Invalid extended APDU format")]
    InvalidExtendedFormat,
}

/// A strictly parsed APDU command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct APDU {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    /// Command data (may be empty)
    pub data: Vec<u8>,
    /// Expected response length (Le), None if not specified
    pub le: Option<u32>,
}

impl APDU {
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
        }
    }

    /// ISO 7816-4 case implied by the presence of data and Le
    pub fn case(&self) -> ApduCase {
        match (self.data.is_empty(), self.le.is_some()) {
            (true, false) => ApduCase::Case1,
            (true, true) => ApduCase::Case2,
            (false, false) => ApduCase::Case3,
            (false, true) => ApduCase::Case4,
        }
    }
}

/// Parse raw bytes into an APDU command, requiring a clean case length
///
/// Supports both short and extended APDU formats:
/// - Short: CLA INS P1 P2 [Lc Data] [Le]
/// - Extended: CLA INS P1 P2 00 Lc1 Lc2 Data [Le1 Le2]
pub fn parse_apdu(data: &[u8]) -> Result<APDU, APDUError> {
    if data.len() < 4 {
        return Err(APDUError::TooShort(data.len()));
    }

    let (cla, ins, p1, p2) = (data[0], data[1], data[2], data[3]);

    if data.len() == 4 {
        return Ok(APDU::new(cla, ins, p1, p2));
    }

    let remaining = &data[4..];

    // Extended form: 00 followed by a two-byte Lc or Le
    if remaining[0] == 0x00 && remaining.len() > 2 {
        let ext_remaining = &remaining[1..];
        let potential_lc = ((ext_remaining[0] as usize) << 8) | (ext_remaining[1] as usize);
        let is_valid_extended = ext_remaining.len() == 2
            || ext_remaining.len() == 2 + potential_lc
            || ext_remaining.len() == 2 + potential_lc + 2;

        if is_valid_extended {
            return parse_extended_apdu(cla, ins, p1, p2, ext_remaining);
        }
    }

    parse_short_apdu(cla, ins, p1, p2, remaining)
}

/// Parse short format APDU (Lc/Le up to 255 bytes)
fn parse_short_apdu(cla: u8, ins: u8, p1: u8, p2: u8, remaining: &[u8]) -> Result<APDU, APDUError> {
    let mut apdu = APDU::new(cla, ins, p1, p2);
    let Some(&first_byte) = remaining.first() else {
        return Ok(apdu);
    };

    // Case 2: Le only, 0 means 256
    if remaining.len() == 1 {
        apdu.le = Some(if first_byte == 0 { 256 } else { first_byte as u32 });
        return Ok(apdu);
    }

    let lc = first_byte as usize;
    if lc == 0 {
        return Err(APDUError::InvalidLength);
    }

    if remaining.len() == 1 + lc {
        apdu.data = remaining[1..].to_vec();
        return Ok(apdu);
    }

    if remaining.len() == 1 + lc + 1 {
        let le_byte = remaining[1 + lc];
        apdu.data = remaining[1..1 + lc].to_vec();
        apdu.le = Some(if le_byte == 0 { 256 } else { le_byte as u32 });
        return Ok(apdu);
    }

    Err(APDUError::InvalidLength)
}

/// Parse extended format APDU (Lc/Le up to 65535 bytes)
fn parse_extended_apdu(cla: u8, ins: u8, p1: u8, p2: u8, remaining: &[u8]) -> Result<APDU, APDUError> {
    if remaining.len() < 2 {
        return Err(APDUError::InvalidExtendedFormat);
    }
    let mut apdu = APDU::new(cla, ins, p1, p2);
    let first_word = ((remaining[0] as u32) << 8) | (remaining[1] as u32);

    if remaining.len() == 2 {
        apdu.le = Some(if first_word == 0 { 65536 } else { first_word });
        return Ok(apdu);
    }

    let lc = first_word as usize;
    if remaining.len() < 2 + lc {
        return Err(APDUError::InvalidLength);
    }
    apdu.data = remaining[2..2 + lc].to_vec();

    if remaining.len() == 2 + lc {
        return Ok(apdu);
    }

    if remaining.len() == 2 + lc + 2 {
        let le_word = ((remaining[2 + lc] as u32) << 8) | (remaining[3 + lc] as u32);
        apdu.le = Some(if le_word == 0 { 65536 } else { le_word });
        return Ok(apdu);
    }

    Err(APDUError::InvalidExtendedFormat)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApduKind {
    Command,
    Response,
}

/// ISO 7816-4 command case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApduCase {
    #[serde(rename = "case1")]
    Case1,
    #[serde(rename = "case2")]
    Case2,
    #[serde(rename = "case3")]
    Case3,
    #[serde(rename = "case4")]
    Case4,
}

/// Command header bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Header {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
}

/// Decoded status trailer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusWord {
    pub sw: u16,
    pub description: String,
}

/// Command details of a proactive command or terminal response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProactiveDetails {
    pub number: u8,
    pub command_type: u8,
    pub name: String,
    pub qualifier: u8,
    pub source: Option<u8>,
    pub destination: Option<u8>,
}

/// One decoded trace frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct APDURecord {
    pub kind: ApduKind,
    pub header: Option<Header>,
    pub instruction: Option<String>,
    pub lc: Option<usize>,
    pub le: Option<u32>,
    pub case: Option<ApduCase>,
    #[serde(with = "crate::base64_bytes")]
    pub data: Vec<u8>,
    pub status: Option<StatusWord>,
    pub direction: Direction,
    pub domain: Domain,
    pub tlvs: Vec<TLV>,
    pub proactive: Option<ProactiveDetails>,
    pub warnings: Vec<String>,
}

impl APDURecord {
    fn new(kind: ApduKind, direction: Direction) -> Self {
        Self {
            kind,
            header: None,
            instruction: None,
            lc: None,
            le: None,
            case: None,
            data: Vec::new(),
            status: None,
            direction,
            domain: Domain::Unknown,
            tlvs: Vec::new(),
            proactive: None,
            warnings: Vec::new(),
        }
    }

    /// The proactive command container, when this is a FETCH response
    pub fn proactive_command(&self) -> Option<&TLV> {
        self.tlvs.iter().find(|t| t.tag == 0xD0)
    }

    /// The TLV list that holds command details and device identities
    pub fn toolkit_tlvs(&self) -> &[TLV] {
        match self.tlvs.first() {
            Some(first) if (0xD0..=0xD7).contains(&first.tag) => &first.subs,
            _ => &self.tlvs,
        }
    }

    pub fn is_bip(&self) -> bool {
        self.domain == Domain::BearerIndependentProtocol
    }

    fn warn(&mut self, message: String) {
        debug!("APDU warning: {}", message);
        self.warnings.push(message);
    }
}

/// Decode one trace frame
///
/// Only empty input is an error. Anything else yields a record, with
/// problems reported in `warnings`.
pub fn parse(raw: &[u8]) -> Result<APDURecord, APDUError> {
    if raw.is_empty() {
        return Err(APDUError::Empty);
    }

    let strict = parse_apdu(raw);
    let trailer = Response::split(raw);
    let starts_like_response = matches!(raw[0], 0xD0 | 0x62 | 0x64 | 0x6F);

    let record = match trailer {
        Some(resp) if strict.is_err() || starts_like_response => parse_response(resp),
        _ if raw.len() >= 4 => parse_command(raw, strict.ok()),
        _ => {
            let mut record = APDURecord::new(ApduKind::Response, Direction::SimToMe);
            record.data = raw.to_vec();
            record.warn(format!("Frame of {} bytes has neither a header nor a status word", raw.len()));
            record
        }
    };
    Ok(record)
}

fn parse_command(raw: &[u8], strict: Option<APDU>) -> APDURecord {
    let mut record = APDURecord::new(ApduKind::Command, Direction::MeToSim);
    let header = Header {
        cla: raw[0],
        ins: raw[1],
        p1: raw[2],
        p2: raw[3],
    };
    record.header = Some(header);
    record.instruction = command::instruction_name(header.ins).map(str::to_string);
    record.domain = command::instruction_domain(header.ins);

    match strict {
        Some(apdu) => {
            record.case = Some(apdu.case());
            record.le = apdu.le;
            if !apdu.data.is_empty() {
                record.lc = Some(apdu.data.len());
            }
            record.data = apdu.data;
        }
        None => {
            // Best effort: Lc then whatever data is present
            record.case = Some(ApduCase::Case3);
            record.lc = raw.get(4).map(|&b| b as usize);
            record.data = raw.get(5..).map(<[u8]>::to_vec).unwrap_or_default();
            record.warn(format!(
                "Length {} matches no ISO 7816 case, treated as case 3",
                raw.len()
            ));
        }
    }

    if command::carries_toolkit_tlv(header.ins) && !record.data.is_empty() {
        record.tlvs = tlv::decode(&record.data);
        if record.tlvs.is_empty() {
            record.warn("Command data does not decode as TLV".to_string());
        }
    }

    match header.ins {
        ins::TERMINAL_RESPONSE => classify_terminal_response(&mut record),
        ins::ENVELOPE => classify_envelope(&mut record),
        _ => {}
    }
    apply_device_direction(&mut record);
    record
}

fn parse_response(resp: Response) -> APDURecord {
    let mut record = APDURecord::new(ApduKind::Response, Direction::SimToMe);
    let sw = resp.sw();
    record.status = Some(StatusWord {
        sw,
        description: status::describe(sw),
    });

    match resp.data.first().copied() {
        Some(0xD0) => {
            record.tlvs = tlv::decode(&resp.data);
            classify_proactive(&mut record);
        }
        Some(0x62 | 0x64 | 0x6F) => {
            record.tlvs = tlv::read_list(&resp.data, TagContext::FileControl);
            record.domain = Domain::FileManagement;
        }
        _ => {}
    }
    record.data = resp.data;
    apply_device_direction(&mut record);
    record
}

fn details_from(list: &[TLV]) -> Option<ProactiveDetails> {
    let details = find_simple(list, command::tag::COMMAND_DETAILS as u32)?;
    let DecodedValue::CommandDetails { number, type_code, type_name, qualifier } = &details.decoded else {
        return None;
    };
    let devices = find_simple(list, command::tag::DEVICE_IDENTITIES as u32);
    let (source, destination) = match devices.map(|d| d.value.as_slice()) {
        Some([s, d, ..]) => (Some(*s), Some(*d)),
        _ => (None, None),
    };
    Some(ProactiveDetails {
        number: *number,
        command_type: *type_code,
        name: type_name.clone(),
        qualifier: *qualifier,
        source,
        destination,
    })
}

fn check_mandatory(record: &mut APDURecord, list_owner: &str, required: &[u8]) {
    let missing: Vec<String> = required
        .iter()
        .filter(|&&t| find_simple(record.toolkit_tlvs(), t as u32).is_none())
        .map(|&t| tlv::tags::tag_name(t as u32, TagContext::Toolkit))
        .collect();
    for name in missing {
        record.warn(format!("{} is missing mandatory {}", list_owner, name));
    }
}

fn classify_proactive(record: &mut APDURecord) {
    let Some(container) = record.proactive_command().cloned() else {
        return;
    };
    if container.truncated {
        record.warn(format!(
            "Proactive command truncated: declared {} bytes, {} present",
            container.length,
            container.value.len()
        ));
    } else {
        let parsed: usize = container.subs.iter().map(TLV::total_len).sum();
        if parsed != container.length {
            record.warn(format!(
                "Proactive command length mismatch: declared {}, parsed {}",
                container.length, parsed
            ));
        }
    }

    record.proactive = details_from(&container.subs);
    let command_type = record.proactive.as_ref().map(|p| p.command_type);
    record.domain = match command_type {
        Some(t) if command::is_bip_command(t) => Domain::BearerIndependentProtocol,
        _ => Domain::SimToolkit,
    };
    let required = command::proactive_mandatory_tags(command_type.unwrap_or(0));
    check_mandatory(record, "Proactive command", &required);
}

fn classify_terminal_response(record: &mut APDURecord) {
    record.proactive = details_from(&record.tlvs);
    record.domain = match record.proactive.as_ref().map(|p| p.command_type) {
        Some(t) if command::is_bip_command(t) => Domain::BearerIndependentProtocol,
        _ => Domain::SimToolkitResponse,
    };
    check_mandatory(record, "Terminal response", &command::TERMINAL_RESPONSE_MANDATORY);
}

fn classify_envelope(record: &mut APDURecord) {
    let Some(envelope) = record.tlvs.first().cloned() else {
        return;
    };
    if envelope.tag != 0xD6 {
        return;
    }
    let bip_event = find_simple(&envelope.subs, command::tag::EVENT_LIST as u32)
        .map(|events| events.value.iter().any(|&e| command::is_bip_event(e)))
        .unwrap_or(false);
    let channel_status = find_simple(&envelope.subs, command::tag::CHANNEL_STATUS as u32).is_some();
    if bip_event || channel_status {
        record.domain = Domain::BearerIndependentProtocol;
    }
    check_mandatory(record, "Event download", &command::EVENT_DOWNLOAD_MANDATORY);
}

/// Device identities override the instruction-based direction
fn apply_device_direction(record: &mut APDURecord) {
    let devices = find_simple(record.toolkit_tlvs(), command::tag::DEVICE_IDENTITIES as u32);
    match devices.and_then(|d| d.value.first()).copied() {
        Some(0x81) => record.direction = Direction::SimToMe,
        Some(0x82) => record.direction = Direction::MeToSim,
        _ => {}
    }
}

/// Decode a command together with its response
///
/// The response inherits the command's header, instruction and (when it has
/// none of its own) domain.
pub fn parse_exchange(command_raw: &[u8], response_raw: &[u8]) -> Result<(APDURecord, APDURecord), APDUError> {
    let command = parse(command_raw)?;
    let mut response = parse(response_raw)?;

    if response.kind == ApduKind::Response {
        response.header = command.header;
        response.instruction = command.instruction.clone();
        if response.domain == Domain::Unknown {
            response.domain = command.domain;
        }
        if command.header.map(|h| h.ins) == Some(ins::FETCH) {
            response.direction = Direction::SimToMe;
            if response.proactive_command().is_none() && !response.data.is_empty() {
                response.warn("FETCH response does not start with a proactive command tag".to_string());
            }
        }
    } else {
        response.warn("Expected a response, frame decoded as a command".to_string());
    }
    Ok((command, response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(hex_str: &str) -> Vec<u8> {
        hex::decode(hex_str.replace(' ', "")).unwrap()
    }

    #[test]
    fn test_case1_no_data_no_le() {
        let apdu = parse_apdu(&[0x00, 0xA4, 0x04, 0x00]).unwrap();
        assert_eq!(apdu.case(), ApduCase::Case1);
        assert!(apdu.data.is_empty());
    }

    #[test]
    fn test_case2_le_only() {
        let apdu = parse_apdu(&[0x80, 0x12, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(apdu.le, Some(256));
        assert_eq!(apdu.case(), ApduCase::Case2);
    }

    #[test]
    fn test_case3_and_case4() {
        let apdu = parse_apdu(&raw("00A40004 02 3F00")).unwrap();
        assert_eq!(apdu.case(), ApduCase::Case3);
        assert_eq!(apdu.data, vec![0x3F, 0x00]);

        let apdu = parse_apdu(&raw("00A40404 02 3F00 00")).unwrap();
        assert_eq!(apdu.case(), ApduCase::Case4);
        assert_eq!(apdu.le, Some(256));
    }

    #[test]
    fn test_extended_case3() {
        let mut data = vec![0x80, 0xC2, 0x00, 0x00, 0x00, 0x01, 0x00];
        data.extend(vec![0xAA; 256]);
        let apdu = parse_apdu(&data).unwrap();
        assert_eq!(apdu.data.len(), 256);
        assert_eq!(apdu.case(), ApduCase::Case3);
    }

    #[test]
    fn test_too_short() {
        assert_eq!(parse_apdu(&[0x00, 0xA4, 0x04]), Err(APDUError::TooShort(3)));
    }

    #[test]
    fn test_empty_is_error() {
        assert_eq!(parse(&[]), Err(APDUError::Empty));
    }

    #[test]
    fn test_fetch_command() {
        let record = parse(&raw("80 12 00 00 0F")).unwrap();
        assert_eq!(record.kind, ApduKind::Command);
        assert_eq!(record.case, Some(ApduCase::Case2));
        assert_eq!(record.instruction.as_deref(), Some("FETCH"));
        assert_eq!(record.direction, Direction::MeToSim);
        assert_eq!(record.domain, Domain::SimToolkit);
    }

    #[test]
    fn test_status_only_response() {
        let record = parse(&raw("91 1B")).unwrap();
        assert_eq!(record.kind, ApduKind::Response);
        let status = record.status.unwrap();
        assert_eq!(status.sw, 0x911B);
        assert!(status.description.contains("proactive command pending"));
    }

    #[test]
    fn test_open_channel_proactive() {
        // OPEN CHANNEL with bearer, buffer size, transport level and address
        let frame = raw(
            "D0 22 81 03 01 40 01 82 02 81 82 35 07 02 00 00 03 00 00 02 \
             39 02 05 DC 3C 03 02 01 BB 3E 05 21 0A 14 1E 28 90 00",
        );
        let record = parse(&frame).unwrap();
        assert_eq!(record.kind, ApduKind::Response);
        assert_eq!(record.direction, Direction::SimToMe);
        assert_eq!(record.domain, Domain::BearerIndependentProtocol);
        let details = record.proactive.as_ref().unwrap();
        assert_eq!(details.name, "OPEN CHANNEL");
        assert_eq!(details.source, Some(0x81));
        assert!(record.warnings.is_empty(), "{:?}", record.warnings);
        assert_eq!(record.tlvs[0].name, "Proactive Command: OPEN CHANNEL");
        let address = record.tlvs[0].find(0x3E).unwrap();
        assert_eq!(address.decoded.to_string(), "IPv4 10.20.30.40");
    }

    #[test]
    fn test_missing_mandatory_tags() {
        // SEND DATA without channel data
        let record = parse(&raw("D0 09 81 03 01 43 01 82 02 81 21 90 00")).unwrap();
        assert_eq!(record.warnings.len(), 1);
        assert!(record.warnings[0].contains("Channel Data"));
    }

    #[test]
    fn test_truncated_proactive_warns() {
        let record = parse(&raw("D0 30 81 03 01 43 01 82 02 81 21 90 00")).unwrap();
        assert!(record.warnings.iter().any(|w| w.contains("truncated")));
        assert_eq!(record.proactive.as_ref().unwrap().name, "SEND DATA");
    }

    #[test]
    fn test_length_mismatch_warns() {
        // Declared 0x0A but children cover 9 bytes plus one filler byte
        let record = parse(&raw("D0 0A 81 03 01 21 80 82 02 81 02 FF 90 00")).unwrap();
        assert_eq!(record.domain, Domain::SimToolkit);
        assert!(record.warnings.iter().any(|w| w.contains("length mismatch")));
    }

    #[test]
    fn test_terminal_response_receive_data() {
        let frame = raw("80 14 00 00 15 81 03 01 42 00 82 02 82 81 83 01 00 B6 04 16 03 03 00 B7 01 00");
        let record = parse(&frame).unwrap();
        assert_eq!(record.kind, ApduKind::Command);
        assert_eq!(record.direction, Direction::MeToSim);
        assert_eq!(record.domain, Domain::BearerIndependentProtocol);
        assert_eq!(record.proactive.as_ref().unwrap().name, "RECEIVE DATA");
        assert!(record.warnings.is_empty(), "{:?}", record.warnings);
    }

    #[test]
    fn test_terminal_response_other_command() {
        let record = parse(&raw("80 14 00 00 0C 81 03 01 21 80 82 02 82 81 83 01 00")).unwrap();
        assert_eq!(record.domain, Domain::SimToolkitResponse);
    }

    #[test]
    fn test_terminal_response_missing_result() {
        let record = parse(&raw("80 14 00 00 09 81 03 01 21 80 82 02 82 81")).unwrap();
        assert!(record.warnings.iter().any(|w| w.contains("Result")));
    }

    #[test]
    fn test_envelope_channel_status_event() {
        let frame = raw("80 C2 00 00 0D D6 0B 99 01 0A 82 02 82 81 B8 02 81 00");
        let record = parse(&frame).unwrap();
        assert_eq!(record.domain, Domain::BearerIndependentProtocol);
        assert_eq!(record.tlvs[0].name, "Event Download: Channel status");
        assert!(record.warnings.is_empty(), "{:?}", record.warnings);
    }

    #[test]
    fn test_select_response_fcp() {
        let record = parse(&raw("62 07 82 02 78 21 83 01 00 90 00")).unwrap();
        assert_eq!(record.domain, Domain::FileManagement);
        assert_eq!(record.tlvs[0].subs[0].name, "File Descriptor");
    }

    #[test]
    fn test_ambiguous_length_defaults_to_case3() {
        let record = parse(&raw("00 B0 00 00 05 01 02")).unwrap();
        assert_eq!(record.kind, ApduKind::Command);
        assert_eq!(record.case, Some(ApduCase::Case3));
        assert_eq!(record.lc, Some(5));
        assert_eq!(record.data, vec![0x01, 0x02]);
        assert_eq!(record.warnings.len(), 1);
    }

    #[test]
    fn test_exchange_inherits_command_context() {
        let (cmd, resp) = parse_exchange(&raw("00 A4 00 04 02 6F 07"), &raw("6A 82")).unwrap();
        assert_eq!(cmd.domain, Domain::FileManagement);
        assert_eq!(resp.domain, Domain::FileManagement);
        assert_eq!(resp.instruction.as_deref(), Some("SELECT"));
        assert_eq!(resp.direction, Direction::SimToMe);
    }

    #[test]
    fn test_exchange_fetch() {
        let (_, resp) = parse_exchange(
            &raw("80 12 00 00 0B"),
            &raw("D0 09 81 03 01 41 00 82 02 81 21 90 00"),
        )
        .unwrap();
        assert_eq!(resp.direction, Direction::SimToMe);
        assert_eq!(resp.domain, Domain::BearerIndependentProtocol);
        assert_eq!(resp.proactive.as_ref().unwrap().name, "CLOSE CHANNEL");
    }

    #[test]
    fn test_record_serializes() {
        let record = parse(&raw("D0 09 81 03 01 41 00 82 02 81 21 90 00")).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["direction"], "SIM->ME");
        assert_eq!(json["domain"], "Bearer Independent Protocol");
        assert_eq!(json["tlvs"][0]["name"], "Proactive Command: CLOSE CHANNEL");
    }
}

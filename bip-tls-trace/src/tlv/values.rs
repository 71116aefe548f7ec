//! Semantic value decoders
//!
//! Every decoder has the same shape, `fn(&[u8]) -> DecodedValue`, so the tag
//! tables in [`super::tags`] can hold them as plain function pointers.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::Serialize;

use super::tags;

/// Bytes shown before a hex rendering is truncated
pub const HEX_PREVIEW_BYTES: usize = 16;

/// Share of printable characters required to treat a value as text
const PRINTABLE_RATIO: f32 = 0.8;

/// Shortest value the ASCII fallback will consider
const MIN_TEXT_LEN: usize = 3;

/// Heuristic classification of a printable string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextClass {
    Plain,
    Url,
    Email,
    Domain,
    Apn,
}

impl fmt::Display for TextClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TextClass::Plain => "text",
            TextClass::Url => "URL",
            TextClass::Email => "e-mail",
            TextClass::Domain => "domain",
            TextClass::Apn => "APN",
        };
        f.write_str(s)
    }
}

/// Decoded meaning of a TLV value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodedValue {
    Empty,
    Constructed {
        children: usize,
    },
    Text {
        text: String,
        class: TextClass,
    },
    Hex {
        hex: String,
        total_len: usize,
        truncated: bool,
    },
    Number {
        value: u64,
        display: String,
    },
    CommandDetails {
        number: u8,
        type_code: u8,
        type_name: String,
        qualifier: u8,
    },
    DeviceIdentities {
        source: u8,
        source_name: String,
        destination: u8,
        destination_name: String,
    },
    Result {
        general: u8,
        description: String,
        additional: Option<String>,
    },
    Duration {
        unit: String,
        interval: u8,
        display: String,
    },
    ChannelStatus {
        channel_id: u8,
        open: bool,
        tcp_state: String,
        link_dropped: bool,
        badge: String,
    },
    BufferSize {
        bytes: u32,
        display: String,
    },
    Bearer {
        bearer_type: u8,
        name: String,
        parameters: String,
    },
    Address {
        family: String,
        address: String,
    },
    Transport {
        protocol: String,
        port: u16,
    },
    ChannelData {
        length: usize,
        tls_record: bool,
        preview: String,
    },
    EventList {
        events: Vec<String>,
    },
}

impl DecodedValue {
    /// The text carried by this value, if it decoded as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DecodedValue::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Empty => f.write_str("(empty)"),
            DecodedValue::Constructed { children } => write!(f, "{} nested objects", children),
            DecodedValue::Text { text, class } => match class {
                TextClass::Plain => write!(f, "\"{}\"", text),
                _ => write!(f, "\"{}\" ({})", text, class),
            },
            DecodedValue::Hex { hex, total_len, truncated } => {
                if *truncated {
                    write!(f, "{} ... ({} bytes)", hex, total_len)
                } else {
                    f.write_str(hex)
                }
            }
            DecodedValue::Number { display, .. } => f.write_str(display),
            DecodedValue::CommandDetails { number, type_name, qualifier, .. } => {
                write!(f, "#{} {} (qualifier 0x{:02X})", number, type_name, qualifier)
            }
            DecodedValue::DeviceIdentities { source_name, destination_name, .. } => {
                write!(f, "{} -> {}", source_name, destination_name)
            }
            DecodedValue::Result { description, additional, .. } => match additional {
                Some(extra) => write!(f, "{} [{}]", description, extra),
                None => f.write_str(description),
            },
            DecodedValue::Duration { display, .. } => f.write_str(display),
            DecodedValue::ChannelStatus { badge, .. } => f.write_str(badge),
            DecodedValue::BufferSize { display, .. } => f.write_str(display),
            DecodedValue::Bearer { name, parameters, .. } => {
                if parameters.is_empty() {
                    f.write_str(name)
                } else {
                    write!(f, "{} [{}]", name, parameters)
                }
            }
            DecodedValue::Address { family, address } => write!(f, "{} {}", family, address),
            DecodedValue::Transport { protocol, port } => write!(f, "{} port {}", protocol, port),
            DecodedValue::ChannelData { length, tls_record, preview } => {
                if *tls_record {
                    write!(f, "{} bytes, TLS record: {}", length, preview)
                } else {
                    write!(f, "{} bytes: {}", length, preview)
                }
            }
            DecodedValue::EventList { events } => f.write_str(&events.join(", ")),
        }
    }
}

/// Hex with a single space between bytes
pub fn hexify(value: &[u8]) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for (i, c) in hex::encode_upper(value).chars().enumerate() {
        if i > 0 && i % 2 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Hex rendering, truncated to [`HEX_PREVIEW_BYTES`]
pub fn hex_preview(value: &[u8]) -> DecodedValue {
    let truncated = value.len() > HEX_PREVIEW_BYTES;
    let shown = &value[..value.len().min(HEX_PREVIEW_BYTES)];
    DecodedValue::Hex {
        hex: hexify(shown),
        total_len: value.len(),
        truncated,
    }
}

/// Fallback for tags without a dedicated decoder
pub fn decode_fallback(value: &[u8]) -> DecodedValue {
    if value.is_empty() {
        return DecodedValue::Empty;
    }
    match printable_text(value) {
        Some(text) => {
            let class = classify_text(&text);
            DecodedValue::Text { text, class }
        }
        None => hex_preview(value),
    }
}

/// Interpret `value` as ASCII when at least 80% of it is printable
pub fn printable_text(value: &[u8]) -> Option<String> {
    // Trailing 0xFF is record padding on SIM files
    let trimmed = trim_padding(value);
    if trimmed.len() < MIN_TEXT_LEN {
        return None;
    }
    let printable = trimmed.iter().filter(|&&b| (0x20..=0x7E).contains(&b)).count();
    if (printable as f32) < (trimmed.len() as f32) * PRINTABLE_RATIO {
        return None;
    }
    Some(
        trimmed
            .iter()
            .map(|&b| if (0x20..=0x7E).contains(&b) { b as char } else { '.' })
            .collect(),
    )
}

fn trim_padding(value: &[u8]) -> &[u8] {
    let end = value.iter().rposition(|&b| b != 0xFF && b != 0x00).map_or(0, |p| p + 1);
    &value[..end]
}

/// Classify a string as URL, e-mail, APN, domain or plain text
pub fn classify_text(text: &str) -> TextClass {
    let lower = text.to_ascii_lowercase();
    if lower.contains("://") || lower.starts_with("www.") {
        return TextClass::Url;
    }
    if text.contains(' ') {
        return TextClass::Plain;
    }
    if let Some((local, host)) = lower.split_once('@') {
        if !local.is_empty() && host.contains('.') && !host.starts_with('.') {
            return TextClass::Email;
        }
    }
    if lower.ends_with(".gprs")
        || lower.contains(".mnc")
        || lower.ends_with(".3gppnetwork.org")
        || lower.ends_with(".m2m")
        || lower.ends_with(".iot")
        || lower == "internet"
    {
        return TextClass::Apn;
    }
    if looks_like_domain(&lower) {
        return TextClass::Domain;
    }
    TextClass::Plain
}

fn looks_like_domain(lower: &str) -> bool {
    let labels: Vec<&str> = lower.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let label_ok = |l: &&str| {
        !l.is_empty()
            && !l.starts_with('-')
            && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    };
    if !labels.iter().all(label_ok) {
        return false;
    }
    let tld = labels[labels.len() - 1];
    (2..=12).contains(&tld.len()) && tld.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn decode_command_details(value: &[u8]) -> DecodedValue {
    if value.len() < 3 {
        return hex_preview(value);
    }
    DecodedValue::CommandDetails {
        number: value[0],
        type_code: value[1],
        type_name: tags::proactive_command_name(value[1]),
        qualifier: value[2],
    }
}

pub fn decode_device_identities(value: &[u8]) -> DecodedValue {
    if value.len() < 2 {
        return hex_preview(value);
    }
    DecodedValue::DeviceIdentities {
        source: value[0],
        source_name: tags::device_name(value[0]),
        destination: value[1],
        destination_name: tags::device_name(value[1]),
    }
}

pub fn decode_result(value: &[u8]) -> DecodedValue {
    let Some(&general) = value.first() else {
        return DecodedValue::Empty;
    };
    let additional = match value.get(1) {
        Some(&cause) if general == 0x3A => Some(bip_error_cause(cause).to_string()),
        Some(_) => Some(hexify(&value[1..])),
        None => None,
    };
    DecodedValue::Result {
        general,
        description: tags::general_result_name(general),
        additional,
    }
}

fn bip_error_cause(cause: u8) -> &'static str {
    match cause {
        0x00 => "No specific cause",
        0x01 => "No channel available",
        0x02 => "Channel closed",
        0x03 => "Channel identifier not valid",
        0x04 => "Requested buffer size not available",
        0x05 => "Security error",
        0x06 => "Requested transport level not available",
        0x07 => "Remote device is not reachable",
        0x08 => "Service error",
        0x09 => "Service identifier unknown",
        0x10 => "Port not available",
        0x11 => "Launch parameters missing or incorrect",
        0x12 => "Application launch failed",
        _ => "Unknown BIP error cause",
    }
}

pub fn decode_duration(value: &[u8]) -> DecodedValue {
    if value.len() < 2 {
        return hex_preview(value);
    }
    let (unit, tenths) = match value[0] {
        0x00 => ("minutes", value[1] as u64 * 600),
        0x01 => ("seconds", value[1] as u64 * 10),
        0x02 => ("tenths of seconds", value[1] as u64),
        _ => return hex_preview(value),
    };
    let total_secs = tenths / 10;
    let mut display = format!(
        "{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    );
    if tenths % 10 != 0 {
        display.push_str(&format!(".{}", tenths % 10));
    }
    display.push_str(&format!(" ({} {})", value[1], unit));
    DecodedValue::Duration {
        unit: unit.to_string(),
        interval: value[1],
        display,
    }
}

/// Alpha identifier: GSM default alphabet or one of the three UCS2 codings
pub fn decode_alpha_identifier(value: &[u8]) -> DecodedValue {
    if value.is_empty() {
        return DecodedValue::Empty;
    }
    let text = match value[0] {
        0x80 => ucs2_text(&value[1..]),
        0x81 => ucs2_compressed(value, 3, |v| (v[2] as u16) << 7),
        0x82 => ucs2_compressed(value, 4, |v| ((v[2] as u16) << 8) | v[3] as u16),
        _ => Some(gsm_text(trim_padding(value))),
    };
    match text {
        Some(text) => DecodedValue::Text {
            class: classify_text(&text),
            text,
        },
        None => hex_preview(value),
    }
}

/// Text string: the first byte is the data coding scheme
pub fn decode_text_string(value: &[u8]) -> DecodedValue {
    let Some((&dcs, body)) = value.split_first() else {
        return DecodedValue::Empty;
    };
    let text = match dcs & 0x0C {
        0x00 => Some(gsm_text(&unpack_septets(body))),
        0x04 => Some(gsm_text(body)),
        0x08 => ucs2_text(body),
        _ => None,
    };
    match text {
        Some(text) => DecodedValue::Text {
            class: classify_text(&text),
            text,
        },
        None => hex_preview(value),
    }
}

fn ucs2_text(body: &[u8]) -> Option<String> {
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .take_while(|&u| u != 0xFFFF)
        .collect();
    String::from_utf16(&units).ok()
}

fn ucs2_compressed(value: &[u8], header: usize, base: impl Fn(&[u8]) -> u16) -> Option<String> {
    if value.len() < header {
        return None;
    }
    let count = value[1] as usize;
    let base = base(value);
    let chars = value[header..].iter().take(count);
    let mut units = Vec::with_capacity(count);
    for &c in chars {
        if c & 0x80 == 0 {
            units.push(gsm_char(c) as u16);
        } else {
            units.push(base.wrapping_add((c & 0x7F) as u16));
        }
    }
    String::from_utf16(&units).ok()
}

fn gsm_text(body: &[u8]) -> String {
    body.iter().map(|&b| gsm_char(b & 0x7F)).collect()
}

/// GSM 03.38 default alphabet; the ASCII-compatible range passes through
fn gsm_char(septet: u8) -> char {
    match septet {
        0x00 => '@',
        0x01 => '£',
        0x02 => '$',
        0x0A => '\n',
        0x0D => '\r',
        0x11 => '_',
        0x1B => ' ',
        0x24 => '¤',
        0x40 => '¡',
        c if (0x20..=0x7E).contains(&c) => c as char,
        _ => '?',
    }
}

/// Unpack GSM 7-bit packed septets
pub fn unpack_septets(packed: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(packed.len() * 8 / 7);
    let mut carry: u16 = 0;
    let mut carry_bits = 0;
    for &byte in packed {
        let acc = ((byte as u16) << carry_bits) | carry;
        out.push((acc & 0x7F) as u8);
        carry = acc >> 7;
        carry_bits += 1;
        if carry_bits == 7 {
            out.push((carry & 0x7F) as u8);
            carry = 0;
            carry_bits = 0;
        }
    }
    out
}

/// Address: TON/NPI byte followed by swapped-nibble BCD digits
pub fn decode_dialling_address(value: &[u8]) -> DecodedValue {
    let Some((&ton_npi, digits)) = value.split_first() else {
        return DecodedValue::Empty;
    };
    let mut number = String::new();
    if (ton_npi >> 4) & 0x07 == 0x01 {
        number.push('+');
    }
    for &b in digits {
        for nibble in [b & 0x0F, b >> 4] {
            match nibble {
                0..=9 => number.push((b'0' + nibble) as char),
                0x0A => number.push('*'),
                0x0B => number.push('#'),
                0x0F => {}
                _ => number.push('?'),
            }
        }
    }
    DecodedValue::Address {
        family: "Dialling number".to_string(),
        address: number,
    }
}

/// Channel status, byte 1: channel id in bits 1-3, state in bits 7-8
///
/// The state field reads 00 closed, 01 TCP LISTEN and 10 established,
/// covering both a client link and a UICC server TCP connection. Byte 2
/// carries further information; 05 means the link was dropped.
pub fn decode_channel_status(value: &[u8]) -> DecodedValue {
    if value.len() < 2 {
        return hex_preview(value);
    }
    let channel_id = value[0] & 0x07;
    let (open, tcp_state) = match value[0] >> 6 {
        0b00 => (false, "CLOSED"),
        0b01 => (true, "LISTEN"),
        0b10 => (true, "ESTABLISHED"),
        _ => (false, "RESERVED"),
    };
    let link_dropped = value[1] == 0x05;

    let mut badge = format!("[CH{} {}", channel_id, if open { "OPEN" } else { "CLOSED" });
    match tcp_state {
        "CLOSED" => {}
        state => badge.push_str(&format!(" | TCP {}", state)),
    }
    if link_dropped {
        badge.push_str(" | LINK DROPPED");
    }
    badge.push(']');

    DecodedValue::ChannelStatus {
        channel_id,
        open,
        tcp_state: tcp_state.to_string(),
        link_dropped,
        badge,
    }
}

pub fn decode_buffer_size(value: &[u8]) -> DecodedValue {
    if value.len() != 2 {
        return hex_preview(value);
    }
    let bytes = u16::from_be_bytes([value[0], value[1]]) as u32;
    DecodedValue::BufferSize {
        bytes,
        display: human_size(bytes as u64),
    }
}

/// Byte count with a KB/MB suffix once it crosses 1024
pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KB * KB {
        format!("{} bytes ({:.1} MB)", bytes, b / (KB * KB))
    } else if b >= KB {
        format!("{} bytes ({:.1} KB)", bytes, b / KB)
    } else {
        format!("{} bytes", bytes)
    }
}

pub fn decode_bearer_description(value: &[u8]) -> DecodedValue {
    let Some((&bearer_type, params)) = value.split_first() else {
        return DecodedValue::Empty;
    };
    let name = match bearer_type {
        0x01 => "CSD",
        0x02 => "GPRS / UTRAN packet service",
        0x03 => "Default bearer for requested transport layer",
        0x04 => "Local link technology independent",
        0x05 => "Bluetooth",
        0x06 => "IrDA",
        0x07 => "RS232",
        0x08 => "cdma2000 packet data service",
        0x09 => "UTRAN packet service with extended parameters",
        0x0A => "(I-)WLAN",
        0x0B => "E-UTRAN / mapped UTRAN packet service",
        0x0C => "NG-RAN",
        0x10 => "USB",
        _ => "Unknown bearer",
    };
    DecodedValue::Bearer {
        bearer_type,
        name: name.to_string(),
        parameters: hexify(params),
    }
}

/// Other address / transport address: IPv4, IPv6 or ASCII
pub fn decode_other_address(value: &[u8]) -> DecodedValue {
    if value.is_empty() {
        return DecodedValue::Empty;
    }
    let (type_byte, addr) = (value[0], &value[1..]);
    match (type_byte, addr.len()) {
        (0x21, 4) => return ipv4(addr),
        (0x57, 16) => return ipv6(addr),
        _ => {}
    }
    // Captures without the address-type byte
    match value.len() {
        4 => ipv4(value),
        16 => ipv6(value),
        _ => match printable_text(value) {
            Some(text) => DecodedValue::Address {
                family: "ASCII".to_string(),
                address: text,
            },
            None => hex_preview(value),
        },
    }
}

fn ipv4(b: &[u8]) -> DecodedValue {
    DecodedValue::Address {
        family: "IPv4".to_string(),
        address: Ipv4Addr::new(b[0], b[1], b[2], b[3]).to_string(),
    }
}

fn ipv6(b: &[u8]) -> DecodedValue {
    let mut octets = [0u8; 16];
    octets.copy_from_slice(b);
    DecodedValue::Address {
        family: "IPv6".to_string(),
        address: Ipv6Addr::from(octets).to_string(),
    }
}

pub fn decode_transport_level(value: &[u8]) -> DecodedValue {
    if value.len() < 3 {
        return hex_preview(value);
    }
    let protocol = match value[0] {
        0x01 => "UDP, UICC in client mode, remote connection",
        0x02 => "TCP, UICC in client mode, remote connection",
        0x03 => "TCP, UICC in server mode",
        0x04 => "UDP, UICC in client mode, local connection",
        0x05 => "TCP, UICC in client mode, local connection",
        0x06 => "Direct communication channel",
        _ => "Unknown transport",
    };
    DecodedValue::Transport {
        protocol: protocol.to_string(),
        port: u16::from_be_bytes([value[1], value[2]]),
    }
}

/// Network access name: DNS-style length-prefixed labels
pub fn decode_network_access_name(value: &[u8]) -> DecodedValue {
    let mut labels = Vec::new();
    let mut pos = 0;
    while pos < value.len() {
        let len = value[pos] as usize;
        let end = pos + 1 + len;
        if len == 0 || end > value.len() {
            labels.clear();
            break;
        }
        match std::str::from_utf8(&value[pos + 1..end]) {
            Ok(label) if label.chars().all(|c| c.is_ascii_graphic()) => labels.push(label),
            _ => {
                labels.clear();
                break;
            }
        }
        pos = end;
    }
    if !labels.is_empty() {
        return DecodedValue::Text {
            text: labels.join("."),
            class: TextClass::Apn,
        };
    }
    match printable_text(value) {
        Some(text) => DecodedValue::Text {
            text,
            class: TextClass::Apn,
        },
        None => hex_preview(value),
    }
}

pub fn decode_channel_data_length(value: &[u8]) -> DecodedValue {
    match value {
        [0xFF] => DecodedValue::Number {
            value: 255,
            display: "more than 255 bytes available".to_string(),
        },
        [n] => DecodedValue::Number {
            value: *n as u64,
            display: format!("{} bytes", n),
        },
        _ => hex_preview(value),
    }
}

pub fn decode_channel_data(value: &[u8]) -> DecodedValue {
    let preview = match hex_preview(value) {
        DecodedValue::Hex { hex, truncated: true, .. } => format!("{} ...", hex),
        DecodedValue::Hex { hex, .. } => hex,
        _ => String::new(),
    };
    DecodedValue::ChannelData {
        length: value.len(),
        tls_record: looks_like_tls_record(value),
        preview,
    }
}

/// Content type 0x14..=0x18 followed by a 3.x version
pub fn looks_like_tls_record(value: &[u8]) -> bool {
    value.len() >= 5 && (0x14..=0x18).contains(&value[0]) && value[1] == 0x03 && value[2] <= 0x04
}

pub fn decode_event_list(value: &[u8]) -> DecodedValue {
    DecodedValue::EventList {
        events: value.iter().map(|&e| tags::event_name(e)).collect(),
    }
}

/// One-byte integer or big-endian counter
pub fn decode_integer(value: &[u8]) -> DecodedValue {
    if value.is_empty() || value.len() > 8 {
        return hex_preview(value);
    }
    let n = value.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
    DecodedValue::Number {
        value: n,
        display: n.to_string(),
    }
}

/// Always hex (identifiers, AIDs, opaque blobs)
pub fn decode_hex(value: &[u8]) -> DecodedValue {
    if value.is_empty() {
        DecodedValue::Empty
    } else {
        hex_preview(value)
    }
}

pub fn decode_file_size(value: &[u8]) -> DecodedValue {
    match decode_integer(value) {
        DecodedValue::Number { value, .. } => DecodedValue::Number {
            value,
            display: human_size(value),
        },
        other => other,
    }
}

pub fn decode_life_cycle_status(value: &[u8]) -> DecodedValue {
    let Some(&lcs) = value.first() else {
        return DecodedValue::Empty;
    };
    let display = match lcs {
        0x00 => "No information given",
        0x01 => "Creation state",
        0x03 => "Initialisation state",
        0x04 | 0x06 => "Operational state - deactivated",
        0x05 | 0x07 => "Operational state - activated",
        0x0C..=0x0F => "Termination state",
        _ => "Proprietary",
    };
    DecodedValue::Number {
        value: lcs as u64,
        display: display.to_string(),
    }
}

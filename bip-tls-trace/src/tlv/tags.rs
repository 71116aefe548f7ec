//! Tag dictionaries
//!
//! Two tag spaces share the same byte values: CAT simple-TLV tags (where bit 8
//! is the comprehension-required flag) and ISO 7816-4 file-control tags. The
//! context decides which table is consulted first.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use super::parser::TLV;
use super::values::{self, DecodedValue};

/// Semantic decoder for a tag's value
pub type ValueDecoder = fn(&[u8]) -> DecodedValue;

/// Which tag table applies to a TLV list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagContext {
    /// Proactive commands, terminal responses, envelopes
    Toolkit,
    /// FCP/FCI templates returned by SELECT
    FileControl,
}

impl TagContext {
    fn other(self) -> Self {
        match self {
            TagContext::Toolkit => TagContext::FileControl,
            TagContext::FileControl => TagContext::Toolkit,
        }
    }
}

/// Name and decoder for one tag
#[derive(Debug, Clone, Copy)]
pub struct TagInfo {
    pub name: &'static str,
    pub decoder: ValueDecoder,
}

fn info(name: &'static str, decoder: ValueDecoder) -> TagInfo {
    TagInfo { name, decoder }
}

/// BER templates, recognised in every context. These always carry children.
static TEMPLATE_TAGS: Lazy<HashMap<u32, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (0x62, "FCP Template"),
        (0x64, "FMD Template"),
        (0x6F, "FCI Template"),
        (0xA5, "Proprietary Template"),
        (0xD0, "Proactive Command"),
        (0xD1, "SMS-PP Download"),
        (0xD2, "Cell Broadcast Download"),
        (0xD3, "Menu Selection"),
        (0xD4, "Call Control"),
        (0xD5, "MO Short Message Control"),
        (0xD6, "Event Download"),
        (0xD7, "Timer Expiration"),
    ])
});

/// CAT simple-TLV tags keyed by tag value with the CR bit cleared
static TOOLKIT_TAGS: Lazy<HashMap<u8, TagInfo>> = Lazy::new(|| {
    use values::*;
    HashMap::from([
        (0x01, info("Command Details", decode_command_details)),
        (0x02, info("Device Identities", decode_device_identities)),
        (0x03, info("Result", decode_result)),
        (0x04, info("Duration", decode_duration)),
        (0x05, info("Alpha Identifier", decode_alpha_identifier)),
        (0x06, info("Address", decode_dialling_address)),
        (0x07, info("Capability Configuration Parameters", decode_hex)),
        (0x08, info("Subaddress", decode_hex)),
        (0x09, info("SS String", decode_hex)),
        (0x0A, info("USSD String", decode_text_string)),
        (0x0B, info("SMS TPDU", decode_hex)),
        (0x0C, info("Cell Broadcast Page", decode_hex)),
        (0x0D, info("Text String", decode_text_string)),
        (0x0E, info("Tone", decode_hex)),
        (0x0F, info("Item", decode_fallback)),
        (0x10, info("Item Identifier", decode_integer)),
        (0x11, info("Response Length", decode_hex)),
        (0x12, info("File List", decode_hex)),
        (0x13, info("Location Information", decode_hex)),
        (0x14, info("IMEI", decode_hex)),
        (0x15, info("Help Request", decode_hex)),
        (0x16, info("Network Measurement Results", decode_hex)),
        (0x17, info("Default Text", decode_text_string)),
        (0x18, info("Items Next Action Indicator", decode_hex)),
        (0x19, info("Event List", decode_event_list)),
        (0x1A, info("Cause", decode_hex)),
        (0x1B, info("Location Status", decode_hex)),
        (0x1C, info("Transaction Identifier", decode_hex)),
        (0x1D, info("BCCH Channel List", decode_hex)),
        (0x1E, info("Icon Identifier", decode_hex)),
        (0x1F, info("Item Icon Identifier List", decode_hex)),
        (0x20, info("Card Reader Status", decode_hex)),
        (0x21, info("Card ATR", decode_hex)),
        (0x22, info("C-APDU", decode_hex)),
        (0x23, info("R-APDU", decode_hex)),
        (0x24, info("Timer Identifier", decode_integer)),
        (0x25, info("Timer Value", decode_hex)),
        (0x26, info("Date-Time and Time Zone", decode_hex)),
        (0x27, info("Call Control Requested Action", decode_hex)),
        (0x28, info("AT Command", decode_fallback)),
        (0x29, info("AT Response", decode_fallback)),
        (0x2A, info("BC Repeat Indicator", decode_hex)),
        (0x2B, info("Immediate Response", decode_hex)),
        (0x2C, info("DTMF String", decode_hex)),
        (0x2D, info("Language", decode_fallback)),
        (0x2E, info("Timing Advance", decode_hex)),
        (0x2F, info("AID", decode_hex)),
        (0x30, info("Browser Identity", decode_hex)),
        (0x31, info("URL", decode_fallback)),
        (0x32, info("Bearer", decode_hex)),
        (0x33, info("Provisioning Reference File", decode_hex)),
        (0x34, info("Browser Termination Cause", decode_hex)),
        (0x35, info("Bearer Description", decode_bearer_description)),
        (0x36, info("Channel Data", decode_channel_data)),
        (0x37, info("Channel Data Length", decode_channel_data_length)),
        (0x38, info("Channel Status", decode_channel_status)),
        (0x39, info("Buffer Size", decode_buffer_size)),
        (0x3A, info("Card Reader Identifier", decode_hex)),
        (0x3B, info("File Update Information", decode_hex)),
        (0x3C, info("UICC/Terminal Interface Transport Level", decode_transport_level)),
        (0x3E, info("Other Address", decode_other_address)),
        (0x3F, info("Access Technology", decode_hex)),
        (0x40, info("Display Parameters", decode_hex)),
        (0x41, info("Service Record", decode_hex)),
        (0x42, info("Device Filter", decode_hex)),
        (0x43, info("Service Search", decode_hex)),
        (0x44, info("Attribute Information", decode_hex)),
        (0x45, info("Service Availability", decode_hex)),
        (0x46, info("ESN", decode_hex)),
        (0x47, info("Network Access Name", decode_network_access_name)),
        (0x48, info("CDMA-SMS-TPDU", decode_hex)),
        (0x49, info("Remote Entity Address", decode_other_address)),
        (0x50, info("Text Attribute", decode_hex)),
    ])
});

/// ISO 7816-4 file control parameters and application data objects
static FILE_CONTROL_TAGS: Lazy<HashMap<u32, TagInfo>> = Lazy::new(|| {
    use values::*;
    HashMap::from([
        (0x4F, info("Application Identifier", decode_hex)),
        (0x50, info("Application Label", decode_fallback)),
        (0x80, info("File Size", decode_file_size)),
        (0x81, info("Total File Size", decode_file_size)),
        (0x82, info("File Descriptor", decode_hex)),
        (0x83, info("File Identifier", decode_hex)),
        (0x84, info("DF Name (AID)", decode_hex)),
        (0x85, info("Proprietary Information", decode_hex)),
        (0x86, info("Security Attributes (Proprietary)", decode_hex)),
        (0x88, info("Short File Identifier", decode_hex)),
        (0x8A, info("Life Cycle Status", decode_life_cycle_status)),
        (0x8B, info("Security Attributes (Referenced)", decode_hex)),
        (0x8C, info("Security Attributes (Compact)", decode_hex)),
        (0xAB, info("Security Attributes (Expanded)", decode_hex)),
        (0xC6, info("PIN Status Template", decode_hex)),
        (0x90, info("PIN Status", decode_hex)),
        (0x95, info("Usage Qualifier", decode_hex)),
    ])
});

/// Tags that always carry nested TLVs, even when truncated
pub fn is_container(tag: u32) -> bool {
    TEMPLATE_TAGS.contains_key(&tag)
}

/// Child context for the value of a container tag
pub fn child_context(tag: u32, context: TagContext) -> TagContext {
    match tag {
        0x62 | 0x64 | 0x6F | 0xA5 => TagContext::FileControl,
        0xD0..=0xD7 => TagContext::Toolkit,
        _ => context,
    }
}

fn lookup_in(tag: u32, context: TagContext) -> Option<TagInfo> {
    match context {
        TagContext::Toolkit if tag <= 0xFF => TOOLKIT_TAGS.get(&((tag & 0x7F) as u8)).copied(),
        TagContext::Toolkit => None,
        TagContext::FileControl => FILE_CONTROL_TAGS.get(&tag).copied(),
    }
}

/// Look up a tag, falling back to the other context's table
pub fn lookup(tag: u32, context: TagContext) -> Option<TagInfo> {
    lookup_in(tag, context).or_else(|| lookup_in(tag, context.other()))
}

/// True when the tag is a known simple-TLV toolkit tag, which never nests
pub fn is_toolkit_primitive(tag: u32, context: TagContext) -> bool {
    context == TagContext::Toolkit && lookup_in(tag, context).is_some()
}

/// Display name for a tag in the given context
pub fn tag_name(tag: u32, context: TagContext) -> String {
    if let Some(name) = TEMPLATE_TAGS.get(&tag) {
        return (*name).to_string();
    }
    match lookup(tag, context) {
        Some(info) => info.name.to_string(),
        None if tag > 0xFF => format!("Unknown Tag {:04X}", tag),
        None => format!("Unknown Tag {:02X}", tag),
    }
}

/// Decode a primitive value with the tag's decoder, or the generic fallback
pub fn decode_value(tag: u32, value: &[u8], context: TagContext) -> DecodedValue {
    match lookup(tag, context) {
        Some(info) => (info.decoder)(value),
        None => values::decode_fallback(value),
    }
}

fn find_child(children: &[TLV], base_tag: u8) -> Option<&TLV> {
    children.iter().find(|c| c.tag <= 0xFF && (c.tag & 0x7F) as u8 == base_tag)
}

/// Rename a container once its children are known
///
/// Returns `None` when the static name stays.
pub fn rename_container(tag: u32, children: &[TLV]) -> Option<String> {
    match tag {
        0x64 | 0x6F => {
            let has_file_params = children.iter().any(|c| matches!(c.tag, 0x82 | 0x83 | 0x84 | 0x4F));
            has_file_params.then(|| "FCP Template".to_string())
        }
        0xD0 => {
            let details = find_child(children, 0x01)?;
            let code = *details.value.get(1)?;
            Some(format!("Proactive Command: {}", proactive_command_name(code)))
        }
        0xD6 => {
            let events = find_child(children, 0x19)?;
            let first = *events.value.first()?;
            Some(format!("Event Download: {}", event_name(first)))
        }
        _ => None,
    }
}

/// Proactive command type names (command details, second byte)
pub fn proactive_command_name(code: u8) -> String {
    let name = match code {
        0x01 => "REFRESH",
        0x02 => "MORE TIME",
        0x03 => "POLL INTERVAL",
        0x04 => "POLLING OFF",
        0x05 => "SET UP EVENT LIST",
        0x10 => "SET UP CALL",
        0x11 => "SEND SS",
        0x12 => "SEND USSD",
        0x13 => "SEND SHORT MESSAGE",
        0x14 => "SEND DTMF",
        0x15 => "LAUNCH BROWSER",
        0x16 => "GEOGRAPHICAL LOCATION REQUEST",
        0x20 => "PLAY TONE",
        0x21 => "DISPLAY TEXT",
        0x22 => "GET INKEY",
        0x23 => "GET INPUT",
        0x24 => "SELECT ITEM",
        0x25 => "SET UP MENU",
        0x26 => "PROVIDE LOCAL INFORMATION",
        0x27 => "TIMER MANAGEMENT",
        0x28 => "SET UP IDLE MODE TEXT",
        0x30 => "PERFORM CARD APDU",
        0x31 => "POWER ON CARD",
        0x32 => "POWER OFF CARD",
        0x33 => "GET READER STATUS",
        0x34 => "RUN AT COMMAND",
        0x35 => "LANGUAGE NOTIFICATION",
        0x40 => "OPEN CHANNEL",
        0x41 => "CLOSE CHANNEL",
        0x42 => "RECEIVE DATA",
        0x43 => "SEND DATA",
        0x44 => "GET CHANNEL STATUS",
        0x45 => "SERVICE SEARCH",
        0x46 => "GET SERVICE INFORMATION",
        0x47 => "DECLARE SERVICE",
        0x50 => "SET FRAMES",
        0x51 => "GET FRAMES STATUS",
        0x70 => "RETRIEVE MULTIMEDIA MESSAGE",
        0x71 => "SUBMIT MULTIMEDIA MESSAGE",
        0x72 => "DISPLAY MULTIMEDIA MESSAGE",
        0x73 => "ACTIVATE",
        0x74 => "CONTACTLESS STATE CHANGED",
        0x75 => "COMMAND CONTAINER",
        0x76 => "ENCAPSULATED SESSION CONTROL",
        0x81 => "END OF THE PROACTIVE SESSION",
        _ => return format!("UNKNOWN (0x{:02X})", code),
    };
    name.to_string()
}

/// Device identity names
pub fn device_name(code: u8) -> String {
    match code {
        0x01 => "Keypad".to_string(),
        0x02 => "Display".to_string(),
        0x03 => "Earpiece".to_string(),
        0x10..=0x17 => format!("Additional Card Reader {}", code - 0x10),
        0x21..=0x27 => format!("Channel {}", code - 0x20),
        0x81 => "UICC".to_string(),
        0x82 => "Terminal".to_string(),
        0x83 => "Network".to_string(),
        _ => format!("Device 0x{:02X}", code),
    }
}

/// General result names (result TLV, first byte)
pub fn general_result_name(code: u8) -> String {
    let name = match code {
        0x00 => "Command performed successfully",
        0x01 => "Command performed with partial comprehension",
        0x02 => "Command performed, with missing information",
        0x03 => "REFRESH performed with additional EFs read",
        0x04 => "Command performed successfully, but requested icon could not be displayed",
        0x05 => "Command performed, but modified by call control by NAA",
        0x06 => "Command performed successfully, limited service",
        0x07 => "Command performed with modification",
        0x08 => "REFRESH performed but indicated NAA was not active",
        0x09 => "Command performed successfully, tone not played",
        0x10 => "Proactive UICC session terminated by the user",
        0x11 => "Backward move in the proactive UICC session requested by the user",
        0x12 => "No response from user",
        0x13 => "Help information required by the user",
        0x20 => "Terminal currently unable to process command",
        0x21 => "Network currently unable to process command",
        0x22 => "User did not accept the proactive command",
        0x23 => "User cleared down call before connection or network release",
        0x24 => "Action in contradiction with the current timer state",
        0x25 => "Interaction with call control by NAA, temporary problem",
        0x26 => "Launch browser generic error code",
        0x30 => "Command beyond terminal's capabilities",
        0x31 => "Command type not understood by terminal",
        0x32 => "Command data not understood by terminal",
        0x33 => "Command number not known by terminal",
        0x36 => "Error, required values are missing",
        0x38 => "MultipleCard commands error",
        0x39 => "Interaction with call control by NAA, permanent problem",
        0x3A => "Bearer Independent Protocol error",
        0x3B => "Access Technology unable to process command",
        0x3C => "Frames error",
        _ => return format!("Unknown result (0x{:02X})", code),
    };
    name.to_string()
}

/// Event names used by SET UP EVENT LIST and event download
pub fn event_name(code: u8) -> String {
    let name = match code {
        0x00 => "MT call",
        0x01 => "Call connected",
        0x02 => "Call disconnected",
        0x03 => "Location status",
        0x04 => "User activity",
        0x05 => "Idle screen available",
        0x06 => "Card reader status",
        0x07 => "Language selection",
        0x08 => "Browser termination",
        0x09 => "Data available",
        0x0A => "Channel status",
        0x0B => "Access Technology Change",
        0x0C => "Display parameters changed",
        0x0D => "Local connection",
        0x0E => "Network Search Mode Change",
        0x0F => "Browsing status",
        0x10 => "Frames Information Change",
        0x13 => "HCI connectivity event",
        0x14 => "Access Technology Change (multiple)",
        0x16 => "Contactless state request",
        _ => return format!("Event 0x{:02X}", code),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comprehension_bit_masked_in_toolkit_context() {
        assert_eq!(tag_name(0x81, TagContext::Toolkit), "Command Details");
        assert_eq!(tag_name(0x01, TagContext::Toolkit), "Command Details");
        assert_eq!(tag_name(0xB8, TagContext::Toolkit), "Channel Status");
    }

    #[test]
    fn test_context_selects_table() {
        assert_eq!(tag_name(0x84, TagContext::FileControl), "DF Name (AID)");
        assert_eq!(tag_name(0x84, TagContext::Toolkit), "Duration");
    }

    #[test]
    fn test_fallback_to_other_context() {
        assert_eq!(tag_name(0x4F, TagContext::Toolkit), "Application Identifier");
        assert_eq!(tag_name(0x01, TagContext::FileControl), "Command Details");
    }

    #[test]
    fn test_unknown_tag_name() {
        assert_eq!(tag_name(0x7D, TagContext::Toolkit), "Unknown Tag 7D");
        assert_eq!(tag_name(0x9F70, TagContext::FileControl), "Unknown Tag 9F70");
    }

    #[test]
    fn test_containers() {
        for tag in [0x62, 0x64, 0x6F, 0xA5, 0xD0, 0xD3, 0xD7] {
            assert!(is_container(tag), "{:02X}", tag);
        }
        assert!(!is_container(0x81));
        assert_eq!(child_context(0x62, TagContext::Toolkit), TagContext::FileControl);
        assert_eq!(child_context(0xD0, TagContext::FileControl), TagContext::Toolkit);
    }

    #[test]
    fn test_command_names() {
        assert_eq!(proactive_command_name(0x40), "OPEN CHANNEL");
        assert_eq!(proactive_command_name(0x43), "SEND DATA");
        assert_eq!(proactive_command_name(0x99), "UNKNOWN (0x99)");
        assert_eq!(device_name(0x21), "Channel 1");
        assert_eq!(device_name(0x82), "Terminal");
    }
}

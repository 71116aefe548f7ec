//! Instruction and proactive-command tables

use std::fmt;

use serde::Serialize;

/// UICC instruction bytes (ETSI TS 102 221)
pub mod ins {
    pub const SELECT: u8 = 0xA4;
    pub const STATUS: u8 = 0xF2;
    pub const READ_BINARY: u8 = 0xB0;
    pub const UPDATE_BINARY: u8 = 0xD6;
    pub const READ_RECORD: u8 = 0xB2;
    pub const UPDATE_RECORD: u8 = 0xDC;
    pub const SEARCH_RECORD: u8 = 0xA2;
    pub const INCREASE: u8 = 0x32;
    pub const RETRIEVE_DATA: u8 = 0xCB;
    pub const SET_DATA: u8 = 0xDB;
    pub const GET_DATA: u8 = 0xCA;
    pub const DEACTIVATE_FILE: u8 = 0x04;
    pub const ACTIVATE_FILE: u8 = 0x44;
    pub const VERIFY: u8 = 0x20;
    pub const CHANGE_PIN: u8 = 0x24;
    pub const DISABLE_PIN: u8 = 0x26;
    pub const ENABLE_PIN: u8 = 0x28;
    pub const UNBLOCK_PIN: u8 = 0x2C;
    pub const AUTHENTICATE: u8 = 0x88;
    pub const AUTHENTICATE_ODD: u8 = 0x89;
    pub const GET_CHALLENGE: u8 = 0x84;
    pub const MANAGE_CHANNEL: u8 = 0x70;
    pub const MANAGE_SECURE_CHANNEL: u8 = 0x73;
    pub const TRANSACT_DATA: u8 = 0x75;
    pub const GET_RESPONSE: u8 = 0xC0;
    pub const SUSPEND_UICC: u8 = 0x76;
    pub const TERMINAL_PROFILE: u8 = 0x10;
    pub const ENVELOPE: u8 = 0xC2;
    pub const FETCH: u8 = 0x12;
    pub const TERMINAL_RESPONSE: u8 = 0x14;
}

/// Proactive command type codes used by the Bearer Independent Protocol
pub mod cmd {
    pub const OPEN_CHANNEL: u8 = 0x40;
    pub const CLOSE_CHANNEL: u8 = 0x41;
    pub const RECEIVE_DATA: u8 = 0x42;
    pub const SEND_DATA: u8 = 0x43;
    pub const GET_CHANNEL_STATUS: u8 = 0x44;
}

/// Simple-TLV tag numbers (CR bit cleared)
pub mod tag {
    pub const COMMAND_DETAILS: u8 = 0x01;
    pub const DEVICE_IDENTITIES: u8 = 0x02;
    pub const RESULT: u8 = 0x03;
    pub const EVENT_LIST: u8 = 0x19;
    pub const BEARER_DESCRIPTION: u8 = 0x35;
    pub const CHANNEL_DATA: u8 = 0x36;
    pub const CHANNEL_DATA_LENGTH: u8 = 0x37;
    pub const CHANNEL_STATUS: u8 = 0x38;
    pub const BUFFER_SIZE: u8 = 0x39;
}

/// Functional area an APDU belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Domain {
    #[serde(rename = "Bearer Independent Protocol")]
    BearerIndependentProtocol,
    #[serde(rename = "SIM Toolkit")]
    SimToolkit,
    #[serde(rename = "SIM Toolkit Response")]
    SimToolkitResponse,
    #[serde(rename = "File Management")]
    FileManagement,
    Security,
    Authentication,
    #[serde(rename = "Logical Channel")]
    LogicalChannel,
    Transport,
    Unknown,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Domain::BearerIndependentProtocol => "Bearer Independent Protocol",
            Domain::SimToolkit => "SIM Toolkit",
            Domain::SimToolkitResponse => "SIM Toolkit Response",
            Domain::FileManagement => "File Management",
            Domain::Security => "Security",
            Domain::Authentication => "Authentication",
            Domain::LogicalChannel => "Logical Channel",
            Domain::Transport => "Transport",
            Domain::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Instruction name
pub fn instruction_name(code: u8) -> Option<&'static str> {
    let name = match code {
        ins::SELECT => "SELECT",
        ins::STATUS => "STATUS",
        ins::READ_BINARY => "READ BINARY",
        ins::UPDATE_BINARY => "UPDATE BINARY",
        ins::READ_RECORD => "READ RECORD",
        ins::UPDATE_RECORD => "UPDATE RECORD",
        ins::SEARCH_RECORD => "SEARCH RECORD",
        ins::INCREASE => "INCREASE",
        ins::RETRIEVE_DATA => "RETRIEVE DATA",
        ins::SET_DATA => "SET DATA",
        ins::GET_DATA => "GET DATA",
        ins::DEACTIVATE_FILE => "DEACTIVATE FILE",
        ins::ACTIVATE_FILE => "ACTIVATE FILE",
        ins::VERIFY => "VERIFY PIN",
        ins::CHANGE_PIN => "CHANGE PIN",
        ins::DISABLE_PIN => "DISABLE PIN",
        ins::ENABLE_PIN => "ENABLE PIN",
        ins::UNBLOCK_PIN => "UNBLOCK PIN",
        ins::AUTHENTICATE | ins::AUTHENTICATE_ODD => "AUTHENTICATE",
        ins::GET_CHALLENGE => "GET CHALLENGE",
        ins::MANAGE_CHANNEL => "MANAGE CHANNEL",
        ins::MANAGE_SECURE_CHANNEL => "MANAGE SECURE CHANNEL",
        ins::TRANSACT_DATA => "TRANSACT DATA",
        ins::GET_RESPONSE => "GET RESPONSE",
        ins::SUSPEND_UICC => "SUSPEND UICC",
        ins::TERMINAL_PROFILE => "TERMINAL PROFILE",
        ins::ENVELOPE => "ENVELOPE",
        ins::FETCH => "FETCH",
        ins::TERMINAL_RESPONSE => "TERMINAL RESPONSE",
        _ => return None,
    };
    Some(name)
}

/// Domain implied by the instruction alone
pub fn instruction_domain(code: u8) -> Domain {
    match code {
        ins::SELECT
        | ins::STATUS
        | ins::READ_BINARY
        | ins::UPDATE_BINARY
        | ins::READ_RECORD
        | ins::UPDATE_RECORD
        | ins::SEARCH_RECORD
        | ins::INCREASE
        | ins::RETRIEVE_DATA
        | ins::SET_DATA
        | ins::GET_DATA
        | ins::DEACTIVATE_FILE
        | ins::ACTIVATE_FILE => Domain::FileManagement,
        ins::VERIFY | ins::CHANGE_PIN | ins::DISABLE_PIN | ins::ENABLE_PIN | ins::UNBLOCK_PIN => {
            Domain::Security
        }
        ins::AUTHENTICATE | ins::AUTHENTICATE_ODD | ins::GET_CHALLENGE => Domain::Authentication,
        ins::MANAGE_CHANNEL | ins::MANAGE_SECURE_CHANNEL | ins::TRANSACT_DATA => Domain::LogicalChannel,
        ins::GET_RESPONSE | ins::SUSPEND_UICC => Domain::Transport,
        ins::TERMINAL_RESPONSE => Domain::SimToolkitResponse,
        ins::FETCH | ins::ENVELOPE | ins::TERMINAL_PROFILE => Domain::SimToolkit,
        _ => Domain::Unknown,
    }
}

/// Instructions whose command data is a toolkit TLV list
pub fn carries_toolkit_tlv(code: u8) -> bool {
    matches!(code, ins::TERMINAL_RESPONSE | ins::ENVELOPE)
}

pub fn is_bip_command(command_type: u8) -> bool {
    (cmd::OPEN_CHANNEL..=cmd::GET_CHANNEL_STATUS).contains(&command_type)
}

/// Top-level tags a proactive command of this type must carry
pub fn proactive_mandatory_tags(command_type: u8) -> Vec<u8> {
    let mut required = vec![tag::COMMAND_DETAILS, tag::DEVICE_IDENTITIES];
    match command_type {
        cmd::OPEN_CHANNEL => required.extend([tag::BEARER_DESCRIPTION, tag::BUFFER_SIZE]),
        cmd::SEND_DATA => required.push(tag::CHANNEL_DATA),
        cmd::RECEIVE_DATA => required.push(tag::CHANNEL_DATA_LENGTH),
        _ => {}
    }
    required
}

pub const TERMINAL_RESPONSE_MANDATORY: [u8; 3] = [tag::COMMAND_DETAILS, tag::DEVICE_IDENTITIES, tag::RESULT];

pub const EVENT_DOWNLOAD_MANDATORY: [u8; 2] = [tag::EVENT_LIST, tag::DEVICE_IDENTITIES];

/// Events that concern an open BIP channel
pub fn is_bip_event(event: u8) -> bool {
    matches!(event, 0x09 | 0x0A)
}

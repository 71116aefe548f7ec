//! Status Word (SW) constants for APDU responses
//!
//! ISO 7816-4 and ETSI TS 102 221 status words, with human-readable
//! descriptions for trace output.

/// Status Word constants
pub struct SW;

impl SW {
    // Normal processing
    pub const SUCCESS: u16 = 0x9000;
    pub const TOOLKIT_BUSY: u16 = 0x9300;

    // Warnings (62xx, 63xx)
    pub const WARNING_NO_CHANGE: u16 = 0x6200;
    pub const WARNING_CORRUPTED: u16 = 0x6281;
    pub const WARNING_EOF: u16 = 0x6282;
    pub const WARNING_SELECTED_FILE_INVALIDATED: u16 = 0x6283;
    pub const WARNING_FCI_INVALID: u16 = 0x6284;
    pub const WARNING_MORE_DATA: u16 = 0x62F1;

    // Execution errors (64xx, 65xx)
    pub const EXEC_ERROR: u16 = 0x6400;
    pub const MEMORY_FAILURE: u16 = 0x6581;

    // Checking errors
    pub const WRONG_LENGTH: u16 = 0x6700;
    pub const LOGICAL_CHANNEL_NOT_SUPPORTED: u16 = 0x6881;
    pub const SECURE_MESSAGING_NOT_SUPPORTED: u16 = 0x6882;
    pub const COMMAND_INCOMPATIBLE: u16 = 0x6981;
    pub const SECURITY_STATUS_NOT_SATISFIED: u16 = 0x6982;
    pub const AUTH_METHOD_BLOCKED: u16 = 0x6983;
    pub const REFERENCE_DATA_INVALIDATED: u16 = 0x6984;
    pub const CONDITIONS_NOT_SATISFIED: u16 = 0x6985;
    pub const COMMAND_NOT_ALLOWED_NO_EF: u16 = 0x6986;
    pub const WRONG_DATA: u16 = 0x6A80;
    pub const FUNCTION_NOT_SUPPORTED: u16 = 0x6A81;
    pub const FILE_NOT_FOUND: u16 = 0x6A82;
    pub const RECORD_NOT_FOUND: u16 = 0x6A83;
    pub const NOT_ENOUGH_MEMORY: u16 = 0x6A84;
    pub const INCORRECT_P1_P2: u16 = 0x6A86;
    pub const REFERENCED_DATA_NOT_FOUND: u16 = 0x6A88;
    pub const WRONG_P1_P2: u16 = 0x6B00;
    pub const INS_NOT_SUPPORTED: u16 = 0x6D00;
    pub const CLA_NOT_SUPPORTED: u16 = 0x6E00;
    pub const UNKNOWN_ERROR: u16 = 0x6F00;

    /// "More data available" status word (61xx)
    #[inline]
    pub fn bytes_remaining(remaining: u8) -> u16 {
        0x6100 | (remaining as u16)
    }

    /// "Proactive command pending" status word (91xx)
    #[inline]
    pub fn proactive_pending(length: u8) -> u16 {
        0x9100 | (length as u16)
    }

    /// Normal ending: 9000, 91xx or 61xx
    #[inline]
    pub fn is_success(sw: u16) -> bool {
        sw == Self::SUCCESS || matches!(sw >> 8, 0x91 | 0x61)
    }

    /// Length of a pending proactive command (91xx)
    #[inline]
    pub fn pending_proactive_len(sw: u16) -> Option<u8> {
        if (sw & 0xFF00) == 0x9100 {
            Some(sw as u8)
        } else {
            None
        }
    }

    /// Check if a status word is a counter warning (63Cx)
    #[inline]
    pub fn is_counter_warning(sw: u16) -> bool {
        (sw & 0xFFF0) == 0x63C0
    }

    /// Extract retry count from counter warning (63Cx)
    #[inline]
    pub fn get_retry_count(sw: u16) -> Option<u8> {
        if Self::is_counter_warning(sw) {
            Some((sw & 0x0F) as u8)
        } else {
            None
        }
    }
}

/// Whether SW1 SW2 look like a status word a UICC would return
pub fn is_plausible(sw1: u8, sw2: u8) -> bool {
    match sw1 {
        0x90 => sw2 == 0x00,
        0x61..=0x6F | 0x91 | 0x92 | 0x93 | 0x98 | 0x9E | 0x9F => true,
        _ => false,
    }
}

/// Human-readable meaning of a status word
pub fn describe(sw: u16) -> String {
    let sw1 = (sw >> 8) as u8;
    let sw2 = sw as u8;
    let fixed = match sw {
        SW::SUCCESS => Some("Normal ending of the command"),
        SW::TOOLKIT_BUSY => Some("SIM Application Toolkit is busy"),
        SW::WARNING_NO_CHANGE => Some("Warning: no information given, state unchanged"),
        SW::WARNING_CORRUPTED => Some("Warning: part of returned data may be corrupted"),
        SW::WARNING_EOF => Some("Warning: end of file reached before reading Le bytes"),
        SW::WARNING_SELECTED_FILE_INVALIDATED => Some("Warning: selected file invalidated"),
        SW::WARNING_FCI_INVALID => Some("Warning: FCI not formatted correctly"),
        SW::WARNING_MORE_DATA => Some("Warning: more data available"),
        SW::EXEC_ERROR => Some("Execution error: state unchanged"),
        SW::MEMORY_FAILURE => Some("Execution error: memory problem"),
        SW::WRONG_LENGTH => Some("Wrong length"),
        SW::LOGICAL_CHANNEL_NOT_SUPPORTED => Some("Logical channel not supported"),
        SW::SECURE_MESSAGING_NOT_SUPPORTED => Some("Secure messaging not supported"),
        SW::COMMAND_INCOMPATIBLE => Some("Command incompatible with file structure"),
        SW::SECURITY_STATUS_NOT_SATISFIED => Some("Security status not satisfied"),
        SW::AUTH_METHOD_BLOCKED => Some("Authentication/PIN method blocked"),
        SW::REFERENCE_DATA_INVALIDATED => Some("Referenced data invalidated"),
        SW::CONDITIONS_NOT_SATISFIED => Some("Conditions of use not satisfied"),
        SW::COMMAND_NOT_ALLOWED_NO_EF => Some("Command not allowed (no EF selected)"),
        SW::WRONG_DATA => Some("Incorrect parameters in the data field"),
        SW::FUNCTION_NOT_SUPPORTED => Some("Function not supported"),
        SW::FILE_NOT_FOUND => Some("File or application not found"),
        SW::RECORD_NOT_FOUND => Some("Record not found"),
        SW::NOT_ENOUGH_MEMORY => Some("Not enough memory space in the file"),
        SW::INCORRECT_P1_P2 => Some("Incorrect parameters P1-P2"),
        SW::REFERENCED_DATA_NOT_FOUND => Some("Referenced data not found"),
        SW::WRONG_P1_P2 => Some("Wrong parameters P1-P2"),
        SW::INS_NOT_SUPPORTED => Some("Instruction code not supported or invalid"),
        SW::CLA_NOT_SUPPORTED => Some("Class not supported"),
        SW::UNKNOWN_ERROR => Some("Technical problem, no precise diagnosis"),
        _ => None,
    };
    if let Some(text) = fixed {
        return text.to_string();
    }
    match sw1 {
        0x91 => format!("Normal ending, proactive command pending ({} bytes)", sw2),
        0x92 => format!("Normal ending, extra information from the proactive UICC (0x{:02X})", sw2),
        0x61 => format!("Normal ending, {} response bytes available", sw2),
        0x6C => format!("Wrong Le, exact length is {}", sw2),
        0x63 if sw2 & 0xF0 == 0xC0 => format!("Verification failed, {} retries left", sw2 & 0x0F),
        0x98 => format!("Security management error (0x{:04X})", sw),
        0x9E | 0x9F => format!("Response data available ({} bytes)", sw2),
        0x62 | 0x63 => format!("Warning (0x{:04X})", sw),
        0x64 | 0x65 => format!("Execution error (0x{:04X})", sw),
        0x67..=0x6F => format!("Checking error (0x{:04X})", sw),
        _ => format!("Unknown status 0x{:04X}", sw),
    }
}

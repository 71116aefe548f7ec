//! APDU Response handling
//!
//! A response is the data field followed by the SW1 SW2 trailer.

use super::status::{self, SW};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response data (without status words)
    pub data: Vec<u8>,
    pub sw1: u8,
    pub sw2: u8,
}

impl Response {
    pub fn new(data: Vec<u8>, sw: u16) -> Self {
        Self {
            data,
            sw1: (sw >> 8) as u8,
            sw2: sw as u8,
        }
    }

    /// Success response (0x9000) with data
    pub fn success(data: Vec<u8>) -> Self {
        Self::new(data, SW::SUCCESS)
    }

    /// Split a raw response into data and status trailer
    ///
    /// Returns `None` unless the buffer ends in a plausible status word.
    pub fn split(raw: &[u8]) -> Option<Self> {
        let [data @ .., sw1, sw2] = raw else {
            return None;
        };
        if !status::is_plausible(*sw1, *sw2) {
            return None;
        }
        Some(Self {
            data: data.to_vec(),
            sw1: *sw1,
            sw2: *sw2,
        })
    }

    /// Check if the response is a normal ending (9000, 91xx or 61xx)
    pub fn is_okay(&self) -> bool {
        SW::is_success(self.sw())
    }

    pub fn sw(&self) -> u16 {
        ((self.sw1 as u16) << 8) | (self.sw2 as u16)
    }

    /// Returns Some(bytes) if SW1=0x61
    pub fn available_response(&self) -> Option<u8> {
        if self.sw1 == 0x61 {
            Some(self.sw2)
        } else {
            None
        }
    }

    /// Returns Some(length) if a proactive command is waiting to be fetched
    pub fn pending_proactive(&self) -> Option<u8> {
        SW::pending_proactive_len(self.sw())
    }

    /// Raw bytes (data + SW1 + SW2)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.data.len() + 2);
        result.extend_from_slice(&self.data);
        result.push(self.sw1);
        result.push(self.sw2);
        result
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_success() {
        let resp = Response::split(&[0xDE, 0xAD, 0xBE, 0xEF, 0x90, 0x00]).unwrap();
        assert!(resp.is_okay());
        assert_eq!(resp.sw(), 0x9000);
        assert_eq!(resp.data, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(resp.to_bytes(), vec![0xDE, 0xAD, 0xBE, 0xEF, 0x90, 0x00]);
    }

    #[test]
    fn test_split_rejects_implausible_trailer() {
        assert!(Response::split(&[0x01, 0x02, 0x03]).is_none());
        assert!(Response::split(&[0x90]).is_none());
    }

    #[test]
    fn test_status_only() {
        let resp = Response::split(&[0x91, 0x1B]).unwrap();
        assert!(resp.is_empty());
        assert_eq!(resp.pending_proactive(), Some(0x1B));
        assert_eq!(resp.available_response(), None);
    }

    #[test]
    fn test_more_data() {
        let resp = Response::new(vec![0xAB], SW::bytes_remaining(16));
        assert!(resp.is_okay());
        assert_eq!(resp.available_response(), Some(16));
    }

    #[test]
    fn test_error_response() {
        let resp = Response::new(Vec::new(), SW::SECURITY_STATUS_NOT_SATISFIED);
        assert!(!resp.is_okay());
        assert_eq!(resp.to_bytes(), vec![0x69, 0x82]);
    }
}

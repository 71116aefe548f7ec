//! Raw DER certificate recovery
//!
//! When no Certificate message could be assembled (missing records, a
//! desynchronised stream) the certificates are often still present in the
//! handshake bytes. The scanner looks for long-form DER SEQUENCE headers and
//! tries each candidate as a certificate.

use std::collections::HashSet;

use log::debug;

use super::{decode, CertificateInfo, CertificateSource};

/// Stateful scanner remembering the signature fingerprints it has returned
#[derive(Debug, Default)]
pub struct CertificateScanner {
    min_len: usize,
    seen: HashSet<String>,
}

impl CertificateScanner {
    pub fn new(min_len: usize) -> Self {
        Self {
            min_len,
            seen: HashSet::new(),
        }
    }

    /// Mark a certificate as already known so scans skip it
    pub fn remember(&mut self, info: &CertificateInfo) {
        self.seen.insert(info.signature_fingerprint.clone());
    }

    /// Scan `data` for certificates not returned before
    pub fn scan(&mut self, data: &[u8]) -> Vec<CertificateInfo> {
        let mut found = Vec::new();
        let mut offset = 0;
        while offset + 4 <= data.len() {
            let Some(total) = der_sequence_len(&data[offset..]) else {
                offset += 1;
                continue;
            };
            if total < self.min_len || offset + total > data.len() {
                offset += 1;
                continue;
            }
            match decode(&data[offset..offset + total], CertificateSource::Scan) {
                Ok(info) => {
                    debug!("Recovered certificate at offset {} ({} bytes)", offset, total);
                    if self.seen.insert(info.signature_fingerprint.clone()) {
                        found.push(info);
                    }
                    offset += total;
                }
                Err(_) => offset += 1,
            }
        }
        found
    }
}

/// Total length (header included) of a `30 82`/`30 83` SEQUENCE at the start
fn der_sequence_len(data: &[u8]) -> Option<usize> {
    if data.first() != Some(&0x30) {
        return None;
    }
    match *data.get(1)? {
        0x82 => {
            let len = u16::from_be_bytes([*data.get(2)?, *data.get(3)?]) as usize;
            Some(4 + len)
        }
        0x83 => {
            let b = data.get(2..5)?;
            let len = ((b[0] as usize) << 16) | ((b[1] as usize) << 8) | b[2] as usize;
            Some(5 + len)
        }
        _ => None,
    }
}

/// One-shot scan with a fresh fingerprint set
pub fn scan_certificates(data: &[u8], min_len: usize) -> Vec<CertificateInfo> {
    CertificateScanner::new(min_len).scan(data)
}

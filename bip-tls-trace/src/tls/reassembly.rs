//! TLS record reassembly
//!
//! Channel payloads rarely line up with record boundaries: one SEND DATA may
//! carry half a header, the next the rest of the record plus the start of
//! another. The reassembler keeps one owned buffer per direction and emits a
//! record only once its declared length is fully present.

use log::{debug, warn};
use serde::Serialize;

use super::names;
use crate::direction::Direction;

/// Record header size: type, version, length
pub const HEADER_LEN: usize = 5;

/// Largest fragment length accepted in a header (2^14 plus expansion slack)
pub const MAX_RECORD_LEN: usize = (1 << 14) + 2048;

/// Bytes kept when no header is found, since a header may straddle feeds
const MAX_PARTIAL_HEADER: usize = HEADER_LEN - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    ChangeCipherSpec,
    Alert,
    Handshake,
    ApplicationData,
    Heartbeat,
}

impl ContentType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x14 => Some(ContentType::ChangeCipherSpec),
            0x15 => Some(ContentType::Alert),
            0x16 => Some(ContentType::Handshake),
            0x17 => Some(ContentType::ApplicationData),
            0x18 => Some(ContentType::Heartbeat),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ContentType::ChangeCipherSpec => 0x14,
            ContentType::Alert => 0x15,
            ContentType::Handshake => 0x16,
            ContentType::ApplicationData => 0x17,
            ContentType::Heartbeat => 0x18,
        }
    }

    pub fn name(self) -> &'static str {
        names::content_type_name(self.to_byte())
    }
}

/// A complete TLS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TlsRecord {
    /// Global order in which records completed, across both directions
    pub completion_sequence: u64,
    pub direction: Direction,
    pub record_type: ContentType,
    pub version: u16,
    /// Header plus fragment
    #[serde(with = "crate::base64_bytes")]
    pub raw: Vec<u8>,
    /// Caller-supplied position of the chunk that completed the record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_position: Option<u64>,
}

impl TlsRecord {
    pub fn fragment(&self) -> &[u8] {
        &self.raw[HEADER_LEN..]
    }

    pub fn fragment_len(&self) -> usize {
        self.raw.len() - HEADER_LEN
    }
}

/// Per-direction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DirectionStats {
    pub bytes_fed: usize,
    pub records: usize,
    /// Bytes discarded while looking for a record header
    pub noise_bytes: usize,
    /// Times the buffer exceeded its cap and was cleared
    pub overflows: usize,
    /// Bytes still buffered, waiting for the rest of a record
    pub pending_bytes: usize,
}

#[derive(Debug, Default)]
struct StreamBuffer {
    data: Vec<u8>,
    stats: DirectionStats,
}

/// Whether `data` starts with a plausible record header, returning the
/// fragment length
fn header_at(data: &[u8]) -> Option<usize> {
    if data.len() < HEADER_LEN {
        return None;
    }
    ContentType::from_byte(data[0])?;
    if data[1] != 0x03 || data[2] > 0x04 {
        return None;
    }
    let len = u16::from_be_bytes([data[3], data[4]]) as usize;
    (len <= MAX_RECORD_LEN).then_some(len)
}

/// Offset of the first plausible record header
fn find_header(data: &[u8]) -> Option<usize> {
    (0..data.len().saturating_sub(MAX_PARTIAL_HEADER)).find(|&i| header_at(&data[i..]).is_some())
}

/// Two-direction record reassembler
#[derive(Debug)]
pub struct RecordReassembler {
    max_buffer_bytes: usize,
    buffers: [StreamBuffer; 2],
    records: Vec<TlsRecord>,
    next_sequence: u64,
    warnings: Vec<String>,
}

impl Default for RecordReassembler {
    fn default() -> Self {
        Self::new(crate::config::AnalyzerConfig::default().max_buffer_bytes)
    }
}

impl RecordReassembler {
    pub fn new(max_buffer_bytes: usize) -> Self {
        Self {
            max_buffer_bytes,
            buffers: Default::default(),
            records: Vec::new(),
            next_sequence: 0,
            warnings: Vec::new(),
        }
    }

    /// Append bytes for `direction` and extract every record now complete
    ///
    /// Returns the number of records this call produced.
    pub fn feed(&mut self, direction: Direction, bytes: &[u8]) -> usize {
        self.feed_inner(direction, None, bytes)
    }

    /// Like [`feed`](Self::feed), tagging produced records with `position`
    pub fn feed_at(&mut self, direction: Direction, position: u64, bytes: &[u8]) -> usize {
        self.feed_inner(direction, Some(position), bytes)
    }

    fn feed_inner(&mut self, direction: Direction, position: Option<u64>, bytes: &[u8]) -> usize {
        let buffer = &mut self.buffers[direction.index()];
        buffer.data.extend_from_slice(bytes);
        buffer.stats.bytes_fed += bytes.len();

        let before = self.records.len();
        self.extract(direction, position);
        let produced = self.records.len() - before;

        let buffer = &mut self.buffers[direction.index()];
        if buffer.data.len() > self.max_buffer_bytes {
            let message = format!(
                "{} reassembly buffer exceeded {} bytes; {} bytes dropped",
                direction,
                self.max_buffer_bytes,
                buffer.data.len()
            );
            warn!("{}", message);
            self.warnings.push(message);
            buffer.data.clear();
            buffer.stats.overflows += 1;
        }
        buffer.stats.pending_bytes = buffer.data.len();
        produced
    }

    fn extract(&mut self, direction: Direction, position: Option<u64>) {
        loop {
            let buffer = &mut self.buffers[direction.index()];
            let Some(offset) = find_header(&buffer.data) else {
                let excess = buffer.data.len().saturating_sub(MAX_PARTIAL_HEADER);
                if excess > 0 {
                    discard_noise(buffer, direction, excess);
                }
                return;
            };
            if offset > 0 {
                discard_noise(buffer, direction, offset);
            }

            let Some(len) = header_at(&buffer.data) else {
                return;
            };
            if buffer.data.len() < HEADER_LEN + len {
                return;
            }

            let raw: Vec<u8> = buffer.data.drain(..HEADER_LEN + len).collect();
            buffer.stats.records += 1;
            let Some(record_type) = ContentType::from_byte(raw[0]) else {
                return;
            };
            let record = TlsRecord {
                completion_sequence: self.next_sequence,
                direction,
                record_type,
                version: u16::from_be_bytes([raw[1], raw[2]]),
                raw,
                source_position: position,
            };
            debug!(
                "Record #{} {} {} ({} bytes)",
                record.completion_sequence,
                direction,
                record_type.name(),
                len
            );
            self.next_sequence += 1;
            self.records.push(record);
        }
    }

    /// Completed records in completion order
    pub fn records(&self) -> &[TlsRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TlsRecord> {
        self.records
    }

    pub fn stats(&self, direction: Direction) -> DirectionStats {
        self.buffers[direction.index()].stats
    }

    /// Bytes buffered for `direction` that do not yet form a record
    pub fn pending(&self, direction: Direction) -> &[u8] {
        &self.buffers[direction.index()].data
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

fn discard_noise(buffer: &mut StreamBuffer, direction: Direction, count: usize) {
    warn!("Discarding {} bytes of non-record data ({})", count, direction);
    buffer.data.drain(..count);
    buffer.stats.noise_bytes += count;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content_type: u8, body: &[u8]) -> Vec<u8> {
        let mut raw = vec![content_type, 0x03, 0x03];
        raw.extend_from_slice(&(body.len() as u16).to_be_bytes());
        raw.extend_from_slice(body);
        raw
    }

    #[test]
    fn test_record_split_over_three_feeds() {
        let raw = record(0x16, &[0xAA; 20]);
        let mut reassembler = RecordReassembler::default();

        assert_eq!(reassembler.feed(Direction::SimToMe, &raw[..3]), 0);
        assert_eq!(reassembler.feed(Direction::SimToMe, &raw[3..10]), 0);
        assert!(reassembler.records().is_empty());
        assert_eq!(reassembler.feed(Direction::SimToMe, &raw[10..]), 1);

        let records = reassembler.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw, raw);
        assert_eq!(records[0].record_type, ContentType::Handshake);
        assert_eq!(records[0].version, 0x0303);
        assert_eq!(records[0].fragment_len(), 20);
    }

    #[test]
    fn test_cross_direction_order_follows_feeds() {
        let client = record(0x16, &[1; 8]);
        let server = record(0x16, &[2; 8]);
        let mut reassembler = RecordReassembler::default();

        reassembler.feed(Direction::SimToMe, &client[..6]);
        reassembler.feed(Direction::MeToSim, &server);
        reassembler.feed(Direction::SimToMe, &client[6..]);

        let records = reassembler.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].direction, Direction::MeToSim);
        assert_eq!(records[0].completion_sequence, 0);
        assert_eq!(records[1].direction, Direction::SimToMe);
        assert_eq!(records[1].completion_sequence, 1);
    }

    #[test]
    fn test_several_records_in_one_feed() {
        let mut data = record(0x16, &[0; 4]);
        data.extend(record(0x14, &[1]));
        data.extend(record(0x17, &[9; 3]));
        let mut reassembler = RecordReassembler::default();

        assert_eq!(reassembler.feed(Direction::MeToSim, &data), 3);
        let types: Vec<_> = reassembler.records().iter().map(|r| r.record_type).collect();
        assert_eq!(
            types,
            vec![ContentType::Handshake, ContentType::ChangeCipherSpec, ContentType::ApplicationData]
        );
        assert!(reassembler.pending(Direction::MeToSim).is_empty());
    }

    #[test]
    fn test_leading_noise_is_skipped() {
        let mut data = vec![0x00, 0x42, 0x99];
        data.extend(record(0x15, &[0x02, 0x28]));
        let mut reassembler = RecordReassembler::default();

        assert_eq!(reassembler.feed(Direction::MeToSim, &data), 1);
        assert_eq!(reassembler.stats(Direction::MeToSim).noise_bytes, 3);
        assert_eq!(reassembler.records()[0].fragment(), &[0x02, 0x28]);
    }

    #[test]
    fn test_no_header_keeps_trailing_bytes() {
        let mut reassembler = RecordReassembler::default();
        reassembler.feed(Direction::SimToMe, &[0x01, 0x02, 0x03, 0x04, 0x05, 0x16, 0x03]);
        assert_eq!(reassembler.pending(Direction::SimToMe), &[0x04, 0x05, 0x16, 0x03]);
        assert_eq!(reassembler.stats(Direction::SimToMe).noise_bytes, 3);

        reassembler.feed(Direction::SimToMe, &[0x03, 0x00, 0x01, 0xFF]);
        assert_eq!(reassembler.records().len(), 1);
        assert_eq!(reassembler.records()[0].fragment(), &[0xFF]);
    }

    #[test]
    fn test_implausible_headers_are_rejected() {
        assert!(header_at(&[0x16, 0x02, 0x00, 0x00, 0x01]).is_none());
        assert!(header_at(&[0x16, 0x03, 0x05, 0x00, 0x01]).is_none());
        assert!(header_at(&[0x19, 0x03, 0x03, 0x00, 0x01]).is_none());
        assert!(header_at(&[0x17, 0x03, 0x03, 0x48, 0x01]).is_none());
        assert_eq!(header_at(&[0x17, 0x03, 0x03, 0x48, 0x00]), Some(MAX_RECORD_LEN));
    }

    #[test]
    fn test_partial_tail_never_emitted() {
        let raw = record(0x17, &[7; 100]);
        let mut reassembler = RecordReassembler::default();
        reassembler.feed(Direction::MeToSim, &raw[..50]);
        assert!(reassembler.records().is_empty());
        assert_eq!(reassembler.stats(Direction::MeToSim).pending_bytes, 50);
    }

    #[test]
    fn test_buffer_cap_clears_and_warns() {
        let raw = record(0x17, &[7; 100]);
        let mut reassembler = RecordReassembler::new(64);
        reassembler.feed(Direction::MeToSim, &raw[..80]);

        assert!(reassembler.pending(Direction::MeToSim).is_empty());
        assert_eq!(reassembler.stats(Direction::MeToSim).overflows, 1);
        assert_eq!(reassembler.warnings().len(), 1);
    }

    #[test]
    fn test_feed_at_records_position() {
        let raw = record(0x16, &[0; 2]);
        let mut reassembler = RecordReassembler::default();
        reassembler.feed_at(Direction::SimToMe, 41, &raw[..4]);
        reassembler.feed_at(Direction::SimToMe, 42, &raw[4..]);
        assert_eq!(reassembler.records()[0].source_position, Some(42));
    }
}

//! Session analysis
//!
//! A [`SessionAnalyzer`] owns everything for one BIP channel session: feed it
//! channel payloads in trace order, then call [`SessionAnalyzer::finish`] to
//! get an immutable [`SessionReport`]. Analysis never fails on malformed
//! data; problems end up in the report's warnings.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::apdu::bip::{extract_channel_payload, extract_payloads, ChannelPayload};
use crate::apdu::APDURecord;
use crate::certificate::{CertificateInfo, CertificateScanner};
use crate::config::AnalyzerConfig;
use crate::direction::Direction;
use crate::evaluate::{self, CipherEvaluation};
use crate::timeline::{self, TimelineEvent};
use crate::tls::{
    ClientHello, DirectionStats, HandshakeAssembler, HandshakeBody, RecordReassembler, ServerHello,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Session contains no channel data")]
    EmptySession,
}

/// Headline facts about the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub sni: Option<String>,
    pub version: Option<String>,
    pub cipher: Option<String>,
    pub certificate_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordStats {
    pub chunks: usize,
    pub records: usize,
    /// Record count per content type name
    pub by_type: BTreeMap<&'static str, usize>,
    pub handshake_messages: usize,
    pub encrypted_handshakes: usize,
    pub sim_to_me: DirectionStats,
    pub me_to_sim: DirectionStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub summary: SessionSummary,
    pub timeline: Vec<TimelineEvent>,
    pub client_hello: Option<ClientHello>,
    pub server_hello: Option<ServerHello>,
    pub certificates: Vec<CertificateInfo>,
    pub evaluation: Option<CipherEvaluation>,
    pub stats: RecordStats,
    pub warnings: Vec<String>,
}

/// Per-session analyzer
#[derive(Debug)]
pub struct SessionAnalyzer {
    config: AnalyzerConfig,
    reassembler: RecordReassembler,
    chunks: usize,
    bytes: usize,
}

impl Default for SessionAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl SessionAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            reassembler: RecordReassembler::new(config.max_buffer_bytes),
            config,
            chunks: 0,
            bytes: 0,
        }
    }

    /// Feed one payload chunk taken at trace `position`
    ///
    /// Returns the number of TLS records the chunk completed.
    pub fn feed_chunk(&mut self, direction: Direction, position: u64, bytes: &[u8]) -> usize {
        self.chunks += 1;
        self.bytes += bytes.len();
        self.reassembler.feed_at(direction, position, bytes)
    }

    /// Feed a chunk without a trace position
    pub fn feed(&mut self, direction: Direction, bytes: &[u8]) -> usize {
        self.chunks += 1;
        self.bytes += bytes.len();
        self.reassembler.feed(direction, bytes)
    }

    pub fn feed_payload(&mut self, payload: &ChannelPayload, position: u64) -> usize {
        self.feed_chunk(payload.direction, position, &payload.data)
    }

    /// Feed every SEND DATA / RECEIVE DATA payload of a decoded APDU trace
    ///
    /// Positions are indexes into `records`.
    pub fn feed_apdus(&mut self, records: &[APDURecord]) -> usize {
        let mut produced = 0;
        for (position, record) in records.iter().enumerate() {
            if let Some(payload) = extract_channel_payload(record) {
                produced += self.feed_payload(&payload, position as u64);
            }
        }
        produced
    }

    /// Whether anything has been fed yet
    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    /// Assemble, decode and evaluate everything fed so far
    pub fn finish(self) -> SessionReport {
        let config = self.config;
        let reassembler = self.reassembler;
        let records = reassembler.records();
        let assembler = HandshakeAssembler::assemble_all(records, config.max_handshake_message_len);

        let mut warnings: Vec<String> = reassembler.warnings().to_vec();
        warnings.extend_from_slice(assembler.warnings());

        let mut client_hello: Option<ClientHello> = None;
        let mut server_hello: Option<ServerHello> = None;
        let mut certificates = Vec::new();
        let mut saw_certificate_message = false;
        for message in assembler.messages() {
            match &message.decoded {
                HandshakeBody::ClientHello(hello) if client_hello.is_none() => {
                    warnings.extend(hello.warnings.iter().cloned());
                    client_hello = Some(hello.clone());
                }
                HandshakeBody::ServerHello(hello) => {
                    warnings.extend(hello.warnings.iter().cloned());
                    let replace = server_hello.as_ref().map_or(true, |current| current.hello_retry_request);
                    if replace {
                        server_hello = Some(hello.clone());
                    }
                }
                HandshakeBody::Certificate(chain) => {
                    saw_certificate_message = true;
                    certificates.extend(chain.certificates.iter().cloned());
                    warnings.extend(chain.errors.iter().cloned());
                }
                HandshakeBody::Undecodable { reason } => {
                    warnings.push(format!("{} {} undecodable: {}", message.direction, message.name, reason));
                }
                _ => {}
            }
        }

        if !saw_certificate_message && config.certificate_scan_fallback {
            let mut scanner = CertificateScanner::new(config.min_der_certificate_len);
            for direction in [Direction::MeToSim, Direction::SimToMe] {
                let mut data = assembler.fragments(direction).to_vec();
                data.extend_from_slice(pending_fragment(reassembler.pending(direction)));
                let recovered = scanner.scan(&data);
                if !recovered.is_empty() {
                    debug!("Recovered {} certificates from {} handshake bytes", recovered.len(), direction);
                    warnings.push(format!(
                        "{} certificate(s) recovered by scanning {} handshake data",
                        recovered.len(),
                        direction
                    ));
                }
                certificates.extend(recovered);
            }
        }

        for direction in Direction::ALL {
            if assembler.has_partial(direction) {
                warnings.push(format!("{} handshake message incomplete at end of capture", direction));
            }
            let pending = reassembler.pending(direction).len();
            if pending > 0 {
                warnings.push(format!("{} {} bytes of incomplete record at end of capture", direction, pending));
            }
        }

        let evaluation = server_hello.as_ref().map(|hello| {
            evaluate::evaluate_session(&hello.cipher_suite.name, Some(hello.negotiated_version), &certificates)
        });

        let summary = SessionSummary {
            sni: client_hello.as_ref().and_then(|hello| hello.server_name.clone()),
            version: server_hello.as_ref().map(|hello| hello.negotiated_version_name.clone()),
            cipher: server_hello.as_ref().map(|hello| hello.cipher_suite.name.clone()),
            certificate_count: certificates.len(),
        };

        let mut by_type = BTreeMap::new();
        for record in records {
            *by_type.entry(record.record_type.name()).or_insert(0) += 1;
        }
        let stats = RecordStats {
            chunks: self.chunks,
            records: records.len(),
            by_type,
            handshake_messages: assembler.messages().len(),
            encrypted_handshakes: assembler.encrypted().len(),
            sim_to_me: reassembler.stats(Direction::SimToMe),
            me_to_sim: reassembler.stats(Direction::MeToSim),
        };

        let timeline = timeline::build(records, assembler.messages(), assembler.encrypted());

        info!(
            "Session analysed: {} records, {} handshake messages, {} certificates, {} warnings",
            stats.records,
            stats.handshake_messages,
            certificates.len(),
            warnings.len()
        );

        SessionReport {
            summary,
            timeline,
            client_hello,
            server_hello,
            certificates,
            evaluation,
            stats,
            warnings,
        }
    }
}

/// Analyze an ordered list of `(direction, payload)` chunks
pub fn analyze<'a, I>(chunks: I, config: &AnalyzerConfig) -> Result<SessionReport, AnalysisError>
where
    I: IntoIterator<Item = (Direction, &'a [u8])>,
{
    let mut analyzer = SessionAnalyzer::new(config.clone());
    for (position, (direction, bytes)) in chunks.into_iter().enumerate() {
        analyzer.feed_chunk(direction, position as u64, bytes);
    }
    if analyzer.is_empty() {
        return Err(AnalysisError::EmptySession);
    }
    Ok(analyzer.finish())
}

/// Analyze the BIP traffic of a decoded APDU trace
pub fn analyze_apdus(records: &[APDURecord], config: &AnalyzerConfig) -> Result<SessionReport, AnalysisError> {
    if extract_payloads(records).is_empty() {
        return Err(AnalysisError::EmptySession);
    }
    let mut analyzer = SessionAnalyzer::new(config.clone());
    analyzer.feed_apdus(records);
    Ok(analyzer.finish())
}

/// Fragment of the incomplete record left in a direction's buffer
///
/// A handshake record header is dropped so the bytes continue the
/// assembled fragments; anything else is scanned as it is.
fn pending_fragment(pending: &[u8]) -> &[u8] {
    match pending {
        [0x16, 0x03, _, _, _, fragment @ ..] => fragment,
        _ => pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apdu;
    use crate::certificate::tests::{CA_DER, LEAF_DER};
    use crate::certificate::CertificateSource;
    use crate::tls::handshake::msg;
    use crate::tls::handshake::tests::{certificate_body, handshake, record};
    use crate::tls::hello::tests::{client_hello_body, server_hello_body};
    use crate::tlv::TLVBuilder;

    /// Client and server streams of a TLS 1.2 ECDHE handshake
    fn tls12_streams() -> (Vec<u8>, Vec<u8>) {
        let mut client = record(0x16, &handshake(msg::CLIENT_HELLO, &client_hello_body("bip.example.net")));
        let mut server_flight = handshake(msg::SERVER_HELLO, &server_hello_body(0xC02F, &[]));
        server_flight.extend(handshake(msg::CERTIFICATE, &certificate_body(&[LEAF_DER, CA_DER])));
        server_flight.extend(handshake(msg::SERVER_KEY_EXCHANGE, &[0x03, 0x00, 0x17, 0x01, 0x04]));
        server_flight.extend(handshake(msg::SERVER_HELLO_DONE, &[]));
        let mut server = record(0x16, &server_flight);

        client.extend(record(0x16, &handshake(msg::CLIENT_KEY_EXCHANGE, &[0x01, 0x04])));
        client.extend(record(0x14, &[0x01]));
        client.extend(record(0x16, &[0x77; 40]));
        server.extend(record(0x14, &[0x01]));
        server.extend(record(0x16, &[0x66; 40]));
        (client, server)
    }

    #[test]
    fn test_full_session_in_small_chunks() {
        let (client, server) = tls12_streams();
        let mut analyzer = SessionAnalyzer::default();
        // ClientHello plus the first bytes of ClientKeyExchange
        let (first, rest) = client.split_at(130);
        analyzer.feed(Direction::SimToMe, first);
        for chunk in server.chunks(97) {
            analyzer.feed(Direction::MeToSim, chunk);
        }
        for chunk in rest.chunks(7) {
            analyzer.feed(Direction::SimToMe, chunk);
        }
        let report = analyzer.finish();

        assert_eq!(report.summary.sni.as_deref(), Some("bip.example.net"));
        assert_eq!(report.summary.version.as_deref(), Some("TLS 1.2"));
        assert_eq!(report.summary.cipher.as_deref(), Some("TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256"));
        assert_eq!(report.summary.certificate_count, 2);
        assert!(report.certificates.iter().all(|c| c.source == CertificateSource::Handshake));

        let evaluation = report.evaluation.as_ref().unwrap();
        assert!(evaluation.forward_secrecy && evaluation.uses_aead);
        assert!(evaluation.issues.is_empty());

        assert_eq!(report.stats.records, 7);
        assert_eq!(report.stats.by_type["Handshake"], 5);
        assert_eq!(report.stats.by_type["ChangeCipherSpec"], 2);
        assert_eq!(report.stats.encrypted_handshakes, 2);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);

        let labels: Vec<_> = report.timeline.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels[0], "ClientHello");
        assert_eq!(labels.iter().filter(|l| **l == "Encrypted Finished").count(), 2);
    }

    #[test]
    fn test_scan_fallback_when_certificate_message_is_lost() {
        let mut flight = handshake(msg::SERVER_HELLO, &server_hello_body(0x002F, &[]));
        let mut certificate = handshake(msg::CERTIFICATE, &certificate_body(&[LEAF_DER, CA_DER]));
        // Corrupt the message length so the assembler never completes it
        certificate[1] = 0x00;
        certificate[2] = 0xFF;
        certificate[3] = 0xFF;
        flight.extend(certificate);
        let server = record(0x16, &flight);

        let report = analyze([(Direction::MeToSim, server.as_slice())], &AnalyzerConfig::default()).unwrap();
        assert_eq!(report.certificates.len(), 2);
        assert!(report.certificates.iter().all(|c| c.source == CertificateSource::Scan));

        let mut fingerprints: Vec<_> = report.certificates.iter().map(|c| &c.signature_fingerprint).collect();
        fingerprints.dedup();
        assert_eq!(fingerprints.len(), 2);

        let evaluation = report.evaluation.unwrap();
        assert!(!evaluation.forward_secrecy);
        assert!(report.warnings.iter().any(|w| w.contains("recovered by scanning")));
        assert!(report.warnings.iter().any(|w| w.contains("incomplete at end of capture")));
    }

    #[test]
    fn test_scan_fallback_reads_incomplete_record() {
        let mut server = record(0x16, &handshake(msg::SERVER_HELLO, &server_hello_body(0xC02F, &[])));
        let mut certificate = record(0x16, &handshake(msg::CERTIFICATE, &certificate_body(&[LEAF_DER, CA_DER])));
        // capture ends inside the CA certificate
        certificate.truncate(certificate.len() - 100);
        server.extend(certificate);

        let report = analyze([(Direction::MeToSim, server.as_slice())], &AnalyzerConfig::default()).unwrap();
        assert_eq!(report.stats.records, 1);
        assert_eq!(report.certificates.len(), 1);
        let leaf = crate::certificate::decode(LEAF_DER, CertificateSource::Scan).unwrap();
        assert_eq!(report.certificates[0].signature_fingerprint, leaf.signature_fingerprint);
        assert_eq!(report.certificates[0].source, CertificateSource::Scan);
        assert!(report.warnings.iter().any(|w| w.contains("recovered by scanning")));
        assert!(report.warnings.iter().any(|w| w.contains("incomplete record at end of capture")));
    }

    #[test]
    fn test_pending_fragment_drops_record_header() {
        assert_eq!(pending_fragment(&[0x16, 0x03, 0x03, 0x10, 0x00, 0x0B, 0x00]), &[0x0B, 0x00]);
        assert_eq!(pending_fragment(&[0x17, 0x03, 0x03, 0x10]), &[0x17, 0x03, 0x03, 0x10]);
    }

    #[test]
    fn test_scan_fallback_can_be_disabled() {
        let mut certificate = handshake(msg::CERTIFICATE, &certificate_body(&[LEAF_DER]));
        certificate[1] = 0x01;
        let server = record(0x16, &certificate);
        let config = AnalyzerConfig {
            certificate_scan_fallback: false,
            ..AnalyzerConfig::default()
        };
        let report = analyze([(Direction::MeToSim, server.as_slice())], &config).unwrap();
        assert!(report.certificates.is_empty());
    }

    #[test]
    fn test_empty_session() {
        let chunks: Vec<(Direction, &[u8])> = Vec::new();
        assert_eq!(
            analyze(chunks, &AnalyzerConfig::default()).unwrap_err(),
            AnalysisError::EmptySession
        );
        assert_eq!(
            analyze_apdus(&[], &AnalyzerConfig::default()).unwrap_err(),
            AnalysisError::EmptySession
        );
    }

    #[test]
    fn test_garbage_session_reports_without_panicking() {
        let noise = [0x42u8; 64];
        let report = analyze([(Direction::SimToMe, &noise[..])], &AnalyzerConfig::default()).unwrap();
        assert_eq!(report.stats.records, 0);
        assert_eq!(report.stats.sim_to_me.noise_bytes, 60);
        assert!(report.summary.sni.is_none());
        assert!(report.evaluation.is_none());
    }

    fn send_data(chunk: &[u8]) -> Vec<u8> {
        let mut raw = TLVBuilder::new()
            .add_required(0x01, &[0x01, 0x43, 0x01])
            .add_required(0x02, &[0x81, 0x21])
            .add_required(0x36, chunk)
            .wrap(0xD0)
            .build();
        raw.extend_from_slice(&[0x90, 0x00]);
        raw
    }

    fn receive_data_response(chunk: &[u8]) -> Vec<u8> {
        let tlvs = TLVBuilder::new()
            .add_required(0x01, &[0x01, 0x42, 0x00])
            .add_required(0x02, &[0x82, 0x81])
            .add_required(0x03, &[0x00])
            .add_required(0x36, chunk)
            .add_required(0x37, &[0x00])
            .build();
        let mut raw = vec![0x80, 0x14, 0x00, 0x00, tlvs.len() as u8];
        raw.extend(tlvs);
        raw
    }

    #[test]
    fn test_session_from_apdu_trace() {
        let (client, server) = tls12_streams();
        let mut frames = Vec::new();
        for chunk in client.chunks(200).take(1) {
            frames.push(send_data(chunk));
        }
        for chunk in server.chunks(200) {
            frames.push(receive_data_response(chunk));
        }
        for chunk in client.chunks(200).skip(1) {
            frames.push(send_data(chunk));
        }
        let records: Vec<APDURecord> = frames.iter().map(|raw| apdu::parse(raw).unwrap()).collect();

        let report = analyze_apdus(&records, &AnalyzerConfig::default()).unwrap();
        assert_eq!(report.summary.sni.as_deref(), Some("bip.example.net"));
        assert_eq!(report.summary.certificate_count, 2);
        assert_eq!(report.certificates[0].subject_cn.as_deref(), Some("bip.example.net"));
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_report_serializes() {
        let (client, server) = tls12_streams();
        let report = analyze(
            [(Direction::SimToMe, client.as_slice()), (Direction::MeToSim, server.as_slice())],
            &AnalyzerConfig::default(),
        )
        .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["sni"], "bip.example.net");
        assert_eq!(json["timeline"][0]["direction"], "SIM->ME");
        assert_eq!(json["client_hello"]["cipher_suites"][0]["id"], 0xC02F);
    }

    #[test]
    fn test_identical_input_gives_identical_reports() {
        let (client, server) = tls12_streams();
        let run = || {
            analyze(
                [(Direction::SimToMe, client.as_slice()), (Direction::MeToSim, server.as_slice())],
                &AnalyzerConfig::default(),
            )
            .unwrap()
        };
        assert_eq!(run(), run());
    }
}

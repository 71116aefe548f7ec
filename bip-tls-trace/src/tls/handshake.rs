//! Handshake message assembly and decoding
//!
//! Handshake messages are framed by a 4-byte header (type plus 24-bit length)
//! and may span several records of the same direction, or share a record
//! with other messages. Each direction owns its assembly state; the header
//! and body buffers are cleared as soon as a message completes. Completed
//! bodies are decoded with tls-parser.

use std::mem;

use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;
use tls_parser::nom::error::{Error as NomError, ErrorKind};
use tls_parser::nom::multi::length_data;
use tls_parser::nom::number::complete::{be_u16, be_u8};
use tls_parser::nom::{Err as NomErr, IResult};
use tls_parser::{
    parse_dh_params, parse_digitally_signed, parse_ecdh_params, parse_tls_message_handshake, ECParametersContent,
    TlsCertificateContents, TlsClientKeyExchangeContents, TlsMessage, TlsMessageHandshake,
};

use super::hello::{self, ClientHello, Named, ServerHello};
use super::names;
use super::reassembly::{ContentType, TlsRecord};
use crate::certificate::{self, CertificateInfo, CertificateSource};
use crate::direction::Direction;

const HANDSHAKE_HEADER_LEN: usize = 4;
const MAX_BODY_LEN: usize = 0xFF_FFFF;

/// Handshake message type codes
pub mod msg {
    pub const HELLO_REQUEST: u8 = 0;
    pub const CLIENT_HELLO: u8 = 1;
    pub const SERVER_HELLO: u8 = 2;
    pub const NEW_SESSION_TICKET: u8 = 4;
    pub const CERTIFICATE: u8 = 11;
    pub const SERVER_KEY_EXCHANGE: u8 = 12;
    pub const CERTIFICATE_REQUEST: u8 = 13;
    pub const SERVER_HELLO_DONE: u8 = 14;
    pub const CERTIFICATE_VERIFY: u8 = 15;
    pub const CLIENT_KEY_EXCHANGE: u8 = 16;
    pub const FINISHED: u8 = 20;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("Truncated handshake message type {msg_type}")]
    Truncated { msg_type: u8 },

    #[error("Malformed handshake message type {msg_type}: {kind:?}")]
    Malformed { msg_type: u8, kind: ErrorKind },

    #[error("Handshake body of {len} bytes does not fit a 24-bit length")]
    Oversize { len: usize },
}

impl HandshakeError {
    fn from_nom(msg_type: u8, err: NomErr<NomError<&[u8]>>) -> Self {
        match err {
            NomErr::Incomplete(_) => HandshakeError::Truncated { msg_type },
            NomErr::Error(e) | NomErr::Failure(e) => HandshakeError::Malformed { msg_type, kind: e.code },
        }
    }
}

/// Certificates carried by a Certificate message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertificateChain {
    pub certificates: Vec<CertificateInfo>,
    /// Entries that did not decode as X.509
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerKeyExchange {
    pub curve_type: Option<u8>,
    pub named_curve: Option<Named>,
    pub public_key_len: Option<usize>,
}

/// Decoded content of a handshake message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandshakeBody {
    HelloRequest,
    ClientHello(ClientHello),
    ServerHello(ServerHello),
    NewSessionTicket { lifetime_hint: u32, ticket_len: usize },
    Certificate(CertificateChain),
    ServerKeyExchange(ServerKeyExchange),
    CertificateRequest { certificate_types: Vec<u8> },
    ServerHelloDone,
    CertificateVerify { signature_scheme: Option<Named>, signature_len: usize },
    ClientKeyExchange { public_value_len: usize },
    Finished { verify_data_len: usize },
    Other { msg_type: u8 },
    Undecodable { reason: String },
}

impl HandshakeBody {
    /// Whether the message type was recognised and decoded
    pub fn is_resolved(&self) -> bool {
        !matches!(self, HandshakeBody::Other { .. } | HandshakeBody::Undecodable { .. })
    }
}

/// A fully assembled handshake message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandshakeMessage {
    pub direction: Direction,
    pub msg_type: u8,
    pub name: String,
    pub length: usize,
    /// Completion sequence of the record that finished the message
    pub completion_sequence: u64,
    #[serde(with = "crate::base64_bytes")]
    pub body: Vec<u8>,
    pub decoded: HandshakeBody,
}

/// Handshake record that arrived after ChangeCipherSpec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncryptedHandshake {
    pub direction: Direction,
    pub completion_sequence: u64,
    pub length: usize,
}

#[derive(Debug, Default)]
struct AssemblyState {
    header: Vec<u8>,
    msg_type: Option<u8>,
    needed: usize,
    body: Vec<u8>,
    encrypted: bool,
    /// Plaintext handshake fragments, in order, for the certificate scanner
    fragments: Vec<u8>,
}

impl AssemblyState {
    fn reset(&mut self) {
        self.header.clear();
        self.msg_type = None;
        self.needed = 0;
        self.body.clear();
    }

    fn in_progress(&self) -> bool {
        self.msg_type.is_some() || !self.header.is_empty()
    }
}

/// Per-direction handshake assembler
#[derive(Debug)]
pub struct HandshakeAssembler {
    max_message_len: usize,
    states: [AssemblyState; 2],
    messages: Vec<HandshakeMessage>,
    encrypted: Vec<EncryptedHandshake>,
    warnings: Vec<String>,
}

impl Default for HandshakeAssembler {
    fn default() -> Self {
        Self::new(crate::config::AnalyzerConfig::default().max_handshake_message_len)
    }
}

impl HandshakeAssembler {
    pub fn new(max_message_len: usize) -> Self {
        Self {
            max_message_len,
            states: Default::default(),
            messages: Vec::new(),
            encrypted: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Feed one record; records must arrive in completion order
    pub fn push_record(&mut self, record: &TlsRecord) {
        let state = &mut self.states[record.direction.index()];
        match record.record_type {
            ContentType::ChangeCipherSpec => {
                if state.in_progress() {
                    self.warn(format!(
                        "{} ChangeCipherSpec interrupted a partial handshake message",
                        record.direction
                    ));
                }
                let state = &mut self.states[record.direction.index()];
                state.reset();
                state.encrypted = true;
            }
            ContentType::Handshake if state.encrypted => {
                self.encrypted.push(EncryptedHandshake {
                    direction: record.direction,
                    completion_sequence: record.completion_sequence,
                    length: record.fragment_len(),
                });
            }
            ContentType::Handshake => {
                state.fragments.extend_from_slice(record.fragment());
                self.assemble(record);
            }
            _ => {}
        }
    }

    fn assemble(&mut self, record: &TlsRecord) {
        let index = record.direction.index();
        let mut input = record.fragment();
        while !input.is_empty() {
            let state = &mut self.states[index];
            if state.msg_type.is_none() {
                let take = (HANDSHAKE_HEADER_LEN - state.header.len()).min(input.len());
                state.header.extend_from_slice(&input[..take]);
                input = &input[take..];
                if state.header.len() < HANDSHAKE_HEADER_LEN {
                    break;
                }

                let msg_type = state.header[0];
                let len = ((state.header[1] as usize) << 16)
                    | ((state.header[2] as usize) << 8)
                    | state.header[3] as usize;
                state.header.clear();
                if len > self.max_message_len {
                    state.reset();
                    self.warn(format!(
                        "{} handshake header type {} declares {} bytes; resynchronising",
                        record.direction, msg_type, len
                    ));
                    break;
                }
                state.msg_type = Some(msg_type);
                state.needed = len;
            } else {
                let take = state.needed.min(input.len());
                state.body.extend_from_slice(&input[..take]);
                state.needed -= take;
                input = &input[take..];
            }

            if self.states[index].needed == 0 && self.states[index].msg_type.is_some() {
                self.complete(record);
            }
        }
    }

    fn complete(&mut self, record: &TlsRecord) {
        let state = &mut self.states[record.direction.index()];
        let Some(msg_type) = state.msg_type.take() else {
            return;
        };
        let body = mem::take(&mut state.body);
        state.needed = 0;

        let decoded = decode_body(msg_type, &body);
        let name = handshake_label(msg_type, &decoded);
        debug!(
            "Handshake {} {} ({} bytes) completed by record #{}",
            record.direction,
            name,
            body.len(),
            record.completion_sequence
        );
        self.messages.push(HandshakeMessage {
            direction: record.direction,
            msg_type,
            name,
            length: body.len(),
            completion_sequence: record.completion_sequence,
            body,
            decoded,
        });
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn messages(&self) -> &[HandshakeMessage] {
        &self.messages
    }

    pub fn encrypted(&self) -> &[EncryptedHandshake] {
        &self.encrypted
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Concatenated plaintext handshake fragments seen for `direction`
    pub fn fragments(&self, direction: Direction) -> &[u8] {
        &self.states[direction.index()].fragments
    }

    /// Whether a message is still waiting for bytes in `direction`
    pub fn has_partial(&self, direction: Direction) -> bool {
        self.states[direction.index()].in_progress()
    }

    /// Assemble every handshake message in a record stream
    pub fn assemble_all(records: &[TlsRecord], max_message_len: usize) -> Self {
        let mut assembler = Self::new(max_message_len);
        for record in records {
            assembler.push_record(record);
        }
        assembler
    }
}

/// Timeline name for a decoded message
fn handshake_label(msg_type: u8, decoded: &HandshakeBody) -> String {
    match decoded {
        HandshakeBody::ServerHello(hello) if hello.hello_retry_request => "HelloRetryRequest".to_string(),
        HandshakeBody::Other { .. } => "Handshake(other)".to_string(),
        _ => names::handshake_type_name(msg_type),
    }
}

/// Decode a handshake body, reporting parse failures as [`HandshakeBody::Undecodable`]
pub fn decode_body(msg_type: u8, body: &[u8]) -> HandshakeBody {
    decode(msg_type, body).unwrap_or_else(|e| HandshakeBody::Undecodable { reason: e.to_string() })
}

/// Decode a handshake body by message type
///
/// The body is re-framed with its 4-byte header and handed to tls-parser.
/// Types without a decoder come back as [`HandshakeBody::Other`].
pub fn decode(msg_type: u8, body: &[u8]) -> Result<HandshakeBody, HandshakeError> {
    if !matches!(
        msg_type,
        msg::HELLO_REQUEST
            | msg::CLIENT_HELLO
            | msg::SERVER_HELLO
            | msg::NEW_SESSION_TICKET
            | msg::CERTIFICATE
            | msg::SERVER_KEY_EXCHANGE
            | msg::CERTIFICATE_REQUEST
            | msg::SERVER_HELLO_DONE
            | msg::CERTIFICATE_VERIFY
            | msg::CLIENT_KEY_EXCHANGE
            | msg::FINISHED
    ) {
        return Ok(HandshakeBody::Other { msg_type });
    }
    if body.len() > MAX_BODY_LEN {
        return Err(HandshakeError::Oversize { len: body.len() });
    }

    let mut framed = Vec::with_capacity(HANDSHAKE_HEADER_LEN + body.len());
    framed.push(msg_type);
    framed.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
    framed.extend_from_slice(body);

    let message = match parse_tls_message_handshake(&framed) {
        Ok((_, TlsMessage::Handshake(message))) => message,
        Ok(_) => return Ok(HandshakeBody::Other { msg_type }),
        Err(e) => return Err(HandshakeError::from_nom(msg_type, e)),
    };

    let decoded = match message {
        TlsMessageHandshake::HelloRequest => HandshakeBody::HelloRequest,
        TlsMessageHandshake::ClientHello(contents) => HandshakeBody::ClientHello(hello::client_hello(&contents, body)),
        TlsMessageHandshake::ServerHello(contents) => HandshakeBody::ServerHello(hello::server_hello(&contents, body)),
        TlsMessageHandshake::NewSessionTicket(ticket) => HandshakeBody::NewSessionTicket {
            lifetime_hint: ticket.ticket_lifetime_hint,
            // opaque ticket<0..2^16-1> keeps its length prefix here
            ticket_len: ticket.ticket.len().saturating_sub(2),
        },
        TlsMessageHandshake::Certificate(contents) => HandshakeBody::Certificate(certificate_chain(&contents, body)),
        TlsMessageHandshake::ServerKeyExchange(contents) => {
            HandshakeBody::ServerKeyExchange(server_key_exchange(contents.parameters))
        }
        TlsMessageHandshake::CertificateRequest(request) => HandshakeBody::CertificateRequest {
            certificate_types: request.cert_types,
        },
        TlsMessageHandshake::ServerDone(_) => HandshakeBody::ServerHelloDone,
        TlsMessageHandshake::CertificateVerify(data) => certificate_verify(data)?,
        TlsMessageHandshake::ClientKeyExchange(exchange) => HandshakeBody::ClientKeyExchange {
            public_value_len: client_public_value_len(&exchange),
        },
        TlsMessageHandshake::Finished(data) => HandshakeBody::Finished {
            verify_data_len: data.len(),
        },
        _ => HandshakeBody::Other { msg_type },
    };
    Ok(decoded)
}

/// Decode every certificate of a TLS 1.2 Certificate message
fn certificate_chain(contents: &TlsCertificateContents<'_>, body: &[u8]) -> CertificateChain {
    let mut chain = CertificateChain::default();
    for (position, raw) in contents.cert_chain.iter().enumerate() {
        match certificate::decode(raw.data, CertificateSource::Handshake) {
            Ok(info) => chain.certificates.push(info),
            Err(e) => chain.errors.push(format!("certificate {}: {}", position, e)),
        }
    }

    let listed: usize = contents.cert_chain.iter().map(|raw| 3 + raw.data.len()).sum();
    let unlisted = body.len().saturating_sub(3 + listed);
    if unlisted > 0 {
        chain.errors.push(format!(
            "{} bytes after certificate {} do not form a complete entry",
            unlisted,
            contents.cert_chain.len()
        ));
    }
    chain
}

/// ServerKeyExchange: named curve for ECDHE, public value length for both
fn server_key_exchange(parameters: &[u8]) -> ServerKeyExchange {
    if let Ok((_, ecdh)) = parse_ecdh_params(parameters) {
        // named curves only; the explicit-prime layout also accepts DH parameters
        if let ECParametersContent::NamedGroup(group) = ecdh.curve_params.params_content {
            return ServerKeyExchange {
                curve_type: Some(ecdh.curve_params.curve_type.0),
                named_curve: Some(Named::new(group.0, names::group_name)),
                public_key_len: Some(ecdh.public.point.len()),
            };
        }
    }

    ServerKeyExchange {
        curve_type: None,
        named_curve: None,
        public_key_len: parse_dh_params(parameters).ok().map(|(_, dh)| dh.dh_ys.len()),
    }
}

fn certificate_verify(data: &[u8]) -> Result<HandshakeBody, HandshakeError> {
    let (_, signed) =
        parse_digitally_signed(data).map_err(|e| HandshakeError::from_nom(msg::CERTIFICATE_VERIFY, e))?;
    Ok(HandshakeBody::CertificateVerify {
        signature_scheme: signed
            .alg
            .map(|alg| Named::new(u16::from_be_bytes([alg.hash.0, alg.sign.0]), names::signature_scheme_name)),
        signature_len: signed.data.len(),
    })
}

/// Length of the key exchange value, ignoring the length prefix when it fits
fn client_public_value_len(exchange: &TlsClientKeyExchangeContents<'_>) -> usize {
    fn whole(parsed: IResult<&[u8], &[u8]>) -> Option<usize> {
        match parsed {
            Ok(([], value)) => Some(value.len()),
            _ => None,
        }
    }

    match exchange {
        TlsClientKeyExchangeContents::Ecdh(point) => point.point.len(),
        TlsClientKeyExchangeContents::Dh(data) | TlsClientKeyExchangeContents::Unknown(data) => {
            whole(length_data(be_u8)(*data))
                .or_else(|| whole(length_data(be_u16)(*data)))
                .unwrap_or(data.len())
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::certificate::tests::{CA_DER, LEAF_DER};
    use crate::tls::hello::tests::{client_hello_body, server_hello_body};
    use crate::tls::reassembly::RecordReassembler;

    pub(crate) fn handshake(msg_type: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![msg_type];
        out.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        out.extend_from_slice(body);
        out
    }

    pub(crate) fn record(content_type: u8, fragment: &[u8]) -> Vec<u8> {
        let mut out = vec![content_type, 0x03, 0x03];
        out.extend_from_slice(&(fragment.len() as u16).to_be_bytes());
        out.extend_from_slice(fragment);
        out
    }

    pub(crate) fn certificate_body(ders: &[&[u8]]) -> Vec<u8> {
        let mut list = Vec::new();
        for der in ders {
            list.extend_from_slice(&(der.len() as u32).to_be_bytes()[1..]);
            list.extend_from_slice(der);
        }
        let mut body = (list.len() as u32).to_be_bytes()[1..].to_vec();
        body.extend(list);
        body
    }

    fn records(chunks: &[(Direction, Vec<u8>)]) -> Vec<TlsRecord> {
        let mut reassembler = RecordReassembler::default();
        for (direction, bytes) in chunks {
            reassembler.feed(*direction, bytes);
        }
        reassembler.into_records()
    }

    #[test]
    fn test_client_hello_split_across_two_records() {
        let message = handshake(msg::CLIENT_HELLO, &client_hello_body("bip.example.net"));
        let (first, second) = message.split_at(30);
        let records = records(&[
            (Direction::SimToMe, record(0x16, first)),
            (Direction::SimToMe, record(0x16, second)),
        ]);

        let assembler = HandshakeAssembler::assemble_all(&records, 1 << 18);
        assert_eq!(assembler.messages().len(), 1);
        let message = &assembler.messages()[0];
        assert_eq!(message.name, "ClientHello");
        assert_eq!(message.completion_sequence, 1);
        let HandshakeBody::ClientHello(hello) = &message.decoded else {
            panic!("expected ClientHello, got {:?}", message.decoded);
        };
        assert_eq!(hello.extensions.len(), 7);
        assert_eq!(hello.server_name.as_deref(), Some("bip.example.net"));
        assert!(!assembler.has_partial(Direction::SimToMe));
    }

    #[test]
    fn test_split_header() {
        let message = handshake(msg::SERVER_HELLO_DONE, &[]);
        let records = records(&[
            (Direction::MeToSim, record(0x16, &message[..2])),
            (Direction::MeToSim, record(0x16, &message[2..])),
        ]);
        let assembler = HandshakeAssembler::assemble_all(&records, 1 << 18);
        assert_eq!(assembler.messages().len(), 1);
        assert_eq!(assembler.messages()[0].decoded, HandshakeBody::ServerHelloDone);
    }

    #[test]
    fn test_server_flight_in_one_record() {
        let mut flight = handshake(msg::SERVER_HELLO, &server_hello_body(0xC02F, &[]));
        flight.extend(handshake(msg::CERTIFICATE, &certificate_body(&[LEAF_DER, CA_DER])));
        flight.extend(handshake(msg::SERVER_KEY_EXCHANGE, &[0x03, 0x00, 0x17, 0x02, 0x04, 0x00]));
        flight.extend(handshake(msg::SERVER_HELLO_DONE, &[]));
        let records = records(&[(Direction::MeToSim, record(0x16, &flight))]);

        let assembler = HandshakeAssembler::assemble_all(&records, 1 << 18);
        let names: Vec<_> = assembler.messages().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["ServerHello", "Certificate", "ServerKeyExchange", "ServerHelloDone"]
        );

        let HandshakeBody::Certificate(chain) = &assembler.messages()[1].decoded else {
            panic!("expected Certificate");
        };
        assert_eq!(chain.certificates.len(), 2);
        assert!(chain.errors.is_empty());

        let HandshakeBody::ServerKeyExchange(ske) = &assembler.messages()[2].decoded else {
            panic!("expected ServerKeyExchange");
        };
        assert_eq!(ske.named_curve.as_ref().unwrap().name, "secp256r1");
        assert_eq!(ske.public_key_len, Some(2));
    }

    #[test]
    fn test_change_cipher_spec_marks_encrypted() {
        let records = records(&[
            (Direction::SimToMe, record(0x14, &[0x01])),
            (Direction::SimToMe, record(0x16, &[0xAB; 40])),
        ]);
        let assembler = HandshakeAssembler::assemble_all(&records, 1 << 18);
        assert!(assembler.messages().is_empty());
        assert_eq!(
            assembler.encrypted(),
            &[EncryptedHandshake {
                direction: Direction::SimToMe,
                completion_sequence: 1,
                length: 40,
            }]
        );
    }

    #[test]
    fn test_directions_assemble_independently() {
        let mut exchange = vec![0x41];
        exchange.extend_from_slice(&[0x04; 65]);
        let client = handshake(msg::CLIENT_KEY_EXCHANGE, &exchange);
        let server = handshake(msg::FINISHED, &[0x00; 12]);
        let records = records(&[
            (Direction::SimToMe, record(0x16, &client[..10])),
            (Direction::MeToSim, record(0x16, &server)),
            (Direction::SimToMe, record(0x16, &client[10..])),
        ]);
        let assembler = HandshakeAssembler::assemble_all(&records, 1 << 18);
        let messages = assembler.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].decoded, HandshakeBody::Finished { verify_data_len: 12 });
        assert_eq!(messages[1].direction, Direction::SimToMe);
        assert_eq!(messages[1].decoded, HandshakeBody::ClientKeyExchange { public_value_len: 65 });
    }

    #[test]
    fn test_oversize_header_resets() {
        let records = records(&[(Direction::MeToSim, record(0x16, &[0x0B, 0x7F, 0xFF, 0xFF, 0x00]))]);
        let assembler = HandshakeAssembler::assemble_all(&records, 1 << 18);
        assert!(assembler.messages().is_empty());
        assert_eq!(assembler.warnings().len(), 1);
        assert!(!assembler.has_partial(Direction::MeToSim));
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let mut flight = handshake(msg::CLIENT_HELLO, &client_hello_body("x.example"));
        flight.extend(handshake(0x63, &[1, 2, 3]));
        let (a, b) = flight.split_at(17);
        let records = records(&[
            (Direction::SimToMe, record(0x16, a)),
            (Direction::SimToMe, record(0x16, b)),
        ]);
        let first = HandshakeAssembler::assemble_all(&records, 1 << 18);
        let second = HandshakeAssembler::assemble_all(&records, 1 << 18);
        assert_eq!(first.messages(), second.messages());
        assert_eq!(first.messages()[1].name, "Handshake(other)");
    }

    #[test]
    fn test_truncated_certificate_entry_reported() {
        let mut body = certificate_body(&[LEAF_DER, CA_DER]);
        body.truncate(body.len() - 10);
        let list_len = (body.len() - 3) as u32;
        body[..3].copy_from_slice(&list_len.to_be_bytes()[1..]);

        let HandshakeBody::Certificate(chain) = decode_body(msg::CERTIFICATE, &body) else {
            panic!("expected Certificate");
        };
        assert_eq!(chain.certificates.len(), 1);
        assert_eq!(chain.errors.len(), 1);
        assert!(chain.errors[0].starts_with(&format!("{} bytes after certificate 1", CA_DER.len() + 3 - 10)));
    }

    #[test]
    fn test_dhe_server_key_exchange() {
        let mut params = vec![0x00, 0x04, 0xFF, 0xFF, 0xFF, 0xFB, 0x00, 0x01, 0x02];
        params.extend_from_slice(&[0x00, 0x03, 0xAA, 0xBB, 0xCC]);
        params.extend_from_slice(&[0x04, 0x01, 0x00, 0x02, 0x5A, 0x5A]);
        let decoded = decode_body(msg::SERVER_KEY_EXCHANGE, &params);
        assert_eq!(
            decoded,
            HandshakeBody::ServerKeyExchange(ServerKeyExchange {
                curve_type: None,
                named_curve: None,
                public_key_len: Some(3),
            })
        );
    }

    #[test]
    fn test_certificate_verify_and_ticket() {
        let decoded = decode_body(msg::CERTIFICATE_VERIFY, &[0x08, 0x04, 0x00, 0x03, 0x01, 0x02, 0x03]);
        let HandshakeBody::CertificateVerify {
            signature_scheme,
            signature_len,
        } = decoded
        else {
            panic!("expected CertificateVerify");
        };
        assert_eq!(signature_scheme.map(|s| s.id), Some(0x0804));
        assert_eq!(signature_len, 3);

        let ticket = decode_body(msg::NEW_SESSION_TICKET, &[0x00, 0x00, 0x1C, 0x20, 0x00, 0x02, 0xAA, 0xBB]);
        assert_eq!(
            ticket,
            HandshakeBody::NewSessionTicket {
                lifetime_hint: 7200,
                ticket_len: 2,
            }
        );
    }

    #[test]
    fn test_truncated_certificate_verify_fails() {
        assert_eq!(
            decode(msg::CERTIFICATE_VERIFY, &[0x04, 0x03, 0x00, 0x40, 0x01]),
            Err(HandshakeError::Truncated {
                msg_type: msg::CERTIFICATE_VERIFY
            })
        );
    }

    #[test]
    fn test_undecodable_body() {
        let decoded = decode_body(msg::SERVER_HELLO, &[0x03]);
        assert!(matches!(decoded, HandshakeBody::Undecodable { .. }));
        assert!(!decoded.is_resolved());
    }
}

//! TLS stream reconstruction
//!
//! Channel payloads are turned into records by [`RecordReassembler`], and
//! handshake records into decoded messages by [`HandshakeAssembler`]. Nothing
//! here decrypts: after ChangeCipherSpec a direction's handshake records are
//! only reported as encrypted.
//!
//! # Example
//! ```
//! use bip_tls_trace::tls::{HandshakeAssembler, HandshakeBody, RecordReassembler};
//! use bip_tls_trace::Direction;
//!
//! // ServerHelloDone split over two channel payloads
//! let mut records = RecordReassembler::default();
//! records.feed(Direction::MeToSim, &[0x16, 0x03, 0x03, 0x00]);
//! records.feed(Direction::MeToSim, &[0x04, 0x0E, 0x00, 0x00, 0x00]);
//!
//! let assembler = HandshakeAssembler::assemble_all(records.records(), 1 << 18);
//! assert_eq!(assembler.messages()[0].decoded, HandshakeBody::ServerHelloDone);
//! ```

pub mod handshake;
pub mod hello;
pub mod names;
pub mod reassembly;

pub use handshake::{
    CertificateChain, EncryptedHandshake, HandshakeAssembler, HandshakeBody, HandshakeError, HandshakeMessage,
};
pub use hello::{ClientHello, Extension, Named, ServerHello};
pub use reassembly::{ContentType, DirectionStats, RecordReassembler, TlsRecord};

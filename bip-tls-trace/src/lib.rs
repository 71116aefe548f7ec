//! BIP/TLS trace decoding engine
//!
//! Decodes smart-card traces between a terminal (ME) and a SIM, and rebuilds
//! the TLS session the SIM runs over a Bearer Independent Protocol channel.
//!
//! - [`tlv`] and [`apdu`] turn raw command/response frames into structured
//!   records: ISO 7816 case, proactive command, device identities, status.
//! - [`apdu::bip`] pulls channel data out of SEND DATA / RECEIVE DATA.
//! - [`tls`] reassembles records and handshake messages across fragments.
//! - [`certificate`], [`evaluate`] and [`timeline`] interpret the handshake.
//! - [`session`] ties it together into a [`SessionReport`].
//!
//! The library does no I/O apart from the explicit [`AnalyzerConfig`]
//! loaders and never installs a logger.

// Allow uppercase acronyms for protocol type names (TLV, APDU)
#![allow(clippy::upper_case_acronyms)]

mod base64_bytes;

pub mod apdu;
pub mod certificate;
pub mod config;
pub mod direction;
pub mod evaluate;
pub mod session;
pub mod timeline;
pub mod tls;
pub mod tlv;

pub use config::AnalyzerConfig;
pub use direction::Direction;
pub use session::{analyze, analyze_apdus, AnalysisError, SessionAnalyzer, SessionReport, SessionSummary};

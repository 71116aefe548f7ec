//! Cipher suite evaluation
//!
//! Classifies a negotiated suite from its IANA name and flags weaknesses.
//! Session-level checks (protocol version, certificate key size) are added
//! by [`evaluate_session`].

use serde::Serialize;

use crate::certificate::CertificateInfo;

const TLS_1_2: u16 = 0x0303;
const MIN_RSA_BITS: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    CbcMode,
    RsaKeyExchange,
    Rc4,
    NullEncryption,
    ExportGrade,
    TripleDes,
    LegacyVersion,
    WeakRsaKey,
}

impl IssueKind {
    pub fn severity(self) -> Severity {
        match self {
            IssueKind::CbcMode
            | IssueKind::RsaKeyExchange
            | IssueKind::TripleDes
            | IssueKind::LegacyVersion
            | IssueKind::WeakRsaKey => Severity::Medium,
            IssueKind::Rc4 | IssueKind::NullEncryption | IssueKind::ExportGrade => Severity::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CipherEvaluation {
    pub suite: String,
    /// False for names the registry could not resolve
    pub known: bool,
    /// "ECDHE", "DHE", "RSA", "PSK", ... or "(EC)DHE" for TLS 1.3 suites
    pub key_exchange: String,
    /// "ECDSA", "RSA", "PSK", "DSS", "none", or "negotiated" for TLS 1.3
    pub authentication: String,
    pub uses_aead: bool,
    pub forward_secrecy: bool,
    pub issues: Vec<Issue>,
}

impl CipherEvaluation {
    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|issue| issue.kind == kind)
    }

    /// Worst severity among the issues
    pub fn worst(&self) -> Option<Severity> {
        self.issues.iter().map(|issue| issue.severity).max()
    }
}

/// Classify a suite by name
pub fn evaluate_suite(suite: &str) -> CipherEvaluation {
    let name = suite.trim_start_matches("TLS_").trim_start_matches("SSL_");
    let Some((kx_part, cipher_part)) = name.split_once("_WITH_") else {
        return evaluate_tls13(suite, name);
    };

    let key_exchange = kx_part.split('_').next().unwrap_or(kx_part).to_string();
    let authentication = if kx_part.contains("anon") {
        "none"
    } else if kx_part.contains("ECDSA") {
        "ECDSA"
    } else if kx_part.contains("PSK") {
        "PSK"
    } else if kx_part.contains("DSS") {
        "DSS"
    } else if kx_part.contains("RSA") {
        "RSA"
    } else {
        "none"
    };
    let forward_secrecy = matches!(key_exchange.as_str(), "ECDHE" | "DHE");
    let uses_aead = is_aead(cipher_part);

    let mut issues = Vec::new();
    if cipher_part.contains("CBC") {
        issues.push(Issue::new(
            IssueKind::CbcMode,
            "CBC mode cipher (legacy, padding-oracle prone)",
        ));
    }
    if key_exchange == "RSA" {
        issues.push(Issue::new(
            IssueKind::RsaKeyExchange,
            "RSA key exchange without ECDHE (no forward secrecy)",
        ));
    }
    if cipher_part.contains("RC4") {
        issues.push(Issue::new(IssueKind::Rc4, "RC4 stream cipher is broken"));
    }
    if cipher_part.starts_with("NULL") {
        issues.push(Issue::new(IssueKind::NullEncryption, "NULL encryption: traffic is not confidential"));
    }
    if name.contains("EXPORT") {
        issues.push(Issue::new(IssueKind::ExportGrade, "EXPORT-grade cipher suite"));
    }
    if cipher_part.contains("3DES") || cipher_part.contains("DES_EDE") {
        issues.push(Issue::new(IssueKind::TripleDes, "3DES (64-bit block, Sweet32)"));
    }

    CipherEvaluation {
        suite: suite.to_string(),
        known: true,
        key_exchange,
        authentication: authentication.to_string(),
        uses_aead,
        forward_secrecy,
        issues,
    }
}

/// TLS 1.3 suites name only the AEAD and hash
fn evaluate_tls13(suite: &str, name: &str) -> CipherEvaluation {
    let known = ["AES_", "CHACHA20_"].iter().any(|prefix| name.starts_with(prefix));
    CipherEvaluation {
        suite: suite.to_string(),
        known,
        key_exchange: if known { "(EC)DHE" } else { "unknown" }.to_string(),
        authentication: if known { "negotiated" } else { "unknown" }.to_string(),
        uses_aead: known && is_aead(name),
        forward_secrecy: known,
        issues: Vec::new(),
    }
}

fn is_aead(cipher: &str) -> bool {
    ["GCM", "CCM", "CHACHA20"].iter().any(|mode| cipher.contains(mode))
}

/// Suite evaluation plus protocol version and certificate key checks
pub fn evaluate_session(
    suite: &str,
    negotiated_version: Option<u16>,
    certificates: &[CertificateInfo],
) -> CipherEvaluation {
    let mut evaluation = evaluate_suite(suite);
    if let Some(version) = negotiated_version.filter(|v| *v < TLS_1_2) {
        evaluation.issues.push(Issue::new(
            IssueKind::LegacyVersion,
            format!("Legacy protocol version {}", crate::tls::names::version_name(version)),
        ));
    }
    for cert in certificates {
        match cert.public_key_bits {
            Some(bits) if cert.is_rsa() && bits < MIN_RSA_BITS => {
                let subject = cert.subject_cn.as_deref().unwrap_or("certificate");
                evaluation.issues.push(Issue::new(
                    IssueKind::WeakRsaKey,
                    format!("{} uses a {}-bit RSA key", subject, bits),
                ));
            }
            _ => {}
        }
    }
    evaluation
}

//! X.509 certificate inspection
//!
//! Certificates arrive either in a handshake Certificate message or are
//! recovered by scanning raw handshake bytes for DER sequences. Every field
//! is optional: a certificate with missing or unparseable extensions still
//! yields what could be read.

pub mod scan;

pub use scan::CertificateScanner;

use std::net::{Ipv4Addr, Ipv6Addr};

use digest::Digest;
use serde::Serialize;
use sha1::Sha1;
use sha2::Sha256;
use thiserror::Error;
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CertificateError {
    #[error("Empty certificate")]
    Empty,

    #[error("Invalid certificate DER: {0}")]
    Der(String),
}

/// Where a certificate was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateSource {
    Handshake,
    Scan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateInfo {
    pub subject: Option<String>,
    pub subject_cn: Option<String>,
    pub issuer: Option<String>,
    pub issuer_cn: Option<String>,
    /// Serial number as colon-separated hex
    pub serial: Option<String>,
    pub not_before: Option<String>,
    pub not_after: Option<String>,
    pub not_before_unix: Option<i64>,
    pub not_after_unix: Option<i64>,
    /// "RSA", "EC", "Ed25519", ...
    pub public_key_algorithm: Option<String>,
    pub public_key_bits: Option<usize>,
    pub curve: Option<String>,
    pub signature_algorithm: Option<String>,
    pub key_usage: Vec<String>,
    pub extended_key_usage: Vec<String>,
    pub subject_alt_names: Vec<String>,
    pub authority_key_id: Option<String>,
    pub crl_distribution_points: Vec<String>,
    pub is_ca: Option<bool>,
    /// SHA-256 of the signature value
    pub signature_fingerprint: String,
    /// SHA-1 of the whole DER encoding
    pub sha1_fingerprint: String,
    pub self_signed: bool,
    pub der_len: usize,
    pub source: CertificateSource,
}

impl CertificateInfo {
    /// One-line key description such as "RSA 2048" or "EC P-256"
    pub fn public_key_description(&self) -> Option<String> {
        let algorithm = self.public_key_algorithm.as_deref()?;
        Some(match (&self.curve, self.public_key_bits) {
            (Some(curve), _) => format!("{} {}", algorithm, curve),
            (None, Some(bits)) => format!("{} {}", algorithm, bits),
            (None, None) => algorithm.to_string(),
        })
    }

    pub fn is_rsa(&self) -> bool {
        self.public_key_algorithm.as_deref() == Some("RSA")
    }
}

/// Decode a DER certificate
pub fn decode(der: &[u8], source: CertificateSource) -> Result<CertificateInfo, CertificateError> {
    if der.is_empty() {
        return Err(CertificateError::Empty);
    }
    let (_, cert) = X509Certificate::from_der(der).map_err(|e| CertificateError::Der(e.to_string()))?;

    let validity = cert.validity();
    let (public_key_algorithm, public_key_bits, curve) = describe_public_key(&cert);

    let mut info = CertificateInfo {
        subject: Some(cert.subject().to_string()),
        subject_cn: common_name(cert.subject()),
        issuer: Some(cert.issuer().to_string()),
        issuer_cn: common_name(cert.issuer()),
        serial: Some(colon_hex(cert.raw_serial())),
        not_before: Some(validity.not_before.to_string()),
        not_after: Some(validity.not_after.to_string()),
        not_before_unix: Some(validity.not_before.timestamp()),
        not_after_unix: Some(validity.not_after.timestamp()),
        public_key_algorithm,
        public_key_bits,
        curve,
        signature_algorithm: Some(signature_algorithm_name(
            &cert.signature_algorithm.algorithm.to_id_string(),
        )),
        key_usage: Vec::new(),
        extended_key_usage: Vec::new(),
        subject_alt_names: Vec::new(),
        authority_key_id: None,
        crl_distribution_points: Vec::new(),
        is_ca: None,
        signature_fingerprint: hex::encode(Sha256::digest(&cert.signature_value.data)),
        sha1_fingerprint: hex::encode(Sha1::digest(der)),
        self_signed: cert.subject() == cert.issuer(),
        der_len: der.len(),
        source,
    };

    for ext in cert.extensions() {
        match ext.parsed_extension() {
            ParsedExtension::KeyUsage(usage) => info.key_usage = key_usage_names(usage),
            ParsedExtension::ExtendedKeyUsage(eku) => info.extended_key_usage = extended_key_usage_names(eku),
            ParsedExtension::SubjectAlternativeName(san) => {
                info.subject_alt_names = san.general_names.iter().filter_map(general_name).collect();
            }
            ParsedExtension::AuthorityKeyIdentifier(aki) => {
                info.authority_key_id = aki.key_identifier.as_ref().map(|id| colon_hex(id.0));
            }
            ParsedExtension::CRLDistributionPoints(points) => {
                info.crl_distribution_points = points
                    .points
                    .iter()
                    .filter_map(|point| match &point.distribution_point {
                        Some(DistributionPointName::FullName(names)) => Some(names),
                        _ => None,
                    })
                    .flatten()
                    .filter_map(|name| match name {
                        GeneralName::URI(uri) => Some(uri.to_string()),
                        _ => None,
                    })
                    .collect();
            }
            ParsedExtension::BasicConstraints(bc) => info.is_ca = Some(bc.ca),
            _ => {}
        }
    }

    Ok(info)
}

fn common_name(name: &X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(|s| s.to_string())
}

fn colon_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, c) in hex::encode(bytes).chars().enumerate() {
        if i > 0 && i % 2 == 0 {
            out.push(':');
        }
        out.push(c);
    }
    out
}

fn describe_public_key(cert: &X509Certificate<'_>) -> (Option<String>, Option<usize>, Option<String>) {
    let spki = cert.public_key();
    match spki.parsed() {
        Ok(PublicKey::RSA(rsa)) => (Some("RSA".to_string()), Some(rsa.key_size()), None),
        Ok(PublicKey::EC(point)) => {
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|p| p.as_oid().ok())
                .map(|oid| curve_name(&oid.to_id_string()));
            (Some("EC".to_string()), Some(point.key_size()), curve)
        }
        Ok(PublicKey::DSA(_)) => (Some("DSA".to_string()), None, None),
        _ => {
            let algorithm = match spki.algorithm.algorithm.to_id_string().as_str() {
                "1.3.101.112" => "Ed25519".to_string(),
                "1.3.101.113" => "Ed448".to_string(),
                other => other.to_string(),
            };
            (Some(algorithm), None, None)
        }
    }
}

fn curve_name(oid: &str) -> String {
    match oid {
        "1.2.840.10045.3.1.7" => "P-256".into(),
        "1.3.132.0.34" => "P-384".into(),
        "1.3.132.0.35" => "P-521".into(),
        "1.3.132.0.10" => "secp256k1".into(),
        "1.3.36.3.3.2.8.1.1.7" => "brainpoolP256r1".into(),
        other => other.into(),
    }
}

/// Map common signature algorithm OIDs to readable names
pub fn signature_algorithm_name(oid: &str) -> String {
    match oid {
        "1.2.840.113549.1.1.4" => "md5WithRSAEncryption".into(),
        "1.2.840.113549.1.1.5" => "sha1WithRSAEncryption".into(),
        "1.2.840.113549.1.1.11" => "sha256WithRSAEncryption".into(),
        "1.2.840.113549.1.1.12" => "sha384WithRSAEncryption".into(),
        "1.2.840.113549.1.1.13" => "sha512WithRSAEncryption".into(),
        "1.2.840.113549.1.1.10" => "RSASSA-PSS".into(),
        "1.2.840.10045.4.1" => "ecdsa-with-SHA1".into(),
        "1.2.840.10045.4.3.2" => "ecdsa-with-SHA256".into(),
        "1.2.840.10045.4.3.3" => "ecdsa-with-SHA384".into(),
        "1.2.840.10045.4.3.4" => "ecdsa-with-SHA512".into(),
        "1.3.101.112" => "Ed25519".into(),
        "1.3.101.113" => "Ed448".into(),
        other => other.into(),
    }
}

fn key_usage_names(usage: &KeyUsage) -> Vec<String> {
    [
        (usage.digital_signature(), "digitalSignature"),
        (usage.non_repudiation(), "nonRepudiation"),
        (usage.key_encipherment(), "keyEncipherment"),
        (usage.data_encipherment(), "dataEncipherment"),
        (usage.key_agreement(), "keyAgreement"),
        (usage.key_cert_sign(), "keyCertSign"),
        (usage.crl_sign(), "cRLSign"),
        (usage.encipher_only(), "encipherOnly"),
        (usage.decipher_only(), "decipherOnly"),
    ]
    .into_iter()
    .filter(|(set, _)| *set)
    .map(|(_, name)| name.to_string())
    .collect()
}

fn extended_key_usage_names(eku: &ExtendedKeyUsage<'_>) -> Vec<String> {
    let mut names: Vec<String> = [
        (eku.any, "anyExtendedKeyUsage"),
        (eku.server_auth, "serverAuth"),
        (eku.client_auth, "clientAuth"),
        (eku.code_signing, "codeSigning"),
        (eku.email_protection, "emailProtection"),
        (eku.time_stamping, "timeStamping"),
        (eku.ocsp_signing, "OCSPSigning"),
    ]
    .into_iter()
    .filter(|(set, _)| *set)
    .map(|(_, name)| name.to_string())
    .collect();
    names.extend(eku.other.iter().map(|oid| oid.to_id_string()));
    names
}

fn general_name(name: &GeneralName<'_>) -> Option<String> {
    match name {
        GeneralName::DNSName(dns) => Some(format!("DNS:{}", dns)),
        GeneralName::RFC822Name(email) => Some(format!("email:{}", email)),
        GeneralName::URI(uri) => Some(format!("URI:{}", uri)),
        GeneralName::IPAddress(ip) => Some(format!("IP:{}", ip_address(ip))),
        GeneralName::DirectoryName(dn) => Some(format!("DirName:{}", dn)),
        _ => None,
    }
}

fn ip_address(bytes: &[u8]) -> String {
    if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
        return Ipv4Addr::from(v4).to_string();
    }
    if let Ok(v6) = <[u8; 16]>::try_from(bytes) {
        return Ipv6Addr::from(v6).to_string();
    }
    hex::encode(bytes)
}

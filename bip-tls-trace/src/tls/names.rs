//! Registry of TLS protocol names

use tls_parser::TlsCipherSuite;

/// Record content type names
pub fn content_type_name(content_type: u8) -> &'static str {
    match content_type {
        0x14 => "ChangeCipherSpec",
        0x15 => "Alert",
        0x16 => "Handshake",
        0x17 => "ApplicationData",
        0x18 => "Heartbeat",
        _ => "Unknown",
    }
}

/// Protocol version names
pub fn version_name(version: u16) -> String {
    match version {
        0x0300 => "SSL 3.0".to_string(),
        0x0301 => "TLS 1.0".to_string(),
        0x0302 => "TLS 1.1".to_string(),
        0x0303 => "TLS 1.2".to_string(),
        0x0304 => "TLS 1.3".to_string(),
        0x7F00..=0x7FFF => format!("TLS 1.3 draft {}", version & 0xFF),
        v if v & 0x0F0F == 0x0A0A => format!("GREASE 0x{:04X}", v),
        v => format!("Unknown 0x{:04X}", v),
    }
}

/// Handshake message type names
pub fn handshake_type_name(msg_type: u8) -> String {
    let name = match msg_type {
        0 => "HelloRequest",
        1 => "ClientHello",
        2 => "ServerHello",
        4 => "NewSessionTicket",
        5 => "EndOfEarlyData",
        8 => "EncryptedExtensions",
        11 => "Certificate",
        12 => "ServerKeyExchange",
        13 => "CertificateRequest",
        14 => "ServerHelloDone",
        15 => "CertificateVerify",
        16 => "ClientKeyExchange",
        20 => "Finished",
        22 => "CertificateStatus",
        24 => "KeyUpdate",
        _ => return format!("Handshake(0x{:02X})", msg_type),
    };
    name.to_string()
}

/// Cipher suite name, `Unknown_0xXXXX` when not registered
pub fn cipher_suite_name(id: u16) -> String {
    if id & 0x0F0F == 0x0A0A {
        return format!("GREASE_0x{:04X}", id);
    }
    match TlsCipherSuite::from_id(id) {
        Some(suite) => suite.name.to_string(),
        None => match id {
            0x00FF => "TLS_EMPTY_RENEGOTIATION_INFO_SCSV".to_string(),
            0x5600 => "TLS_FALLBACK_SCSV".to_string(),
            _ => format!("Unknown_0x{:04X}", id),
        },
    }
}

/// Extension type names
pub fn extension_name(ext_type: u16) -> String {
    let name = match ext_type {
        0 => "server_name",
        1 => "max_fragment_length",
        5 => "status_request",
        10 => "supported_groups",
        11 => "ec_point_formats",
        13 => "signature_algorithms",
        14 => "use_srtp",
        15 => "heartbeat",
        16 => "application_layer_protocol_negotiation",
        18 => "signed_certificate_timestamp",
        21 => "padding",
        22 => "encrypt_then_mac",
        23 => "extended_master_secret",
        27 => "compress_certificate",
        28 => "record_size_limit",
        35 => "session_ticket",
        41 => "pre_shared_key",
        42 => "early_data",
        43 => "supported_versions",
        44 => "cookie",
        45 => "psk_key_exchange_modes",
        47 => "certificate_authorities",
        49 => "post_handshake_auth",
        50 => "signature_algorithms_cert",
        51 => "key_share",
        0xFF01 => "renegotiation_info",
        t if t & 0x0F0F == 0x0A0A => return format!("GREASE_0x{:04X}", t),
        _ => return format!("unknown_{}", ext_type),
    };
    name.to_string()
}

/// Named group (elliptic curve / finite field) names
pub fn group_name(group: u16) -> String {
    let name = match group {
        19 => "secp192r1",
        21 => "secp224r1",
        23 => "secp256r1",
        24 => "secp384r1",
        25 => "secp521r1",
        26 => "brainpoolP256r1",
        27 => "brainpoolP384r1",
        28 => "brainpoolP512r1",
        29 => "x25519",
        30 => "x448",
        256 => "ffdhe2048",
        257 => "ffdhe3072",
        258 => "ffdhe4096",
        259 => "ffdhe6144",
        260 => "ffdhe8192",
        0x11EC => "X25519MLKEM768",
        g if g & 0x0F0F == 0x0A0A => return format!("GREASE_0x{:04X}", g),
        _ => return format!("group_0x{:04X}", group),
    };
    name.to_string()
}

/// Signature scheme names
pub fn signature_scheme_name(scheme: u16) -> String {
    let name = match scheme {
        0x0201 => "rsa_pkcs1_sha1",
        0x0203 => "ecdsa_sha1",
        0x0401 => "rsa_pkcs1_sha256",
        0x0403 => "ecdsa_secp256r1_sha256",
        0x0501 => "rsa_pkcs1_sha384",
        0x0503 => "ecdsa_secp384r1_sha384",
        0x0601 => "rsa_pkcs1_sha512",
        0x0603 => "ecdsa_secp521r1_sha512",
        0x0804 => "rsa_pss_rsae_sha256",
        0x0805 => "rsa_pss_rsae_sha384",
        0x0806 => "rsa_pss_rsae_sha512",
        0x0807 => "ed25519",
        0x0808 => "ed448",
        0x0809 => "rsa_pss_pss_sha256",
        0x080A => "rsa_pss_pss_sha384",
        0x080B => "rsa_pss_pss_sha512",
        _ => return format!("scheme_0x{:04X}", scheme),
    };
    name.to_string()
}

pub fn ec_point_format_name(format: u8) -> String {
    match format {
        0 => "uncompressed".to_string(),
        1 => "ansiX962_compressed_prime".to_string(),
        2 => "ansiX962_compressed_char2".to_string(),
        f => format!("format_{}", f),
    }
}

/// Alert description names
pub fn alert_description(code: u8) -> String {
    let name = match code {
        0 => "close_notify",
        10 => "unexpected_message",
        20 => "bad_record_mac",
        22 => "record_overflow",
        40 => "handshake_failure",
        42 => "bad_certificate",
        43 => "unsupported_certificate",
        44 => "certificate_revoked",
        45 => "certificate_expired",
        46 => "certificate_unknown",
        47 => "illegal_parameter",
        48 => "unknown_ca",
        49 => "access_denied",
        50 => "decode_error",
        51 => "decrypt_error",
        70 => "protocol_version",
        71 => "insufficient_security",
        80 => "internal_error",
        86 => "inappropriate_fallback",
        90 => "user_canceled",
        109 => "missing_extension",
        110 => "unsupported_extension",
        112 => "unrecognized_name",
        116 => "certificate_required",
        120 => "no_application_protocol",
        _ => return format!("alert_{}", code),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cipher_names() {
        assert_eq!(cipher_suite_name(0xC02F), "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256");
        assert_eq!(cipher_suite_name(0x002F), "TLS_RSA_WITH_AES_128_CBC_SHA");
        assert_eq!(cipher_suite_name(0x1301), "TLS_AES_128_GCM_SHA256");
        assert_eq!(cipher_suite_name(0x00FF), "TLS_EMPTY_RENEGOTIATION_INFO_SCSV");
        assert_eq!(cipher_suite_name(0xFEFE), "Unknown_0xFEFE");
        assert_eq!(cipher_suite_name(0x2A2A), "GREASE_0x2A2A");
    }

    #[test]
    fn test_versions() {
        assert_eq!(version_name(0x0303), "TLS 1.2");
        assert_eq!(version_name(0x0304), "TLS 1.3");
        assert_eq!(version_name(0x1234), "Unknown 0x1234");
    }

    #[test]
    fn test_extension_and_group_names() {
        assert_eq!(extension_name(0), "server_name");
        assert_eq!(extension_name(0xFF01), "renegotiation_info");
        assert_eq!(extension_name(9999), "unknown_9999");
        assert_eq!(group_name(29), "x25519");
        assert_eq!(signature_scheme_name(0x0403), "ecdsa_secp256r1_sha256");
    }
}

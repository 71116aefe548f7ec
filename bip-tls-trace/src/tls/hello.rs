//! Hello message decoders
//!
//! Maps tls-parser's ClientHello and ServerHello contents into report types.
//! Fixed fields must parse; the extension block is walked one extension at a
//! time so a malformed entry costs only that entry.

use serde::Serialize;
use tls_parser::nom::error::Error;
use tls_parser::nom::{Err as NomErr, IResult};
use tls_parser::{
    parse_tls_extension_unknown, TlsClientHelloContents, TlsExtension, TlsServerHelloContents,
};

use super::names;

/// ServerHello random marking a HelloRetryRequest
pub const HELLO_RETRY_REQUEST_RANDOM: [u8; 32] = [
    0xCF, 0x21, 0xAD, 0x74, 0xE5, 0x9A, 0x61, 0x11, 0xBE, 0x1D, 0x8C, 0x02, 0x1E, 0x65, 0xB8, 0x91,
    0xC2, 0xA2, 0x11, 0x16, 0x7A, 0xBB, 0x8C, 0x5E, 0x07, 0x9E, 0x09, 0xE2, 0xC8, 0xA8, 0x33, 0x9C,
];

type ExtensionParser = for<'a> fn(&'a [u8]) -> IResult<&'a [u8], TlsExtension<'a>>;

/// A registry code together with its name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Named {
    pub id: u16,
    pub name: String,
}

impl Named {
    pub(crate) fn new(id: u16, name: fn(u16) -> String) -> Self {
        Named { id, name: name(id) }
    }
}

/// Extension as seen on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extension {
    pub id: u16,
    pub name: String,
    pub length: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientHello {
    pub version: u16,
    pub version_name: String,
    pub random: String,
    pub session_id: String,
    pub cipher_suites: Vec<Named>,
    pub compression_methods: Vec<u8>,
    pub server_name: Option<String>,
    pub supported_groups: Vec<Named>,
    pub signature_algorithms: Vec<Named>,
    pub alpn: Vec<String>,
    pub ec_point_formats: Vec<String>,
    pub renegotiation_info: bool,
    pub supported_versions: Vec<Named>,
    pub extensions: Vec<Extension>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ClientHello {
    /// Highest version offered, preferring supported_versions
    pub fn max_version(&self) -> u16 {
        self.supported_versions
            .iter()
            .map(|v| v.id)
            .filter(|v| v & 0x0F0F != 0x0A0A)
            .max()
            .unwrap_or(self.version)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerHello {
    pub version: u16,
    pub random: String,
    pub session_id: String,
    pub cipher_suite: Named,
    pub compression_method: u8,
    pub extensions: Vec<Extension>,
    /// Version selected through supported_versions, when present
    pub selected_version: Option<u16>,
    /// Legacy version unless supported_versions overrides it
    pub negotiated_version: u16,
    pub negotiated_version_name: String,
    pub alpn: Option<String>,
    pub key_share_group: Option<Named>,
    pub hello_retry_request: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

fn random_bytes(rand_time: u32, rand_data: &[u8]) -> Vec<u8> {
    let mut random = rand_time.to_be_bytes().to_vec();
    random.extend_from_slice(rand_data);
    random
}

/// Build a ClientHello report from parsed contents and the raw body
pub(crate) fn client_hello(contents: &TlsClientHelloContents<'_>, body: &[u8]) -> ClientHello {
    let version = contents.version.0;
    let session_id = contents.session_id.unwrap_or_default();
    let mut hello = ClientHello {
        version,
        version_name: names::version_name(version),
        random: hex::encode(random_bytes(contents.rand_time, contents.rand_data)),
        session_id: hex::encode(session_id),
        cipher_suites: contents
            .ciphers
            .iter()
            .map(|suite| Named::new(suite.0, names::cipher_suite_name))
            .collect(),
        compression_methods: contents.comp.iter().map(|method| method.0).collect(),
        ..Default::default()
    };

    let fixed_len = 2 + 32 + 1 + session_id.len() + 2 + 2 * contents.ciphers.len() + 1 + contents.comp.len();
    let block = extension_block("ClientHello", contents.ext, body, fixed_len, &mut hello.warnings);
    let decoded = walk_extensions(
        "ClientHello",
        block,
        tls_parser::parse_tls_client_hello_extension,
        &mut hello.extensions,
        &mut hello.warnings,
    );
    for extension in decoded {
        match extension {
            TlsExtension::SNI(entries) => {
                hello.server_name = entries
                    .iter()
                    .find(|(name_type, _)| name_type.0 == 0)
                    .map(|(_, name)| String::from_utf8_lossy(name).into_owned());
            }
            TlsExtension::EllipticCurves(groups) => {
                hello.supported_groups = groups.iter().map(|g| Named::new(g.0, names::group_name)).collect();
            }
            TlsExtension::SignatureAlgorithms(schemes) => {
                hello.signature_algorithms = schemes
                    .iter()
                    .map(|&scheme| Named::new(scheme, names::signature_scheme_name))
                    .collect();
            }
            TlsExtension::ALPN(protocols) => hello.alpn = protocol_names(&protocols),
            TlsExtension::EcPointFormats(formats) => {
                hello.ec_point_formats = formats.iter().map(|&f| names::ec_point_format_name(f)).collect();
            }
            TlsExtension::RenegotiationInfo(_) => hello.renegotiation_info = true,
            TlsExtension::SupportedVersions(versions) => {
                hello.supported_versions = versions.iter().map(|v| Named::new(v.0, names::version_name)).collect();
            }
            _ => {}
        }
    }
    hello
}

/// Build a ServerHello report from parsed contents and the raw body
pub(crate) fn server_hello(contents: &TlsServerHelloContents<'_>, body: &[u8]) -> ServerHello {
    let version = contents.version.0;
    let session_id = contents.session_id.unwrap_or_default();
    let random = random_bytes(contents.rand_time, contents.rand_data);
    let mut hello = ServerHello {
        version,
        session_id: hex::encode(session_id),
        cipher_suite: Named::new(contents.cipher.0, names::cipher_suite_name),
        compression_method: contents.compression.0,
        hello_retry_request: random == HELLO_RETRY_REQUEST_RANDOM,
        random: hex::encode(random),
        ..Default::default()
    };

    let fixed_len = 2 + 32 + 1 + session_id.len() + 2 + 1;
    let block = extension_block("ServerHello", contents.ext, body, fixed_len, &mut hello.warnings);
    let decoded = walk_extensions(
        "ServerHello",
        block,
        tls_parser::parse_tls_server_hello_extension,
        &mut hello.extensions,
        &mut hello.warnings,
    );
    for extension in decoded {
        match extension {
            TlsExtension::SupportedVersions(versions) => hello.selected_version = versions.first().map(|v| v.0),
            TlsExtension::ALPN(protocols) => hello.alpn = protocol_names(&protocols).into_iter().next(),
            TlsExtension::KeyShare(entry) => match entry {
                [hi, lo, ..] => {
                    hello.key_share_group = Some(Named::new(u16::from_be_bytes([*hi, *lo]), names::group_name));
                }
                _ => hello
                    .warnings
                    .push(format!("ServerHello key_share: {} bytes, no group", entry.len())),
            },
            _ => {}
        }
    }

    hello.negotiated_version = hello.selected_version.unwrap_or(version);
    hello.negotiated_version_name = names::version_name(hello.negotiated_version);
    hello
}

fn protocol_names(protocols: &[&[u8]]) -> Vec<String> {
    protocols
        .iter()
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .collect()
}

/// The extension block, or whatever follows its length when the declared
/// length overruns the body
fn extension_block<'a>(
    message: &str,
    parsed: Option<&'a [u8]>,
    body: &'a [u8],
    fixed_len: usize,
    warnings: &mut Vec<String>,
) -> &'a [u8] {
    if let Some(block) = parsed {
        return block;
    }
    match body.get(fixed_len..).unwrap_or_default() {
        [] => &[],
        [hi, lo, rest @ ..] => {
            warnings.push(format!(
                "{} extension block declares {} bytes, {} present",
                message,
                u16::from_be_bytes([*hi, *lo]),
                rest.len()
            ));
            rest
        }
        [_] => {
            warnings.push(format!("{} ends with a stray byte after its fixed fields", message));
            &[]
        }
    }
}

/// Frame each extension, then decode it with `parse`
///
/// A body that fails to decode is recorded and skipped; framing errors end
/// the walk since the next extension boundary is unknown.
fn walk_extensions<'a>(
    message: &str,
    mut block: &'a [u8],
    parse: ExtensionParser,
    extensions: &mut Vec<Extension>,
    warnings: &mut Vec<String>,
) -> Vec<TlsExtension<'a>> {
    let mut decoded = Vec::new();
    while !block.is_empty() {
        let (rest, id, data) = match parse_tls_extension_unknown(block) {
            Ok((rest, TlsExtension::Unknown(id, data))) => (rest, id.0, data),
            _ => {
                warnings.push(format!(
                    "{} extensions: {} trailing bytes do not frame an extension",
                    message,
                    block.len()
                ));
                break;
            }
        };
        extensions.push(Extension {
            id,
            name: names::extension_name(id),
            length: data.len(),
        });

        let raw = &block[..block.len() - rest.len()];
        match parse(raw) {
            Ok((_, extension)) => decoded.push(extension),
            Err(e) => warnings.push(format!(
                "{} {} extension: {}",
                message,
                names::extension_name(id),
                nom_reason(&e)
            )),
        }
        block = rest;
    }
    decoded
}

fn nom_reason(err: &NomErr<Error<&[u8]>>) -> String {
    match err {
        NomErr::Incomplete(_) => "truncated".to_string(),
        NomErr::Error(e) | NomErr::Failure(e) => format!("malformed ({:?})", e.code),
    }
}

//! TLS protocol handling: library setup, capability enumeration, probing

pub mod capability;
pub mod probe;

use once_cell::sync::OnceCell;
use openssl::ssl::SslVersion;
use serde::{Deserialize, Serialize};

static TLS_INIT: OnceCell<()> = OnceCell::new();

/// Initialise the TLS library once for the whole process.
///
/// Must run before any capability table build or probe. Calling it again
/// is a no-op.
pub fn init() {
    TLS_INIT.get_or_init(|| {
        openssl::init();
        log::debug!("TLS library initialised");
    });
}

/// Protocol versions the auditor knows how to probe, oldest first.
///
/// SSLv2 is not represented: current TLS libraries cannot speak it at all.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum TlsProtocol {
    #[serde(rename = "SSLv3")]
    Ssl3,
    #[serde(rename = "TLSv1")]
    Tls1,
    #[serde(rename = "TLSv1.1")]
    Tls11,
    #[serde(rename = "TLSv1.2")]
    Tls12,
    #[serde(rename = "TLSv1.3")]
    Tls13,
}

impl TlsProtocol {
    /// All supported protocols in probing order
    pub const ALL: [TlsProtocol; 5] = [
        TlsProtocol::Ssl3,
        TlsProtocol::Tls1,
        TlsProtocol::Tls11,
        TlsProtocol::Tls12,
        TlsProtocol::Tls13,
    ];

    /// Get the display name of the protocol version
    pub fn name(&self) -> &'static str {
        match self {
            TlsProtocol::Ssl3 => "SSLv3",
            TlsProtocol::Tls1 => "TLSv1",
            TlsProtocol::Tls11 => "TLSv1.1",
            TlsProtocol::Tls12 => "TLSv1.2",
            TlsProtocol::Tls13 => "TLSv1.3",
        }
    }

    /// Version constant understood by the TLS library
    pub fn version(&self) -> SslVersion {
        match self {
            TlsProtocol::Ssl3 => SslVersion::SSL3,
            TlsProtocol::Tls1 => SslVersion::TLS1,
            TlsProtocol::Tls11 => SslVersion::TLS1_1,
            TlsProtocol::Tls12 => SslVersion::TLS1_2,
            TlsProtocol::Tls13 => SslVersion::TLS1_3,
        }
    }

    /// TLS 1.3 negotiates its suites through a separate configuration
    /// channel than the classic cipher list
    pub fn uses_ciphersuites(&self) -> bool {
        matches!(self, TlsProtocol::Tls13)
    }
}

impl std::fmt::Display for TlsProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One cipher suite as reported by the TLS library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherDescriptor {
    /// Cipher suite name in the library's notation
    pub name: String,
    /// Protocol version string the library associates with the suite
    pub version: String,
    /// Secret key bits
    pub bits: i32,
}

impl CipherDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>, bits: i32) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            bits,
        }
    }
}

impl std::fmt::Display for CipherDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} bits)", self.name, self.bits)
    }
}

//! Capability table: what the local TLS library can offer per protocol

use crate::error::AuditError;
use crate::tls::{CipherDescriptor, TlsProtocol};
use openssl::error::ErrorStack;
use openssl::ssl::{Ssl, SslContext, SslMethod};
use std::collections::BTreeMap;

/// Cipher list pattern selecting every suite the library knows about
pub const MAXIMAL_CIPHER_LIST: &str = "ALL:COMPLEMENTOFALL";

/// Map from protocol version to the cipher suites the local library is
/// willing to negotiate for it.
///
/// Built once before the worker pool starts and shared read-only from then
/// on; there are no mutating methods. Iteration order is fixed (oldest
/// protocol first) and every supported protocol has a key, even when its
/// cipher list came back empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapabilityTable {
    entries: BTreeMap<TlsProtocol, Vec<CipherDescriptor>>,
}

impl CapabilityTable {
    /// Enumerate the local library's capabilities for every protocol.
    ///
    /// A context or session that cannot be constructed makes the whole
    /// build fail; a protocol version the library was built without is
    /// recorded with an empty cipher list instead.
    pub fn build() -> crate::Result<Self> {
        crate::tls::init();

        let mut entries = BTreeMap::new();
        for protocol in TlsProtocol::ALL {
            let ciphers = enumerate_protocol(protocol)?;
            log::debug!("{}: {} negotiable cipher(s)", protocol.name(), ciphers.len());
            entries.insert(protocol, ciphers);
        }

        Ok(Self { entries })
    }

    /// Build a table from explicit entries
    pub fn from_entries(
        entries: impl IntoIterator<Item = (TlsProtocol, Vec<CipherDescriptor>)>,
    ) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Protocols with their cipher lists, oldest protocol first
    pub fn iter(&self) -> impl Iterator<Item = (TlsProtocol, &[CipherDescriptor])> {
        self.entries.iter().map(|(p, c)| (*p, c.as_slice()))
    }

    /// Protocols present in the table, oldest first
    pub fn protocols(&self) -> impl Iterator<Item = TlsProtocol> + '_ {
        self.entries.keys().copied()
    }

    /// Cipher suites recorded for one protocol
    pub fn ciphers(&self, protocol: TlsProtocol) -> &[CipherDescriptor] {
        self.entries
            .get(&protocol)
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of handshakes one host audit will attempt
    pub fn probe_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.probe_count() == 0
    }
}

fn enumerate_protocol(protocol: TlsProtocol) -> crate::Result<Vec<CipherDescriptor>> {
    let mut builder = SslContext::builder(SslMethod::tls_client())
        .map_err(|e| setup_error(protocol, "context builder", e))?;

    if builder
        .set_min_proto_version(Some(protocol.version()))
        .is_err()
        || builder
            .set_max_proto_version(Some(protocol.version()))
            .is_err()
    {
        // Library built without this protocol version
        log::debug!("{} unavailable in the linked TLS library", protocol.name());
        return Ok(Vec::new());
    }

    builder
        .set_cipher_list(MAXIMAL_CIPHER_LIST)
        .map_err(|e| setup_error(protocol, "cipher list", e))?;
    let ctx = builder.build();

    let ssl = Ssl::new(&ctx).map_err(|e| setup_error(protocol, "session", e))?;

    // The library reports TLS 1.3 suites and pre-1.3 ciphers in one stack;
    // only the side matching the pinned version is negotiable here.
    let pinned_13 = protocol.uses_ciphersuites();
    let ciphers = ssl
        .ciphers()
        .iter()
        .filter(|c| (c.version() == "TLSv1.3") == pinned_13)
        .map(|c| CipherDescriptor::new(c.name(), c.version(), c.bits().secret))
        .collect();

    Ok(ciphers)
}

fn setup_error(protocol: TlsProtocol, stage: &str, err: ErrorStack) -> AuditError {
    AuditError::ConfigError(format!(
        "{}: {} setup failed: {}",
        protocol.name(),
        stage,
        err
    ))
}

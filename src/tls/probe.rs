//! Single-cipher handshake probes against remote endpoints

use crate::tls::{CipherDescriptor, TlsProtocol};
use async_trait::async_trait;
use openssl::error::ErrorStack;
use openssl::ssl::{HandshakeError, SslConnector, SslMethod, SslVerifyMode};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Result of offering one cipher to one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeOutcome {
    /// Handshake completed with the offered cipher
    Accepted,
    /// Endpoint declined the handshake
    Rejected,
    /// Transport connection could not be established
    ConnectionFailed,
    /// Probe could not be set up or run to completion
    Error(String),
}

impl ProbeOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            ProbeOutcome::Accepted => "accepted",
            ProbeOutcome::Rejected => "rejected",
            ProbeOutcome::ConnectionFailed => "connection-failed",
            ProbeOutcome::Error(_) => "error",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ProbeOutcome::Accepted)
    }

    /// Failure detail for error outcomes
    pub fn detail(&self) -> Option<&str> {
        match self {
            ProbeOutcome::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where a probe dials: resolved address plus the server name offered
/// during the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub host: String,
    pub addr: SocketAddr,
}

impl ProbeTarget {
    pub fn new(host: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            host: host.into(),
            addr,
        }
    }
}

/// Offers a single (protocol, cipher) pair to an endpoint
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(
        &self,
        target: &ProbeTarget,
        protocol: TlsProtocol,
        cipher: &CipherDescriptor,
    ) -> ProbeOutcome;
}

/// Prober that performs a real TLS handshake restricted to one cipher
#[derive(Debug, Clone)]
pub struct HandshakeProber {
    connect_timeout: Duration,
    handshake_timeout: Duration,
}

impl HandshakeProber {
    pub fn new(connect_timeout: Duration, handshake_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            handshake_timeout,
        }
    }
}

impl Default for HandshakeProber {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000), Duration::from_millis(5000))
    }
}

#[async_trait]
impl Prober for HandshakeProber {
    async fn probe(
        &self,
        target: &ProbeTarget,
        protocol: TlsProtocol,
        cipher: &CipherDescriptor,
    ) -> ProbeOutcome {
        // Each probe dials its own connection: a handshake attempt consumes
        // the transport whether it succeeds or not.
        let stream = match timeout(self.connect_timeout, TcpStream::connect(target.addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                log::debug!("probe connect to {} failed: {}", target.addr, e);
                return ProbeOutcome::ConnectionFailed;
            }
            Err(_) => {
                log::debug!(
                    "probe connect to {} timed out after {:?}",
                    target.addr,
                    self.connect_timeout
                );
                return ProbeOutcome::ConnectionFailed;
            }
        };

        // The handshake runs on a blocking socket with read/write deadlines
        let std_stream = match stream.into_std() {
            Ok(s) => s,
            Err(e) => return ProbeOutcome::Error(format!("stream conversion failed: {e}")),
        };
        if let Err(e) = std_stream.set_nonblocking(false) {
            return ProbeOutcome::Error(format!("stream conversion failed: {e}"));
        }
        let _ = std_stream.set_read_timeout(Some(self.handshake_timeout));
        let _ = std_stream.set_write_timeout(Some(self.handshake_timeout));

        let connector = match build_connector(protocol, cipher) {
            Ok(c) => c,
            Err(e) => return ProbeOutcome::Error(format!("probe setup failed: {e}")),
        };

        let server_name = target.host.clone();
        let handshake =
            tokio::task::spawn_blocking(move || run_handshake(&connector, &server_name, std_stream));

        match handshake.await {
            Ok(outcome) => outcome,
            Err(e) => ProbeOutcome::Error(format!("probe task failed: {e}")),
        }
    }
}

fn build_connector(
    protocol: TlsProtocol,
    cipher: &CipherDescriptor,
) -> Result<SslConnector, ErrorStack> {
    let mut builder = SslConnector::builder(SslMethod::tls())?;

    // Capability probing, not trust evaluation
    builder.set_verify(SslVerifyMode::NONE);

    builder.set_min_proto_version(Some(protocol.version()))?;
    builder.set_max_proto_version(Some(protocol.version()))?;

    if protocol.uses_ciphersuites() {
        builder.set_ciphersuites(&cipher.name)?;
    } else {
        builder.set_cipher_list(&cipher.name)?;
    }

    Ok(builder.build())
}

fn run_handshake(
    connector: &SslConnector,
    server_name: &str,
    stream: std::net::TcpStream,
) -> ProbeOutcome {
    match connector.connect(server_name, stream) {
        Ok(mut tls) => {
            let _ = tls.shutdown();
            ProbeOutcome::Accepted
        }
        Err(HandshakeError::SetupFailure(stack)) => {
            ProbeOutcome::Error(format!("handshake setup failed: {stack}"))
        }
        Err(HandshakeError::Failure(mid)) => {
            let err = mid.error();
            match err.io_error() {
                Some(io)
                    if io.kind() == std::io::ErrorKind::WouldBlock
                        || io.kind() == std::io::ErrorKind::TimedOut =>
                {
                    ProbeOutcome::Error(format!("handshake timed out: {io}"))
                }
                _ => {
                    // Alerts and mid-handshake closes both mean the peer
                    // would not take this cipher
                    log::debug!("handshake declined by {}: {}", server_name, err);
                    ProbeOutcome::Rejected
                }
            }
        }
        Err(HandshakeError::WouldBlock(_)) => {
            ProbeOutcome::Error("handshake timed out".to_string())
        }
    }
}

//! Ciphersweep - concurrent TLS capability auditor
//!
//! Enumerates the protocol versions and cipher suites the local TLS library
//! can offer, then probes remote hosts to find out which of those ciphers
//! each host actually accepts. Hosts are audited concurrently by a bounded
//! worker pool; every outcome, including per-host failures, ends up in the
//! final report rather than on a side channel.

pub mod config;
pub mod error;
pub mod net;
pub mod output;
pub mod scanner;
pub mod tls;

// Re-export commonly used types
pub use config::AuditConfig;
pub use error::{AuditError, AuditResult, ErrorKind};
pub use net::{AddressFamily, Connection, Endpoint};
pub use scanner::engine::AuditEngine;
pub use scanner::{AuditReport, HostReport, HostStatus, ProbeRecord};
pub use tls::capability::CapabilityTable;
pub use tls::probe::{ProbeOutcome, ProbeTarget};
pub use tls::{CipherDescriptor, TlsProtocol};

pub type Result<T> = std::result::Result<T, AuditError>;

//! Audit orchestration: per-host reports and the worker pool engine

pub mod engine;

use crate::tls::probe::ProbeOutcome;
use crate::tls::{CipherDescriptor, TlsProtocol};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use engine::AuditEngine;

/// One probe outcome for a (protocol, cipher) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub protocol: TlsProtocol,
    pub cipher: CipherDescriptor,
    pub outcome: ProbeOutcome,
}

/// Terminal state of one host's audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostStatus {
    /// Probing ran to completion
    Scanned,
    /// Host name could not be resolved; no probes were attempted
    ResolutionFailed(String),
    /// No endpoint accepted a connection; no probes were attempted
    ConnectionFailed(String),
    /// Worker stopped before finishing, e.g. on cancellation
    Aborted(String),
}

impl HostStatus {
    pub fn name(&self) -> &'static str {
        match self {
            HostStatus::Scanned => "scanned",
            HostStatus::ResolutionFailed(_) => "resolution-failed",
            HostStatus::ConnectionFailed(_) => "connection-failed",
            HostStatus::Aborted(_) => "aborted",
        }
    }

    /// Failure message for non-scanned states
    pub fn detail(&self) -> Option<&str> {
        match self {
            HostStatus::Scanned => None,
            HostStatus::ResolutionFailed(msg)
            | HostStatus::ConnectionFailed(msg)
            | HostStatus::Aborted(msg) => Some(msg),
        }
    }

    pub fn is_scanned(&self) -> bool {
        matches!(self, HostStatus::Scanned)
    }
}

impl std::fmt::Display for HostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.detail() {
            Some(msg) => write!(f, "{}: {}", self.name(), msg),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// Everything learned about one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostReport {
    /// Host as given on the command line
    pub host: String,

    /// How the audit of this host ended
    pub status: HostStatus,

    /// Probe outcomes in capability table order
    pub probes: Vec<ProbeRecord>,

    /// Wall time spent on this host
    pub duration: Duration,
}

impl HostReport {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            status: HostStatus::Scanned,
            probes: Vec::new(),
            duration: Duration::from_millis(0),
        }
    }

    /// Report for a host whose audit ended before any probe ran
    pub fn failed(host: impl Into<String>, status: HostStatus) -> Self {
        Self {
            host: host.into(),
            status,
            probes: Vec::new(),
            duration: Duration::from_millis(0),
        }
    }

    /// Record one probe outcome
    pub fn add_probe(
        &mut self,
        protocol: TlsProtocol,
        cipher: CipherDescriptor,
        outcome: ProbeOutcome,
    ) {
        self.probes.push(ProbeRecord {
            protocol,
            cipher,
            outcome,
        });
    }

    /// Probes the endpoint accepted
    pub fn accepted(&self) -> impl Iterator<Item = &ProbeRecord> {
        self.probes.iter().filter(|p| p.outcome.is_accepted())
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted().count()
    }

    /// Probes recorded for one protocol, in table order
    pub fn probes_for(&self, protocol: TlsProtocol) -> impl Iterator<Item = &ProbeRecord> {
        self.probes.iter().filter(move |p| p.protocol == protocol)
    }
}

/// Full result of one audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    /// Host reports in submission order
    pub hosts: Vec<HostReport>,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Total wall time of the run
    pub duration: Duration,
}

impl AuditReport {
    pub fn new() -> Self {
        Self {
            hosts: Vec::new(),
            started_at: Utc::now(),
            duration: Duration::from_millis(0),
        }
    }

    pub fn add_host(&mut self, report: HostReport) {
        self.hosts.push(report);
    }

    /// Accepted probes across all hosts
    pub fn total_accepted(&self) -> usize {
        self.hosts.iter().map(|h| h.accepted_count()).sum()
    }

    /// Hosts whose audit ran to completion
    pub fn scanned_count(&self) -> usize {
        self.hosts.iter().filter(|h| h.status.is_scanned()).count()
    }

    /// Hosts that failed before probing
    pub fn failed_count(&self) -> usize {
        self.hosts.len() - self.scanned_count()
    }
}

impl Default for AuditReport {
    fn default() -> Self {
        Self::new()
    }
}

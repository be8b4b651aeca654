//! Bounded worker pool that drives per-host audit pipelines

use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::net::{AddressFamily, Connector, Resolver, SystemResolver, TcpConnector};
use crate::scanner::{AuditReport, HostReport, HostStatus};
use crate::tls::capability::CapabilityTable;
use crate::tls::probe::{HandshakeProber, ProbeTarget, Prober};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Main audit engine.
///
/// Construction validates the configuration and builds the capability
/// table; from then on the table is shared read-only with every worker.
pub struct AuditEngine {
    config: AuditConfig,
    table: Arc<CapabilityTable>,
    resolver: Arc<dyn Resolver>,
    connector: Arc<dyn Connector>,
    prober: Arc<dyn Prober>,
    cancel: CancellationToken,
}

impl AuditEngine {
    /// Create a new audit engine with system-backed components
    pub fn new(config: AuditConfig) -> crate::Result<Self> {
        config.validate()?;

        crate::tls::init();
        let table = CapabilityTable::build()?;
        if table.is_empty() {
            return Err(AuditError::ConfigError(
                "TLS library reports no negotiable ciphers".to_string(),
            ));
        }

        let resolver = Arc::new(SystemResolver::new(config.dns_timeout_duration()));
        let connector = Arc::new(TcpConnector::new(config.connect_timeout_duration()));
        let prober = Arc::new(HandshakeProber::new(
            config.connect_timeout_duration(),
            config.handshake_timeout_duration(),
        ));

        Ok(Self {
            config,
            table: Arc::new(table),
            resolver,
            connector,
            prober,
            cancel: CancellationToken::new(),
        })
    }

    /// Replace the capability table, mainly for tests
    pub fn with_table(mut self, table: CapabilityTable) -> Self {
        self.table = Arc::new(table);
        self
    }

    /// Replace the resolver component
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the connector component
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Replace the prober component
    pub fn with_prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = prober;
        self
    }

    /// Use an externally controlled cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Capability table the engine probes from
    pub fn table(&self) -> &CapabilityTable {
        &self.table
    }

    /// Audit every configured host and collect one report per host.
    ///
    /// At most `concurrency` hosts are in flight at a time. The report
    /// lists hosts in submission order no matter how the workers finish.
    pub async fn run(&self) -> crate::Result<AuditReport> {
        let start_time = Instant::now();
        let mut report = AuditReport::new();

        log::info!(
            "Auditing {} host(s) with {} worker(s), {} probe(s) per host",
            self.config.hosts.len(),
            self.config.concurrency,
            self.table.probe_count()
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut handles = Vec::with_capacity(self.config.hosts.len());

        for host in &self.config.hosts {
            if self.cancel.is_cancelled() {
                // Hosts never submitted still get a report
                handles.push((host.clone(), None));
                continue;
            }

            let permit = semaphore.clone().acquire_owned().await.unwrap();
            let task = HostTask {
                host: host.clone(),
                service: self.config.service.clone(),
                family: self.config.family,
                resolver: self.resolver.clone(),
                connector: self.connector.clone(),
                prober: self.prober.clone(),
                table: self.table.clone(),
                cancel: self.cancel.clone(),
            };

            let handle = tokio::spawn(async move {
                let _permit = permit; // Keep permit alive
                task.run().await
            });

            handles.push((host.clone(), Some(handle)));
        }

        // Join in submission order so the report order is stable
        for (host, handle) in handles {
            match handle {
                None => {
                    report.add_host(HostReport::failed(
                        host,
                        HostStatus::Aborted("cancelled before start".to_string()),
                    ));
                }
                Some(handle) => match handle.await {
                    Ok(host_report) => report.add_host(host_report),
                    Err(e) => {
                        log::error!("Worker for {} did not finish: {}", host, e);
                        report.add_host(HostReport::failed(
                            host,
                            HostStatus::Aborted(format!("worker failed: {e}")),
                        ));
                    }
                },
            }
        }

        report.duration = start_time.elapsed();
        log::info!(
            "Audit finished in {:.2}s: {} host(s) scanned, {} failed, {} cipher(s) accepted",
            report.duration.as_secs_f64(),
            report.scanned_count(),
            report.failed_count(),
            report.total_accepted()
        );

        Ok(report)
    }
}

impl std::fmt::Debug for AuditEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditEngine")
            .field("config", &self.config)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Everything one worker needs to audit a single host
struct HostTask {
    host: String,
    service: String,
    family: AddressFamily,
    resolver: Arc<dyn Resolver>,
    connector: Arc<dyn Connector>,
    prober: Arc<dyn Prober>,
    table: Arc<CapabilityTable>,
    cancel: CancellationToken,
}

impl HostTask {
    /// Resolve, connect once as a reachability gate, then offer every
    /// cipher in the capability table. All failures end up in the report.
    async fn run(self) -> HostReport {
        let start_time = Instant::now();
        let mut report = HostReport::new(self.host.clone());

        if self.cancel.is_cancelled() {
            report.status = HostStatus::Aborted("cancelled before start".to_string());
            return report;
        }

        let endpoints = match self
            .resolver
            .resolve(&self.host, &self.service, self.family)
            .await
        {
            Ok(endpoints) => endpoints,
            Err(e) => {
                log::warn!("{}: {}", self.host, e);
                report.status = HostStatus::ResolutionFailed(e.to_string());
                report.duration = start_time.elapsed();
                return report;
            }
        };

        let connection = match self.connector.connect(&endpoints).await {
            Ok(connection) => connection,
            Err(e) => {
                log::warn!("{}: {}", self.host, e);
                report.status = HostStatus::ConnectionFailed(e.to_string());
                report.duration = start_time.elapsed();
                return report;
            }
        };

        let endpoint = connection.endpoint().clone();
        let server_name = endpoint
            .canonical_name
            .clone()
            .unwrap_or_else(|| self.host.clone());
        let target = ProbeTarget::new(server_name, endpoint.addr);
        log::debug!("{}: gate connection to {} established", self.host, endpoint);

        // The gate connection only proves reachability; every probe dials
        // its own connection, so release this one before probing starts.
        drop(connection);

        'protocols: for (protocol, ciphers) in self.table.iter() {
            for cipher in ciphers {
                if self.cancel.is_cancelled() {
                    report.status = HostStatus::Aborted("cancelled".to_string());
                    break 'protocols;
                }

                let outcome = self.prober.probe(&target, protocol, cipher).await;
                log::debug!(
                    "{}: {} {} -> {}",
                    self.host,
                    protocol.name(),
                    cipher.name,
                    outcome
                );
                report.add_probe(protocol, cipher.clone(), outcome);
            }
        }

        report.duration = start_time.elapsed();
        if report.status.is_scanned() {
            log::info!(
                "{}: {} of {} cipher(s) accepted in {:.2}s",
                self.host,
                report.accepted_count(),
                report.probes.len(),
                report.duration.as_secs_f64()
            );
        }
        report
    }
}

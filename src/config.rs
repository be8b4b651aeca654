//! Configuration module for the ciphersweep auditor

use crate::net::AddressFamily;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for audit runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Hosts to audit, in the order results should be reported
    pub hosts: Vec<String>,

    /// Service to connect to, as a decimal port number
    pub service: String,

    /// Number of hosts audited concurrently
    pub concurrency: usize,

    /// Restrict resolution to one address family
    pub family: AddressFamily,

    /// Timeout for resolving one host, in milliseconds
    pub dns_timeout: u64,

    /// Timeout for each TCP connection attempt, in milliseconds
    pub connect_timeout: u64,

    /// Timeout for each TLS handshake, in milliseconds
    pub handshake_timeout: u64,

    /// Verbosity level (0 = warnings, 1 = info, 2 = debug, 3 = trace)
    pub verbosity: u8,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            service: "443".to_string(), // HTTPS is the usual audit target
            concurrency: 5,
            family: AddressFamily::Any,
            dns_timeout: 5000,
            connect_timeout: 3000,
            handshake_timeout: 5000,
            verbosity: 0,
        }
    }
}

impl AuditConfig {
    /// Create a new audit configuration for the given hosts
    pub fn new(hosts: Vec<String>) -> Self {
        Self {
            hosts,
            ..Default::default()
        }
    }

    /// Set the service port
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Set the number of concurrent host audits
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Restrict resolution to one address family
    pub fn with_family(mut self, family: AddressFamily) -> Self {
        self.family = family;
        self
    }

    /// Set the TCP connect timeout in milliseconds
    pub fn with_connect_timeout(mut self, timeout: u64) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the TLS handshake timeout in milliseconds
    pub fn with_handshake_timeout(mut self, timeout: u64) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the DNS resolution timeout in milliseconds
    pub fn with_dns_timeout(mut self, timeout: u64) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// Get the DNS timeout as Duration
    pub fn dns_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.dns_timeout)
    }

    /// Get the connect timeout as Duration
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }

    /// Get the handshake timeout as Duration
    pub fn handshake_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            crate::AuditError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: AuditConfig = toml::from_str(&content)
            .map_err(|e| crate::AuditError::ConfigError(format!("Failed to parse TOML: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from the default location
    pub fn load_default_config() -> Self {
        // Try to load from ~/.ciphersweep.toml
        let home_dir = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));

        let config_path = home_dir.join(".ciphersweep.toml");

        if config_path.exists() {
            if let Ok(config) = Self::from_toml_file(&config_path) {
                log::info!("Loaded config from {}", config_path.display());
                return config;
            }
        }

        // Return default config if no file found
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.hosts.is_empty() {
            return Err(crate::AuditError::InvalidArgument(
                "No hosts specified".to_string(),
            ));
        }

        if self.hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(crate::AuditError::InvalidArgument(
                "Host names cannot be empty".to_string(),
            ));
        }

        if self.service.parse::<u16>().is_err() {
            return Err(crate::AuditError::InvalidArgument(format!(
                "Service must be a port number, got '{}'",
                self.service
            )));
        }

        if self.concurrency == 0 {
            return Err(crate::AuditError::InvalidArgument(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        if self.dns_timeout == 0 || self.connect_timeout == 0 || self.handshake_timeout == 0 {
            return Err(crate::AuditError::InvalidArgument(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

//! Host name resolution with family filtering and ordered candidates

use crate::error::AuditError;
use crate::net::{AddressFamily, Endpoint};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

static HOSTNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9._-]*[A-Za-z0-9])?$").unwrap());

/// Turns a host name into candidate endpoints.
///
/// Implementations must keep the resolver's preference order and must never
/// return an empty list on success: zero usable addresses is a resolution
/// error, not an empty result.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(
        &self,
        host: &str,
        service: &str,
        family: AddressFamily,
    ) -> crate::Result<Vec<Endpoint>>;
}

/// Resolver backed by the operating system's name service
#[derive(Debug, Clone)]
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000))
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(
        &self,
        host: &str,
        service: &str,
        family: AddressFamily,
    ) -> crate::Result<Vec<Endpoint>> {
        let host = host.trim();
        if host.is_empty() {
            return Err(AuditError::InvalidArgument(
                "Host name cannot be empty".to_string(),
            ));
        }

        let port: u16 = service.parse().map_err(|_| {
            AuditError::InvalidArgument(format!("Service must be a port number, got '{service}'"))
        })?;

        // Address literals skip the system resolver entirely
        if let Ok(ip) = host.parse::<IpAddr>() {
            if !family.matches(&ip) {
                return Err(AuditError::ResolutionError(format!(
                    "{host} is not an {family} address"
                )));
            }
            return Ok(vec![Endpoint::new(SocketAddr::new(ip, port))]);
        }

        if host.len() > 253 || !HOSTNAME_RE.is_match(host) {
            return Err(AuditError::InvalidArgument(format!(
                "Invalid host name '{host}'"
            )));
        }

        let query = format!("{host}:{port}");
        let addrs = match tokio::time::timeout(self.timeout, tokio::net::lookup_host(query)).await {
            Ok(Ok(addrs)) => addrs,
            Ok(Err(e)) => {
                return Err(AuditError::ResolutionError(format!("{host}: {e}")));
            }
            Err(_) => {
                return Err(AuditError::ResolutionError(format!(
                    "{host}: resolution timed out"
                )));
            }
        };

        let endpoints: Vec<Endpoint> = addrs
            .filter(|addr| family.matches(&addr.ip()))
            .map(|addr| Endpoint::new(addr).with_canonical_name(host))
            .collect();

        if endpoints.is_empty() {
            return Err(AuditError::ResolutionError(format!(
                "{host}: no {family} addresses found"
            )));
        }

        log::debug!("{} resolved to {} address(es)", host, endpoints.len());
        Ok(endpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_ipv4_literal_bypasses_lookup() {
        let resolver = SystemResolver::default();
        let endpoints = resolver
            .resolve("192.0.2.7", "443", AddressFamily::Any)
            .await
            .unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].addr, "192.0.2.7:443".parse().unwrap());
        assert!(endpoints[0].canonical_name.is_none());
    }

    #[tokio::test]
    async fn test_ipv6_literal_bypasses_lookup() {
        let resolver = SystemResolver::default();
        let endpoints = resolver
            .resolve("2001:db8::1", "8443", AddressFamily::V6)
            .await
            .unwrap();
        assert_eq!(endpoints[0].addr, "[2001:db8::1]:8443".parse().unwrap());
    }

    #[tokio::test]
    async fn test_literal_family_mismatch_is_resolution_error() {
        let resolver = SystemResolver::default();
        let err = resolver
            .resolve("192.0.2.7", "443", AddressFamily::V6)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }

    #[tokio::test]
    async fn test_bad_service_is_invalid_argument() {
        let resolver = SystemResolver::default();
        let err = resolver
            .resolve("example.com", "https", AddressFamily::Any)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_bad_host_name_is_invalid_argument() {
        let resolver = SystemResolver::default();
        let err = tokio_test::block_on(resolver.resolve(
            "bad host name!",
            "443",
            AddressFamily::Any,
        ))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err =
            tokio_test::block_on(resolver.resolve("", "443", AddressFamily::Any)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}

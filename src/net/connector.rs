//! Connection establishment with ordered endpoint fallback

use crate::error::AuditError;
use crate::net::{Connection, Endpoint};
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Establishes one connection from an ordered candidate list.
///
/// Candidates are tried strictly in list order and the first one that
/// accepts wins. A failed attempt closes its socket before the next
/// candidate is tried; individual attempt errors are not surfaced, only
/// the last one is kept for the final error message.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoints: &[Endpoint]) -> crate::Result<Connection>;
}

/// Plain TCP connector with a per-attempt timeout
#[derive(Debug, Clone)]
pub struct TcpConnector {
    timeout: Duration,
}

impl TcpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000))
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, endpoints: &[Endpoint]) -> crate::Result<Connection> {
        if endpoints.is_empty() {
            return Err(AuditError::ConnectionError(
                "No endpoints to try".to_string(),
            ));
        }

        let mut last_error = String::new();
        for endpoint in endpoints {
            match timeout(self.timeout, TcpStream::connect(endpoint.addr)).await {
                Ok(Ok(stream)) => {
                    log::debug!("connected to {}", endpoint.addr);
                    return Ok(Connection::new(stream, endpoint.clone()));
                }
                Ok(Err(e)) => {
                    // Attempt failed, socket already released; move on
                    log::debug!("connect to {} failed: {}", endpoint.addr, e);
                    last_error = e.to_string();
                }
                Err(_) => {
                    log::debug!(
                        "connect to {} timed out after {:?}",
                        endpoint.addr,
                        self.timeout
                    );
                    last_error = format!("timed out after {:?}", self.timeout);
                }
            }
        }

        Err(AuditError::ConnectionError(format!(
            "No endpoint accepted a connection, last error: {last_error}"
        )))
    }
}

//! Network module for address resolution and connection establishment

pub mod connector;
pub mod resolver;

pub use connector::{Connector, TcpConnector};
pub use resolver::{Resolver, SystemResolver};

use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Type};
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpStream;

/// Address family restriction for resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AddressFamily {
    /// Accept both IPv4 and IPv6 addresses
    #[default]
    #[serde(rename = "any")]
    Any,
    /// IPv4 only
    #[serde(rename = "ipv4")]
    V4,
    /// IPv6 only
    #[serde(rename = "ipv6")]
    V6,
}

impl AddressFamily {
    pub fn name(&self) -> &'static str {
        match self {
            AddressFamily::Any => "any",
            AddressFamily::V4 => "ipv4",
            AddressFamily::V6 => "ipv6",
        }
    }

    /// Check whether an address belongs to this family
    pub fn matches(&self, addr: &IpAddr) -> bool {
        match self {
            AddressFamily::Any => true,
            AddressFamily::V4 => addr.is_ipv4(),
            AddressFamily::V6 => addr.is_ipv6(),
        }
    }
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One candidate address for a host, in resolver preference order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Resolved socket address
    pub addr: SocketAddr,
    /// Name the address was resolved from, used for SNI during probes.
    /// Absent when the host was given as an address literal.
    pub canonical_name: Option<String>,
}

impl Endpoint {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            canonical_name: None,
        }
    }

    pub fn with_canonical_name(mut self, name: impl Into<String>) -> Self {
        self.canonical_name = Some(name.into());
        self
    }

    /// Socket domain for this endpoint
    pub fn domain(&self) -> Domain {
        Domain::for_address(self.addr)
    }

    /// Socket type used for TLS probing (always stream-oriented)
    pub fn socket_type(&self) -> Type {
        Type::STREAM
    }

    /// Transport protocol used for TLS probing
    pub fn protocol(&self) -> Protocol {
        Protocol::TCP
    }

    pub fn family(&self) -> AddressFamily {
        if self.addr.is_ipv4() {
            AddressFamily::V4
        } else {
            AddressFamily::V6
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.addr)
    }
}

/// An established TCP connection to one endpoint.
///
/// Owns the underlying stream; dropping the value closes the descriptor
/// exactly once. There is no way to copy a `Connection`.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    endpoint: Endpoint,
}

impl Connection {
    pub fn new(stream: TcpStream, endpoint: Endpoint) -> Self {
        Self { stream, endpoint }
    }

    /// Endpoint this connection was established to
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Remote address as reported by the socket
    pub fn peer_addr(&self) -> crate::Result<SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }
}

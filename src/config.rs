//! Sender configuration and the ohm:// URL scheme.
//! Parses URLs like: ohm://239.253.38.1:51972?iface=192.168.1.20&ttl=4&latency=100

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_GROUP: Ipv4Addr = Ipv4Addr::new(239, 253, 38, 1);
pub const DEFAULT_PORT: u16 = 51972;
pub const DEFAULT_TTL: u8 = 1;
pub const DEFAULT_LATENCY_MS: u64 = 100;

/// Where packets go: multicast group, port, and outbound interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Multicast group address
    pub group: Ipv4Addr,
    /// UDP port
    pub port: u16,
    /// Address of the sending interface (0.0.0.0 = system default)
    pub adapter: Ipv4Addr,
}

impl Endpoint {
    pub fn new(group: Ipv4Addr, port: u16, adapter: Ipv4Addr) -> Self {
        Self { group, port, adapter }
    }

    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.group, self.port)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP, DEFAULT_PORT, Ipv4Addr::UNSPECIFIED)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} via {}", self.group, self.port, self.adapter)
    }
}

/// Control-plane settings for a sender session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    pub endpoint: Endpoint,
    /// Multicast hop limit
    pub ttl: u8,
    /// Target latency the host passes with each period
    pub latency_ms: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            ttl: DEFAULT_TTL,
            latency_ms: DEFAULT_LATENCY_MS,
        }
    }
}

impl SenderConfig {
    /// Parse an ohm:// URL string.
    /// Format: ohm://GROUP[:PORT]?iface=IP&ttl=N&latency=MS
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let rest = url.strip_prefix("ohm://").ok_or(ConfigError::Scheme)?;
        let mut result = Self::default();

        let (host_port, query) = match rest.split_once('?') {
            Some((host_port, query)) => (host_port, Some(query)),
            None => (rest, None),
        };

        let (host, port) = match host_port.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        };

        result.endpoint.group =
            Ipv4Addr::from_str(host).map_err(|_| ConfigError::Address(host.to_string()))?;

        if let Some(port) = port {
            result.endpoint.port = port.parse().map_err(|_| ConfigError::Port(port.to_string()))?;
        }

        if let Some(query) = query {
            for param in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = param.split_once('=').unwrap_or((param, ""));
                let invalid = || ConfigError::Parameter {
                    key: key.to_string(),
                    value: value.to_string(),
                };

                match key {
                    "iface" | "interface" | "adapter" => {
                        result.endpoint.adapter = Ipv4Addr::from_str(value).map_err(|_| invalid())?;
                    }
                    "ttl" => {
                        result.ttl = value.parse().map_err(|_| invalid())?;
                    }
                    "latency" => {
                        result.latency_ms = value.parse().map_err(|_| invalid())?;
                    }
                    _ => {
                        // Ignore unknown parameters
                    }
                }
            }
        }

        Ok(result)
    }
}

impl FromStr for SenderConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

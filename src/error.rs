//! Error types for songcast-sender.
//!
//! None of these are fatal to the audio path: the session logs them and
//! degrades to silence.

use std::collections::TryReserveError;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};

/// Failures while (re)configuring the multicast socket.
///
/// Any of these leaves the transport without a socket; sends are no-ops
/// until the next successful reconfiguration.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The UDP socket could not be created.
    #[error("failed to create socket: {0}")]
    Socket(#[source] io::Error),

    /// The outbound multicast interface could not be selected.
    #[error("failed to set multicast interface {adapter}: {source}")]
    MulticastInterface {
        adapter: Ipv4Addr,
        #[source]
        source: io::Error,
    },

    /// The socket could not be connected to the group.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddrV4,
        #[source]
        source: io::Error,
    },
}

/// Failures building the packet encoder.
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    /// The packet buffer could not be reserved.
    #[error("failed to allocate {bytes}-byte packet buffer: {source}")]
    Allocation {
        bytes: usize,
        #[source]
        source: TryReserveError,
    },
}

/// Failures parsing an `ohm://` sender URL.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("URL must start with ohm://")]
    Scheme,

    #[error("invalid multicast address '{0}'")]
    Address(String),

    #[error("invalid port '{0}'")]
    Port(String),

    #[error("invalid value '{value}' for parameter '{key}'")]
    Parameter { key: String, value: String },
}

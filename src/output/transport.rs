//! Outbound UDP multicast transport.
//!
//! Holds at most one connected socket. Replacing the endpoint drops the old
//! socket before the new one is opened, and the stored TTL is reapplied to
//! every new socket. Sends are fire-and-forget.

use std::io;
use std::net::{SocketAddrV4, UdpSocket};
use std::sync::Arc;

use log::warn;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::config::{Endpoint, DEFAULT_TTL};
use crate::error::TransportError;
use crate::observer::SessionObserver;

const SEND_BUFFER_BYTES: usize = 256 * 1024;

/// A connected datagram socket.
pub trait DatagramSocket: Send {
    /// Write one datagram to the connected peer.
    fn send(&self, data: &[u8]) -> io::Result<usize>;

    fn set_multicast_ttl(&self, ttl: u8) -> io::Result<()>;
}

/// Opens sockets connected to an [`Endpoint`].
pub trait SocketFactory: Send {
    type Socket: DatagramSocket;

    fn open(&self, endpoint: &Endpoint) -> Result<Self::Socket, TransportError>;
}

impl DatagramSocket for UdpSocket {
    fn send(&self, data: &[u8]) -> io::Result<usize> {
        UdpSocket::send(self, data)
    }

    fn set_multicast_ttl(&self, ttl: u8) -> io::Result<()> {
        self.set_multicast_ttl_v4(ttl as u32)
    }
}

/// Opens real IPv4 UDP sockets via socket2.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpSocketFactory;

impl SocketFactory for UdpSocketFactory {
    type Socket = UdpSocket;

    fn open(&self, endpoint: &Endpoint) -> Result<UdpSocket, TransportError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(TransportError::Socket)?;

        socket
            .set_multicast_if_v4(&endpoint.adapter)
            .map_err(|source| TransportError::MulticastInterface {
                adapter: endpoint.adapter,
                source,
            })?;

        // Connected so every send goes to the group without re-addressing
        let addr: SocketAddrV4 = endpoint.socket_addr();
        socket
            .connect(&SockAddr::from(addr))
            .map_err(|source| TransportError::Connect { addr, source })?;

        // Increase send buffer for bursty periods; the default still works
        if let Err(e) = socket.set_send_buffer_size(SEND_BUFFER_BYTES) {
            warn!("Send buffer for {} left at default: {}", endpoint, e);
        }

        Ok(socket.into())
    }
}

/// Result of one transport send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the kernel
    Sent(usize),
    /// No socket configured
    NoSocket,
    /// The write failed; the packet is lost
    Dropped,
}

/// Multicast sender owning one socket and the TTL.
pub struct MulticastTransport<F: SocketFactory = UdpSocketFactory> {
    factory: F,
    socket: Option<F::Socket>,
    endpoint: Option<Endpoint>,
    ttl: u8,
    observer: Arc<dyn SessionObserver>,
}

impl<F: SocketFactory> MulticastTransport<F> {
    pub fn new(factory: F, observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            factory,
            socket: None,
            endpoint: None,
            ttl: DEFAULT_TTL,
            observer,
        }
    }

    /// Replace the socket with one connected to `endpoint`.
    ///
    /// On failure the transport is left without a socket and sends are
    /// no-ops until the next successful call.
    pub fn configure_endpoint(&mut self, endpoint: Endpoint) -> Result<(), TransportError> {
        self.close();

        let socket = match self.factory.open(&endpoint) {
            Ok(socket) => socket,
            Err(e) => {
                self.observer.endpoint_failed(&endpoint, &e);
                return Err(e);
            }
        };

        self.socket = Some(socket);
        self.endpoint = Some(endpoint);
        self.apply_ttl();
        self.observer.endpoint_configured(&endpoint);
        Ok(())
    }

    /// Store the TTL and apply it to the live socket, if any.
    pub fn set_ttl(&mut self, ttl: u8) {
        self.ttl = ttl;
        self.apply_ttl();
    }

    fn apply_ttl(&self) {
        if let Some(socket) = &self.socket {
            if let Err(e) = socket.set_multicast_ttl(self.ttl) {
                self.observer.ttl_failed(self.ttl, &e);
            }
        }
    }

    /// Best-effort single datagram write. Never retried.
    ///
    /// Only a write of the whole packet counts as sent.
    pub fn send(&self, packet: &[u8]) -> Delivery {
        let Some(socket) = &self.socket else {
            return Delivery::NoSocket;
        };

        let written = socket.send(packet).and_then(|n| {
            if n == packet.len() {
                Ok(n)
            } else {
                Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("short datagram write: {} of {} bytes", n, packet.len()),
                ))
            }
        });

        match written {
            Ok(n) => Delivery::Sent(n),
            Err(e) => {
                self.observer.send_failed(packet.len(), &e);
                Delivery::Dropped
            }
        }
    }

    /// Drop the socket, if any.
    pub fn close(&mut self) {
        self.socket = None;
        self.endpoint = None;
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub fn ttl(&self) -> u8 {
        self.ttl
    }
}

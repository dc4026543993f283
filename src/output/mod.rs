//! Songcast output module.
//! Turns PCM periods into Ohm audio packets and transmits them over UDP multicast.

mod encoder;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use encoder::PacketEncoder;
pub use session::{SendOutcome, SessionState, SessionStats, StreamSession};
pub use transport::{DatagramSocket, Delivery, MulticastTransport, SocketFactory, UdpSocketFactory};

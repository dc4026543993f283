//! Songcast sender
//!
//! Streams uncompressed PCM to Songcast (Ohm protocol) receivers over UDP
//! multicast.
//! - Host audio code calls [`StreamSession::send`] once per audio period
//! - The control path activates/deactivates the stream and sets endpoint and TTL
//! - Every deactivation is followed by exactly one packet carrying the halt flag
//!
//! Wire notes:
//! - Fixed 50-byte big-endian header followed by interleaved linear PCM
//! - Timestamps and latency are fixed-point sample counts (x256)
//! - No retransmission or acknowledgement: a lost datagram is a lost period
//!
//! ```no_run
//! use songcast_sender::{FormatDescriptor, SenderConfig, StreamSession};
//!
//! let config = SenderConfig::parse("ohm://239.253.38.1:51972?ttl=2").unwrap();
//! let session = StreamSession::from_config(&config);
//! session.set_active(true);
//!
//! let format = FormatDescriptor::default();
//! let pcm = vec![0u8; format.payload_bytes()];
//! session.send(&format, 0, 0, config.latency_ms, false, &pcm);
//!
//! // Next send carries the halt flag, then the session falls silent
//! session.set_active(false);
//! session.send(&format, 1, format.packet_duration_ns(), config.latency_ms, false, &pcm);
//! ```

pub mod config;
pub mod error;
pub mod ffi;
pub mod format;
pub mod observer;
pub mod output;
pub mod wire;

pub use config::{Endpoint, SenderConfig};
pub use error::{ConfigError, EncoderError, TransportError};
pub use format::{max_payload_bytes, FormatDescriptor, SUPPORTED_FORMATS};
pub use observer::{LogObserver, NullObserver, SessionObserver};
pub use output::{
    DatagramSocket, Delivery, MulticastTransport, PacketEncoder, SendOutcome, SessionState,
    SessionStats, SocketFactory, StreamSession, UdpSocketFactory,
};
pub use wire::AudioHeader;

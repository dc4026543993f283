//! Songcast stream session.
//!
//! Two callers share a session: the host's audio thread calls [`StreamSession::send`]
//! once per period, and the control path calls the setters. Activation state
//! is a lock-free atomic cell; encoder and transport sit behind one mutex so
//! encode-then-transmit never interleaves with a socket swap.
//!
//! Stopping is expressed only through the state machine:
//!
//! ```text
//!   set_active(true)            set_active(false)
//!   any ──────────────► Active  any ─────────────► PendingInactive
//!
//!   send() in PendingInactive: emit one packet with the halt flag, then Inactive
//!   send() in Inactive:        emit nothing
//! ```

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::encoder::PacketEncoder;
use super::transport::{Delivery, MulticastTransport, SocketFactory, UdpSocketFactory};
use crate::config::{Endpoint, SenderConfig};
use crate::error::TransportError;
use crate::format::{max_payload_bytes, FormatDescriptor};
use crate::observer::{LogObserver, SessionObserver};

/// Activation state of a session.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Inactive = 0,
    Active = 1,
    /// Deactivation requested; the next send carries the halt flag.
    PendingInactive = 2,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Active,
            2 => SessionState::PendingInactive,
            _ => SessionState::Inactive,
        }
    }
}

/// What one call to [`StreamSession::send`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Session inactive, no packet built
    Inactive,
    /// Packet handed to the socket
    Sent { bytes: usize, halt: bool },
    /// Packet built but not delivered (no socket, send failure, or no encoder)
    NotSent { halt: bool },
}

/// Statistics (atomic for lock-free access)
struct AtomicStats {
    packets_sent: AtomicU64,
    halts_sent: AtomicU64,
    send_failures: AtomicU64,
    periods_skipped: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            packets_sent: AtomicU64::new(0),
            halts_sent: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
            periods_skipped: AtomicU64::new(0),
        }
    }
}

/// Statistics snapshot for external access
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Packets handed to the socket
    pub packets_sent: u64,
    /// Of those, packets carrying the halt flag
    pub halts_sent: u64,
    /// Packets built but not delivered
    pub send_failures: u64,
    /// Periods ignored while inactive
    pub periods_skipped: u64,
}

struct Pipeline<F: SocketFactory> {
    /// None when the packet buffer could not be allocated
    encoder: Option<PacketEncoder>,
    transport: MulticastTransport<F>,
}

/// Sender session: activation state machine over an encoder and transport.
pub struct StreamSession<F: SocketFactory = UdpSocketFactory> {
    state: AtomicU8,
    pipeline: Mutex<Pipeline<F>>,
    stats: AtomicStats,
    observer: Arc<dyn SessionObserver>,
}

impl StreamSession<UdpSocketFactory> {
    /// Session over real UDP sockets, logging through the `log` crate.
    pub fn new() -> Self {
        Self::with_factory(UdpSocketFactory, Arc::new(LogObserver))
    }

    /// Session with TTL and endpoint applied from `config`.
    ///
    /// An endpoint failure is logged and leaves the session without a
    /// socket; the session itself is always returned.
    pub fn from_config(config: &SenderConfig) -> Self {
        let session = Self::new();
        session.set_ttl(config.ttl);
        let _ = session.set_endpoint(config.endpoint);
        session
    }
}

impl Default for StreamSession<UdpSocketFactory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: SocketFactory> StreamSession<F> {
    pub fn with_factory(factory: F, observer: Arc<dyn SessionObserver>) -> Self {
        Self::with_capacity(factory, observer, max_payload_bytes())
    }

    /// Session whose packet buffer holds `max_payload_bytes` of PCM.
    ///
    /// If the buffer cannot be allocated the session still runs its state
    /// machine but never emits a packet.
    pub(crate) fn with_capacity(
        factory: F,
        observer: Arc<dyn SessionObserver>,
        max_payload_bytes: usize,
    ) -> Self {
        let encoder = match PacketEncoder::new(max_payload_bytes, FormatDescriptor::default()) {
            Ok(encoder) => Some(encoder),
            Err(e) => {
                observer.encoder_unavailable(&e);
                None
            }
        };

        Self {
            state: AtomicU8::new(SessionState::Inactive as u8),
            pipeline: Mutex::new(Pipeline {
                encoder,
                transport: MulticastTransport::new(factory, observer.clone()),
            }),
            stats: AtomicStats::new(),
            observer,
        }
    }

    /// Activate or request deactivation.
    ///
    /// Deactivating always arms a halt packet, even when already inactive,
    /// so receivers are told the stream ended whatever they last saw.
    pub fn set_active(&self, active: bool) {
        let next = if active {
            SessionState::Active
        } else {
            SessionState::PendingInactive
        };
        let previous = SessionState::from_u8(self.state.swap(next as u8, Ordering::SeqCst));
        if previous != next {
            self.observer.activation_changed(previous, next);
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Point the transport at a new group/port/interface.
    pub fn set_endpoint(&self, endpoint: Endpoint) -> Result<(), TransportError> {
        self.pipeline.lock().transport.configure_endpoint(endpoint)
    }

    pub fn set_ttl(&self, ttl: u8) {
        self.pipeline.lock().transport.set_ttl(ttl);
    }

    /// Encode and transmit one audio period.
    ///
    /// Does nothing while inactive. While a deactivation is pending the
    /// packet is forced to carry the halt flag and the session then falls
    /// inactive, whether or not the datagram was delivered.
    pub fn send(
        &self,
        format: &FormatDescriptor,
        frame: u32,
        timestamp_ns: u64,
        latency_ms: u64,
        halt: bool,
        data: &[u8],
    ) -> SendOutcome {
        // State is read and retired under the pipeline lock so overlapping
        // sends cannot both observe PendingInactive.
        let mut pipeline = self.pipeline.lock();
        let state = self.state();
        if state == SessionState::Inactive {
            drop(pipeline);
            self.stats.periods_skipped.fetch_add(1, Ordering::Relaxed);
            return SendOutcome::Inactive;
        }

        let pending = state == SessionState::PendingInactive;
        let halt = halt || pending;

        let Pipeline { encoder, transport } = &mut *pipeline;
        let delivery = match encoder {
            Some(encoder) => {
                encoder.set_format(format, timestamp_ns, latency_ms);
                encoder.set_frame_number(frame);
                encoder.set_halt_flag(halt);
                encoder.set_payload(data);
                transport.send(encoder.packet())
            }
            None => Delivery::NoSocket,
        };

        // A concurrent set_active(true) wins over this transition
        let retired = pending
            && self
                .state
                .compare_exchange(
                    SessionState::PendingInactive as u8,
                    SessionState::Inactive as u8,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok();
        drop(pipeline);

        let outcome = match delivery {
            Delivery::Sent(bytes) => {
                self.stats.packets_sent.fetch_add(1, Ordering::Relaxed);
                if halt {
                    self.stats.halts_sent.fetch_add(1, Ordering::Relaxed);
                    self.observer.halt_sent(frame);
                }
                SendOutcome::Sent { bytes, halt }
            }
            Delivery::NoSocket | Delivery::Dropped => {
                self.stats.send_failures.fetch_add(1, Ordering::Relaxed);
                SendOutcome::NotSent { halt }
            }
        };

        if retired {
            self.observer
                .activation_changed(SessionState::PendingInactive, SessionState::Inactive);
        }

        outcome
    }

    /// False when the packet buffer could not be allocated.
    pub fn is_usable(&self) -> bool {
        self.pipeline.lock().encoder.is_some()
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        self.pipeline.lock().transport.endpoint().copied()
    }

    pub fn ttl(&self) -> u8 {
        self.pipeline.lock().transport.ttl()
    }

    /// Get current statistics (lock-free snapshot)
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            packets_sent: self.stats.packets_sent.load(Ordering::Relaxed),
            halts_sent: self.stats.halts_sent.load(Ordering::Relaxed),
            send_failures: self.stats.send_failures.load(Ordering::Relaxed),
            periods_skipped: self.stats.periods_skipped.load(Ordering::Relaxed),
        }
    }
}

//! Injected observability for the sender.
//!
//! The session and transport never format diagnostics themselves; they call
//! a [`SessionObserver`]. [`LogObserver`] forwards to the `log` facade, so a
//! host without an enabled logger pays no formatting cost on the audio path.

use std::io;

use crate::config::Endpoint;
use crate::error::{EncoderError, TransportError};
use crate::output::SessionState;

/// Receives sender lifecycle and failure events.
///
/// Every method defaults to a no-op. Implementations are called from the
/// real-time send path and must not block.
pub trait SessionObserver: Send + Sync {
    fn activation_changed(&self, _previous: SessionState, _current: SessionState) {}

    fn endpoint_configured(&self, _endpoint: &Endpoint) {}

    fn endpoint_failed(&self, _endpoint: &Endpoint, _error: &TransportError) {}

    fn ttl_failed(&self, _ttl: u8, _error: &io::Error) {}

    fn send_failed(&self, _bytes: usize, _error: &io::Error) {}

    /// The terminal packet of a stream was handed to the transport.
    fn halt_sent(&self, _frame: u32) {}

    fn encoder_unavailable(&self, _error: &EncoderError) {}
}

/// Forwards events to the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn activation_changed(&self, previous: SessionState, current: SessionState) {
        log::info!("songcast state {:?} -> {:?}", previous, current);
    }

    fn endpoint_configured(&self, endpoint: &Endpoint) {
        log::info!("songcast endpoint {} ok", endpoint);
    }

    fn endpoint_failed(&self, endpoint: &Endpoint, error: &TransportError) {
        log::warn!("songcast endpoint {} failed: {}", endpoint, error);
    }

    fn ttl_failed(&self, ttl: u8, error: &io::Error) {
        log::warn!("songcast failed to apply ttl {}: {}", ttl, error);
    }

    fn send_failed(&self, bytes: usize, error: &io::Error) {
        log::debug!("songcast send of {} bytes failed: {}", bytes, error);
    }

    fn halt_sent(&self, frame: u32) {
        log::info!("songcast halt sent at frame {}", frame);
    }

    fn encoder_unavailable(&self, error: &EncoderError) {
        log::error!("songcast encoder unavailable: {}", error);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SessionObserver for NullObserver {}

//! Recording socket factory for transport and session tests.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use super::transport::{DatagramSocket, SocketFactory};
use crate::config::Endpoint;
use crate::error::TransportError;

/// Shared record of everything the mock sockets saw.
#[derive(Default)]
pub(crate) struct Recorder {
    live: AtomicUsize,
    max_live: AtomicUsize,
    opened: AtomicUsize,
    fail_open: AtomicBool,
    fail_send: AtomicBool,
    short_send: AtomicBool,
    sends_started: AtomicUsize,
    /// While true, sends block inside the socket
    gate_closed: Mutex<bool>,
    gate: Condvar,
    packets: Mutex<Vec<(Endpoint, Vec<u8>)>>,
    ttls: Mutex<Vec<u8>>,
}

impl Recorder {
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Highest number of sockets alive at the same time.
    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    /// Report one byte fewer than requested on each send.
    pub fn short_send(&self, short: bool) {
        self.short_send.store(short, Ordering::SeqCst);
    }

    /// Sends entered so far, including ones still held at the gate.
    pub fn sends_started(&self) -> usize {
        self.sends_started.load(Ordering::SeqCst)
    }

    pub fn close_gate(&self) {
        *self.gate_closed.lock() = true;
    }

    pub fn open_gate(&self) {
        *self.gate_closed.lock() = false;
        self.gate.notify_all();
    }

    pub fn packets(&self) -> Vec<(Endpoint, Vec<u8>)> {
        self.packets.lock().clone()
    }

    pub fn ttls(&self) -> Vec<u8> {
        self.ttls.lock().clone()
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockFactory {
    pub recorder: Arc<Recorder>,
}

pub(crate) struct MockSocket {
    recorder: Arc<Recorder>,
    endpoint: Endpoint,
}

impl Drop for MockSocket {
    fn drop(&mut self) {
        self.recorder.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DatagramSocket for MockSocket {
    fn send(&self, data: &[u8]) -> io::Result<usize> {
        self.recorder.sends_started.fetch_add(1, Ordering::SeqCst);
        {
            let mut closed = self.recorder.gate_closed.lock();
            while *closed {
                self.recorder.gate.wait(&mut closed);
            }
        }

        if self.recorder.fail_send.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "send refused"));
        }
        self.recorder.packets.lock().push((self.endpoint, data.to_vec()));
        if self.recorder.short_send.load(Ordering::SeqCst) {
            return Ok(data.len().saturating_sub(1));
        }
        Ok(data.len())
    }

    fn set_multicast_ttl(&self, ttl: u8) -> io::Result<()> {
        self.recorder.ttls.lock().push(ttl);
        Ok(())
    }
}

impl SocketFactory for MockFactory {
    type Socket = MockSocket;

    fn open(&self, endpoint: &Endpoint) -> Result<MockSocket, TransportError> {
        if self.recorder.fail_open.load(Ordering::SeqCst) {
            return Err(TransportError::Connect {
                addr: endpoint.socket_addr(),
                source: io::Error::new(io::ErrorKind::AddrNotAvailable, "no route"),
            });
        }

        self.recorder.opened.fetch_add(1, Ordering::SeqCst);
        let live = self.recorder.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.recorder.max_live.fetch_max(live, Ordering::SeqCst);

        Ok(MockSocket {
            recorder: self.recorder.clone(),
            endpoint: *endpoint,
        })
    }
}

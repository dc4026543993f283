//! C API for host audio drivers.
//!
//! Sessions are addressed by integer handles kept in a global registry, so
//! the driver never holds a Rust pointer. Addresses are host-order IPv4
//! integers.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::slice;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::config::Endpoint;
use crate::format::FormatDescriptor;
use crate::output::StreamSession;

// ============================================================================
// C API Error Codes
// ============================================================================

pub const SONGCAST_OK: i32 = 0;
pub const SONGCAST_ERROR_HANDLE: i32 = 1;
pub const SONGCAST_ERROR_INVALID: i32 = 2;
pub const SONGCAST_ERROR_ENDPOINT: i32 = 3;
pub const SONGCAST_ERROR_NOT_SENT: i32 = 4;

/// Library version (major.minor format: 0x0100 = 1.0)
pub const SONGCAST_VERSION: u32 = 0x0100;

// ============================================================================
// Session Registry
// ============================================================================

static NEXT_HANDLE: AtomicU32 = AtomicU32::new(1);

// Registry access is a read lock on the audio path; writes only on create/free.
lazy_static! {
    static ref SESSIONS: RwLock<HashMap<u32, Arc<StreamSession>>> = RwLock::new(HashMap::new());
}

fn session(handle: u32) -> Option<Arc<StreamSession>> {
    SESSIONS.read().get(&handle).cloned()
}

// ============================================================================
// C API Functions
// ============================================================================

#[no_mangle]
pub extern "C" fn SONGCAST_GetVersion() -> u32 {
    SONGCAST_VERSION
}

/// Create an inactive session with no endpoint.
///
/// # Returns
/// * Session handle (never 0)
#[no_mangle]
pub extern "C" fn SONGCAST_Create() -> u32 {
    let handle = NEXT_HANDLE.fetch_add(1, Ordering::SeqCst);
    SESSIONS.write().insert(handle, Arc::new(StreamSession::new()));
    handle
}

/// Free a session, closing its socket.
#[no_mangle]
pub extern "C" fn SONGCAST_Free(handle: u32) -> i32 {
    match SESSIONS.write().remove(&handle) {
        Some(_) => SONGCAST_OK,
        None => SONGCAST_ERROR_HANDLE,
    }
}

/// Activate (non-zero) or deactivate (zero) the stream.
#[no_mangle]
pub extern "C" fn SONGCAST_SetActive(handle: u32, active: u32) -> i32 {
    let Some(session) = session(handle) else {
        return SONGCAST_ERROR_HANDLE;
    };
    session.set_active(active != 0);
    SONGCAST_OK
}

/// Set the multicast group, port, and sending interface.
///
/// # Returns
/// * SONGCAST_ERROR_ENDPOINT if the socket could not be set up; the session
///   stays silent until a later call succeeds
#[no_mangle]
pub extern "C" fn SONGCAST_SetEndpoint(handle: u32, group: u32, port: u16, adapter: u32) -> i32 {
    let Some(session) = session(handle) else {
        return SONGCAST_ERROR_HANDLE;
    };
    let endpoint = Endpoint::new(Ipv4Addr::from(group), port, Ipv4Addr::from(adapter));
    match session.set_endpoint(endpoint) {
        Ok(()) => SONGCAST_OK,
        Err(_) => SONGCAST_ERROR_ENDPOINT,
    }
}

/// Set the multicast TTL (values above 255 are clamped).
#[no_mangle]
pub extern "C" fn SONGCAST_SetTtl(handle: u32, ttl: u32) -> i32 {
    let Some(session) = session(handle) else {
        return SONGCAST_ERROR_HANDLE;
    };
    session.set_ttl(u8::try_from(ttl).unwrap_or(u8::MAX));
    SONGCAST_OK
}

/// Send one audio period.
///
/// # Returns
/// * SONGCAST_OK if a packet was sent or the session is inactive
/// * SONGCAST_ERROR_NOT_SENT if a packet was built but not delivered
///
/// # Safety
/// `format` must point to a valid format, and `data` to `bytes` readable
/// bytes (or be null with `bytes` 0).
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn SONGCAST_Send(
    handle: u32,
    format: *const FormatDescriptor,
    frame: u32,
    timestamp_ns: u64,
    latency_ms: u64,
    halt: u32,
    data: *const u8,
    bytes: u32,
) -> i32 {
    let Some(session) = session(handle) else {
        return SONGCAST_ERROR_HANDLE;
    };
    if format.is_null() || (data.is_null() && bytes != 0) {
        return SONGCAST_ERROR_INVALID;
    }

    let format = *format;
    let data = if bytes == 0 {
        &[][..]
    } else {
        slice::from_raw_parts(data, bytes as usize)
    };

    match session.send(&format, frame, timestamp_ns, latency_ms, halt != 0, data) {
        crate::output::SendOutcome::NotSent { .. } => SONGCAST_ERROR_NOT_SENT,
        _ => SONGCAST_OK,
    }
}

//! Ohm audio message layout.
//!
//! Fixed 50-byte header followed by interleaved linear PCM. All multi-byte
//! fields are big-endian and written field by field, never through struct
//! layout.
//!
//! ```text
//!  0..4   signature "Ohm "         21      flags
//!  4      version (1)              22..24  samples per packet
//!  5      message type (3, audio)  24..28  frame number
//!  6      header length (50)       28..32  network timestamp
//!  7..15  reserved (zero)          32..36  media latency
//!  15     codec name length (3)    36..40  media timestamp
//!  16..19 codec name "PCM"         40..44  sample rate
//!  19..21 total packet length      44..48  bit rate
//!                                  48      bit depth
//!                                  49      channels
//! ```

pub const SIGNATURE: [u8; 4] = *b"Ohm ";
pub const VERSION: u8 = 1;
pub const MSG_TYPE_AUDIO: u8 = 3;
pub const HEADER_BYTES: usize = 50;
pub const CODEC_NAME: &[u8; 3] = b"PCM";

/// Lossless audio with timestamps
pub const FLAGS_NORMAL: u8 = 0x06;
/// [`FLAGS_NORMAL`] plus the halt bit: last packet of the stream
pub const FLAGS_HALT: u8 = FLAGS_NORMAL | FLAG_HALT_BIT;
pub const FLAG_HALT_BIT: u8 = 0x01;

// Field offsets
pub const OFFSET_SIGNATURE: usize = 0;
pub const OFFSET_VERSION: usize = 4;
pub const OFFSET_MSG_TYPE: usize = 5;
pub const OFFSET_HEADER_BYTES: usize = 6;
pub const OFFSET_RESERVED: usize = 7;
pub const RESERVED_BYTES: usize = 8;
pub const OFFSET_CODEC_NAME_BYTES: usize = 15;
pub const OFFSET_CODEC_NAME: usize = 16;
pub const OFFSET_TOTAL_BYTES: usize = 19;
pub const OFFSET_FLAGS: usize = 21;
pub const OFFSET_SAMPLE_COUNT: usize = 22;
pub const OFFSET_FRAME: usize = 24;
pub const OFFSET_NETWORK_TIMESTAMP: usize = 28;
pub const OFFSET_MEDIA_LATENCY: usize = 32;
pub const OFFSET_MEDIA_TIMESTAMP: usize = 36;
pub const OFFSET_SAMPLE_RATE: usize = 40;
pub const OFFSET_BIT_RATE: usize = 44;
pub const OFFSET_BIT_DEPTH: usize = 48;
pub const OFFSET_CHANNELS: usize = 49;

/// Convert nanoseconds to the wire's fixed-point clock (samples x 256).
/// Computed in 128-bit, truncated to the 32-bit field.
pub fn ns_to_fixed_point(timestamp_ns: u64, sample_rate: u32) -> u32 {
    (timestamp_ns as u128 * sample_rate as u128 * 256 / 1_000_000_000) as u32
}

/// Convert milliseconds to the wire's fixed-point clock (samples x 256).
pub fn ms_to_fixed_point(latency_ms: u64, sample_rate: u32) -> u32 {
    (latency_ms as u128 * sample_rate as u128 * 256 / 1000) as u32
}

/// Decoded view of an audio message header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioHeader {
    pub version: u8,
    pub msg_type: u8,
    pub total_bytes: u16,
    pub flags: u8,
    pub samples_per_packet: u16,
    pub frame: u32,
    pub network_timestamp: u32,
    pub media_latency: u32,
    pub media_timestamp: u32,
    pub sample_rate: u32,
    pub bit_rate: u32,
    pub bit_depth: u8,
    pub channels: u8,
}

impl AudioHeader {
    /// Parse a header from the start of a packet.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < HEADER_BYTES {
            return None;
        }
        if data[OFFSET_SIGNATURE..OFFSET_SIGNATURE + 4] != SIGNATURE {
            return None;
        }
        if data[OFFSET_HEADER_BYTES] as usize != HEADER_BYTES {
            return None;
        }

        Some(AudioHeader {
            version: data[OFFSET_VERSION],
            msg_type: data[OFFSET_MSG_TYPE],
            total_bytes: read_u16(data, OFFSET_TOTAL_BYTES),
            flags: data[OFFSET_FLAGS],
            samples_per_packet: read_u16(data, OFFSET_SAMPLE_COUNT),
            frame: read_u32(data, OFFSET_FRAME),
            network_timestamp: read_u32(data, OFFSET_NETWORK_TIMESTAMP),
            media_latency: read_u32(data, OFFSET_MEDIA_LATENCY),
            media_timestamp: read_u32(data, OFFSET_MEDIA_TIMESTAMP),
            sample_rate: read_u32(data, OFFSET_SAMPLE_RATE),
            bit_rate: read_u32(data, OFFSET_BIT_RATE),
            bit_depth: data[OFFSET_BIT_DEPTH],
            channels: data[OFFSET_CHANNELS],
        })
    }

    pub fn is_halt(&self) -> bool {
        self.flags & FLAG_HALT_BIT != 0
    }

    /// Payload length implied by the total length field.
    pub fn payload_bytes(&self) -> usize {
        (self.total_bytes as usize).saturating_sub(HEADER_BYTES)
    }
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

//! Ohm audio packet encoder.
//! Renders the fixed header and PCM payload into one pre-allocated buffer.

use crate::error::EncoderError;
use crate::format::FormatDescriptor;
use crate::wire::*;

/// Packet encoder with a single reusable buffer.
///
/// The buffer is sized once for the largest supported payload and never
/// grows. Constant header fields are written at construction; per-period
/// calls only touch the fields that change.
pub struct PacketEncoder {
    /// Header + payload region, fixed length
    buffer: Vec<u8>,
    /// Capacity of the payload region
    max_payload_bytes: usize,
    /// Payload length of the current format (clamped to capacity)
    payload_bytes: usize,
    /// Current format
    format: FormatDescriptor,
    /// Current format does not fit the buffer; payload is forced to silence
    oversized: bool,
}

impl PacketEncoder {
    /// Create an encoder for payloads up to `max_payload_bytes`, starting in `format`.
    ///
    /// Media latency is initialised to 100ms at the format's sample rate.
    pub fn new(max_payload_bytes: usize, format: FormatDescriptor) -> Result<Self, EncoderError> {
        let total = HEADER_BYTES.saturating_add(max_payload_bytes);
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(total)
            .map_err(|source| EncoderError::Allocation { bytes: total, source })?;
        buffer.resize(total, 0);

        let mut encoder = Self {
            buffer,
            max_payload_bytes,
            payload_bytes: 0,
            format,
            oversized: false,
        };

        // Header fields that never change
        encoder.buffer[OFFSET_SIGNATURE..OFFSET_SIGNATURE + 4].copy_from_slice(&SIGNATURE);
        encoder.buffer[OFFSET_VERSION] = VERSION;
        encoder.buffer[OFFSET_MSG_TYPE] = MSG_TYPE_AUDIO;
        encoder.buffer[OFFSET_HEADER_BYTES] = HEADER_BYTES as u8;
        encoder.buffer[OFFSET_CODEC_NAME_BYTES] = CODEC_NAME.len() as u8;
        encoder.buffer[OFFSET_CODEC_NAME..OFFSET_CODEC_NAME + CODEC_NAME.len()]
            .copy_from_slice(CODEC_NAME);

        // Defaults until the first period arrives
        encoder.apply_format(&format);
        encoder.set_halt_flag(false);
        encoder.set_frame_number(0);
        encoder.put_u32(
            OFFSET_MEDIA_LATENCY,
            ms_to_fixed_point(crate::config::DEFAULT_LATENCY_MS, format.sample_rate),
        );

        Ok(encoder)
    }

    /// Switch format and stamp the period's timestamp and latency.
    pub fn set_format(&mut self, format: &FormatDescriptor, timestamp_ns: u64, latency_ms: u64) {
        self.apply_format(format);

        let timestamp = ns_to_fixed_point(timestamp_ns, format.sample_rate);
        self.put_u32(OFFSET_NETWORK_TIMESTAMP, timestamp);
        self.put_u32(OFFSET_MEDIA_TIMESTAMP, timestamp);
        self.put_u32(OFFSET_MEDIA_LATENCY, ms_to_fixed_point(latency_ms, format.sample_rate));
    }

    fn apply_format(&mut self, format: &FormatDescriptor) {
        let wanted = format.payload_bytes();
        self.oversized = wanted > self.max_payload_bytes;
        if self.oversized {
            // Never overrun the buffer: send silence at full capacity instead
            self.payload_bytes = self.max_payload_bytes;
            self.payload_mut().fill(0);
        } else {
            self.payload_bytes = wanted;
        }
        self.format = *format;

        self.put_u16(OFFSET_TOTAL_BYTES, self.bytes() as u16);
        self.put_u16(OFFSET_SAMPLE_COUNT, format.samples_per_packet);
        self.put_u32(OFFSET_SAMPLE_RATE, format.sample_rate);
        self.put_u32(OFFSET_BIT_RATE, format.bit_rate());
        self.buffer[OFFSET_BIT_DEPTH] = format.bit_depth;
        self.buffer[OFFSET_CHANNELS] = format.channels;
    }

    /// Frame sequence number; callers let it wrap.
    pub fn set_frame_number(&mut self, frame: u32) {
        self.put_u32(OFFSET_FRAME, frame);
    }

    pub fn set_halt_flag(&mut self, halt: bool) {
        self.buffer[OFFSET_FLAGS] = if halt { FLAGS_HALT } else { FLAGS_NORMAL };
    }

    /// Copy PCM into the payload region.
    ///
    /// Shorter input leaves a zeroed tail. Input longer than the buffer's
    /// capacity is dropped and the packet carries silence.
    pub fn set_payload(&mut self, data: &[u8]) {
        let oversized = self.oversized;
        let payload = self.payload_mut();
        if oversized || data.len() > payload.len() {
            payload.fill(0);
            return;
        }
        payload[..data.len()].copy_from_slice(data);
        payload[data.len()..].fill(0);
    }

    /// Bytes to transmit: header plus the current format's payload.
    pub fn bytes(&self) -> usize {
        HEADER_BYTES + self.payload_bytes
    }

    /// The packet ready to send.
    pub fn packet(&self) -> &[u8] {
        &self.buffer[..self.bytes()]
    }

    /// Current payload, as it will be sent.
    pub fn payload(&self) -> &[u8] {
        &self.buffer[HEADER_BYTES..self.bytes()]
    }

    pub fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    /// True when the current format exceeds the buffer and packets carry silence.
    pub fn is_degraded(&self) -> bool {
        self.oversized
    }

    pub fn frame_number(&self) -> u32 {
        self.get_u32(OFFSET_FRAME)
    }

    pub fn is_halt(&self) -> bool {
        self.buffer[OFFSET_FLAGS] & FLAG_HALT_BIT != 0
    }

    fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[HEADER_BYTES..]
    }

    fn put_u16(&mut self, offset: usize, value: u16) {
        self.buffer[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
    }

    fn put_u32(&mut self, offset: usize, value: u32) {
        self.buffer[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    fn get_u32(&self, offset: usize) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.buffer[offset..offset + 4]);
        u32::from_be_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::max_payload_bytes;

    fn encoder() -> PacketEncoder {
        PacketEncoder::new(max_payload_bytes(), FormatDescriptor::default()).unwrap()
    }

    #[test]
    fn test_constant_header_fields() {
        let encoder = encoder();
        let packet = encoder.packet();

        assert_eq!(&packet[0..4], b"Ohm ");
        assert_eq!(packet[OFFSET_VERSION], 1);
        assert_eq!(packet[OFFSET_MSG_TYPE], 3);
        assert_eq!(packet[OFFSET_HEADER_BYTES], 50);
        assert!(packet[OFFSET_RESERVED..OFFSET_RESERVED + RESERVED_BYTES].iter().all(|&b| b == 0));
        assert_eq!(packet[OFFSET_CODEC_NAME_BYTES], 3);
        assert_eq!(&packet[OFFSET_CODEC_NAME..OFFSET_CODEC_NAME + 3], b"PCM");
    }

    #[test]
    fn test_initial_defaults() {
        let encoder = encoder();
        assert_eq!(encoder.bytes(), 1370);

        let header = AudioHeader::parse(encoder.packet()).unwrap();
        assert_eq!(header.total_bytes, 1370);
        assert_eq!(header.flags, FLAGS_NORMAL);
        assert_eq!(header.samples_per_packet, 220);
        assert_eq!(header.frame, 0);
        assert_eq!(header.network_timestamp, 0);
        assert_eq!(header.media_timestamp, 0);
        // 100ms at 44.1kHz in samples x 256
        assert_eq!(header.media_latency, 1_128_960);
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.bit_rate, 44100 * 2 * 24);
        assert_eq!(header.bit_depth, 24);
        assert_eq!(header.channels, 2);
    }

    #[test]
    fn test_set_format_timestamps() {
        let mut encoder = encoder();
        encoder.set_format(&FormatDescriptor::default(), 1_000_000_000, 100);

        let header = AudioHeader::parse(encoder.packet()).unwrap();
        assert_eq!(header.network_timestamp, 11_289_600);
        assert_eq!(header.media_timestamp, header.network_timestamp);
        assert_eq!(header.media_latency, 1_128_960);

        encoder.set_format(&FormatDescriptor::default(), 2_500_000_000, 40);
        let header = AudioHeader::parse(encoder.packet()).unwrap();
        assert_eq!(header.network_timestamp, 28_224_000);
        assert_eq!(header.media_timestamp, 28_224_000);
        assert_eq!(header.media_latency, 451_584);
    }

    #[test]
    fn test_smaller_format_shrinks_packet() {
        let mut encoder = encoder();
        let mono = FormatDescriptor::new(44100, 16, 1, 220);
        encoder.set_format(&mono, 0, 100);

        assert_eq!(encoder.bytes(), 50 + 440);
        let header = AudioHeader::parse(encoder.packet()).unwrap();
        assert_eq!(header.total_bytes, 490);
        assert_eq!(header.bit_depth, 16);
        assert_eq!(header.channels, 1);
        assert_eq!(header.bit_rate, 44100 * 16);
        assert!(!encoder.is_degraded());
    }

    #[test]
    fn test_frame_number_and_wrap() {
        let mut encoder = encoder();
        encoder.set_frame_number(5);
        assert_eq!(encoder.frame_number(), 5);
        assert_eq!(&encoder.packet()[OFFSET_FRAME..OFFSET_FRAME + 4], &[0, 0, 0, 5]);

        encoder.set_frame_number(u32::MAX);
        assert_eq!(&encoder.packet()[OFFSET_FRAME..OFFSET_FRAME + 4], &[0xFF; 4]);
        encoder.set_frame_number(u32::MAX.wrapping_add(1));
        assert_eq!(encoder.frame_number(), 0);
    }

    #[test]
    fn test_halt_flag_toggles() {
        let mut encoder = encoder();
        encoder.set_halt_flag(true);
        assert_eq!(encoder.packet()[OFFSET_FLAGS], FLAGS_HALT);
        assert!(encoder.is_halt());
        encoder.set_halt_flag(false);
        assert_eq!(encoder.packet()[OFFSET_FLAGS], FLAGS_NORMAL);
    }

    #[test]
    fn test_payload_exact_copy() {
        let mut encoder = encoder();
        let data: Vec<u8> = (0..1320).map(|i| (i % 251) as u8 + 1).collect();
        encoder.set_payload(&data);
        assert_eq!(encoder.payload(), &data[..]);
    }

    #[test]
    fn test_payload_short_zeroes_tail() {
        let mut encoder = encoder();
        encoder.set_payload(&[0xAA; 1320]);

        encoder.set_payload(&[0x55; 100]);
        let payload = encoder.payload();
        assert!(payload[..100].iter().all(|&b| b == 0x55));
        assert!(payload[100..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_payload_too_long_sends_silence() {
        // Silent degradation: oversize input is dropped, not an error
        let mut encoder = encoder();
        encoder.set_payload(&[0xAA; 1320]);

        encoder.set_payload(&[0x77; 1321]);
        assert_eq!(encoder.bytes(), 1370);
        assert!(encoder.payload().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_oversized_format_never_overruns() {
        let mut encoder = encoder();
        let big = FormatDescriptor::new(96000, 32, 8, 480);
        encoder.set_format(&big, 0, 100);

        assert!(encoder.is_degraded());
        assert_eq!(encoder.bytes(), 50 + 1320);
        encoder.set_payload(&[0x11; 1000]);
        assert!(encoder.payload().iter().all(|&b| b == 0));

        encoder.set_format(&FormatDescriptor::default(), 0, 100);
        assert!(!encoder.is_degraded());
        encoder.set_payload(&[0x11; 1320]);
        assert!(encoder.payload().iter().all(|&b| b == 0x11));
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let result = PacketEncoder::new(usize::MAX, FormatDescriptor::default());
        assert!(matches!(result, Err(EncoderError::Allocation { .. })));
    }
}

//! Supported PCM formats.
//!
//! A [`FormatDescriptor`] describes one linear PCM layout and derives the
//! payload size and wall-clock duration of a single packet. All derivations
//! use integer arithmetic so millions of packets never drift.

use std::time::Duration;

/// One supported PCM format.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatDescriptor {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample
    pub bit_depth: u8,
    /// Interleaved channel count
    pub channels: u8,
    /// Samples per channel carried in one packet
    pub samples_per_packet: u16,
}

impl FormatDescriptor {
    pub const fn new(sample_rate: u32, bit_depth: u8, channels: u8, samples_per_packet: u16) -> Self {
        Self {
            sample_rate,
            bit_depth,
            channels,
            samples_per_packet,
        }
    }

    /// Payload size in bytes of one packet in this format.
    pub const fn payload_bytes(&self) -> usize {
        self.samples_per_packet as usize * self.channels as usize * self.bit_depth as usize / 8
    }

    /// Duration of one packet in nanoseconds (64-bit to avoid overflow).
    pub const fn packet_duration_ns(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        1_000_000_000u64 * self.samples_per_packet as u64 / self.sample_rate as u64
    }

    pub const fn packet_duration(&self) -> Duration {
        Duration::from_nanos(self.packet_duration_ns())
    }

    /// Bit rate as carried on the wire: rate x channels x depth.
    pub const fn bit_rate(&self) -> u32 {
        (self.sample_rate as u64 * self.channels as u64 * self.bit_depth as u64) as u32
    }

    pub fn is_supported(&self) -> bool {
        SUPPORTED_FORMATS.contains(self)
    }
}

impl Default for FormatDescriptor {
    fn default() -> Self {
        SUPPORTED_FORMATS[0]
    }
}

/// Formats the sender can stream. The first entry is the session default.
pub const SUPPORTED_FORMATS: &[FormatDescriptor] = &[
    // SampleRate, BitDepth, Channels, SamplesPerPacket
    FormatDescriptor::new(44100, 24, 2, 220),
];

/// Largest payload across [`SUPPORTED_FORMATS`]; sizes the packet buffer.
pub fn max_payload_bytes() -> usize {
    SUPPORTED_FORMATS
        .iter()
        .map(FormatDescriptor::payload_bytes)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_sizes() {
        let format = FormatDescriptor::default();
        assert_eq!(format, FormatDescriptor::new(44100, 24, 2, 220));
        assert_eq!(format.payload_bytes(), 1320);
        assert_eq!(format.bit_rate(), 2_116_800);
    }

    #[test]
    fn test_packet_duration() {
        let format = FormatDescriptor::default();
        // 220 / 44100 s = 4.988662... ms, truncated
        assert_eq!(format.packet_duration_ns(), 4_988_662);
        assert_eq!(format.packet_duration(), Duration::from_nanos(4_988_662));

        let format = FormatDescriptor::new(48000, 24, 2, 48);
        assert_eq!(format.packet_duration_ns(), 1_000_000);
    }

    #[test]
    fn test_zero_rate_has_no_duration() {
        let format = FormatDescriptor::new(0, 16, 2, 64);
        assert_eq!(format.packet_duration_ns(), 0);
    }

    #[test]
    fn test_max_payload_covers_table() {
        let max = max_payload_bytes();
        assert!(max > 0);
        assert!(SUPPORTED_FORMATS.iter().all(|f| f.payload_bytes() <= max));
        assert_eq!(max, 1320);
    }

    #[test]
    fn test_is_supported() {
        assert!(FormatDescriptor::default().is_supported());
        assert!(!FormatDescriptor::new(96000, 24, 2, 480).is_supported());
    }
}

//! Stream a 440 Hz test tone to Songcast receivers.
//!
//! Usage: cargo run --example tone_sender -- [ohm://GROUP:PORT?iface=IP&ttl=N&latency=MS]
//!
//! Press Ctrl+C to stop; the last packet carries the halt flag.

use std::env;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use songcast_sender::{FormatDescriptor, SendOutcome, SenderConfig, StreamSession};

const TONE_HZ: f64 = 440.0;
const AMPLITUDE: f64 = 0.25;

/// Fill `out` with interleaved 24-bit big-endian samples of a sine wave.
fn render_tone(out: &mut [u8], format: &FormatDescriptor, phase: &mut f64) {
    let step = 2.0 * PI * TONE_HZ / format.sample_rate as f64;
    let frame_bytes = 3 * format.channels as usize;

    for frame in out.chunks_exact_mut(frame_bytes) {
        let sample = (phase.sin() * AMPLITUDE * 8_388_607.0) as i32;
        let u24 = (sample as u32) & 0x00FF_FFFF;
        for channel in frame.chunks_exact_mut(3) {
            channel[0] = (u24 >> 16) as u8;
            channel[1] = (u24 >> 8) as u8;
            channel[2] = u24 as u8;
        }
        *phase = (*phase + step) % (2.0 * PI);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let url = env::args()
        .nth(1)
        .unwrap_or_else(|| "ohm://239.253.38.1:51972".to_string());
    let config = match SenderConfig::parse(&url) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid URL '{}': {}", url, e);
            std::process::exit(1);
        }
    };

    println!("Streaming {} Hz tone to {} (ttl {})", TONE_HZ, config.endpoint, config.ttl);

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
            eprintln!("Failed to install Ctrl+C handler: {}", e);
        }
    }

    let session = StreamSession::from_config(&config);
    if session.endpoint().is_none() {
        eprintln!("Endpoint not configured; packets will be dropped");
    }
    session.set_active(true);

    let format = FormatDescriptor::default();
    let period = format.packet_duration();
    let mut pcm = vec![0u8; format.payload_bytes()];
    let mut phase = 0.0;
    let mut frame: u32 = 0;

    let start = Instant::now();
    let mut next = start;

    loop {
        let stopping = !running.load(Ordering::SeqCst);
        if stopping {
            session.set_active(false);
        }

        render_tone(&mut pcm, &format, &mut phase);
        let timestamp_ns = start.elapsed().as_nanos() as u64;
        let outcome = session.send(&format, frame, timestamp_ns, config.latency_ms, false, &pcm);
        frame = frame.wrapping_add(1);

        if stopping {
            if let SendOutcome::Sent { halt: true, .. } = outcome {
                println!("Halt sent at frame {}", frame.wrapping_sub(1));
            }
            break;
        }

        next += period;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else if now - next > Duration::from_millis(100) {
            // Fell far behind: resync rather than burst
            next = now;
        }
    }

    let stats = session.stats();
    println!(
        "Sent {} packets ({} halt, {} failed)",
        stats.packets_sent, stats.halts_sent, stats.send_failures
    );
}

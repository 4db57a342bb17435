//! Pull multiplexed color+depth buffers from the mock backend to stdout.
//!
//! Usage: cargo run --example stream

use realsense_mux::mock::{MockHost, MockSdk};
use realsense_mux::{Flow, RealsenseSrc};
use std::time::Instant;

fn main() {
    env_logger::init();

    let mut src = RealsenseSrc::new(MockSdk::new(), MockHost::new());
    if let Err(e) = src.start() {
        eprintln!("Failed to start capture: {}", e);
        std::process::exit(1);
    }

    let format = *src.negotiated_format().expect("format is negotiated after start");
    println!(
        "Output: {}x{} RGB @ {}/{} fps, {} bytes/frame",
        format.width, format.height, format.fps_n, format.fps_d, format.frame_size
    );

    let start = Instant::now();
    let mut count: u64 = 0;

    for _ in 0..90 {
        match src.create() {
            Ok(Flow::Buffer(buf)) => {
                count += 1;
                if count % 30 == 1 {
                    println!(
                        "frame offset={} pts={:?} ({} bytes)",
                        buf.offset,
                        buf.pts,
                        buf.data.len()
                    );
                }
            }
            Ok(Flow::Flushing) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    println!(
        "{} frames in {:.1}s ({:.1} fps)",
        count,
        elapsed,
        count as f64 / elapsed
    );
    src.stop();
}

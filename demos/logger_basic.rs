//! Minimal end-to-end use of the async logger from several producer
//! threads, mirroring how an exchange adapter would emit events.

use hft_core::{Level, Logger, LoggerConfig};
use std::sync::Arc;
use std::thread;

fn main() {
    println!("Async logger demo");
    println!("=================\n");

    let logger = Arc::new(
        Logger::init(
            "/tmp/hft-core-demo/trading.log",
            LoggerConfig {
                queue_capacity: 8192,
                batch_size: 128,
                flush_ms: 5,
                ..Default::default()
            },
        )
        .expect("failed to initialize logger"),
    );

    const PRODUCERS: usize = 4;
    const EVENTS_PER_PRODUCER: usize = 50_000;

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|id| {
            let logger = Arc::clone(&logger);
            thread::Builder::new()
                .name(format!("gateway-{id}"))
                .spawn(move || {
                    for i in 0..EVENTS_PER_PRODUCER {
                        logger.log(Level::Info, format_args!("order_ack seq={i}"));
                    }
                })
                .unwrap()
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    logger.shutdown();

    let stats = logger.stats();
    println!("written: {}", stats.written());
    println!("dropped: {}", stats.dropped());
    println!("bytes:   {}", stats.bytes());
    println!("errors:  {}", stats.errors());
}

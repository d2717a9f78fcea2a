//! Drives the SPSC ring across two threads and reports achieved throughput.

use hft_core::ring::Spsc;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

fn main() {
    const ITEMS: u64 = 10_000_000;
    let ring: Arc<Spsc<u64, 65536>> = Arc::new(Spsc::new());

    println!("SPSC ring throughput demo");
    println!("=========================\n");
    println!("Items: {ITEMS}\n");

    let start = Instant::now();

    let producer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            let mut i = 0u64;
            while i < ITEMS {
                if let Some(slot) = ring.producer_slot() {
                    *slot = i;
                    ring.publish();
                    i += 1;
                } else {
                    thread::yield_now();
                }
            }
        })
    };

    let consumer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            let mut sum = 0u64;
            let mut count = 0u64;
            while count < ITEMS {
                if let Some(value) = ring.consumer_slot() {
                    sum = sum.wrapping_add(*value);
                    ring.consume();
                    count += 1;
                } else {
                    thread::yield_now();
                }
            }
            sum
        })
    };

    producer.join().unwrap();
    let sum = consumer.join().unwrap();
    let elapsed = start.elapsed();

    println!("Consumed checksum: {sum}");
    println!("Elapsed: {:?}", elapsed);
    println!(
        "Throughput: {:.2} million items/sec",
        ITEMS as f64 / elapsed.as_secs_f64() / 1_000_000.0
    );
}

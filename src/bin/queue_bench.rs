//! Blocking queue throughput and latency benchmark.
//!
//! Usage:
//!     cargo run --release --bin queue_bench
//!
//! Environment variables:
//!     PRODUCER_CPU=0  Pin producer to CPU 0 (default: 0)
//!     CONSUMER_CPU=2  Pin consumer to CPU 2 (default: 2)

use std::env;
use std::sync::Arc;
use std::time::Instant;

use weir::queue::BoundedQueue;

const QUEUE_SIZE: usize = 1 << 10;
const ITERATIONS: usize = 1 << 20;

type Payload = u64;

fn get_cpu_affinity() -> (Option<usize>, Option<usize>) {
    let producer_cpu = env::var("PRODUCER_CPU")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(Some(0));
    let consumer_cpu = env::var("CONSUMER_CPU")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(Some(2));
    (producer_cpu, consumer_cpu)
}

fn pin_to_cpu(cpu: Option<usize>) {
    if let Some(id) = cpu {
        core_affinity::set_for_current(core_affinity::CoreId { id });
    }
}

fn bench_throughput(producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    let queue = Arc::new(BoundedQueue::<Payload>::new(QUEUE_SIZE).expect("non-zero capacity"));

    let rx = Arc::clone(&queue);
    let consumer_thread = std::thread::spawn(move || {
        pin_to_cpu(consumer_cpu);

        for expected in 0..ITERATIONS as Payload {
            let value = rx.pop();
            assert_eq!(value, expected, "data corruption");
        }
    });

    pin_to_cpu(producer_cpu);

    let start = Instant::now();

    for i in 0..ITERATIONS as Payload {
        queue.push(i);
    }

    consumer_thread.join().unwrap();
    let elapsed = start.elapsed();

    let ops_per_ms = ITERATIONS as u128 * 1_000_000 / elapsed.as_nanos();
    println!("{} ops/ms", ops_per_ms);
}

fn bench_rtt(producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    let request = Arc::new(BoundedQueue::<Payload>::new(QUEUE_SIZE).expect("non-zero capacity"));
    let response = Arc::new(BoundedQueue::<Payload>::new(QUEUE_SIZE).expect("non-zero capacity"));

    let req_rx = Arc::clone(&request);
    let resp_tx = Arc::clone(&response);

    // Responder thread: echoes every request back.
    let responder = std::thread::spawn(move || {
        pin_to_cpu(consumer_cpu);

        for _ in 0..ITERATIONS {
            let value = req_rx.pop();
            resp_tx.push(value);
        }
    });

    pin_to_cpu(producer_cpu);

    let start = Instant::now();

    for i in 0..ITERATIONS as Payload {
        request.push(i);
        let _ = response.pop();
    }

    let elapsed = start.elapsed();
    responder.join().unwrap();

    let rtt_ns = elapsed.as_nanos() / ITERATIONS as u128;
    println!("{} ns RTT", rtt_ns);
}

fn main() {
    let (producer_cpu, consumer_cpu) = get_cpu_affinity();

    println!("weir blocking queue (size={}, iters={}):", QUEUE_SIZE, ITERATIONS);
    bench_throughput(producer_cpu, consumer_cpu);
    bench_rtt(producer_cpu, consumer_cpu);
}

//! Percentile latency report for the two hot-path operations.
//!
//! Pre-generates the order stream, pins to the last CPU core, trains the
//! branch predictor, then records per-call wall time into an
//! HdrHistogram.

use hdrhistogram::Histogram;
use slab_lob::{Book, Side};
use std::time::Instant;

const ITERATIONS: u64 = 1_000_000;
const BUFFER_SIZE: usize = 10_000;

struct Shot {
    id: u64,
    side: Side,
    price: u32,
    volume: u64,
}

fn main() {
    println!("Preparing latency report...");

    // The last core is the one most likely to be isolated from OS noise
    if let Some(core_ids) = core_affinity::get_core_ids() {
        if let Some(last) = core_ids.last() {
            core_affinity::set_for_current(*last);
        }
    }

    let mut book = Book::with_capacity(1 << 20);
    let mut histogram = Histogram::<u64>::new_with_bounds(1, 100_000, 3).unwrap();

    // Pre-generate the stream so no RNG or formatting runs inside the
    // measured section
    println!("Pre-generating {BUFFER_SIZE} orders...");
    let shots: Vec<Shot> = (0..BUFFER_SIZE)
        .map(|i| Shot {
            id: i as u64 + 1,
            side: if i % 2 == 0 { Side::Buy } else { Side::Sell },
            price: 10_000 + (i as u32 % 100),
            volume: 10,
        })
        .collect();

    // Train the branch predictor and fault the first slabs in
    println!("Warming up ({BUFFER_SIZE} ops)...");
    for shot in &shots {
        std::hint::black_box(book.place_order(shot.id, 1, shot.side, shot.price, shot.volume).len());
    }

    println!("Running {ITERATIONS} iterations...");
    let mut total = std::time::Duration::ZERO;
    let mut next_id = BUFFER_SIZE as u64;

    for i in 0..ITERATIONS {
        let shot = &shots[(i as usize) % BUFFER_SIZE];
        next_id += 1;

        let start = Instant::now();
        std::hint::black_box(book.place_order(next_id, 1, shot.side, shot.price, shot.volume).len());
        let elapsed = start.elapsed();

        histogram.record(elapsed.as_nanos() as u64).unwrap_or(());
        total += elapsed;
    }

    println!("\n=== Latency Report (ns) ===");
    println!("Total Ops:  {ITERATIONS}");
    println!(
        "Throughput: {:.2} ops/sec",
        ITERATIONS as f64 / total.as_secs_f64()
    );
    println!("---------------------------");
    println!("Min:    {:6} ns", histogram.min());
    println!("P50:    {:6} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:6} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:6} ns", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:6} ns", histogram.value_at_quantile(0.999));
    println!("P99.99: {:6} ns", histogram.value_at_quantile(0.9999));
    println!("Max:    {:6} ns", histogram.max());
    println!("---------------------------");
    println!(
        "Book at exit: {} resting, {} bid levels, {} ask levels",
        book.resting_orders_count(),
        book.buy_levels_count(),
        book.sell_levels_count()
    );
}

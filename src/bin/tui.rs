//! Live book viewer driven by synthetic random-walk order flow.
//!
//! A load thread owns the book exclusively and hammers it with places
//! and cancels around a drifting mid price; the UI thread renders depth
//! bars from periodic snapshots. Only counters and snapshots cross the
//! thread boundary - the book itself is never shared.
//!
//! Run with: cargo run --release --features tui --bin tui

use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use slab_lob::{Book, Side};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

/// Top-of-book snapshot shared with the UI
#[derive(Default, Clone)]
struct BookSnapshot {
    bids: Vec<(u32, u64)>, // (price, volume)
    asks: Vec<(u32, u64)>,
    spread: u32,
}

struct SharedStats {
    ops_count: AtomicU64,
    ns_per_op: AtomicU64,
    resting: AtomicU64,
    pool_capacity: AtomicU64,
    snapshot: RwLock<BookSnapshot>,
}

impl SharedStats {
    fn new() -> Self {
        Self {
            ops_count: AtomicU64::new(0),
            ns_per_op: AtomicU64::new(0),
            resting: AtomicU64::new(0),
            pool_capacity: AtomicU64::new(0),
            snapshot: RwLock::new(BookSnapshot::default()),
        }
    }
}

const DEPTH_SHOWN: usize = 15;

fn render_depth_bars(levels: &[(u32, u64)]) -> String {
    let mut out = String::new();
    let max_volume = levels.iter().map(|&(_, v)| v).max().unwrap_or(1).max(1);

    for &(price, volume) in levels.iter().take(DEPTH_SHOWN) {
        let price_fmt = format!("{:.2}", price as f64 / 100.0);
        let bar_len = ((volume as f64 / max_volume as f64) * 20.0) as usize;
        let bar = "█".repeat(bar_len);
        out.push_str(&format!("{price_fmt:>9} {bar} {volume:<6}\n"));
    }
    out
}

fn load_thread(stats: Arc<SharedStats>) {
    let mut book = Book::with_capacity(1 << 20);

    let mut order_id = 0u64;
    let mut rng = 0x5EED_u64; // LCG; speed matters more than quality here
    let mut batch_no = 0u64;
    let mut recent: Vec<u64> = Vec::with_capacity(1024);

    // Mid starts at $3,000.00 in cent ticks
    let mut mid = 300_000u32;

    loop {
        const BATCH_SIZE: u64 = 1_000;
        let batch_start = std::time::Instant::now();

        for _ in 0..BATCH_SIZE {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            // High bits only; LCG low bits are poor
            let r = rng >> 32;

            // Occasional drift in the mid keeps the ladder moving
            if r % 100 == 0 {
                let drift = (r % 11) as i64 - 5;
                mid = (mid as i64 + drift).max(1_000) as u32;
            }

            if !recent.is_empty() && r % 10 < 3 {
                // ~30% cancels of a recent order
                let victim = recent.swap_remove((r as usize) % recent.len());
                book.cancel_order(victim);
            } else {
                order_id += 1;
                let side = if r % 2 == 0 { Side::Buy } else { Side::Sell };
                let half_spread = 50 + (r % 200) as u32;
                let noise = ((r >> 8) % 20) as i64 - 10;
                let base = match side {
                    Side::Buy => mid.saturating_sub(half_spread),
                    Side::Sell => mid.saturating_add(half_spread),
                };
                let price = (base as i64 + noise).max(1) as u32;
                let volume = 1 + (rng % 100);

                book.place_order(order_id, 1, side, price, volume);
                if recent.len() < 1024 {
                    recent.push(order_id);
                }
            }
        }

        batch_no += 1;
        stats.ops_count.fetch_add(BATCH_SIZE, Ordering::Relaxed);
        let elapsed = batch_start.elapsed();
        stats
            .ns_per_op
            .store(elapsed.as_nanos() as u64 / BATCH_SIZE, Ordering::Relaxed);
        stats
            .resting
            .store(book.resting_orders_count() as u64, Ordering::Relaxed);
        stats
            .pool_capacity
            .store(book.order_pool_capacity() as u64, Ordering::Relaxed);

        // Publish a snapshot every ~50 batches
        if batch_no % 50 == 0 {
            if let Ok(mut guard) = stats.snapshot.write() {
                guard.bids = book
                    .buy_prices()
                    .into_iter()
                    .take(DEPTH_SHOWN)
                    .map(|p| (p, book.depth_at(Side::Buy, p).0))
                    .collect();
                guard.asks = book
                    .sell_prices()
                    .into_iter()
                    .take(DEPTH_SHOWN)
                    .map(|p| (p, book.depth_at(Side::Sell, p).0))
                    .collect();
                guard.spread = book.spread();
            }
        }

        // Keep the demo bounded: wipe and restart the session once the
        // book gets crowded
        if book.resting_orders_count() > 500_000 {
            book.clear();
            recent.clear();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let stats = Arc::new(SharedStats::new());
    let stats_clone = stats.clone();
    thread::spawn(move || load_thread(stats_clone));

    let mut last_ops = 0u64;
    let mut last_time = std::time::Instant::now();
    let mut throughput = 0.0f64;

    loop {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('q') {
                    break;
                }
            }
        }

        let now = std::time::Instant::now();
        if now.duration_since(last_time).as_secs_f64() >= 1.0 {
            let ops = stats.ops_count.load(Ordering::Relaxed);
            throughput = (ops - last_ops) as f64;
            last_ops = ops;
            last_time = now;
        }

        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(10),
                    Constraint::Length(6),
                ])
                .split(f.size());

            let header = Block::default().borders(Borders::ALL).title("slab-lob demo");
            let title = Paragraph::new("synthetic random-walk flow | press 'q' to quit")
                .block(header)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Cyan));
            f.render_widget(title, chunks[0]);

            let book_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[1]);

            let snapshot = stats.snapshot.read().unwrap().clone();
            let bids_widget = Paragraph::new(render_depth_bars(&snapshot.bids)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("BIDS")
                    .style(Style::default().fg(Color::Green)),
            );
            let asks_widget = Paragraph::new(render_depth_bars(&snapshot.asks)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("ASKS")
                    .style(Style::default().fg(Color::Red)),
            );
            f.render_widget(bids_widget, book_chunks[0]);
            f.render_widget(asks_widget, book_chunks[1]);

            let ops_fmt = if throughput > 1_000_000.0 {
                format!("{:.2} M", throughput / 1_000_000.0)
            } else {
                format!("{:.0} k", throughput / 1_000.0)
            };
            let resting = stats.resting.load(Ordering::Relaxed);
            let capacity = stats.pool_capacity.load(Ordering::Relaxed).max(1);
            let stats_text = format!(
                "Throughput: {} ops/sec\nLatency (batch avg): {} ns\nResting: {} / {} pool slots ({:.1}%)\nSpread: {} ticks",
                ops_fmt,
                stats.ns_per_op.load(Ordering::Relaxed),
                resting,
                capacity,
                resting as f64 / capacity as f64 * 100.0,
                snapshot.spread,
            );
            let stats_block = Paragraph::new(stats_text)
                .block(Block::default().borders(Borders::ALL).title("Telemetry"))
                .style(Style::default().fg(Color::Yellow));
            f.render_widget(stats_block, chunks[2]);
        })?;
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    Ok(())
}

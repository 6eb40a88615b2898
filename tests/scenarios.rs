//! End-to-end flows through the public API: resting, matching, FIFO,
//! cancellation, and the conservation/pricing laws the book guarantees.

use slab_lob::{Book, OrderStatus, Side, Trade};

#[test]
fn no_match_insert_rests_on_empty_book() {
    let mut book = Book::new();

    let trades = book.place_order(1, 1, Side::Buy, 100, 50);
    assert!(trades.is_empty());

    assert_eq!(book.best_bid(), 100);
    assert_eq!(book.buy_levels_count(), 1);
    assert_eq!(book.sell_levels_count(), 0);
    assert_eq!(book.resting_orders_count(), 1);
}

#[test]
fn taker_fills_maker_completely_and_rests_remainder() {
    let mut book = Book::new();
    book.place_order(1, 1, Side::Sell, 100, 30);

    let trades = book.place_order(2, 2, Side::Buy, 100, 50);
    assert_eq!(trades, &[Trade::new(2, 1, 100, 30)]);

    assert_eq!(book.sell_levels_count(), 0);
    assert_eq!(book.buy_levels_count(), 1);
    assert_eq!(book.order_volume(2), Some(20));
    assert_eq!(book.order_status(1), OrderStatus::Deleted);
    assert_eq!(book.order_status(2), OrderStatus::Active);
}

#[test]
fn fifo_across_multiple_makers_at_one_price() {
    let mut book = Book::new();
    book.place_order(1, 1, Side::Buy, 100, 10);
    book.place_order(2, 1, Side::Buy, 100, 20);
    book.place_order(3, 1, Side::Buy, 100, 30);

    let trades = book.place_order(4, 2, Side::Sell, 100, 60);
    assert_eq!(
        trades,
        &[
            Trade::new(4, 1, 100, 10),
            Trade::new(4, 2, 100, 20),
            Trade::new(4, 3, 100, 30),
        ]
    );

    assert!(book.is_empty());
    assert_eq!(book.buy_levels_count(), 0);
    for id in 1..=4 {
        assert_eq!(book.order_status(id), OrderStatus::Deleted);
    }
}

#[test]
fn partial_taker_eats_partial_maker() {
    let mut book = Book::new();
    book.place_order(1, 1, Side::Buy, 100, 10);
    book.place_order(2, 1, Side::Buy, 100, 20);

    let trades = book.place_order(3, 2, Side::Sell, 100, 25);
    assert_eq!(
        trades,
        &[Trade::new(3, 1, 100, 10), Trade::new(3, 2, 100, 15)]
    );

    assert_eq!(book.order_status(1), OrderStatus::Deleted);
    assert_eq!(book.order_status(2), OrderStatus::Active);
    assert_eq!(book.order_volume(2), Some(5));
    assert_eq!(book.order_status(3), OrderStatus::Deleted);
}

#[test]
fn cancel_unlocks_next_best_level() {
    let mut book = Book::new();
    book.place_order(1, 1, Side::Buy, 100, 10);
    book.place_order(2, 1, Side::Buy, 110, 10);
    assert_eq!(book.best_bid(), 110);

    book.cancel_order(2);
    assert_eq!(book.best_bid(), 100);
    assert_eq!(book.order_status(2), OrderStatus::Deleted);

    let trades = book.place_order(3, 2, Side::Sell, 100, 10);
    assert_eq!(trades, &[Trade::new(3, 1, 100, 10)]);
    assert!(book.is_empty());
}

#[test]
fn steady_state_churn_keeps_pool_footprint_bounded() {
    let mut book = Book::with_capacity(1024);

    let mut capacity_after_first_cycle = 0;
    for cycle in 0u64..20 {
        // 100 resting buys across a band of prices
        for i in 1..=100 {
            book.place_order(cycle * 1_000 + i, 1, Side::Buy, 100 + (i % 10) as u32, 10);
        }
        // 100 aggressive sells that sweep most of them
        for i in 1..=100 {
            book.place_order(500_000 + cycle * 1_000 + i, 2, Side::Sell, 100, 1_000);
        }
        // Cancel whatever is left on either side
        for i in 1..=100 {
            book.cancel_order(cycle * 1_000 + i);
        }
        for i in 1..=100 {
            book.cancel_order(500_000 + cycle * 1_000 + i);
        }

        assert_eq!(book.resting_orders_count(), 0, "cycle {cycle}");
        if cycle == 0 {
            capacity_after_first_cycle = book.order_pool_capacity();
        } else {
            // Footprint is bounded by the peak of a single cycle, not by
            // the number of cycles
            assert_eq!(book.order_pool_capacity(), capacity_after_first_cycle);
        }
    }
}

#[test]
fn cancel_is_idempotent() {
    let mut book = Book::new();
    book.place_order(1, 1, Side::Buy, 100, 10);

    book.cancel_order(1);
    let bid_after_one = book.best_bid();
    let count_after_one = book.resting_orders_count();

    book.cancel_order(1);
    assert_eq!(book.best_bid(), bid_after_one);
    assert_eq!(book.resting_orders_count(), count_after_one);
}

#[test]
fn volume_is_conserved_through_matching() {
    let mut book = Book::new();
    book.place_order(1, 1, Side::Buy, 100, 40);
    book.place_order(2, 1, Side::Buy, 99, 25);

    let resting_before: u64 = 40 + 25;
    let incoming = 50u64;

    let trades = book.place_order(3, 2, Side::Sell, 99, incoming);
    let matched: u64 = trades.iter().map(|t| t.volume).sum();

    let resting_after: u64 = [1, 2, 3]
        .iter()
        .filter_map(|&id| book.order_volume(id))
        .sum();

    // Each fill removes `volume` from both the resting side and the
    // incoming order, so the ledger balances with 2x the matched volume.
    assert_eq!(resting_after + 2 * matched, resting_before + incoming);
    assert_eq!(matched, 50);
    assert_eq!(book.order_volume(2), Some(15));
}

#[test]
fn every_trade_prints_at_the_resting_price() {
    let mut book = Book::new();
    book.place_order(1, 1, Side::Sell, 101, 10);
    book.place_order(2, 1, Side::Sell, 103, 10);
    book.place_order(3, 1, Side::Sell, 105, 10);

    // Buy through all three levels at a much higher limit
    let trades = book.place_order(4, 2, Side::Buy, 120, 30).to_vec();
    assert_eq!(trades.len(), 3);
    assert_eq!(trades[0].price, 101);
    assert_eq!(trades[1].price, 103);
    assert_eq!(trades[2].price, 105);
    for trade in &trades {
        assert_eq!(trade.incoming_order_id, 4);
    }
}

#[test]
fn price_walks_stay_sorted_under_churn() {
    let mut book = Book::new();
    let prices = [105u32, 95, 100, 110, 90, 98];
    for (i, &price) in prices.iter().enumerate() {
        book.place_order(i as u64 + 1, 1, Side::Buy, price, 10);
        book.place_order(i as u64 + 100, 1, Side::Sell, price + 30, 10);
    }

    book.cancel_order(4); // drop the 110 bid
    book.place_order(200, 1, Side::Buy, 103, 10);

    let bids = book.buy_prices();
    let asks = book.sell_prices();
    assert!(bids.windows(2).all(|w| w[0] > w[1]), "bids not descending: {bids:?}");
    assert!(asks.windows(2).all(|w| w[0] < w[1]), "asks not ascending: {asks:?}");
    assert_eq!(bids.first().copied().unwrap_or(0), book.best_bid());
    assert_eq!(asks.first().copied().unwrap_or(0), book.best_ask());
}

#[test]
fn trade_buffer_is_reused_across_calls() {
    let mut book = Book::new();
    book.place_order(1, 1, Side::Sell, 100, 10);

    let first = book.place_order(2, 2, Side::Buy, 100, 10).to_vec();
    assert_eq!(first.len(), 1);

    // The next place overwrites the buffer; a non-matching order leaves
    // it empty
    let second = book.place_order(3, 1, Side::Buy, 90, 10);
    assert!(second.is_empty());
}

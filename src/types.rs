//! Core vocabulary types shared across the book.
//!
//! Prices are fixed-point unsigned ticks (e.g. $100.50 -> 10050 with a
//! 2-decimal tick); volumes are share counts. Both are caller-defined
//! units — the engine never interprets them beyond ordering.

/// External order identifier, caller-assigned.
pub type OrderId = u64;

/// Opaque agent/trader tag. Surfaced on orders, never interpreted.
pub type AgentId = u64;

/// Fixed-point limit price in ticks. Zero is not a valid order price.
pub type Price = u32;

/// Share count.
pub type Volume = u64;

/// Order side (buy = bid, sell = ask)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Buy = 0,
    /// Sell side (asks)
    Sell = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Lifecycle state of an order.
///
/// `Active` while resting (or transiently while matching); `Fulfilled` /
/// `Deleted` are terminal — an order never returns to `Active`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OrderStatus {
    /// Resting in the book (or currently being matched)
    Active = 0,
    /// Fully filled through matching
    Fulfilled = 1,
    /// Removed by cancellation (also reported for unknown ids)
    Deleted = 2,
}

/// A single execution between an incoming order and a resting order.
///
/// Prints at the resting (maker) order's limit price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trade {
    /// Taker: the aggressive order that triggered the match
    pub incoming_order_id: OrderId,
    /// Maker: the resting order that was hit
    pub matched_order_id: OrderId,
    /// Execution price (the maker's limit price)
    pub price: Price,
    /// Executed volume
    pub volume: Volume,
}

impl Trade {
    #[inline]
    pub const fn new(
        incoming_order_id: OrderId,
        matched_order_id: OrderId,
        price: Price,
        volume: Volume,
    ) -> Self {
        Self {
            incoming_order_id,
            matched_order_id,
            price,
            volume,
        }
    }
}

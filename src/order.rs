//! Order - a limit order with intrusive FIFO links.
//!
//! Orders live in the book's order pool; `prev`/`next` are pool handles
//! threading the order into its level's FIFO queue. The links are weak:
//! the pool owns the storage, the level only points into it.

use crate::pool::{PoolIndex, SlabPool, NULL_INDEX};
use crate::types::{AgentId, OrderId, OrderStatus, Price, Side, Volume};

/// Orders per pool slab.
pub const ORDER_SLAB_SIZE: usize = 16_384;

/// The order pool instantiation used by the book.
pub type OrderPool = SlabPool<Order, ORDER_SLAB_SIZE>;

/// A limit order. Immutable at creation apart from `remaining_volume`,
/// `status`, and the intrusive links.
#[derive(Debug)]
pub struct Order {
    /// External order id (caller-assigned, unique among resting orders)
    pub id: OrderId,
    /// Opaque tag of the agent who placed the order
    pub agent: AgentId,
    /// Buy or sell
    pub side: Side,
    /// Limit price (strictly positive)
    pub price: Price,
    /// Volume at creation
    pub initial_volume: Volume,
    /// Unfilled volume; 0 <= remaining_volume <= initial_volume
    pub remaining_volume: Volume,
    /// Lifecycle state
    pub status: OrderStatus,
    /// Previous order in the level's FIFO queue (NULL_INDEX if first)
    pub prev: PoolIndex,
    /// Next order in the level's FIFO queue (NULL_INDEX if last)
    pub next: PoolIndex,
}

impl Order {
    /// Create a new active order with the full volume remaining.
    #[inline]
    pub const fn new(
        id: OrderId,
        agent: AgentId,
        side: Side,
        price: Price,
        volume: Volume,
    ) -> Self {
        Self {
            id,
            agent,
            side,
            price,
            initial_volume: volume,
            remaining_volume: volume,
            status: OrderStatus::Active,
            prev: NULL_INDEX,
            next: NULL_INDEX,
        }
    }

    /// Reduce the remaining volume by `volume`; flips the order to
    /// `Fulfilled` when it reaches zero.
    ///
    /// `volume` must not exceed the remaining volume - the matching loop
    /// always fills with `min(resting, incoming)`.
    #[inline]
    pub fn fill(&mut self, volume: Volume) {
        debug_assert!(
            volume <= self.remaining_volume,
            "fill volume exceeds remaining volume"
        );
        self.remaining_volume -= volume;
        if self.remaining_volume == 0 {
            self.status = OrderStatus::Fulfilled;
        }
    }

    /// True once the order has no volume left.
    #[inline]
    pub const fn is_fulfilled(&self) -> bool {
        self.remaining_volume == 0
    }
}

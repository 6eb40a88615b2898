//! Book - the central limit order book and matching engine.
//!
//! One book is one instrument. All state is owned by the book: two slab
//! pools (orders, levels), the order-id index, per-side price maps, the
//! two sorted level lists, and the reusable trade buffer.
//!
//! The sorted lists are intrusive and doubly linked through the levels
//! themselves; the buy list runs descending (head = best bid), the sell
//! list ascending (head = best ask). The heads are authoritative - there
//! is no separate best-price cache to keep coherent.
//!
//! Strictly single-threaded: each call runs to completion, nothing
//! blocks, and the same input sequence from a cold start reproduces the
//! same trades and the same final state bit for bit.

use rustc_hash::FxHashMap;

use crate::index::OrderIndex;
use crate::level::{Level, LevelPool};
use crate::order::{Order, OrderPool};
use crate::pool::{PoolIndex, NULL_INDEX};
use crate::types::{AgentId, OrderId, OrderStatus, Price, Side, Trade, Volume};

/// Limit order book with price-time (FIFO) priority matching.
pub struct Book {
    /// Storage for every order; levels and the id index hold handles
    orders: OrderPool,
    /// Storage for every level; the lists and price maps hold handles
    levels: LevelPool,
    /// order id -> order handle, resting orders only
    ids: OrderIndex,
    /// price -> level handle, buy side
    buy_map: FxHashMap<Price, PoolIndex>,
    /// price -> level handle, sell side
    sell_map: FxHashMap<Price, PoolIndex>,
    /// Head of the descending buy list (best bid), NULL_INDEX if empty
    best_buy: PoolIndex,
    /// Head of the ascending sell list (best ask), NULL_INDEX if empty
    best_sell: PoolIndex,
    /// Reusable trade output buffer, cleared at the start of each place
    trades: Vec<Trade>,
}

impl Book {
    /// Create an empty book; pools grow on demand.
    pub fn new() -> Self {
        Self {
            orders: OrderPool::new(),
            levels: LevelPool::new(),
            ids: OrderIndex::new(),
            buy_map: FxHashMap::default(),
            sell_map: FxHashMap::default(),
            best_buy: NULL_INDEX,
            best_sell: NULL_INDEX,
            trades: Vec::with_capacity(64),
        }
    }

    /// Create a book with roughly `capacity` order slots pre-reserved
    /// (pool slabs, id index, and price maps sized to match).
    pub fn with_capacity(capacity: usize) -> Self {
        let levels = (capacity / 64).max(64);
        Self {
            orders: OrderPool::with_capacity(capacity),
            levels: LevelPool::with_capacity(levels),
            ids: OrderIndex::with_capacity(capacity),
            buy_map: FxHashMap::with_capacity_and_hasher(levels, Default::default()),
            sell_map: FxHashMap::with_capacity_and_hasher(levels, Default::default()),
            best_buy: NULL_INDEX,
            best_sell: NULL_INDEX,
            trades: Vec::with_capacity(64),
        }
    }

    // ========================================================================
    // Order entry
    // ========================================================================

    /// Place a limit order: match it against the opposite side, then rest
    /// any remainder in the book.
    ///
    /// Returns the trades generated, borrowed from an internal buffer
    /// that is overwritten by the next mutating call - copy them out if
    /// they must outlive that window.
    ///
    /// A zero price or zero volume is silently ignored: no allocation, no
    /// state change, empty trade slice back.
    pub fn place_order(
        &mut self,
        id: OrderId,
        agent: AgentId,
        side: Side,
        price: Price,
        volume: Volume,
    ) -> &[Trade] {
        self.trades.clear();
        if price == 0 || volume == 0 {
            return &self.trades;
        }

        let incoming = self.orders.allocate(Order::new(id, agent, side, price, volume));

        match side {
            Side::Buy => {
                while self.best_sell != NULL_INDEX && !self.orders.get(incoming).is_fulfilled() {
                    let level_idx = self.best_sell;
                    if price < self.levels.get(level_idx).price {
                        break;
                    }
                    if self.match_level(level_idx, incoming) {
                        self.drop_level(Side::Sell, level_idx);
                    }
                }
            }
            Side::Sell => {
                while self.best_buy != NULL_INDEX && !self.orders.get(incoming).is_fulfilled() {
                    let level_idx = self.best_buy;
                    if price > self.levels.get(level_idx).price {
                        break;
                    }
                    if self.match_level(level_idx, incoming) {
                        self.drop_level(Side::Buy, level_idx);
                    }
                }
            }
        }

        if self.orders.get(incoming).is_fulfilled() {
            self.orders.free(incoming);
        } else {
            self.rest_order(incoming);
        }

        &self.trades
    }

    /// Cancel a resting order. Unknown ids are an idempotent no-op.
    pub fn cancel_order(&mut self, id: OrderId) {
        let Some(index) = self.ids.find(id) else {
            return;
        };

        if self.orders.get(index).status != OrderStatus::Active {
            // Stale entry: drop it from the index, touch nothing else
            self.ids.erase(id);
            return;
        }

        let (side, price) = {
            let order = self.orders.get(index);
            (order.side, order.price)
        };

        let level_idx = match side {
            Side::Buy => self.buy_map.get(&price).copied(),
            Side::Sell => self.sell_map.get(&price).copied(),
        };
        if let Some(level_idx) = level_idx {
            let level = self.levels.get_mut(level_idx);
            level.erase(&mut self.orders, index);
            let emptied = level.is_empty();
            if emptied {
                self.drop_level(side, level_idx);
            }
        }

        self.orders.get_mut(index).status = OrderStatus::Deleted;
        self.ids.erase(id);
        self.orders.free(index);
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Match the incoming order against one opposite-side level, head to
    /// tail, until either the level drains or the incoming order fills.
    ///
    /// Every trade prints at the level's price - the resting (maker)
    /// order's limit, never the incoming price. Fulfilled resting orders
    /// are popped, dropped from the id index, and returned to the pool on
    /// the spot.
    ///
    /// Returns true if the level is now empty.
    fn match_level(&mut self, level_idx: PoolIndex, incoming_idx: PoolIndex) -> bool {
        let level_price = self.levels.get(level_idx).price;
        let incoming_id = self.orders.get(incoming_idx).id;

        loop {
            let resting_idx = self.levels.get(level_idx).head;
            if resting_idx == NULL_INDEX || self.orders.get(incoming_idx).is_fulfilled() {
                break;
            }

            let fill = self
                .orders
                .get(resting_idx)
                .remaining_volume
                .min(self.orders.get(incoming_idx).remaining_volume);

            self.orders.get_mut(resting_idx).fill(fill);
            self.orders.get_mut(incoming_idx).fill(fill);
            self.levels.get_mut(level_idx).decrease_volume(fill);

            let resting_id = self.orders.get(resting_idx).id;
            self.trades
                .push(Trade::new(incoming_id, resting_id, level_price, fill));

            if self.orders.get(resting_idx).is_fulfilled() {
                self.levels.get_mut(level_idx).pop_front(&mut self.orders);
                self.ids.erase(resting_id);
                self.orders.free(resting_idx);
            }
        }

        self.levels.get(level_idx).is_empty()
    }

    /// Rest an unfulfilled order: find or create its level, queue it, and
    /// index it for cancellation.
    fn rest_order(&mut self, index: PoolIndex) {
        let (id, side, price) = {
            let order = self.orders.get(index);
            (order.id, order.side, order.price)
        };
        // Caller contract: an id may only be reused once the prior
        // instance has left the book
        debug_assert!(self.ids.find(id).is_none(), "duplicate resting order id {id}");

        let level_idx = self.find_or_create_level(side, price);
        self.levels
            .get_mut(level_idx)
            .push_back(&mut self.orders, index);
        self.ids.insert(id, index);
    }

    // ========================================================================
    // Level list management
    // ========================================================================

    /// Look up the level at `price`, creating and linking it if absent.
    fn find_or_create_level(&mut self, side: Side, price: Price) -> PoolIndex {
        let map = match side {
            Side::Buy => &self.buy_map,
            Side::Sell => &self.sell_map,
        };
        if let Some(&index) = map.get(&price) {
            return index;
        }

        let index = self.levels.allocate(Level::new(price));
        self.link_level(side, index);
        match side {
            Side::Buy => self.buy_map.insert(price, index),
            Side::Sell => self.sell_map.insert(price, index),
        };
        index
    }

    /// Splice a fresh level into its side's sorted list.
    ///
    /// Walks from the head comparing prices - linear in the number of
    /// distinct levels, which stays small in practice, and only paid on
    /// level creation. Removal stays O(1) through the intrusive links.
    fn link_level(&mut self, side: Side, index: PoolIndex) {
        let price = self.levels.get(index).price;
        let mut prev = NULL_INDEX;
        let mut cursor = match side {
            Side::Buy => self.best_buy,
            Side::Sell => self.best_sell,
        };

        while cursor != NULL_INDEX {
            let cursor_price = self.levels.get(cursor).price;
            let cursor_better = match side {
                Side::Buy => cursor_price > price,
                Side::Sell => cursor_price < price,
            };
            if !cursor_better {
                break;
            }
            prev = cursor;
            cursor = self.levels.get(cursor).next_level;
        }

        {
            let level = self.levels.get_mut(index);
            level.prev_level = prev;
            level.next_level = cursor;
        }
        if prev == NULL_INDEX {
            match side {
                Side::Buy => self.best_buy = index,
                Side::Sell => self.best_sell = index,
            }
        } else {
            self.levels.get_mut(prev).next_level = index;
        }
        if cursor != NULL_INDEX {
            self.levels.get_mut(cursor).prev_level = index;
        }
    }

    /// Unlink an emptied level from its sorted list and price map, then
    /// return it to the pool. The list head moves when the best level
    /// goes.
    fn drop_level(&mut self, side: Side, index: PoolIndex) {
        let (prev, next, price) = {
            let level = self.levels.get(index);
            debug_assert!(level.is_empty());
            (level.prev_level, level.next_level, level.price)
        };

        if prev == NULL_INDEX {
            match side {
                Side::Buy => self.best_buy = next,
                Side::Sell => self.best_sell = next,
            }
        } else {
            self.levels.get_mut(prev).next_level = next;
        }
        if next != NULL_INDEX {
            self.levels.get_mut(next).prev_level = prev;
        }

        match side {
            Side::Buy => self.buy_map.remove(&price),
            Side::Sell => self.sell_map.remove(&price),
        };
        self.levels.free(index);
    }

    // ========================================================================
    // Observability (read-only)
    // ========================================================================

    /// Highest resting buy price, 0 if the buy side is empty.
    #[inline]
    pub fn best_bid(&self) -> Price {
        if self.best_buy == NULL_INDEX {
            0
        } else {
            self.levels.get(self.best_buy).price
        }
    }

    /// Lowest resting sell price, 0 if the sell side is empty.
    #[inline]
    pub fn best_ask(&self) -> Price {
        if self.best_sell == NULL_INDEX {
            0
        } else {
            self.levels.get(self.best_sell).price
        }
    }

    /// `best_ask - best_bid`, 0 if either side is empty.
    #[inline]
    pub fn spread(&self) -> Price {
        let (bid, ask) = (self.best_bid(), self.best_ask());
        if bid == 0 || ask == 0 {
            0
        } else {
            ask - bid
        }
    }

    /// Midpoint of the touch, 0.0 if either side is empty.
    #[inline]
    pub fn mid_price(&self) -> f64 {
        let (bid, ask) = (self.best_bid(), self.best_ask());
        if bid == 0 || ask == 0 {
            0.0
        } else {
            (bid as f64 + ask as f64) / 2.0
        }
    }

    /// Buy-side prices, best (highest) first.
    pub fn buy_prices(&self) -> Vec<Price> {
        self.walk_prices(self.best_buy)
    }

    /// Sell-side prices, best (lowest) first.
    pub fn sell_prices(&self) -> Vec<Price> {
        self.walk_prices(self.best_sell)
    }

    fn walk_prices(&self, head: PoolIndex) -> Vec<Price> {
        let mut prices = Vec::new();
        let mut cursor = head;
        while cursor != NULL_INDEX {
            let level = self.levels.get(cursor);
            if !level.is_empty() {
                prices.push(level.price);
            }
            cursor = level.next_level;
        }
        prices
    }

    /// Number of distinct buy-side price levels.
    #[inline]
    pub fn buy_levels_count(&self) -> usize {
        self.buy_map.len()
    }

    /// Number of distinct sell-side price levels.
    #[inline]
    pub fn sell_levels_count(&self) -> usize {
        self.sell_map.len()
    }

    /// Number of resting orders across both sides.
    #[inline]
    pub fn resting_orders_count(&self) -> usize {
        self.ids.len()
    }

    /// Status of the order with this id; `Deleted` for ids the book does
    /// not know (cancelled, fulfilled, or never seen).
    pub fn order_status(&self, id: OrderId) -> OrderStatus {
        match self.ids.find(id) {
            Some(index) => self.orders.get(index).status,
            None => OrderStatus::Deleted,
        }
    }

    /// Remaining volume of a resting order, if it is resting.
    pub fn order_volume(&self, id: OrderId) -> Option<Volume> {
        self.ids
            .find(id)
            .map(|index| self.orders.get(index).remaining_volume)
    }

    /// Total volume and order count at a price level, (0, 0) if absent.
    pub fn depth_at(&self, side: Side, price: Price) -> (Volume, u32) {
        let map = match side {
            Side::Buy => &self.buy_map,
            Side::Sell => &self.sell_map,
        };
        map.get(&price)
            .map(|&index| {
                let level = self.levels.get(index);
                (level.total_volume, level.order_count)
            })
            .unwrap_or((0, 0))
    }

    /// Returns true if nothing is resting.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Order-pool slot capacity (footprint introspection).
    #[inline]
    pub fn order_pool_capacity(&self) -> usize {
        self.orders.capacity()
    }

    /// Level-pool slot capacity (footprint introspection).
    #[inline]
    pub fn level_pool_capacity(&self) -> usize {
        self.levels.capacity()
    }

    /// Reset to the freshly-constructed state. Pool slabs are retained,
    /// so a cleared book re-fills without re-faulting pages.
    pub fn clear(&mut self) {
        self.orders.clear();
        self.levels.clear();
        self.ids.clear();
        self.buy_map.clear();
        self.sell_map.clear();
        self.best_buy = NULL_INDEX;
        self.best_sell = NULL_INDEX;
        self.trades.clear();
    }
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Book")
            .field("best_bid", &self.best_bid())
            .field("best_ask", &self.best_ask())
            .field("buy_levels", &self.buy_map.len())
            .field("sell_levels", &self.sell_map.len())
            .field("resting_orders", &self.ids.len())
            .finish()
    }
}

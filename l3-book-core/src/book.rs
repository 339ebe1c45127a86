use crate::types::{
    DepthEntry, Direction, Id, Instrument, L3BookError, Level, LevelTotals, Order, OrderView,
    Price, PriceAndQuantity, Quantity, Side, Timestamp,
};
use std::collections::{BTreeMap, HashMap};
use std::iter;

/// A full order-by-order (Level-3) limit order book.
///
/// Three structures are kept mutually consistent behind the mutation entry
/// points [`add`](L3Book::add), [`replace`](L3Book::replace),
/// [`delete`](L3Book::delete) and [`exec`](L3Book::exec): an order index
/// keyed by id, and one price-keyed level map per side. Every mutation
/// finishes by uncrossing the book, so callers always observe
/// best buy < best sell (or an empty side).
///
/// The book is single-writer and fully synchronous; it does no locking and
/// nothing is process-global. Each instance owns its own indexes.
pub struct L3Book {
    /// Instrument this book tracks
    pub instrument: Instrument,
    /// Buy levels; best price is the last key
    buy_side: BTreeMap<Price, Level>,
    /// Sell levels; best price is the first key
    sell_side: BTreeMap<Price, Level>,
    /// Order index: every live order, keyed by id
    orders: HashMap<Id, Order>,
    /// Admission counter; assigned to every (re-)inserted order
    next_timestamp: Timestamp,
}

impl L3Book {
    /// Creates an empty book for the given instrument.
    pub fn new(instrument: Instrument) -> Self {
        L3Book {
            instrument,
            buy_side: BTreeMap::new(),
            sell_side: BTreeMap::new(),
            orders: HashMap::new(),
            next_timestamp: 0,
        }
    }

    /// Adds a previously-unseen order to the book.
    ///
    /// Finds or creates the level at `price`, queues the order at the level
    /// (newest behind all earlier admissions), indexes it, then uncrosses
    /// the book from `side`.
    ///
    /// # Errors
    ///
    /// [`L3BookError::DuplicateOrder`] if `id` is already live,
    /// [`L3BookError::ZeroQuantity`] if `quantity` is zero.
    pub fn add(
        &mut self,
        id: Id,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Result<(), L3BookError> {
        if self.orders.contains_key(&id) {
            return Err(L3BookError::DuplicateOrder(id));
        }
        if quantity == 0 {
            return Err(L3BookError::ZeroQuantity { id, quantity });
        }

        let timestamp = self.next_timestamp;
        self.next_timestamp += 1;

        self.side_mut(side)
            .entry(price)
            .or_insert_with(|| Level::new(price))
            .admit(timestamp, id, quantity);
        self.orders
            .insert(id, Order::new(id, side, price, quantity, timestamp));

        self.uncross(side);
        Ok(())
    }

    /// Replaces a live order's price and/or quantity.
    ///
    /// Shrinking the quantity at an unchanged price and side keeps the
    /// order's queue position (the priority-neutral hot path). Any other
    /// combination loses priority: the order is deleted and re-added as if
    /// newly arrived.
    ///
    /// # Errors
    ///
    /// [`L3BookError::UnknownOrder`] if `id` is not live,
    /// [`L3BookError::ZeroQuantity`] if `quantity` is zero.
    pub fn replace(
        &mut self,
        id: Id,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Result<(), L3BookError> {
        let (cur_side, cur_price, cur_quantity, timestamp) = match self.orders.get(&id) {
            Some(order) => (order.side, order.price, order.quantity, order.timestamp),
            None => return Err(L3BookError::UnknownOrder(id)),
        };
        if quantity == 0 {
            return Err(L3BookError::ZeroQuantity { id, quantity });
        }

        let in_place = side == cur_side && price == cur_price && quantity < cur_quantity;
        if in_place {
            let delta = cur_quantity - quantity;
            self.side_mut(side)
                .get_mut(&price)
                .ok_or(L3BookError::Corruption("replaced order has no level"))?
                .reduce(timestamp, delta)
                .map_err(L3BookError::Corruption)?;
            if let Some(order) = self.orders.get_mut(&id) {
                order.quantity = quantity;
            }
            Ok(())
        } else {
            self.delete(id)?;
            self.add(id, side, price, quantity)
        }
    }

    /// Removes a live order from the book.
    ///
    /// Unlinks the order from its level by the stored position handle,
    /// shrinks the level aggregates, drops the level if it emptied, and
    /// removes the order from the index.
    ///
    /// # Errors
    ///
    /// [`L3BookError::UnknownOrder`] if `id` is not live;
    /// [`L3BookError::Corruption`] if the order's level or queue slot is
    /// missing, or an aggregate would go negative.
    pub fn delete(&mut self, id: Id) -> Result<(), L3BookError> {
        let order = match self.orders.get(&id) {
            Some(order) => order.clone(),
            None => return Err(L3BookError::UnknownOrder(id)),
        };
        self.unlink(&order)?;
        self.orders.remove(&id);
        Ok(())
    }

    /// Executes quantity against a live order.
    ///
    /// An execution smaller than the order's remainder is a partial fill:
    /// the order stays live with its queue position intact. Anything else is
    /// a full fill of the remainder and removes the order. Either way the
    /// book is uncrossed from the order's side afterwards.
    ///
    /// # Errors
    ///
    /// [`L3BookError::UnknownOrder`] if `id` is not live;
    /// [`L3BookError::Corruption`] as for [`delete`](L3Book::delete).
    pub fn exec(&mut self, id: Id, exec_quantity: Quantity) -> Result<(), L3BookError> {
        let (side, price, remaining, timestamp) = match self.orders.get(&id) {
            Some(order) => (order.side, order.price, order.quantity, order.timestamp),
            None => return Err(L3BookError::UnknownOrder(id)),
        };

        if exec_quantity < remaining {
            self.side_mut(side)
                .get_mut(&price)
                .ok_or(L3BookError::Corruption("executed order has no level"))?
                .reduce(timestamp, exec_quantity)
                .map_err(L3BookError::Corruption)?;
            if let Some(order) = self.orders.get_mut(&id) {
                order.quantity -= exec_quantity;
            }
        } else {
            self.delete(id)?;
        }

        self.uncross(side);
        Ok(())
    }

    /// Returns the best (highest) buy price and total quantity at that level.
    pub fn best_buy(&self) -> Option<PriceAndQuantity> {
        self.buy_side
            .iter()
            .next_back()
            .map(|(price, level)| (*price, level.total_quantity))
    }

    /// Returns the best (lowest) sell price and total quantity at that level.
    pub fn best_sell(&self) -> Option<PriceAndQuantity> {
        self.sell_side
            .iter()
            .next()
            .map(|(price, level)| (*price, level.total_quantity))
    }

    /// Looks up a live order by id.
    pub fn order(&self, id: Id) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Number of live orders across both sides.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Returns true if the book has no orders on either side.
    pub fn is_empty(&self) -> bool {
        self.buy_side.is_empty() && self.sell_side.is_empty()
    }

    /// Returns up to `levels` (price, total quantity) pairs for one side,
    /// best price first.
    pub fn depth(&self, side: Side, levels: usize) -> Vec<PriceAndQuantity> {
        let iter: Box<dyn Iterator<Item = (&Price, &Level)>> = match side {
            Side::Buy => Box::new(self.buy_side.iter().rev()),
            Side::Sell => Box::new(self.sell_side.iter()),
        };

        iter.take(levels)
            .map(|(price, level)| (*price, level.total_quantity))
            .collect()
    }

    /// Lazy depth traversal: both sides walked best-to-worst in lockstep.
    ///
    /// Each step pairs the next buy level's totals with the next sell
    /// level's; once a side is exhausted it is reported as
    /// [`LevelTotals::EMPTY`] until the other side runs out. The iterator is
    /// finite and restartable; an empty book yields nothing.
    pub fn depth_levels(&self) -> impl Iterator<Item = DepthEntry> + '_ {
        let mut bids = self.buy_side.values().rev();
        let mut asks = self.sell_side.values();
        iter::from_fn(move || match (bids.next(), asks.next()) {
            (None, None) => None,
            (bid, ask) => Some(DepthEntry {
                bid: bid.map(Level::totals).unwrap_or(LevelTotals::EMPTY),
                ask: ask.map(Level::totals).unwrap_or(LevelTotals::EMPTY),
            }),
        })
    }

    /// Drives `f` once per depth step; `f` returning false stops the walk.
    pub fn for_each_level<F>(&self, mut f: F)
    where
        F: FnMut(&DepthEntry) -> bool,
    {
        for entry in self.depth_levels() {
            if !f(&entry) {
                break;
            }
        }
    }

    /// Lazy order-detail traversal over one side.
    ///
    /// Levels are visited whole, [`Direction::InnerToOuter`] starting at the
    /// best price and [`Direction::OuterToInner`] at the worst; within a
    /// level orders come oldest admission first (time priority). The
    /// iterator is finite and restartable.
    pub fn orders(&self, side: Side, direction: Direction) -> impl Iterator<Item = OrderView> + '_ {
        let levels: Box<dyn Iterator<Item = &Level>> = match (side, direction) {
            (Side::Buy, Direction::InnerToOuter) => Box::new(self.buy_side.values().rev()),
            (Side::Buy, Direction::OuterToInner) => Box::new(self.buy_side.values()),
            (Side::Sell, Direction::InnerToOuter) => Box::new(self.sell_side.values()),
            (Side::Sell, Direction::OuterToInner) => Box::new(self.sell_side.values().rev()),
        };

        levels.flat_map(move |level| {
            level.orders.values().map(move |resting| OrderView {
                side,
                level_price: level.price,
                level_quantity: level.total_quantity,
                quantity: resting.quantity,
                id: resting.id,
            })
        })
    }

    /// Drives `f` once per order on `side`; `f` returning false stops the
    /// walk.
    pub fn for_each_order<F>(&self, side: Side, direction: Direction, mut f: F)
    where
        F: FnMut(&OrderView) -> bool,
    {
        for view in self.orders(side, direction) {
            if !f(&view) {
                break;
            }
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<Price, Level> {
        match side {
            Side::Buy => &mut self.buy_side,
            Side::Sell => &mut self.sell_side,
        }
    }

    /// Unlinks `order` from its level and drops the level if it emptied.
    /// The order index is left untouched; callers pair this with index
    /// removal so no cross-link outlives the operation.
    fn unlink(&mut self, order: &Order) -> Result<(), L3BookError> {
        let side = self.side_mut(order.side);
        let level = side
            .get_mut(&order.price)
            .ok_or(L3BookError::Corruption("order points at a missing level"))?;
        level
            .withdraw(order.timestamp, order.quantity)
            .map_err(L3BookError::Corruption)?;
        if level.is_empty() {
            side.remove(&order.price);
        }
        Ok(())
    }

    /// Removes opposite-side liquidity invalidated by a best-price move on
    /// `side`.
    ///
    /// Every opposite level whose price does not strictly better the
    /// triggering side's best price is removed together with all its member
    /// orders' index entries; opposite prices are monotonic from the best,
    /// so the crossed levels are exactly the prefix up to the trigger price.
    /// No trades are produced; this only retracts stale resting interest.
    fn uncross(&mut self, side: Side) {
        let trigger = match side {
            Side::Buy => self.buy_side.keys().next_back().copied(),
            Side::Sell => self.sell_side.keys().next().copied(),
        };
        let Some(trigger) = trigger else {
            return;
        };

        let crossed: Vec<Price> = match side {
            Side::Buy => self.sell_side.range(..=trigger).map(|(p, _)| *p).collect(),
            Side::Sell => self.buy_side.range(trigger..).map(|(p, _)| *p).collect(),
        };

        for price in crossed {
            if let Some(level) = self.side_mut(side.opposite()).remove(&price) {
                for resting in level.orders.into_values() {
                    self.orders.remove(&resting.id);
                }
            }
        }
    }

    /// Checks every book invariant; test-only.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        for (side, levels) in [(Side::Buy, &self.buy_side), (Side::Sell, &self.sell_side)] {
            for (price, level) in levels {
                assert_eq!(*price, level.price, "level keyed under wrong price");
                assert!(!level.is_empty(), "empty level left in {side} side");
                let member_sum: Quantity = level.orders.values().map(|r| r.quantity).sum();
                assert_eq!(level.total_quantity, member_sum, "level quantity drifted");
                assert_eq!(
                    level.order_count,
                    level.orders.len() as u64,
                    "level count drifted"
                );
                for (timestamp, resting) in &level.orders {
                    let order = self
                        .orders
                        .get(&resting.id)
                        .expect("level member missing from order index");
                    assert_eq!(order.side, side);
                    assert_eq!(order.price, *price);
                    assert_eq!(order.timestamp, *timestamp);
                    assert_eq!(order.quantity, resting.quantity);
                }
            }
        }

        let indexed: usize = self.buy_side.values().map(|l| l.orders.len()).sum::<usize>()
            + self.sell_side.values().map(|l| l.orders.len()).sum::<usize>();
        assert_eq!(indexed, self.orders.len(), "order index has dangling entries");

        if let (Some((bid, _)), Some((ask, _))) = (self.best_buy(), self.best_sell()) {
            assert!(bid < ask, "book left crossed: bid {bid} >= ask {ask}");
        }
    }
}

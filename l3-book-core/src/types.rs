use derive_more::Display;
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::Validate;

pub type Price = u128;
pub type Quantity = u128;

pub type PriceAndQuantity = (Price, Quantity);
pub type Id = u64;
pub type Timestamp = u64;

/// Which side of the book an order rests on.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", value(rename_all = "lower"))]
pub enum Side {
    /// Buy order (bid) - best price is the highest
    Buy,
    /// Sell order (ask) - best price is the lowest
    Sell,
}

impl Side {
    /// The side resting interest is removed from when this side crosses.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Direction for order-detail traversal.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", value(rename_all = "kebab-case"))]
pub enum Direction {
    /// Best (nearest-to-market) level first
    InnerToOuter,
    /// Worst (furthest-from-market) level first
    OuterToInner,
}

/// A live order as tracked by the order index.
///
/// `timestamp` is the book-wide admission sequence number; together with
/// `side` and `price` it is the order's back-link into its level and its
/// position handle within that level's member map. A replace that loses
/// priority re-admits the order under a fresh timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Unique identifier for the order
    pub id: Id,
    /// Whether this is a buy or sell order
    pub side: Side,
    /// Price per unit in the smallest denomination
    pub price: Price,
    /// Remaining quantity; always positive while the order is live
    pub quantity: Quantity,
    /// Admission sequence number (position handle within the level)
    pub timestamp: Timestamp,
}

impl Order {
    pub fn new(id: Id, side: Side, price: Price, quantity: Quantity, timestamp: Timestamp) -> Self {
        Order {
            id,
            side,
            price,
            quantity,
            timestamp,
        }
    }
}

/// One member of a level's order queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Resting {
    pub(crate) id: Id,
    pub(crate) quantity: Quantity,
}

/// All resting orders at one price on one side, plus their aggregates.
///
/// Members are keyed by admission timestamp, so ascending iteration is
/// oldest-order-first (time priority) and any member can be unlinked by its
/// handle without scanning. Aggregates are maintained incrementally and must
/// always equal the sum/count of the members; a level whose last member
/// leaves is removed from its side immediately, so levels never rest empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Level {
    /// The price for this level
    pub(crate) price: Price,
    /// Member orders keyed by admission timestamp (oldest first)
    pub(crate) orders: BTreeMap<Timestamp, Resting>,
    /// Total quantity resting at this level
    pub(crate) total_quantity: Quantity,
    /// Number of orders resting at this level
    pub(crate) order_count: u64,
}

impl Level {
    pub(crate) fn new(price: Price) -> Self {
        Level {
            price,
            orders: BTreeMap::new(),
            total_quantity: 0,
            order_count: 0,
        }
    }

    /// Links a new member and bumps the aggregates.
    pub(crate) fn admit(&mut self, timestamp: Timestamp, id: Id, quantity: Quantity) {
        self.orders.insert(timestamp, Resting { id, quantity });
        self.total_quantity += quantity;
        self.order_count += 1;
    }

    /// Unlinks the member admitted at `timestamp` and shrinks the aggregates.
    ///
    /// Fails if the member is missing or an aggregate would underflow;
    /// either means the book structures have desynchronized.
    pub(crate) fn withdraw(
        &mut self,
        timestamp: Timestamp,
        quantity: Quantity,
    ) -> Result<(), &'static str> {
        if self.orders.remove(&timestamp).is_none() {
            return Err("order missing from its level");
        }
        self.total_quantity = self
            .total_quantity
            .checked_sub(quantity)
            .ok_or("level quantity underflow")?;
        self.order_count = self
            .order_count
            .checked_sub(1)
            .ok_or("level order count underflow")?;
        Ok(())
    }

    /// Shrinks the member admitted at `timestamp` by `delta` in place.
    ///
    /// The member keeps its queue position; used by the in-place replace and
    /// the partial-execution paths.
    pub(crate) fn reduce(
        &mut self,
        timestamp: Timestamp,
        delta: Quantity,
    ) -> Result<(), &'static str> {
        let resting = self
            .orders
            .get_mut(&timestamp)
            .ok_or("order missing from its level")?;
        resting.quantity = resting
            .quantity
            .checked_sub(delta)
            .ok_or("order quantity underflow")?;
        self.total_quantity = self
            .total_quantity
            .checked_sub(delta)
            .ok_or("level quantity underflow")?;
        Ok(())
    }

    pub(crate) fn totals(&self) -> LevelTotals {
        LevelTotals {
            price: self.price,
            quantity: self.total_quantity,
            count: self.order_count,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Aggregate view of one level, as reported by the depth traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelTotals {
    pub price: Price,
    pub quantity: Quantity,
    pub count: u64,
}

impl LevelTotals {
    /// Sentinel reported for an exhausted side during depth traversal.
    pub const EMPTY: LevelTotals = LevelTotals {
        price: 0,
        quantity: 0,
        count: 0,
    };
}

/// One step of the depth traversal: the next-best level on each side.
///
/// Once a side runs out of levels it is reported as [`LevelTotals::EMPTY`]
/// while the other side finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthEntry {
    pub bid: LevelTotals,
    pub ask: LevelTotals,
}

/// One step of the order-detail traversal.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
#[display(
    "{} {}({}) level {} total {}",
    side,
    quantity,
    id,
    level_price,
    level_quantity
)]
pub struct OrderView {
    /// Side being traversed
    pub side: Side,
    /// Price of the level this order rests at
    pub level_price: Price,
    /// Aggregate quantity of that level
    pub level_quantity: Quantity,
    /// The order's own remaining quantity
    pub quantity: Quantity,
    /// The order's identifier
    pub id: Id,
}

#[derive(Display, Debug, Clone, PartialEq, Eq, Hash)]
#[display("{}", symbol)]
pub struct Asset {
    /// Symbol string
    pub symbol: Cow<'static, str>,
    /// Minor units for display (e.g., USD=2, BTC=8)
    pub decimals: u8,
}

impl Asset {
    pub const fn new(symbol: &'static str, decimals: u8) -> Self {
        Self {
            symbol: Cow::Borrowed(symbol),
            decimals,
        }
    }
}

#[derive(Display, Validate, Debug, Clone, PartialEq, Eq, Hash)]
#[display("{}/{}", base, quote)]
pub struct Instrument {
    /// Base asset (e.g., BTC)
    pub base: Asset,
    /// Quote asset (e.g., USDT)
    pub quote: Asset,
}

impl Instrument {
    pub fn new(base: Asset, quote: Asset) -> Self {
        Self { base, quote }
    }
}

/// Error type for book operations.
///
/// `DuplicateOrder`, `UnknownOrder` and `ZeroQuantity` are caller mistakes.
/// `Corruption` means an internal invariant broke (aggregate underflow,
/// dangling back-link); there is no recovery path for it inside the book.
#[derive(Display, Debug, Clone, PartialEq, Eq)]
pub enum L3BookError {
    /// Order ID already live in the book
    #[display("order {} already in book", _0)]
    DuplicateOrder(Id),
    /// Order ID not currently live
    #[display("order {} not in book", _0)]
    UnknownOrder(Id),
    /// Order quantity is zero
    #[display("order {} quantity {} is 0, nothing to rest", id, quantity)]
    ZeroQuantity { id: Id, quantity: Quantity },
    /// Internal structures have desynchronized; indicates a prior bug
    #[display("book corrupted: {}", _0)]
    Corruption(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------- Asset ----------

    #[test]
    fn asset_display_and_new() {
        let btc = Asset::new("BTC", 8);
        assert_eq!(format!("{}", btc), "BTC");
        assert_eq!(btc.symbol, "BTC");
        assert_eq!(btc.decimals, 8);

        let usdt = Asset::new("USDT", 2);
        assert_eq!(format!("{}", usdt), "USDT");
        assert_eq!(usdt.decimals, 2);
    }

    // ---------- Level ----------

    #[test]
    fn level_new_and_is_empty() {
        let mut lvl = Level::new(10);
        assert_eq!(lvl.price, 10);
        assert!(lvl.is_empty());
        assert_eq!(
            lvl.totals(),
            LevelTotals {
                price: 10,
                quantity: 0,
                count: 0
            }
        );

        lvl.admit(0, 1, 5);
        assert!(!lvl.is_empty());
        assert_eq!(lvl.total_quantity, 5);
        assert_eq!(lvl.order_count, 1);
    }

    #[test]
    fn level_members_iterate_oldest_first() {
        let mut lvl = Level::new(42);

        // Admission out of id order; timestamps decide the queue order.
        lvl.admit(7, 30, 1);
        lvl.admit(3, 10, 2);
        lvl.admit(5, 20, 4);

        let ids: Vec<Id> = lvl.orders.values().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(lvl.total_quantity, 7);
        assert_eq!(lvl.order_count, 3);
    }

    #[test]
    fn level_withdraw_by_handle() {
        let mut lvl = Level::new(99);

        lvl.admit(0, 1, 10);
        lvl.admit(1, 2, 25);
        lvl.admit(2, 3, 5);

        // Unlink the middle member without disturbing its neighbours.
        lvl.withdraw(1, 25).unwrap();
        let ids: Vec<Id> = lvl.orders.values().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(lvl.total_quantity, 15);
        assert_eq!(lvl.order_count, 2);

        lvl.withdraw(0, 10).unwrap();
        lvl.withdraw(2, 5).unwrap();
        assert!(lvl.is_empty());

        // Withdrawing an absent handle is a structural fault.
        assert!(lvl.withdraw(1, 25).is_err());
    }

    #[test]
    fn level_withdraw_underflow_is_detected() {
        let mut lvl = Level::new(7);
        lvl.admit(0, 1, 10);
        assert_eq!(lvl.withdraw(0, 11), Err("level quantity underflow"));
    }

    #[test]
    fn level_reduce_keeps_position() {
        let mut lvl = Level::new(50);
        lvl.admit(0, 1, 10);
        lvl.admit(1, 2, 20);

        lvl.reduce(0, 4).unwrap();
        assert_eq!(lvl.orders[&0], Resting { id: 1, quantity: 6 });
        assert_eq!(lvl.total_quantity, 26);
        assert_eq!(lvl.order_count, 2);

        // First member is still first.
        assert_eq!(lvl.orders.values().next().unwrap().id, 1);

        // Reducing past the member's remainder is a structural fault.
        assert_eq!(lvl.reduce(0, 7), Err("order quantity underflow"));
    }

    #[test]
    fn error_display() {
        assert_eq!(
            L3BookError::DuplicateOrder(9).to_string(),
            "order 9 already in book"
        );
        assert_eq!(
            L3BookError::Corruption("level quantity underflow").to_string(),
            "book corrupted: level quantity underflow"
        );
    }
}

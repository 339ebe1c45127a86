//! # L3 Book Core
//!
//! An in-memory Level-3 (full order-by-order) limit order book.
//!
//! The book tracks every live resting order on both sides of one market and
//! keeps per-price-level aggregates (total quantity, order count) consistent
//! with the underlying orders under four mutations: add, replace, delete and
//! execute. After every mutation the book uncrosses itself by retracting
//! opposite-side liquidity the new best price has invalidated; it never
//! generates trades. Depth and order-detail views are exposed as lazy
//! iterators and as stop-on-false callback walks.
//!
//! Mutations cost O(log L) in the number of price levels, never O(orders).
//!
//! ## Example
//!
//! ```rust
//! use l3_book_core::{L3Book, Side};
//! use l3_book_core::types::{Asset, Instrument};
//!
//! let usdt = Asset::new("USDT", 2);
//! let btc = Asset::new("BTC", 6);
//! let mut book = L3Book::new(Instrument::new(btc, usdt));
//!
//! // Two bids at the same price (minor units)
//! book.add(1, Side::Buy, 10000, 10_000_000).unwrap();
//! book.add(2, Side::Buy, 10000, 5_000_000).unwrap();
//! assert_eq!(book.best_buy(), Some((10000, 15_000_000)));
//!
//! // Fully execute the first; the level and the second order survive
//! book.exec(1, 10_000_000).unwrap();
//! assert_eq!(book.best_buy(), Some((10000, 5_000_000)));
//! assert!(book.order(1).is_none());
//! ```

pub mod book;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;
mod units;

pub use book::L3Book;
pub use types::{DepthEntry, Direction, L3BookError, LevelTotals, Order, OrderView, Side};
pub use units::{
    format_price, format_quantity, price_from_minor_units, price_to_minor_units,
    quantity_from_minor_units, quantity_to_minor_units,
};

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use crate::types::Price;
    use crate::{DepthEntry, Direction, Side};

    #[test]
    fn two_sided_depth_walk() {
        let mut book = new_book();

        book.add(1, Side::Buy, price("100.00"), quantity("10")).unwrap();
        book.add(2, Side::Buy, price("99.00"), quantity("9")).unwrap();
        book.add(3, Side::Buy, price("98.00"), quantity("8")).unwrap();
        book.add(4, Side::Sell, price("101.00"), quantity("11")).unwrap();
        book.add(5, Side::Sell, price("102.00"), quantity("12")).unwrap();

        let entries: Vec<DepthEntry> = book.depth_levels().collect();
        assert_eq!(entries.len(), 3);

        // Lockstep, best to worst on both sides.
        let prices: Vec<(Price, Price)> = entries
            .iter()
            .map(|e| (e.bid.price, e.ask.price))
            .collect();
        assert_eq!(
            prices,
            vec![
                (price("100.00"), price("101.00")),
                (price("99.00"), price("102.00")),
                (price("98.00"), 0),
            ]
        );
        book.assert_consistent();
    }

    #[test]
    fn l3_view_print_order() {
        // The conventional full-book rendering: sell side outer-to-inner,
        // then buy side inner-to-outer, i.e. highest price to lowest.
        let mut book = new_book();

        book.add(20, Side::Sell, price("103.00"), quantity("1")).unwrap();
        book.add(17, Side::Sell, price("103.00"), quantity("1")).unwrap();
        book.add(3, Side::Sell, price("103.00"), quantity("10")).unwrap();
        book.add(1, Side::Sell, price("102.00"), quantity("7")).unwrap();
        book.add(7, Side::Sell, price("102.00"), quantity("4")).unwrap();
        book.add(12, Side::Buy, price("100.00"), quantity("2")).unwrap();
        book.add(5, Side::Buy, price("100.00"), quantity("8")).unwrap();
        book.add(41, Side::Buy, price("99.00"), quantity("1")).unwrap();
        book.add(28, Side::Buy, price("99.00"), quantity("7")).unwrap();

        let mut lines = Vec::new();
        book.for_each_order(Side::Sell, Direction::OuterToInner, |v| {
            lines.push((v.side, v.level_price, v.level_quantity, v.quantity, v.id));
            true
        });
        book.for_each_order(Side::Buy, Direction::InnerToOuter, |v| {
            lines.push((v.side, v.level_price, v.level_quantity, v.quantity, v.id));
            true
        });

        assert_eq!(
            lines,
            vec![
                (Side::Sell, price("103.00"), quantity("12"), quantity("1"), 20),
                (Side::Sell, price("103.00"), quantity("12"), quantity("1"), 17),
                (Side::Sell, price("103.00"), quantity("12"), quantity("10"), 3),
                (Side::Sell, price("102.00"), quantity("11"), quantity("7"), 1),
                (Side::Sell, price("102.00"), quantity("11"), quantity("4"), 7),
                (Side::Buy, price("100.00"), quantity("10"), quantity("2"), 12),
                (Side::Buy, price("100.00"), quantity("10"), quantity("8"), 5),
                (Side::Buy, price("99.00"), quantity("8"), quantity("1"), 41),
                (Side::Buy, price("99.00"), quantity("8"), quantity("7"), 28),
            ]
        );
    }

    #[test]
    fn churn_keeps_structures_consistent() {
        let mut book = new_book();

        for i in 1..=50u64 {
            let p = format!("{}.00", 100 - (i % 10));
            book.add(i, Side::Buy, price(&p), quantity("1")).unwrap();
        }
        for i in 51..=100u64 {
            let p = format!("{}.00", 101 + (i % 10));
            book.add(i, Side::Sell, price(&p), quantity("1")).unwrap();
        }
        book.assert_consistent();

        // Mixed churn: shrink, reprice, execute, remove.
        for i in (1..=40u64).step_by(4) {
            book.replace(i, Side::Buy, price("95.00"), quantity("2")).unwrap();
        }
        for i in (2..=40u64).step_by(4) {
            book.exec(i, quantity("1")).unwrap();
        }
        for i in (3..=40u64).step_by(4) {
            book.delete(i).unwrap();
        }
        book.assert_consistent();

        // A deep sweep from the sell side clears every remaining bid at or
        // above the new best sell.
        book.add(200, Side::Sell, price("90.00"), quantity("1")).unwrap();
        assert!(book.best_buy().is_none());
        book.assert_consistent();
    }

    #[test]
    fn one_sided_book_never_uncrosses() {
        let mut book = new_book();
        for i in 1..=5u64 {
            book.add(i, Side::Buy, price(&format!("{}.00", 95 + i)), quantity("1")).unwrap();
        }
        assert_eq!(book.len(), 5);
        assert_eq!(book.best_buy(), Some((price("100.00"), quantity("1"))));
        assert!(book.best_sell().is_none());
        book.assert_consistent();
    }
}

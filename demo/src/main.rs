//! # L3 Book Demo
//!
//! Demonstrates the Level-3 order book behaviors:
//! - Per-level aggregation of resting orders
//! - Partial and full executions
//! - Uncrossing after an aggressive add
//! - Priority-preserving vs priority-losing replaces
//! - The two traversal views (depth pairs and order-by-order detail)

use l3_book_core::types::{Asset, Instrument};
use l3_book_core::{
    price_from_minor_units, price_to_minor_units, quantity_from_minor_units,
    quantity_to_minor_units, Direction, L3Book, L3BookError, Side,
};
use rust_decimal::Decimal;
use std::str::FromStr;

fn main() {
    println!("=== L3 Limit Order Book Demo ===\n");

    let btc = Asset::new("BTC", 6); // Base: BTC (6 decimals)
    let usdt = Asset::new("USDT", 2); // Quote: USDT (2 decimals)
    let instrument = Instrument::new(btc, usdt);

    println!("Instrument details: {}", instrument);
    let mut book1 = L3Book::new(instrument.clone());
    demo_level_aggregation(&mut book1);

    let mut book2 = L3Book::new(instrument.clone());
    demo_uncross(&mut book2);

    let mut book3 = L3Book::new(instrument.clone());
    demo_replace_priority(&mut book3);

    let mut book4 = L3Book::new(instrument.clone());
    demo_traversals(&mut book4);
}

/// Orders at one price aggregate into a single level; executions shrink it.
fn demo_level_aggregation(book: &mut L3Book) {
    println!("--------------------------");
    println!("1. Level Aggregation Demo:");
    println!("--------------------------");

    add(book, 1, Side::Buy, "100.00", "0.010").expect("Failed to add order 1");
    add(book, 2, Side::Buy, "100.00", "0.005").expect("Failed to add order 2");
    print_book_state(book);

    println!("--Fully executing order 1 (0.010)");
    book.exec(1, qty(book, "0.010")).expect("Failed to exec order 1");
    print_book_state(book);

    println!("--Partially executing order 2 (0.002 of 0.005)");
    book.exec(2, qty(book, "0.002")).expect("Failed to exec order 2");
    print_book_state(book);
}

/// A sell admitted through the best bid retracts the crossed buy levels.
fn demo_uncross(book: &mut L3Book) {
    println!("-----------------");
    println!("2. Uncross Demo:");
    println!("-----------------");

    add(book, 10, Side::Buy, "101.00", "0.003").expect("Failed to add order 10");
    print_book_state(book);

    println!("--Adding SELL at 100.00, at or below the best bid of 101.00");
    add(book, 11, Side::Sell, "100.00", "0.003").expect("Failed to add order 11");
    print_book_state(book);

    match book.order(10) {
        Some(_) => println!("--Order 10 still live"),
        None => println!("--Order 10 was retracted by the uncross"),
    }
    println!();
}

/// Shrinking quantity at the same price keeps queue position; everything
/// else re-queues the order as if newly arrived.
fn demo_replace_priority(book: &mut L3Book) {
    println!("---------------------------");
    println!("3. Replace Priority Demo:");
    println!("---------------------------");

    add(book, 1, Side::Buy, "100.00", "0.010").expect("Failed to add order 1");
    add(book, 2, Side::Buy, "100.00", "0.005").expect("Failed to add order 2");

    println!("--Shrinking order 2 in place (0.005 -> 0.002), priority kept:");
    book.replace(2, Side::Buy, price(book, "100.00"), qty(book, "0.002"))
        .expect("Failed to replace order 2");
    print_queue(book);

    println!("--Growing order 1 (0.010 -> 0.020), priority lost:");
    book.replace(1, Side::Buy, price(book, "100.00"), qty(book, "0.020"))
        .expect("Failed to replace order 1");
    print_queue(book);
}

/// Walks the depth pairs and the order-by-order detail of a five-level book.
fn demo_traversals(book: &mut L3Book) {
    println!("--------------------");
    println!("4. Traversal Demo:");
    println!("--------------------");

    add(book, 20, Side::Sell, "103.00", "0.001").expect("Failed to add");
    add(book, 17, Side::Sell, "103.00", "0.001").expect("Failed to add");
    add(book, 3, Side::Sell, "103.00", "0.010").expect("Failed to add");
    add(book, 1, Side::Sell, "102.00", "0.007").expect("Failed to add");
    add(book, 7, Side::Sell, "102.00", "0.004").expect("Failed to add");
    add(book, 12, Side::Buy, "100.00", "0.002").expect("Failed to add");
    add(book, 5, Side::Buy, "100.00", "0.008").expect("Failed to add");
    add(book, 41, Side::Buy, "99.00", "0.001").expect("Failed to add");
    add(book, 28, Side::Buy, "99.00", "0.007").expect("Failed to add");

    println!("--Depth, both sides best to worst (bid | ask):");
    book.for_each_level(|entry| {
        let bid = if entry.bid.count > 0 {
            format!(
                "{} x {} ({} orders)",
                price_from_minor_units(entry.bid.price, &book.instrument.quote),
                quantity_from_minor_units(entry.bid.quantity, &book.instrument.base),
                entry.bid.count
            )
        } else {
            "-".to_string()
        };
        let ask = if entry.ask.count > 0 {
            format!(
                "{} x {} ({} orders)",
                price_from_minor_units(entry.ask.price, &book.instrument.quote),
                quantity_from_minor_units(entry.ask.quantity, &book.instrument.base),
                entry.ask.count
            )
        } else {
            "-".to_string()
        };
        println!("----{} | {}", bid, ask);
        true
    });

    println!("--L3 view, highest price to lowest, oldest order first per level:");
    book.for_each_order(Side::Sell, Direction::OuterToInner, |view| {
        println!(
            "----S {} level-qty {} order {}({})",
            price_from_minor_units(view.level_price, &book.instrument.quote),
            quantity_from_minor_units(view.level_quantity, &book.instrument.base),
            quantity_from_minor_units(view.quantity, &book.instrument.base),
            view.id
        );
        true
    });
    book.for_each_order(Side::Buy, Direction::InnerToOuter, |view| {
        println!(
            "----B {} level-qty {} order {}({})",
            price_from_minor_units(view.level_price, &book.instrument.quote),
            quantity_from_minor_units(view.level_quantity, &book.instrument.base),
            quantity_from_minor_units(view.quantity, &book.instrument.base),
            view.id
        );
        true
    });
}

/// Prints the queue of buy orders at the front level, best first.
fn print_queue(book: &L3Book) {
    book.for_each_order(Side::Buy, Direction::InnerToOuter, |view| {
        println!(
            "----order {} qty {}",
            view.id,
            quantity_from_minor_units(view.quantity, &book.instrument.base)
        );
        true
    });
}

/// Prints the current best bid and ask.
fn print_book_state(book: &L3Book) {
    println!("--Book state:");
    match book.best_buy() {
        Some((p, q)) => println!(
            "----Best BUY:  {} @ {}",
            quantity_from_minor_units(q, &book.instrument.base),
            price_from_minor_units(p, &book.instrument.quote)
        ),
        None => println!("----Best BUY:  None"),
    }
    match book.best_sell() {
        Some((p, q)) => println!(
            "----Best SELL: {} @ {}",
            quantity_from_minor_units(q, &book.instrument.base),
            price_from_minor_units(p, &book.instrument.quote)
        ),
        None => println!("----Best SELL: None"),
    }
    println!();
}

/// Helper to add an order from decimal strings.
fn add(
    book: &mut L3Book,
    id: u64,
    side: Side,
    price_decimal: &str,
    quantity_decimal: &str,
) -> Result<(), L3BookError> {
    println!(
        "--Adding {} order: ID={}, Price={}, Qty={}",
        side, id, price_decimal, quantity_decimal
    );
    book.add(id, side, price(book, price_decimal), qty(book, quantity_decimal))
}

fn price(book: &L3Book, s: &str) -> u128 {
    let d = Decimal::from_str(s).expect("bad demo price literal");
    price_to_minor_units(d, &book.instrument.quote).expect("demo price out of range")
}

fn qty(book: &L3Book, s: &str) -> u128 {
    let d = Decimal::from_str(s).expect("bad demo quantity literal");
    quantity_to_minor_units(d, &book.instrument.base).expect("demo quantity out of range")
}

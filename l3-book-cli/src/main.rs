//! # L3 Book CLI
//!
//! A command-line interface for driving a Level-3 order book.
//!
//! Supports one-shot commands against a fresh book and an interactive mode
//! where adds, replaces, deletes and executions accumulate in one book.

use clap::{Parser, Subcommand};
use l3_book_core::types::{Asset, Instrument, Price, Quantity};
use l3_book_core::{
    price_from_minor_units, price_to_minor_units, quantity_from_minor_units,
    quantity_to_minor_units, Direction, L3Book, Side,
};
use rust_decimal::Decimal;
use std::io::{self, Write};
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "l3-book-cli")]
#[command(about = "A Level-3 limit order book CLI", long_about = None)]
struct Cli {
    /// Base asset symbol (e.g., BTC)
    #[arg(long, default_value = "BTC")]
    base_asset: String,

    /// Base asset decimals (e.g., 6)
    #[arg(long, default_value = "6")]
    base_decimals: u8,

    /// Quote asset symbol (e.g., USDT)
    #[arg(long, default_value = "USDT")]
    quote_asset: String,

    /// Quote asset decimals (e.g., 2 for USDT cents)
    #[arg(long, default_value = "2")]
    quote_decimals: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a resting order to the book
    #[command(name = "add")]
    Add {
        /// Order side (buy/sell)
        side: Side,
        /// Price in decimal format (e.g., 100.50)
        price: String,
        /// Quantity in decimal format (e.g., 0.001)
        quantity: String,
        /// Unique order ID (auto-generated if not provided)
        id: Option<u64>,
    },
    /// Replace a live order's price and/or quantity
    #[command(name = "replace")]
    Replace {
        /// Order ID to replace
        id: u64,
        /// Order side (buy/sell)
        side: Side,
        /// New price in decimal format
        price: String,
        /// New quantity in decimal format
        quantity: String,
    },
    /// Delete a live order
    #[command(name = "delete", aliases = ["cancel"])]
    Delete {
        /// Order ID to delete
        id: u64,
    },
    /// Execute quantity against a live order
    #[command(name = "exec")]
    Exec {
        /// Order ID to execute against
        id: u64,
        /// Executed quantity in decimal format
        quantity: String,
    },
    /// Show the L3 view of the book, order by order
    #[command(name = "book", aliases = ["state", "b"])]
    Book,
    /// Show one side's orders, level by level
    #[command(name = "orders")]
    Orders {
        /// Side to walk (buy/sell)
        side: Side,
        /// Traversal direction
        #[arg(default_value = "inner-to-outer")]
        direction: Direction,
    },
    /// Show best bid and ask prices
    #[command(name = "best")]
    Best,
    /// Show market depth, level by level
    #[command(name = "depth")]
    Depth {
        /// Number of level pairs to show (default: 5)
        #[arg(default_value = "5")]
        levels: usize,
    },
    /// Clear the order book (interactive mode)
    #[command(name = "clear")]
    Clear,
    /// Exit interactive mode
    #[command(name = "quit", aliases = ["exit", "q"])]
    Quit,
    /// Start interactive mode
    #[command(name = "interactive")]
    Interactive,
}

fn main() {
    let cli = Cli::parse();

    let base_asset = Asset {
        symbol: cli.base_asset.into(),
        decimals: cli.base_decimals,
    };
    let quote_asset = Asset {
        symbol: cli.quote_asset.into(),
        decimals: cli.quote_decimals,
    };
    let instrument = Instrument::new(base_asset, quote_asset);

    match cli.command {
        None => {
            // Default to interactive mode when no command is provided
            run_interactive_mode(instrument);
        }
        Some(Commands::Add {
            side,
            price,
            quantity,
            id,
        }) => {
            let mut book = L3Book::new(instrument);
            match add_order(&mut book, side, &price, &quantity, id.unwrap_or(1)) {
                Ok(()) => println!("Order added. {} order(s) resting.", book.len()),
                Err(e) => {
                    eprintln!("Error adding order: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Best) => {
            let book = L3Book::new(instrument);
            print_best_prices(&book);
        }
        Some(Commands::Interactive) => {
            run_interactive_mode(instrument);
        }
        // These commands only make sense against an accumulated book
        Some(Commands::Replace { .. })
        | Some(Commands::Delete { .. })
        | Some(Commands::Exec { .. })
        | Some(Commands::Book)
        | Some(Commands::Orders { .. })
        | Some(Commands::Depth { .. })
        | Some(Commands::Clear)
        | Some(Commands::Quit) => {
            eprintln!("This command is only available in interactive mode.");
            eprintln!("Use: cargo run --bin l3-book-cli -- interactive");
            std::process::exit(1);
        }
    }
}

/// Parse interactive command using clap
fn parse_interactive_command(input: &str) -> Result<Commands, String> {
    let args = shlex::split(input).ok_or("Invalid command syntax")?;
    if args.is_empty() {
        return Err("Empty command".to_string());
    }

    // Prepend a dummy program name for clap parsing
    let mut full_args = vec!["l3-book-cli".to_string()];
    full_args.extend(args);

    match Cli::try_parse_from(full_args) {
        Ok(cli) => match cli.command {
            Some(command) => Ok(command),
            None => Err("Interactive mode not available within interactive mode".to_string()),
        },
        Err(e) => Err(e.to_string()),
    }
}

/// Runs the interactive REPL mode
fn run_interactive_mode(instrument: Instrument) {
    println!("=== L3 Book Interactive CLI ===");
    println!("Type 'help' for available commands, 'quit' to exit\n");

    let mut book = L3Book::new(instrument);

    println!("Instrument: {}\n", book.instrument);

    let mut next_id = 1u64;

    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(_) => {
                let trimmed = input.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_interactive_command(trimmed) {
                    Ok(command) => match command {
                        Commands::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        Commands::Add {
                            side,
                            price,
                            quantity,
                            id,
                        } => {
                            let order_id = id.unwrap_or_else(|| {
                                let id = next_id;
                                next_id += 1;
                                id
                            });

                            match add_order(&mut book, side, &price, &quantity, order_id) {
                                Ok(()) => {
                                    println!("Order {} added.", order_id);
                                    print_best_prices(&book);
                                }
                                Err(e) => println!("Error: {}", e),
                            }
                        }
                        Commands::Replace {
                            id,
                            side,
                            price,
                            quantity,
                        } => match replace_order(&mut book, id, side, &price, &quantity) {
                            Ok(()) => {
                                println!("Order {} replaced.", id);
                                print_best_prices(&book);
                            }
                            Err(e) => println!("Error: {}", e),
                        },
                        Commands::Delete { id } => match book.delete(id) {
                            Ok(()) => println!("Order {} deleted.", id),
                            Err(e) => println!("Error: {}", e),
                        },
                        Commands::Exec { id, quantity } => {
                            match exec_order(&mut book, id, &quantity) {
                                Ok(()) => {
                                    println!("Executed against order {}.", id);
                                    print_best_prices(&book);
                                }
                                Err(e) => println!("Error: {}", e),
                            }
                        }
                        Commands::Book => print_l3_view(&book),
                        Commands::Orders { side, direction } => {
                            print_l3_side(&book, side, direction)
                        }
                        Commands::Best => print_best_prices(&book),
                        Commands::Depth { levels } => print_market_depth(&book, levels),
                        Commands::Clear => {
                            let instrument = book.instrument.clone();
                            book = L3Book::new(instrument);
                            next_id = 1;
                            println!("Order book cleared.");
                        }
                        // These commands shouldn't be reachable in interactive mode
                        Commands::Interactive => {
                            println!("Command not available in interactive mode.");
                        }
                    },
                    Err(e) => {
                        if trimmed == "help" || trimmed == "h" {
                            show_help();
                        } else if e.contains("unexpected argument") || e.contains("invalid value") {
                            println!("Invalid command. Type 'help' for available commands.");
                        } else if e.contains("required arguments")
                            || e.contains("The following required arguments")
                        {
                            println!("Missing required arguments. Type 'help' for usage.");
                        } else {
                            println!(
                                "Error: {}",
                                e.lines().next().unwrap_or("Invalid command")
                            );
                        }
                    }
                }
            }
            Err(error) => {
                println!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn show_help() {
    println!("Available Commands:");
    println!("  add <side> <price> <qty> [id]      - Add an order (e.g., add buy 100.50 0.001)");
    println!("  replace <id> <side> <price> <qty>  - Replace a live order");
    println!("  delete <id>                        - Delete a live order");
    println!("  exec <id> <qty>                    - Execute quantity against a live order");
    println!("  book | state | b                   - Show the L3 view, order by order");
    println!("  orders <side> [direction]          - Walk one side (inner-to-outer or outer-to-inner)");
    println!("  best                               - Show best bid and ask prices");
    println!("  depth [levels]                     - Show market depth (default: 5 levels)");
    println!("  clear                              - Clear the order book");
    println!("  help | h                           - Show this help message");
    println!("  quit | exit | q                    - Exit the CLI");
    println!();
    println!("Notes:");
    println!("  - Prices and quantities use decimal format (e.g., 100.50, 0.001)");
    println!("  - IDs are auto-generated for 'add' if not provided");
    println!("  - The book uncrosses after every mutation: adding through the");
    println!("    opposite side's best price retracts the crossed levels");
    println!();
}

fn parse_amounts(
    book: &L3Book,
    price_str: &str,
    quantity_str: &str,
) -> Result<(Price, Quantity), String> {
    let price_decimal = Decimal::from_str(price_str)
        .map_err(|_| format!("Invalid price format: {}", price_str))?;
    let quantity_decimal = Decimal::from_str(quantity_str)
        .map_err(|_| format!("Invalid quantity format: {}", quantity_str))?;

    let price_minor = price_to_minor_units(price_decimal, &book.instrument.quote)
        .ok_or("Price too large to convert to minor units")?;
    let quantity_minor = quantity_to_minor_units(quantity_decimal, &book.instrument.base)
        .ok_or("Quantity too large to convert to minor units")?;

    Ok((price_minor, quantity_minor))
}

fn add_order(
    book: &mut L3Book,
    side: Side,
    price_str: &str,
    quantity_str: &str,
    id: u64,
) -> Result<(), String> {
    let (price, quantity) = parse_amounts(book, price_str, quantity_str)?;
    book.add(id, side, price, quantity).map_err(|e| e.to_string())
}

fn replace_order(
    book: &mut L3Book,
    id: u64,
    side: Side,
    price_str: &str,
    quantity_str: &str,
) -> Result<(), String> {
    let (price, quantity) = parse_amounts(book, price_str, quantity_str)?;
    book.replace(id, side, price, quantity).map_err(|e| e.to_string())
}

fn exec_order(book: &mut L3Book, id: u64, quantity_str: &str) -> Result<(), String> {
    let quantity_decimal = Decimal::from_str(quantity_str)
        .map_err(|_| format!("Invalid quantity format: {}", quantity_str))?;
    let quantity_minor = quantity_to_minor_units(quantity_decimal, &book.instrument.base)
        .ok_or("Quantity too large to convert to minor units")?;
    book.exec(id, quantity_minor).map_err(|e| e.to_string())
}

fn print_best_prices(book: &L3Book) {
    match (book.best_buy(), book.best_sell()) {
        (Some((buy_price, buy_qty)), Some((sell_price, sell_qty))) => {
            println!(
                "Best BUY:  {} @ {}",
                quantity_from_minor_units(buy_qty, &book.instrument.base),
                price_from_minor_units(buy_price, &book.instrument.quote)
            );
            println!(
                "Best SELL: {} @ {}",
                quantity_from_minor_units(sell_qty, &book.instrument.base),
                price_from_minor_units(sell_price, &book.instrument.quote)
            );
            let spread = sell_price - buy_price;
            println!(
                "Spread:    {}",
                price_from_minor_units(spread, &book.instrument.quote)
            );
        }
        (Some((buy_price, buy_qty)), None) => {
            println!(
                "Best BUY:  {} @ {}",
                quantity_from_minor_units(buy_qty, &book.instrument.base),
                price_from_minor_units(buy_price, &book.instrument.quote)
            );
            println!("No sell orders");
        }
        (None, Some((sell_price, sell_qty))) => {
            println!("No buy orders");
            println!(
                "Best SELL: {} @ {}",
                quantity_from_minor_units(sell_qty, &book.instrument.base),
                price_from_minor_units(sell_price, &book.instrument.quote)
            );
        }
        (None, None) => {
            println!("No buy orders");
            println!("No sell orders");
        }
    }
}

/// Prints both sides level by level, best levels first, walking the two
/// sides in lockstep the way the depth traversal reports them.
fn print_market_depth(book: &L3Book, levels: usize) {
    if book.is_empty() {
        println!("Order book is empty");
        return;
    }
    if levels == 0 {
        return;
    }

    println!(
        "{:>14} {:>10} {:>5} | {:>14} {:>10} {:>5}",
        "bid qty", "bid", "cnt", "ask", "ask qty", "cnt"
    );
    let mut remaining = levels;
    book.for_each_level(|entry| {
        let bid = if entry.bid.count > 0 {
            format!(
                "{:>14} {:>10} {:>5}",
                quantity_from_minor_units(entry.bid.quantity, &book.instrument.base),
                price_from_minor_units(entry.bid.price, &book.instrument.quote),
                entry.bid.count
            )
        } else {
            format!("{:>14} {:>10} {:>5}", "-", "-", "-")
        };
        let ask = if entry.ask.count > 0 {
            format!(
                "{:>14} {:>10} {:>5}",
                price_from_minor_units(entry.ask.price, &book.instrument.quote),
                quantity_from_minor_units(entry.ask.quantity, &book.instrument.base),
                entry.ask.count
            )
        } else {
            format!("{:>14} {:>10} {:>5}", "-", "-", "-")
        };
        println!("{} | {}", bid, ask);
        remaining -= 1;
        remaining > 0
    });
}

/// Prints the L3 view: sell side from the outermost level down, then buy
/// side from the innermost level down, i.e. highest price to lowest, with
/// each level's orders oldest first.
fn print_l3_view(book: &L3Book) {
    if book.is_empty() {
        println!("Order book is empty");
        return;
    }

    println!("side {:>10} {:>12}  orders", "price", "qty");
    print_l3_side(book, Side::Sell, Direction::OuterToInner);
    print_l3_side(book, Side::Buy, Direction::InnerToOuter);
}

fn print_l3_side(book: &L3Book, side: Side, direction: Direction) {
    let tag = match side {
        Side::Buy => "B",
        Side::Sell => "S",
    };

    let mut current: Option<(Price, Quantity)> = None;
    let mut members: Vec<String> = Vec::new();

    let mut flush = |level: Option<(Price, Quantity)>, members: &mut Vec<String>| {
        if let Some((price, qty)) = level {
            println!(
                "{}    {:>10} {:>12}  {}",
                tag,
                price_from_minor_units(price, &book.instrument.quote),
                quantity_from_minor_units(qty, &book.instrument.base),
                members.join(", ")
            );
            members.clear();
        }
    };

    for view in book.orders(side, direction) {
        if current.map(|(p, _)| p) != Some(view.level_price) {
            flush(current, &mut members);
            current = Some((view.level_price, view.level_quantity));
        }
        members.push(format!(
            "{}({})",
            quantity_from_minor_units(view.quantity, &book.instrument.base),
            view.id
        ));
    }
    flush(current, &mut members);
}

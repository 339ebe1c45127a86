use crate::types::{Asset, Price, Quantity};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

#[inline]
fn pow10(decimals: u8) -> Option<Decimal> {
    let n = 10_i128.checked_pow(u32::from(decimals))?;
    Decimal::try_from_i128_with_scale(n, 0).ok()
}

#[inline]
pub(crate) fn to_minor_units(val: Decimal, decimals: u8) -> Option<u128> {
    val.checked_mul(pow10(decimals)?)?.trunc().to_u128()
}

/// Exact display value for a minor-unit amount, trailing zeros stripped.
/// Values produced by `to_minor_units` always fit; anything beyond
/// Decimal's mantissa range saturates to `Decimal::MAX`.
#[inline]
pub(crate) fn from_minor_units(units: u128, decimals: u8) -> Decimal {
    i128::try_from(units)
        .ok()
        .and_then(|n| Decimal::try_from_i128_with_scale(n, u32::from(decimals)).ok())
        .map(|d| d.normalize())
        .unwrap_or(Decimal::MAX)
}

/// Converts a decimal price to minor units for the given quote asset
pub fn price_to_minor_units(price: Decimal, quote_asset: &Asset) -> Option<Price> {
    to_minor_units(price, quote_asset.decimals)
}

/// Converts a decimal quantity to minor units for the given base asset
pub fn quantity_to_minor_units(quantity: Decimal, base_asset: &Asset) -> Option<Quantity> {
    to_minor_units(quantity, base_asset.decimals)
}

/// Converts a minor-unit price back to a decimal for the given quote asset
pub fn price_from_minor_units(price: Price, quote_asset: &Asset) -> Decimal {
    from_minor_units(price, quote_asset.decimals)
}

/// Converts a minor-unit quantity back to a decimal for the given base asset
pub fn quantity_from_minor_units(quantity: Quantity, base_asset: &Asset) -> Decimal {
    from_minor_units(quantity, base_asset.decimals)
}

/// Formats a minor-unit price for display with the quote asset symbol
pub fn format_price(price: Price, quote_asset: &Asset) -> String {
    format!("{} {}", price_from_minor_units(price, quote_asset), quote_asset.symbol)
}

/// Formats a minor-unit quantity for display with the base asset symbol
pub fn format_quantity(quantity: Quantity, base_asset: &Asset) -> String {
    format!("{} {}", quantity_from_minor_units(quantity, base_asset), base_asset.symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trip_is_exact() {
        let d = Decimal::from_str("100.25").unwrap();
        let minor = to_minor_units(d, 2).unwrap();
        assert_eq!(minor, 10025);
        assert_eq!(from_minor_units(minor, 2), d);
    }

    #[test]
    fn sub_minor_precision_truncates() {
        let d = Decimal::from_str("1.239").unwrap();
        assert_eq!(to_minor_units(d, 2), Some(123));
    }

    #[test]
    fn format_includes_symbol() {
        let usdt = Asset::new("USDT", 2);
        assert_eq!(format_price(10025, &usdt), "100.25 USDT");
    }
}

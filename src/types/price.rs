//! Fixed-point money. All prices, totals and balances carry 8 decimal places.

pub type Price = i64;
pub type Qty = u64;

pub const PRICE_SCALE: i64 = 100_000_000;

/// Build a price from a whole number of cents (`18263` -> 182.63).
pub const fn from_cents(cents: i64) -> Price {
    cents * (PRICE_SCALE / 100)
}

/// Build a price from whole currency units.
pub const fn from_units(units: i64) -> Price {
    units * PRICE_SCALE
}

/// Lossy conversion for percentages and display.
pub fn to_f64(price: Price) -> f64 {
    price as f64 / PRICE_SCALE as f64
}

/// quantity × price, `None` on overflow.
pub fn checked_total(price: Price, qty: Qty) -> Option<Price> {
    let qty = i64::try_from(qty).ok()?;
    price.checked_mul(qty)
}

/// Parse a plain decimal string ("100000", "2500.75") into a price.
/// More than 8 fractional digits, signs and exponents are rejected.
pub fn parse_decimal(s: &str) -> Option<Price> {
    let s = s.trim();
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() || frac.len() > 8 {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let mut frac_value: i64 = if frac.is_empty() { 0 } else { frac.parse().ok()? };
    for _ in frac.len()..8 {
        frac_value *= 10;
    }
    whole.checked_mul(PRICE_SCALE)?.checked_add(frac_value)
}

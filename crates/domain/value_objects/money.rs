/// Every price in this service is charged in US dollars.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Renders minor units as the two-decimal string PayPal expects (`1999` -> `"19.99"`).
pub fn format_minor_amount(amount_minor: i64) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Converts a client-supplied major amount (`4.99`) into minor units, rounding to the cent.
/// Returns `None` for non-finite or out-of-range input.
pub fn minor_from_major(amount: f64) -> Option<i64> {
    if !amount.is_finite() {
        return None;
    }
    let minor = (amount * 100.0).round();
    if minor.abs() > i64::MAX as f64 / 2.0 {
        return None;
    }
    Some(minor as i64)
}

pub fn major_from_minor(amount_minor: i64) -> f64 {
    amount_minor as f64 / 100.0
}

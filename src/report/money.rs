use rust_decimal::Decimal;

/// Currency amounts are carried and printed with exactly two fraction digits
pub const MONEY_SCALE: u32 = 2;

/// Builds an amount from integer minor units (cents)
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, MONEY_SCALE)
}

/// Rounds half-even to cents and pins the scale so `0` prints as `0.00`
pub fn to_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp(MONEY_SCALE);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// `$1234.50`
pub fn format_amount(amount: Decimal) -> String {
    format!("${}", to_money(amount))
}

/// Percentage taken on top of every transfer.
pub const FEE_PERCENT: u64 = 10;

/// Fee charged for sending `amount` points: 10%, rounded down.
pub fn calculate_fee(amount: u64) -> u64 {
    amount / (100 / FEE_PERCENT)
}

/// What leaves the sender's balance: the amount plus its fee.
pub fn total_deduction(amount: u64) -> u64 {
    amount.saturating_add(calculate_fee(amount))
}

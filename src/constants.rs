/// Decimal precision for stored monetary values
pub const AMOUNT_DECIMAL_PRECISION: u32 = 2;

/// Decimal precision for percentage values shown on dashboards
pub const PERCENT_DECIMAL_PRECISION: u32 = 2;

/// Decimal precision for exchange rates
pub const RATE_DECIMAL_PRECISION: u32 = 6;

use serde::{Deserialize, Serialize};

use crate::range::DateRange;
use crate::{CatalogError, CatalogResult};

/// Milliseconds in one calendar day.
pub const MS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

/// Price estimate for a rental period.
///
/// This is a client-side estimate for display and for the reservation
/// payload. The backend is expected to recompute the authoritative price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingQuote {
    /// Billable days, always at least 1.
    pub days: u64,
    pub daily_price: f64,
    pub total_price: f64,
}

/// Number of billable days in `range`, counting both boundary dates.
///
/// Computed as `ceil(delta_ms / MS_PER_DAY) + 1`: identical start and end
/// count as one day, and any started day is billed in full.
pub fn compute_day_count(range: &DateRange) -> CatalogResult<u64> {
    range.validate()?;

    // each endpoint is truncated to whole milliseconds before subtracting
    let delta_ms = range.to.timestamp_millis() - range.from.timestamp_millis();
    let whole_days = delta_ms / MS_PER_DAY;
    let ceil_days = if delta_ms % MS_PER_DAY == 0 { whole_days } else { whole_days + 1 };

    // delta_ms >= 0 after validation
    Ok(ceil_days as u64 + 1)
}

/// `daily_price * compute_day_count(range)`. Negative prices are rejected, not clamped.
pub fn compute_total_price(range: &DateRange, daily_price: f64) -> CatalogResult<f64> {
    validate_price(daily_price)?;
    let days = compute_day_count(range)?;
    Ok(daily_price * days as f64)
}

/// Day count and total for `range` at `daily_price`.
pub fn quote(range: &DateRange, daily_price: f64) -> CatalogResult<PricingQuote> {
    validate_price(daily_price)?;
    let days = compute_day_count(range)?;
    Ok(PricingQuote {
        days,
        daily_price,
        total_price: daily_price * days as f64,
    })
}

fn validate_price(daily_price: f64) -> CatalogResult<()> {
    if !daily_price.is_finite() || daily_price < 0.0 {
        return Err(CatalogError::InvalidPrice(daily_price));
    }
    Ok(())
}

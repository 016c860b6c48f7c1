pub mod range;
pub mod availability;
pub mod pricing;

pub use range::{DateRange, ReservationInterval};
pub use availability::{conflicting_intervals, is_range_available};
pub use pricing::{compute_day_count, compute_total_price, quote, PricingQuote, MS_PER_DAY};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid date range: {0}")]
    InvalidRange(String),
    #[error("Invalid daily price: {0}")]
    InvalidPrice(f64),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

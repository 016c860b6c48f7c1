//! Overlap checks between a requested range and a car's existing bookings.
//!
//! Intervals are closed: a booking occupies its first and last day entirely,
//! so a request ending on the day another booking starts is a conflict. There
//! is no same-day handoff.

use crate::range::{DateRange, ReservationInterval};

fn overlaps(candidate: &DateRange, interval: &ReservationInterval) -> bool {
    candidate.from <= interval.end_date && candidate.to >= interval.start_date
}

/// `true` when `candidate` shares no day with any of `existing`.
///
/// Expects `candidate.from <= candidate.to`; callers validate first.
pub fn is_range_available(candidate: &DateRange, existing: &[ReservationInterval]) -> bool {
    !existing.iter().any(|interval| overlaps(candidate, interval))
}

/// The bookings that make `candidate` unavailable, in input order.
pub fn conflicting_intervals(
    candidate: &DateRange,
    existing: &[ReservationInterval],
) -> Vec<ReservationInterval> {
    existing
        .iter()
        .filter(|interval| overlaps(candidate, interval))
        .copied()
        .collect()
}

//! Filtering, bucketing and aggregation of deployment history.
//!
//! Everything here works on an in-memory slice of [`Deployment`]s borrowed
//! immutably, so one loaded batch can back any number of queries.
//!
//! [`Deployment`]: crate::models::Deployment

pub mod buckets;
pub mod filter;
pub mod frame;
pub mod recovery;
pub mod table;
pub mod timeseries;

pub use filter::filter_matches;
pub use frame::Frame;
pub use table::evaluate_table;
pub use timeseries::evaluate_time_series;

/// Clamps a signed count into `u32`; negatives become 0.
pub(crate) fn saturating_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

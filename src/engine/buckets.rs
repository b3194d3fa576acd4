use chrono::{DateTime, TimeDelta, Utc};

use crate::query::Query;

/// Hard ceiling on the number of buckets in one series.
pub const MAX_BUCKETS: i64 = 50;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Nanoseconds from 0001-01-01T00:00:00Z, the rounding origin, to the Unix epoch.
const ROUNDING_ORIGIN_OFFSET: i128 = 62_135_596_800 * NANOS_PER_SECOND;

/// How a query's time range is cut into buckets.
///
/// The width is re-derived as `range / count`, so it differs from the
/// requested interval whenever the bucket cap or the max points hint binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketLayout {
    count: i64,
    width: TimeDelta,
}

impl BucketLayout {
    /// Returns `None` when the range cannot hold a single bucket.
    pub fn for_query(query: &Query) -> Option<Self> {
        let range = query.range().num_nanoseconds()?;
        let requested = query.requested_interval().num_nanoseconds()?;
        if range <= 0 || requested <= 0 {
            return None;
        }

        let mut count = MAX_BUCKETS.min(range / requested);
        if let Some(max_points) = query.max_points() {
            count = count.min(max_points);
        }
        if count <= 0 {
            return None;
        }

        Some(Self {
            count,
            width: TimeDelta::nanoseconds(range / count),
        })
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn width(&self) -> TimeDelta {
        self.width
    }

    /// Rounds to the nearest multiple of the bucket width counted from
    /// 0001-01-01T00:00:00Z. Halfway values round up.
    pub fn round(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let width = i128::from(self.width.num_nanoseconds()?);
        let since_origin = i128::from(instant.timestamp()) * NANOS_PER_SECOND
            + i128::from(instant.timestamp_subsec_nanos())
            + ROUNDING_ORIGIN_OFFSET;

        let remainder = since_origin.rem_euclid(width);
        let rounded = if remainder + remainder < width {
            since_origin - remainder
        } else {
            since_origin + (width - remainder)
        };

        let unix = rounded - ROUNDING_ORIGIN_OFFSET;
        let seconds = i64::try_from(unix.div_euclid(NANOS_PER_SECOND)).ok()?;
        let nanos = u32::try_from(unix.rem_euclid(NANOS_PER_SECOND)).ok()?;
        DateTime::from_timestamp(seconds, nanos)
    }

    /// Rounded slot starts lying strictly inside `(from, to)`, in order.
    pub fn slots(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        (0..self.count)
            .filter_map(move |i| {
                let offset = self.width.num_nanoseconds()?.checked_mul(i)?;
                let start = from.checked_add_signed(TimeDelta::nanoseconds(offset))?;
                self.round(start)
            })
            .filter(move |start| from < *start && *start < to)
    }
}

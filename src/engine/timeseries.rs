use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use super::buckets::BucketLayout;
use super::filter::filter_matches;
use super::recovery::time_to_recovery;
use super::saturating_u32;
use crate::models::{Deployment, TaskState};
use crate::providers::ReleaseLookup;
use crate::query::Query;

/// Aggregate statistics for one time slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketAggregate {
    pub time: DateTime<Utc>,
    pub success: u32,
    pub failure: u32,
    pub cancelled: u32,
    pub timed_out: u32,
    pub total_duration: u32,
    pub avg_duration: f32,
    pub total_time_to_recovery: u32,
    pub avg_time_to_recovery: u32,
    pub total_cycle_time: u32,
    pub avg_cycle_time: u32,
}

impl BucketAggregate {
    pub fn empty(time: DateTime<Utc>) -> Self {
        Self {
            time,
            success: 0,
            failure: 0,
            cancelled: 0,
            timed_out: 0,
            total_duration: 0,
            avg_duration: 0.0,
            total_time_to_recovery: 0,
            avg_time_to_recovery: 0,
            total_cycle_time: 0,
            avg_cycle_time: 0,
        }
    }
}

/// Folds deployments into one slot. Averages are recomputed from the full
/// per-slot lists after every fold.
struct BucketAccumulator {
    aggregate: BucketAggregate,
    durations: Vec<u32>,
    recovery_times: Vec<u32>,
    cycle_times: Vec<u32>,
}

impl BucketAccumulator {
    fn new(time: DateTime<Utc>) -> Self {
        Self {
            aggregate: BucketAggregate::empty(time),
            durations: vec![],
            recovery_times: vec![],
            cycle_times: vec![],
        }
    }

    fn fold(&mut self, deployment: &Deployment, recovery_time: u32, cycle_time: u32) {
        let bucket = &mut self.aggregate;

        match deployment.task_state {
            TaskState::Success => bucket.success += 1,
            TaskState::Failed => bucket.failure += 1,
            TaskState::Cancelled => bucket.cancelled += 1,
            TaskState::TimedOut => bucket.timed_out += 1,
            TaskState::Unknown | TaskState::Other(_) => {}
        }

        bucket.total_duration = bucket
            .total_duration
            .saturating_add(deployment.duration_seconds);
        bucket.total_time_to_recovery = bucket.total_time_to_recovery.saturating_add(recovery_time);
        bucket.total_cycle_time = bucket.total_cycle_time.saturating_add(cycle_time);

        self.durations.push(deployment.duration_seconds);
        self.recovery_times.push(recovery_time);
        self.cycle_times.push(cycle_time);

        bucket.avg_duration = average(&self.durations);
        bucket.avg_time_to_recovery = average_ignoring_zero(&self.recovery_times);
        bucket.avg_cycle_time = average_ignoring_zero(&self.cycle_times);
    }

    fn finish(self) -> BucketAggregate {
        self.aggregate
    }
}

/// Buckets the deployments matching `query` over its time range.
///
/// Every slot strictly inside the range is present, zero-filled when nothing
/// landed in it. Release lookups only happen when a cycle time column is
/// requested.
pub fn evaluate_time_series(
    deployments: &[Deployment],
    query: &Query,
    releases: &dyn ReleaseLookup,
) -> Vec<BucketAggregate> {
    let Some(layout) = BucketLayout::for_query(query) else {
        debug!(
            "No buckets fit between {} and {}, returning an empty series",
            query.from, query.to
        );
        return vec![];
    };

    debug!(
        "Bucketing {} deployments into {} buckets of {}s",
        deployments.len(),
        layout.count(),
        layout.width().num_seconds()
    );

    // Keyed by position so shared records are never written to.
    let bucket_keys: Vec<Option<DateTime<Utc>>> = deployments
        .iter()
        .map(|d| d.completed_at().and_then(|completed| layout.round(completed)))
        .collect();

    let wants_cycle_time = query.fields.wants_cycle_time();

    layout
        .slots(query.from, query.to)
        .map(|slot| {
            let mut bucket = BucketAccumulator::new(slot);

            for (index, deployment) in deployments.iter().enumerate() {
                if bucket_keys[index] != Some(slot) || !filter_matches(&query.criteria, deployment)
                {
                    continue;
                }

                let cycle_seconds = if wants_cycle_time {
                    cycle_time(deployment, releases)
                } else {
                    0
                };
                let recovery_minutes = time_to_recovery(deployment, deployments, index);

                bucket.fold(deployment, recovery_minutes, cycle_seconds);
            }

            bucket.finish()
        })
        .collect()
}

/// Seconds from the release being assembled to the deployment completing.
/// A failed lookup counts as 0.
pub fn cycle_time(deployment: &Deployment, releases: &dyn ReleaseLookup) -> u32 {
    let Some(completed) = deployment.completed_at() else {
        return 0;
    };

    match releases.assembled(&deployment.release_id) {
        Ok(assembled) => saturating_u32((completed - assembled).num_seconds()),
        Err(e) => {
            debug!("No cycle time for {}: {e}", deployment.deployment_id);
            0
        }
    }
}

fn average(values: &[u32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let avg = values.iter().map(|&v| u64::from(v)).sum::<u64>() as f32 / values.len() as f32;
    avg
}

/// Integer mean over the non-zero entries; 0 covers "not applicable",
/// "not yet recovered" and "lookup failed" alike.
fn average_ignoring_zero(values: &[u32]) -> u32 {
    let (total, count) = values
        .iter()
        .filter(|&&v| v != 0)
        .fold((0u64, 0u64), |(total, count), &v| (total + u64::from(v), count + 1));

    if count == 0 {
        return 0;
    }

    #[allow(clippy::cast_possible_truncation)]
    let avg = (total / count) as u32;
    avg
}

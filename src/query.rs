use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Interval used when a query does not ask for one.
pub const DEFAULT_INTERVAL_SECONDS: i64 = 60;

/// Criteria a deployment must meet to be part of a result. Blank means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub project_name: String,
    pub tenant_name: String,
    pub environment_name: String,
    pub channel_name: String,
    pub release_version: String,
    #[serde(alias = "TaskState")]
    pub task_state: String,
}

/// Which aggregate columns a time series query emits. The time axis is always emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputFields {
    pub success_field: bool,
    pub failure_field: bool,
    pub cancelled_field: bool,
    pub timed_out_field: bool,
    pub total_duration_field: bool,
    pub average_duration_field: bool,
    pub total_time_to_recovery_field: bool,
    pub average_time_to_recovery_field: bool,
    pub total_cycle_time_field: bool,
    pub average_cycle_time_field: bool,
}

impl OutputFields {
    #[cfg(test)]
    pub fn all() -> Self {
        Self {
            success_field: true,
            failure_field: true,
            cancelled_field: true,
            timed_out_field: true,
            total_duration_field: true,
            average_duration_field: true,
            total_time_to_recovery_field: true,
            average_time_to_recovery_field: true,
            total_cycle_time_field: true,
            average_cycle_time_field: true,
        }
    }

    /// Cycle time needs a release lookup per deployment, so only do it when asked.
    pub fn wants_cycle_time(&self) -> bool {
        self.total_cycle_time_field || self.average_cycle_time_field
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(default)]
    pub interval_seconds: Option<i64>,
    #[serde(default)]
    pub max_data_points: Option<i64>,
    #[serde(flatten)]
    pub criteria: FilterCriteria,
    #[serde(flatten)]
    pub fields: OutputFields,
}

impl Query {
    #[cfg(test)]
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            interval_seconds: None,
            max_data_points: None,
            criteria: FilterCriteria::default(),
            fields: OutputFields::default(),
        }
    }

    pub fn range(&self) -> TimeDelta {
        self.to - self.from
    }

    /// The interval the caller asked for, falling back to the default when
    /// absent or not positive.
    pub fn requested_interval(&self) -> TimeDelta {
        let seconds = self
            .interval_seconds
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_INTERVAL_SECONDS);
        TimeDelta::seconds(seconds)
    }

    pub fn max_points(&self) -> Option<i64> {
        self.max_data_points.filter(|&p| p > 0)
    }
}

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DeployLensError, Result};

/// Layout of every timestamp on a deployment record. No zone, read as UTC.
pub const DEPLOYMENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Outcome of a deployment task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskState {
    Success,
    Failed,
    Cancelled,
    TimedOut,
    #[default]
    Unknown,
    Other(String),
}

impl TaskState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
            Self::TimedOut => "TimedOut",
            Self::Unknown => "",
            Self::Other(state) => state,
        }
    }
}

impl From<&str> for TaskState {
    fn from(value: &str) -> Self {
        match value {
            "Success" => Self::Success,
            "Failed" => Self::Failed,
            "Cancelled" => Self::Cancelled,
            "TimedOut" => Self::TimedOut,
            "" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for TaskState {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<TaskState> for String {
    fn from(value: TaskState) -> Self {
        value.as_str().to_string()
    }
}

/// One completed, failed, cancelled or timed-out deployment task.
///
/// Records are read-only once loaded. Anything derived per query (such as the
/// rounded completion time) lives beside the record, never on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Deployment {
    pub deployment_id: String,
    pub deployment_name: String,
    pub project_id: String,
    pub project_name: String,
    pub project_slug: String,
    pub tenant_id: String,
    pub tenant_name: String,
    pub channel_id: String,
    pub channel_name: String,
    pub environment_id: String,
    pub environment_name: String,
    pub release_id: String,
    pub release_version: String,
    pub task_id: String,
    pub task_state: TaskState,
    pub created: String,
    pub queue_time: String,
    pub start_time: String,
    pub completed_time: String,
    pub duration_seconds: u32,
    pub deployed_by: String,
}

impl Deployment {
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.completed_time).ok()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created).ok()
    }

    pub fn queued_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.queue_time).ok()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.start_time).ok()
    }
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), DEPLOYMENT_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DeployLensError::Timestamp(format!("{value:?}: {e}")))
}

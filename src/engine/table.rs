use chrono::{DateTime, Utc};
use serde::Serialize;

use super::filter::filter_matches;
use super::recovery::time_to_recovery;
use crate::models::Deployment;
use crate::query::Query;

/// One deployment, projected as-is for the table view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub time: Option<DateTime<Utc>>,
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
    pub task_state: String,
    pub deployed_by: String,
    pub created: Option<DateTime<Utc>>,
    pub queue_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub duration: u32,
    pub time_to_recovery: u32,
}

impl TableRow {
    fn new(deployment: &Deployment, time_to_recovery: u32) -> Self {
        Self {
            time: deployment.completed_at(),
            deployment_id: deployment.deployment_id.clone(),
            deployment_name: deployment.deployment_name.clone(),
            project_id: deployment.project_id.clone(),
            project_name: deployment.project_name.clone(),
            project_slug: deployment.project_slug.clone(),
            tenant_id: deployment.tenant_id.clone(),
            tenant_name: deployment.tenant_name.clone(),
            channel_id: deployment.channel_id.clone(),
            channel_name: deployment.channel_name.clone(),
            environment_id: deployment.environment_id.clone(),
            environment_name: deployment.environment_name.clone(),
            release_id: deployment.release_id.clone(),
            release_version: deployment.release_version.clone(),
            task_id: deployment.task_id.clone(),
            task_state: deployment.task_state.as_str().to_string(),
            deployed_by: deployment.deployed_by.clone(),
            created: deployment.created_at(),
            queue_time: deployment.queued_at(),
            start_time: deployment.started_at(),
            duration: deployment.duration_seconds,
            time_to_recovery,
        }
    }
}

/// Every deployment matching the query's criteria, in input order. No
/// bucketing and no time range check happen here.
pub fn evaluate_table(deployments: &[Deployment], query: &Query) -> Vec<TableRow> {
    deployments
        .iter()
        .enumerate()
        .filter(|(_, deployment)| filter_matches(&query.criteria, deployment))
        .map(|(index, deployment)| {
            TableRow::new(deployment, time_to_recovery(deployment, deployments, index))
        })
        .collect()
}

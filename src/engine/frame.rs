use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use super::table::TableRow;
use super::timeseries::BucketAggregate;
use crate::query::OutputFields;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Column {
    Time(Vec<Option<DateTime<Utc>>>),
    Text(Vec<String>),
    Count(Vec<u32>),
    Mean(Vec<f32>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Self::Time(values) => values.len(),
            Self::Text(values) => values.len(),
            Self::Count(values) => values.len(),
            Self::Mean(values) => values.len(),
        }
    }
}

/// Named columns in output order, serialised as one JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Frame {
    columns: IndexMap<&'static str, Column>,
}

impl Frame {
    /// Time axis plus whichever aggregate columns `fields` selects.
    pub fn from_buckets(buckets: &[BucketAggregate], fields: &OutputFields) -> Self {
        let count = |value: fn(&BucketAggregate) -> u32| {
            Column::Count(buckets.iter().map(value).collect())
        };

        let selected = [
            (fields.success_field, "success", count(|b| b.success)),
            (fields.failure_field, "failure", count(|b| b.failure)),
            (fields.cancelled_field, "cancelled", count(|b| b.cancelled)),
            (fields.timed_out_field, "timedOut", count(|b| b.timed_out)),
            (
                fields.total_duration_field,
                "totalDuration",
                count(|b| b.total_duration),
            ),
            (
                fields.average_duration_field,
                "avgDuration",
                Column::Mean(buckets.iter().map(|b| b.avg_duration).collect()),
            ),
            (
                fields.total_time_to_recovery_field,
                "totalTimeToRecovery",
                count(|b| b.total_time_to_recovery),
            ),
            (
                fields.average_time_to_recovery_field,
                "avgTimeToRecovery",
                count(|b| b.avg_time_to_recovery),
            ),
            (
                fields.total_cycle_time_field,
                "totalReleaseLeadTime",
                count(|b| b.total_cycle_time),
            ),
            (
                fields.average_cycle_time_field,
                "avgReleaseLeadTime",
                count(|b| b.avg_cycle_time),
            ),
        ];

        let mut columns = IndexMap::new();
        columns.insert(
            "time",
            Column::Time(buckets.iter().map(|b| Some(b.time)).collect()),
        );
        columns.extend(
            selected
                .into_iter()
                .filter(|(wanted, _, _)| *wanted)
                .map(|(_, name, column)| (name, column)),
        );

        Self { columns }
    }

    pub fn from_rows(rows: &[TableRow]) -> Self {
        let text = |value: fn(&TableRow) -> &str| {
            Column::Text(rows.iter().map(|r| value(r).to_string()).collect())
        };
        let time = |value: fn(&TableRow) -> Option<DateTime<Utc>>| {
            Column::Time(rows.iter().map(value).collect())
        };

        let columns = IndexMap::from([
            ("time", time(|r| r.time)),
            ("deploymentid", text(|r| r.deployment_id.as_str())),
            ("deploymentname", text(|r| r.deployment_name.as_str())),
            ("projectid", text(|r| r.project_id.as_str())),
            ("projectname", text(|r| r.project_name.as_str())),
            ("projectslug", text(|r| r.project_slug.as_str())),
            ("tenantid", text(|r| r.tenant_id.as_str())),
            ("tenantname", text(|r| r.tenant_name.as_str())),
            ("channelid", text(|r| r.channel_id.as_str())),
            ("channelname", text(|r| r.channel_name.as_str())),
            ("environmentid", text(|r| r.environment_id.as_str())),
            ("environmentname", text(|r| r.environment_name.as_str())),
            ("releaseid", text(|r| r.release_id.as_str())),
            ("releaseversion", text(|r| r.release_version.as_str())),
            ("taskid", text(|r| r.task_id.as_str())),
            ("taskstate", text(|r| r.task_state.as_str())),
            ("deployedby", text(|r| r.deployed_by.as_str())),
            ("created", time(|r| r.created)),
            ("queuetime", time(|r| r.queue_time)),
            ("starttime", time(|r| r.start_time)),
            ("duration", Column::Count(rows.iter().map(|r| r.duration).collect())),
            (
                "timeToRecovery",
                Column::Count(rows.iter().map(|r| r.time_to_recovery).collect()),
            ),
        ]);

        Self { columns }
    }

    #[cfg(test)]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.keys().copied()
    }

    /// Row count; every column has the same length.
    pub fn len(&self) -> usize {
        self.columns.values().next().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bucket(minute: u32, success: u32) -> BucketAggregate {
        BucketAggregate {
            success,
            total_duration: 120,
            avg_duration: 60.0,
            ..BucketAggregate::empty(Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap())
        }
    }

    #[test]
    fn test_time_axis_is_always_present() {
        let frame = Frame::from_buckets(&[bucket(1, 2)], &OutputFields::default());

        assert_eq!(frame.names().collect::<Vec<_>>(), vec!["time"]);
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn test_all_fields_keep_their_order() {
        let frame = Frame::from_buckets(&[bucket(1, 2)], &OutputFields::all());

        assert_eq!(
            frame.names().collect::<Vec<_>>(),
            vec![
                "time",
                "success",
                "failure",
                "cancelled",
                "timedOut",
                "totalDuration",
                "avgDuration",
                "totalTimeToRecovery",
                "avgTimeToRecovery",
                "totalReleaseLeadTime",
                "avgReleaseLeadTime",
            ]
        );
    }

    #[test]
    fn test_only_selected_fields_are_emitted() {
        let fields = OutputFields {
            failure_field: true,
            average_duration_field: true,
            ..OutputFields::default()
        };

        let frame = Frame::from_buckets(&[bucket(1, 2), bucket(2, 0)], &fields);

        assert_eq!(
            frame.names().collect::<Vec<_>>(),
            vec!["time", "failure", "avgDuration"]
        );
        assert_eq!(frame.column("failure"), Some(&Column::Count(vec![0, 0])));
        assert_eq!(frame.column("avgDuration"), Some(&Column::Mean(vec![60.0, 60.0])));
        assert_eq!(frame.column("success"), None);
    }

    #[test]
    fn test_frame_serializes_as_ordered_object() {
        let fields = OutputFields {
            success_field: true,
            ..OutputFields::default()
        };

        let frame = Frame::from_buckets(&[bucket(1, 2)], &fields);
        let json = serde_json::to_string(&frame).unwrap();

        assert_eq!(json, r#"{"time":["2024-01-01T00:01:00Z"],"success":[2]}"#);
    }

    #[test]
    fn test_empty_series_has_empty_time_axis() {
        let frame = Frame::from_buckets(&[], &OutputFields::all());

        assert!(frame.is_empty());
        assert_eq!(frame.column("time"), Some(&Column::Time(vec![])));
    }

    #[test]
    fn test_table_frame_columns() {
        let row = TableRow {
            time: None,
            deployment_id: "Deployments-1".to_string(),
            deployment_name: String::new(),
            project_id: String::new(),
            project_name: "Web".to_string(),
            project_slug: String::new(),
            tenant_id: String::new(),
            tenant_name: String::new(),
            channel_id: String::new(),
            channel_name: String::new(),
            environment_id: String::new(),
            environment_name: String::new(),
            release_id: String::new(),
            release_version: String::new(),
            task_id: String::new(),
            task_state: "Failed".to_string(),
            deployed_by: String::new(),
            created: None,
            queue_time: None,
            start_time: None,
            duration: 42,
            time_to_recovery: 7,
        };

        let frame = Frame::from_rows(&[row]);

        assert_eq!(
            frame.names().collect::<Vec<_>>(),
            vec![
                "time",
                "deploymentid",
                "deploymentname",
                "projectid",
                "projectname",
                "projectslug",
                "tenantid",
                "tenantname",
                "channelid",
                "channelname",
                "environmentid",
                "environmentname",
                "releaseid",
                "releaseversion",
                "taskid",
                "taskstate",
                "deployedby",
                "created",
                "queuetime",
                "starttime",
                "duration",
                "timeToRecovery",
            ]
        );
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.column("time"), Some(&Column::Time(vec![None])));
        assert_eq!(
            frame.column("projectname"),
            Some(&Column::Text(vec!["Web".to_string()]))
        );
        assert_eq!(frame.column("timeToRecovery"), Some(&Column::Count(vec![7])));
    }
}

use crate::models::Deployment;
use crate::query::FilterCriteria;

/// Whether `deployment` satisfies every non-blank criterion.
///
/// Matching is exact and case-sensitive; blank (or whitespace-only) criteria
/// impose no constraint.
pub fn filter_matches(criteria: &FilterCriteria, deployment: &Deployment) -> bool {
    let constraints = [
        (&criteria.release_version, deployment.release_version.as_str()),
        (&criteria.project_name, deployment.project_name.as_str()),
        (&criteria.channel_name, deployment.channel_name.as_str()),
        (&criteria.tenant_name, deployment.tenant_name.as_str()),
        (&criteria.environment_name, deployment.environment_name.as_str()),
        (&criteria.task_state, deployment.task_state.as_str()),
    ];

    constraints
        .iter()
        .all(|(wanted, actual)| is_blank(wanted) || wanted.as_str() == *actual)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskState;

    fn deployment() -> Deployment {
        Deployment {
            project_name: "Web".to_string(),
            tenant_name: "Acme".to_string(),
            environment_name: "Production".to_string(),
            channel_name: "Default".to_string(),
            release_version: "1.2.3".to_string(),
            task_state: TaskState::Success,
            ..Deployment::default()
        }
    }

    #[test]
    fn test_blank_criteria_match_everything() {
        assert!(filter_matches(&FilterCriteria::default(), &deployment()));
        assert!(filter_matches(&FilterCriteria::default(), &Deployment::default()));
    }

    #[test]
    fn test_whitespace_criterion_is_blank() {
        let criteria = FilterCriteria {
            project_name: "   ".to_string(),
            ..FilterCriteria::default()
        };

        assert!(filter_matches(&criteria, &deployment()));
    }

    #[test]
    fn test_each_criterion_must_match_exactly() {
        let cases = [
            FilterCriteria {
                project_name: "Api".to_string(),
                ..FilterCriteria::default()
            },
            FilterCriteria {
                tenant_name: "Globex".to_string(),
                ..FilterCriteria::default()
            },
            FilterCriteria {
                environment_name: "Staging".to_string(),
                ..FilterCriteria::default()
            },
            FilterCriteria {
                channel_name: "Hotfix".to_string(),
                ..FilterCriteria::default()
            },
            FilterCriteria {
                release_version: "1.2.4".to_string(),
                ..FilterCriteria::default()
            },
            FilterCriteria {
                task_state: "Failed".to_string(),
                ..FilterCriteria::default()
            },
        ];

        for criteria in &cases {
            assert!(!filter_matches(criteria, &deployment()), "{criteria:?}");
        }
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let criteria = FilterCriteria {
            environment_name: "production".to_string(),
            ..FilterCriteria::default()
        };

        assert!(!filter_matches(&criteria, &deployment()));
    }

    #[test]
    fn test_no_partial_matching() {
        let criteria = FilterCriteria {
            release_version: "1.2".to_string(),
            ..FilterCriteria::default()
        };

        assert!(!filter_matches(&criteria, &deployment()));
    }

    #[test]
    fn test_all_criteria_together() {
        let criteria = FilterCriteria {
            project_name: "Web".to_string(),
            tenant_name: "Acme".to_string(),
            environment_name: "Production".to_string(),
            channel_name: "Default".to_string(),
            release_version: "1.2.3".to_string(),
            task_state: "Success".to_string(),
        };

        assert!(filter_matches(&criteria, &deployment()));
    }

    #[test]
    fn test_task_state_filter_matches_unrecognised_state_text() {
        let mut queued = deployment();
        queued.task_state = TaskState::from("Queued");
        let criteria = FilterCriteria {
            task_state: "Queued".to_string(),
            ..FilterCriteria::default()
        };

        assert!(filter_matches(&criteria, &queued));
    }

    #[test]
    fn test_adding_a_criterion_only_narrows_the_accepted_set() {
        let mut other = deployment();
        other.project_name = "Api".to_string();
        let mut failed = deployment();
        failed.task_state = TaskState::Failed;
        let events = [deployment(), other, failed];

        let broad = FilterCriteria {
            environment_name: "Production".to_string(),
            ..FilterCriteria::default()
        };
        let narrow = FilterCriteria {
            task_state: "Success".to_string(),
            ..broad.clone()
        };

        let broad_hits: Vec<_> = events.iter().map(|e| filter_matches(&broad, e)).collect();
        let narrow_hits: Vec<_> = events.iter().map(|e| filter_matches(&narrow, e)).collect();

        assert_eq!(broad_hits, vec![true, true, true]);
        assert_eq!(narrow_hits, vec![true, true, false]);
        for (b, n) in broad_hits.iter().zip(&narrow_hits) {
            assert!(*b || !*n);
        }
    }
}

use crate::models::{Deployment, TaskState};

use super::saturating_u32;

/// Minutes between a failed deployment and the next successful deployment of
/// the same channel, environment, project and tenant.
///
/// The scan runs forward from `index + 1`, so the result depends on the
/// order of `deployments`. Anything that is not a failure, or a failure with
/// no later success, yields 0.
pub fn time_to_recovery(deployment: &Deployment, deployments: &[Deployment], index: usize) -> u32 {
    if deployment.task_state != TaskState::Failed {
        return 0;
    }

    let Some(failed_at) = deployment.completed_at() else {
        return 0;
    };

    deployments
        .iter()
        .skip(index.saturating_add(1))
        .filter(|candidate| is_recovery_of(deployment, candidate))
        .find_map(Deployment::completed_at)
        .map_or(0, |recovered_at| {
            saturating_u32((recovered_at - failed_at).num_minutes())
        })
}

fn is_recovery_of(failed: &Deployment, candidate: &Deployment) -> bool {
    candidate.task_state == TaskState::Success
        && candidate.channel_id == failed.channel_id
        && candidate.environment_id == failed.environment_id
        && candidate.project_id == failed.project_id
        && candidate.tenant_id == failed.tenant_id
}

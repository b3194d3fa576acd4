pub mod file;
pub mod octopus;

use chrono::{DateTime, Utc};

use crate::error::{DeployLensError, Result};
use crate::models::Deployment;

/// Which deployments an [`EventSource`] should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventScope {
    pub project_id: Option<String>,
    pub environment_id: Option<String>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl EventScope {
    /// Deployments with an unreadable completion time are kept; the engine
    /// decides what to do with them.
    pub fn contains(&self, deployment: &Deployment) -> bool {
        let same = |wanted: &Option<String>, actual: &str| {
            wanted.as_deref().map_or(true, |id| id == actual)
        };

        same(&self.project_id, &deployment.project_id)
            && same(&self.environment_id, &deployment.environment_id)
            && deployment
                .completed_at()
                .map_or(true, |completed| self.from <= completed && completed <= self.to)
    }
}

/// Supplies the ordered deployment history for a scope.
pub trait EventSource {
    /// Never fails: an unavailable source yields no deployments.
    fn fetch(&self, scope: &EventScope) -> Vec<Deployment>;
}

/// Resolves when a release was assembled, for cycle time.
pub trait ReleaseLookup {
    fn assembled(&self, release_id: &str) -> Result<DateTime<Utc>>;
}

/// Used when cycle time is off or no server is configured.
pub struct NoReleaseLookup;

impl ReleaseLookup for NoReleaseLookup {
    fn assembled(&self, release_id: &str) -> Result<DateTime<Utc>> {
        Err(DeployLensError::Config(format!(
            "No release source configured to look up {release_id}"
        )))
    }
}

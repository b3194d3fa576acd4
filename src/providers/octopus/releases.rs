use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap};

use super::client::OctopusClient;
use crate::error::{DeployLensError, Result};
use crate::providers::ReleaseLookup;

const CONCURRENCY: usize = 10;

/// Release assembly times resolved ahead of evaluation, so the engine's
/// per-deployment lookup is a map read. `None` marks a release that could not
/// be fetched.
#[derive(Debug, Default)]
pub struct ReleaseCatalog {
    assembled: HashMap<String, Option<DateTime<Utc>>>,
}

impl ReleaseCatalog {
    pub async fn prefetch<'a>(
        client: &OctopusClient,
        release_ids: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let unique: BTreeSet<String> = release_ids
            .into_iter()
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
            .collect();

        info!("Fetching {} releases for cycle time...", unique.len());

        let catalog: Self = stream::iter(unique)
            .map(|release_id| async move {
                match client.fetch_release(&release_id).await {
                    Ok(release) => {
                        debug!(
                            "Release {} ({}) assembled at {}",
                            release.id, release.version, release.assembled
                        );
                        (release_id, Some(release.assembled))
                    }
                    Err(e) => {
                        warn!("Could not fetch release {release_id}: {e}");
                        (release_id, None)
                    }
                }
            })
            .buffer_unordered(CONCURRENCY)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect();

        info!(
            "Resolved {} of {} releases",
            catalog.assembled.values().filter(|a| a.is_some()).count(),
            catalog.len()
        );

        catalog
    }

    pub fn len(&self) -> usize {
        self.assembled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assembled.is_empty()
    }
}

impl FromIterator<(String, Option<DateTime<Utc>>)> for ReleaseCatalog {
    fn from_iter<I: IntoIterator<Item = (String, Option<DateTime<Utc>>)>>(iter: I) -> Self {
        Self {
            assembled: iter.into_iter().collect(),
        }
    }
}

impl ReleaseLookup for ReleaseCatalog {
    fn assembled(&self, release_id: &str) -> Result<DateTime<Utc>> {
        match self.assembled.get(release_id) {
            Some(Some(assembled)) => Ok(*assembled),
            Some(None) => Err(DeployLensError::Api(format!(
                "Release {release_id} could not be fetched"
            ))),
            None => Err(DeployLensError::Api(format!(
                "Release {release_id} was not prefetched"
            ))),
        }
    }
}

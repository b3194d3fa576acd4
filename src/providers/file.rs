use log::{info, warn};
use serde::Deserialize;
use std::path::PathBuf;

use super::{EventScope, EventSource};
use crate::error::Result;
use crate::models::Deployment;

/// Deployment history exported to a JSON file, either as a bare array or
/// wrapped in a `deployments` object.
pub struct JsonFileEventSource {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventDocument {
    List(Vec<Deployment>),
    Wrapped {
        #[serde(alias = "Deployments")]
        deployments: Vec<Deployment>,
    },
}

impl JsonFileEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Vec<Deployment>> {
        let text = std::fs::read_to_string(&self.path)?;
        parse_events(&text)
    }
}

impl EventSource for JsonFileEventSource {
    fn fetch(&self, scope: &EventScope) -> Vec<Deployment> {
        match self.load() {
            Ok(deployments) => {
                let total = deployments.len();
                let in_scope: Vec<_> = deployments
                    .into_iter()
                    .filter(|d| scope.contains(d))
                    .collect();
                info!(
                    "Loaded {} of {total} deployments from {}",
                    in_scope.len(),
                    self.path.display()
                );
                in_scope
            }
            Err(e) => {
                warn!(
                    "Failed to read deployments from {}: {e}",
                    self.path.display()
                );
                vec![]
            }
        }
    }
}

pub fn parse_events(text: &str) -> Result<Vec<Deployment>> {
    let document: EventDocument = serde_json::from_str(text)?;
    Ok(match document {
        EventDocument::List(deployments) | EventDocument::Wrapped { deployments } => deployments,
    })
}

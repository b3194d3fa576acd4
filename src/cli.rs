use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::{debug, info, warn};
use std::path::PathBuf;

use crate::auth::ApiKey;
use crate::engine::{evaluate_table, evaluate_time_series, filter_matches, Frame};
use crate::models::Deployment;
use crate::providers::file::JsonFileEventSource;
use crate::providers::octopus::{OctopusClient, ReleaseCatalog};
use crate::providers::{EventScope, EventSource, NoReleaseLookup, ReleaseLookup};
use crate::query::Query;

#[derive(Parser)]
#[command(name = "deploylens")]
#[command(author, version, about = "Deployment history insights", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Bucket deployments into a graph-ready time series
    Timeseries {
        #[command(flatten)]
        input: InputArgs,

        /// Octopus server URL, used to look up releases for cycle time
        #[arg(short, long, env = "OCTOPUS_SERVER")]
        server: Option<String>,

        /// Octopus API key
        #[arg(short = 'k', long, env = "OCTOPUS_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Octopus space ID (e.g., "Spaces-1")
        #[arg(long, env = "OCTOPUS_SPACE_ID")]
        space_id: Option<String>,
    },
    /// List matching deployments one row each
    Table {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// JSON file of deployments, oldest first
    #[arg(short, long)]
    events: PathBuf,

    /// JSON file holding the query
    #[arg(short, long)]
    query: PathBuf,

    /// Only load deployments of this project ID
    #[arg(long)]
    project_id: Option<String>,

    /// Only load deployments to this environment ID
    #[arg(long)]
    environment_id: Option<String>,
}

impl InputArgs {
    fn load(&self) -> Result<(Query, Vec<Deployment>)> {
        let query: Query = serde_json::from_str(&std::fs::read_to_string(&self.query)?)?;
        debug!("Query: {query:?}");

        let scope = EventScope {
            project_id: self.project_id.clone(),
            environment_id: self.environment_id.clone(),
            from: query.from,
            to: query.to,
        };
        let deployments = JsonFileEventSource::new(&self.events).fetch(&scope);

        if deployments.is_empty() {
            warn!("No deployments found in {}", self.events.display());
        }

        Ok((query, deployments))
    }
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let frame = match &self.command {
            Commands::Timeseries {
                input,
                server,
                api_key,
                space_id,
            } => {
                let (query, deployments) = input.load()?;
                let releases = release_lookup(
                    &query,
                    &deployments,
                    server.as_deref(),
                    api_key.as_deref(),
                    space_id.clone(),
                )
                .await?;

                let buckets = evaluate_time_series(&deployments, &query, releases.as_ref());
                info!("Built {} buckets", buckets.len());
                Frame::from_buckets(&buckets, &query.fields)
            }
            Commands::Table { input } => {
                let (query, deployments) = input.load()?;

                let rows = evaluate_table(&deployments, &query);
                info!("Built {} rows", rows.len());
                Frame::from_rows(&rows)
            }
        };

        if frame.is_empty() {
            warn!("Frame has no rows");
        }
        info!(
            "Frame has {} columns of {} rows",
            frame.names().count(),
            frame.len()
        );

        // Serialize to JSON
        let json_output = if self.pretty {
            serde_json::to_string_pretty(&frame)?
        } else {
            serde_json::to_string(&frame)?
        };

        // Write to output
        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Frame written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }
}

/// Resolves release assembly times up front when the query wants cycle time.
async fn release_lookup(
    query: &Query,
    deployments: &[Deployment],
    server: Option<&str>,
    api_key: Option<&str>,
    space_id: Option<String>,
) -> Result<Box<dyn ReleaseLookup>> {
    if !query.fields.wants_cycle_time() {
        return Ok(Box::new(NoReleaseLookup));
    }

    let Some(server) = server else {
        warn!("Cycle time requested but no Octopus server configured; reporting zero");
        return Ok(Box::new(NoReleaseLookup));
    };

    let client = OctopusClient::new(server, api_key.map(ApiKey::from), space_id)?;
    let release_ids = deployments
        .iter()
        .filter(|d| filter_matches(&query.criteria, d))
        .map(|d| d.release_id.as_str());

    let catalog = ReleaseCatalog::prefetch(&client, release_ids).await;
    if catalog.is_empty() {
        warn!("No releases to look up; cycle time will be zero");
    }

    Ok(Box::new(catalog))
}

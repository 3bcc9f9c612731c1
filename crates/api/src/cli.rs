//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use modelhub_domain::JobAction;

/// ModelHub registry console
#[derive(Debug, Parser)]
#[command(name = "modelhub", version, about)]
pub struct Cli {
    /// Config file; defaults to the environment, then the probed locations
    #[arg(long, global = true, env = "MODELHUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the tokens issued by the login page
    Login {
        #[arg(long)]
        access_token: String,
        #[arg(long)]
        refresh_token: Option<String>,
        #[arg(long)]
        project_id: Option<String>,
        #[arg(long)]
        repo_name: Option<String>,
        #[arg(long)]
        username: Option<String>,
    },
    /// Forget the stored tokens
    Logout,
    /// Select the job scheduler region
    Region { name: String },
    /// Select the project used for publishing
    Project { id: String },
    /// Publish a model version and wait for the job to finish
    Publish {
        #[arg(long)]
        run_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        version: String,
    },
    /// Unpublish a model version and wait for the job to finish
    Unpublish {
        #[arg(long)]
        run_id: String,
        #[arg(long)]
        name: String,
    },
    /// Print the address a model version is served from once hosted
    Productionize {
        #[arg(long)]
        run_id: String,
        #[arg(long)]
        experiment_id: String,
    },
    /// Query a job status once
    Status {
        #[arg(long, value_parser = parse_action)]
        action: JobAction,
        #[arg(long)]
        location: String,
    },
    /// List published models
    Published {
        #[arg(long)]
        name: Option<String>,
    },
}

fn parse_action(raw: &str) -> Result<JobAction, String> {
    raw.parse().map_err(|err: modelhub_domain::ModelHubError| err.to_string())
}

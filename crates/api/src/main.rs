//! ModelHub - registry console client
//!
//! Main entry point for the command-line application.

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use modelhub_app::cli::{Cli, Command};
use modelhub_app::utils::command_helpers::execute_logged;
use modelhub_app::utils::logging::init_tracing;
use modelhub_app::{
    finish_job, job_status, list_published, login, logout, model_url, select_project,
    select_region, start_job, AppContext, LoginDetails,
};
use modelhub_domain::constants::MODEL_URL_MESSAGE;
use modelhub_domain::Config;
use modelhub_infra::api::JobRequest;
use modelhub_infra::{config, Reply};
use serde::Serialize;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env before reading any configuration
    let dotenv = dotenvy::dotenv();
    init_tracing(cli.json_logs)?;
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) => tracing::debug!(error = %err, "no .env file loaded"),
    }

    let config = load_config(&cli)?;
    let ctx = AppContext::new(config).context("failed to initialize application")?;

    run(&ctx, cli.command).await
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let loaded = match &cli.config {
        Some(path) => config::load_from_file(Some(path.clone())),
        None => config::load(),
    };
    loaded.context("failed to load configuration")
}

async fn run(ctx: &AppContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { access_token, refresh_token, project_id, repo_name, username } => {
            let details =
                LoginDetails { access_token, refresh_token, project_id, repo_name, username };
            login(ctx, &details)?;
            emit_line("Signed in.")
        }
        Command::Logout => {
            logout(ctx)?;
            emit_line("Signed out.")
        }
        Command::Region { name } => {
            let key = select_region(ctx, &name)?;
            emit_line(&format!("Region set to {key}."))
        }
        Command::Project { id } => {
            select_project(ctx, &id)?;
            emit_line(&format!("Project set to {id}."))
        }
        Command::Publish { run_id, name, version } => {
            let request = JobRequest::Publish { run_id: run_id.clone(), model_name: name, version };
            watch_job(ctx, "jobs::publish", &request, &run_id).await
        }
        Command::Unpublish { run_id, name } => {
            let request = JobRequest::Unpublish { run_id: run_id.clone(), model_name: name };
            watch_job(ctx, "jobs::unpublish", &request, &run_id).await
        }
        Command::Productionize { run_id, experiment_id } => {
            let url = model_url(ctx, &run_id, &experiment_id)?;
            emit_line(&format!("{MODEL_URL_MESSAGE} {url}"))
        }
        Command::Status { action, location } => {
            let reply =
                execute_logged("jobs::status", || job_status(ctx, action, &location)).await?;
            emit_reply(&reply)
        }
        Command::Published { name } => {
            let reply =
                execute_logged("published::list", || list_published(ctx, name.as_deref())).await?;
            emit_reply(&reply)
        }
    }
}

async fn watch_job(
    ctx: &AppContext,
    command_name: &str,
    request: &JobRequest,
    run_id: &str,
) -> anyhow::Result<()> {
    let Some(job) = execute_logged(command_name, || start_job(ctx, request)).await? else {
        return emit_line("The scheduler did not start a job.");
    };

    emit_line(job.in_progress_message())?;

    let summary = tokio::select! {
        summary = finish_job(job, run_id) => summary,
        _ = tokio::signal::ctrl_c() => {
            emit_line("Stopped watching the job; it keeps running on the scheduler.")?;
            return Ok(());
        }
    };
    emit_json(&summary)
}

fn emit_reply<T: Serialize>(reply: &Reply<T>) -> anyhow::Result<()> {
    match reply {
        Reply::Data(value) => emit_json(value),
        Reply::Redirected => emit_line("Session expired; sign in again."),
    }
}

fn emit_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn emit_line(line: &str) -> anyhow::Result<()> {
    writeln!(std::io::stdout().lock(), "{line}")?;
    Ok(())
}

//! authsweep batch job: prunes stale anonymous and tester accounts.

#![forbid(unsafe_code)]

mod args;

use std::env;
use std::process::ExitCode;

use authsweep_application::{PruneService, PruneSummary};
use authsweep_core::AppResult;
use authsweep_infrastructure::{FirebaseAuthConfig, initialize_default_directory};
use chrono::Utc;
use clap::Parser;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::args::PruneArgs;

/// Scheduler task identity, used to correlate failure reports.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TaskContext {
    index: String,
    attempt: String,
}

impl TaskContext {
    fn from_env() -> Self {
        Self {
            index: env::var("CLOUD_TASK_INDEX").unwrap_or_else(|_| "0".to_owned()),
            attempt: env::var("CLOUD_TASK_ATTEMPT").unwrap_or_else(|_| "0".to_owned()),
        }
    }

    /// Structured log line the scheduler alerts on.
    fn failure_report(&self, error: &dyn std::fmt::Display) -> String {
        json!({
            "message": format!(
                "Task #{}, Attempt #{} failed: {error}",
                self.index, self.attempt
            ),
            "severity": "ERROR",
        })
        .to_string()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = PruneArgs::parse();
    let task = TaskContext::from_env();

    match run(args).await {
        Ok(summary) => {
            info!(
                total_deleted = summary.total_deleted,
                candidates = summary.candidates,
                pages = summary.pages,
                "{} users deleted",
                summary.total_deleted
            );
            ExitCode::SUCCESS
        }
        Err(run_error) => {
            // Exiting non-zero makes the scheduler retry the task.
            error!("{}", task.failure_report(&run_error));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: PruneArgs) -> AppResult<PruneSummary> {
    let directory = initialize_default_directory(FirebaseAuthConfig::from_env().await?)?;
    info!(
        project_id = directory.project_id(),
        dry_run = args.dry_run,
        "cleaning up auth users"
    );

    let request = args.into_request(Utc::now())?;
    PruneService::new(directory).prune(&request).await
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

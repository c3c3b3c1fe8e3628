//! `hookcut` command-line client.

mod commands;
mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hookcut_models::JobId;

use crate::services::Services;

#[derive(Parser, Debug)]
#[command(name = "hookcut")]
#[command(about = "Upload a video for AI editing and follow the job", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a video, create a job and watch it
    Submit {
        /// Video file to upload
        file: PathBuf,

        /// User the job belongs to
        #[arg(long, env = "HOOKCUT_UID")]
        uid: String,

        /// Print the job id and exit without polling
        #[arg(long)]
        no_watch: bool,
    },

    /// Poll an existing job until it finishes
    Watch {
        job_id: String,
    },

    /// Print the download link of a finished job
    Download {
        job_id: String,
    },
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let directive = if verbose { "hookcut=debug" } else { "hookcut=warn" };
    let env_filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    // Logs go to stderr; stdout carries status lines
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let services = Services::from_env()?;

    match cli.command {
        Command::Submit {
            file,
            uid,
            no_watch,
        } => commands::submit(&services, &file, &uid, !no_watch).await,
        Command::Watch { job_id } => commands::follow(&services, JobId::from_string(job_id)).await,
        Command::Download { job_id } => {
            commands::download(&services, JobId::from_string(job_id)).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        error!("Failed to install rustls crypto provider");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

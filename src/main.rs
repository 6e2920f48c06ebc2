use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkpoint_core::{CheckpointError, CheckpointService, Config, Database};
use checkpoint_manager::{api, mcp, report};

#[derive(Parser)]
#[command(name = "ckpt")]
#[command(about = "Save and resume named task-session checkpoints")]
struct Cli {
    /// Path to the checkpoint database (overrides CHECKPOINT_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Start MCP server via stdio
    Mcp,
    /// Save a checkpoint from a JSON document on stdin (must include "name")
    Save,
    /// Show a checkpoint
    Resume {
        name: String,
        /// Print the YAML document instead of the report
        #[arg(long)]
        yaml: bool,
    },
    /// List all checkpoints, most recently updated first
    List {
        /// Print JSON instead of the report
        #[arg(long)]
        json: bool,
    },
    /// Delete a checkpoint and everything it owns
    Delete { name: String },
    /// Update summary, goal or environment fields of a checkpoint
    Update {
        name: String,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        current_goal: Option<String>,
        #[arg(long)]
        working_directory: Option<String>,
        #[arg(long)]
        git_branch: Option<String>,
        #[arg(long)]
        git_status: Option<String>,
    },
}

/// Failures that end the process: checkpoint errors keep their own exit
/// status, everything else exits with 1.
#[derive(Debug, Error)]
enum Failure {
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "checkpoint_manager=info,checkpoint_core=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!("Error: {failure}");
            match failure {
                Failure::Checkpoint(err) => ExitCode::from(err.exit_code() as u8),
                Failure::Other(_) => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cli: Cli) -> Result<(), Failure> {
    let mut config = Config::from_env();
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }

    let db = Database::open(&config.db_path)?;
    db.migrate()?;
    let service = CheckpointService::new(db);

    match cli.command {
        Commands::Serve { port } => {
            let app = api::create_router(service);

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
                .await
                .map_err(anyhow::Error::from)?;
            tracing::info!("Checkpoint API listening on http://127.0.0.1:{}", port);

            axum::serve(listener, app).await.map_err(anyhow::Error::from)?;
        }
        Commands::Mcp => {
            mcp::run_stdio_server(service).await?;
        }
        Commands::Save => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .map_err(anyhow::Error::from)?;
            let input = input.trim();
            if input.is_empty() {
                return Err(anyhow::anyhow!("No input provided. Please pipe JSON data to stdin.").into());
            }
            let document: Value = serde_json::from_str(input)
                .map_err(|e| anyhow::anyhow!("Invalid JSON input: {e}"))?;

            let outcome = service.save_document(&document)?;
            let name = document["name"].as_str().unwrap_or_default().trim();
            let counts = outcome.counts;
            println!(
                "Saved checkpoint '{}' ({} todos, {} files, {} decisions, {} artifacts)",
                name, counts.todos, counts.file_modifications, counts.key_decisions, counts.artifacts
            );
        }
        Commands::Resume { name, yaml } => match service.resume(&name) {
            Ok(checkpoint) if yaml => {
                print!("{}", serde_yaml::to_string(&checkpoint).map_err(CheckpointError::from)?);
            }
            Ok(checkpoint) => println!("{}", report::render_checkpoint(&checkpoint)),
            Err(err @ CheckpointError::NotFound(_)) => {
                println!("{}", report::render_available(&service.list()?.checkpoints));
                println!();
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        },
        Commands::List { json } => {
            let list = service.list()?;
            if json {
                let json = serde_json::to_string_pretty(&list).map_err(anyhow::Error::from)?;
                println!("{json}");
            } else {
                println!("{}", report::render_list(&list.checkpoints));
            }
        }
        Commands::Delete { name } => {
            println!("{}", service.delete(&name)?.message);
        }
        Commands::Update {
            name,
            summary,
            current_goal,
            working_directory,
            git_branch,
            git_status,
        } => {
            let updates: Map<String, Value> = [
                ("summary", summary),
                ("current_goal", current_goal),
                ("working_directory", working_directory),
                ("git_branch", git_branch),
                ("git_status", git_status),
            ]
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), Value::String(v))))
            .collect();

            let outcome = service.update(&name, &Value::Object(updates))?;
            println!("{} ({})", outcome.message, outcome.updated_fields.join(", "));
        }
    }

    Ok(())
}

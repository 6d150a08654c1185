//! Driftgate CLI
//!
//! One subcommand per pipeline stage, plus the full drift-gated run, the
//! prediction API server, the smoke test, and cron-trigger management.

use clap::{Parser, Subcommand};
use driftgate::{
    api, data, diagnostics, pipeline, scheduler,
    store::{ArtifactKind, ArtifactStore},
    PipelineConfig,
};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "driftgate", version, about = "Drift-gated ML pipeline")]
struct Cli {
    /// Pipeline configuration file (falls back to DRIFTGATE_CONFIG, then
    /// ./config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge source CSVs into a new dataset snapshot
    Ingest,
    /// Train a classifier on the latest snapshot
    Train,
    /// Score a model against the held-out test set
    Score {
        /// Evaluate the production model instead of the latest working one
        #[arg(long)]
        production: bool,
        /// Do not write a metric artifact
        #[arg(long)]
        no_persist: bool,
    },
    /// Promote the latest model, metric, and ingestion record
    Deploy,
    /// One full drift-gated pipeline run
    Run,
    /// Write the confusion-matrix report for the production model
    Report,
    /// Print dataset and environment diagnostics
    Diagnose,
    /// Serve the prediction API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Exercise every live endpoint and persist the responses
    SmokeTest,
    /// Manage the periodic cron trigger
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
}

#[derive(Subcommand)]
enum ScheduleCommands {
    /// Install the periodic trigger
    Add {
        #[arg(long, default_value_t = scheduler::DEFAULT_INTERVAL_MINUTES)]
        interval_minutes: u32,
        #[arg(long, default_value = scheduler::DEFAULT_COMMAND)]
        command: String,
    },
    /// List current crontab entries
    List,
    /// Remove triggers matching a command
    Remove {
        #[arg(long, default_value = scheduler::DEFAULT_COMMAND)]
        command: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = PipelineConfig::resolve_path(cli.config.clone());

    match cli.command {
        Commands::Ingest => {
            let config = PipelineConfig::from_file(&config_path)?;
            let report = pipeline::ingest(&config)?;
            println!(
                "ingested {} rows ({} after deduplication) into {}",
                report.rows_read,
                report.rows_written,
                report.snapshot_path.display()
            );
        }
        Commands::Train => {
            let config = PipelineConfig::from_file(&config_path)?;
            let report = pipeline::train(&config)?;
            println!(
                "trained model {} (validation accuracy {:.4}, F1 {:.4})",
                report.model_path.display(),
                report.validation_accuracy,
                report.validation_f1
            );
        }
        Commands::Score {
            production,
            no_persist,
        } => {
            let config = PipelineConfig::from_file(&config_path)?;
            let source = if production {
                pipeline::ModelSource::Production
            } else {
                pipeline::ModelSource::LatestWorking
            };
            let f1 = pipeline::score(&config, source, !no_persist)?;
            println!("F1 score: {f1}");
        }
        Commands::Deploy => {
            let config = PipelineConfig::from_file(&config_path)?;
            pipeline::deployment::deploy(&config)?;
            println!(
                "deployed latest artifacts to {}",
                config.prod_deployment_path.display()
            );
        }
        Commands::Run => {
            let config = PipelineConfig::from_file(&config_path)?;
            let outcome = pipeline::run(&config).await?;
            println!("{outcome}");
        }
        Commands::Report => {
            let config = PipelineConfig::from_file(&config_path)?;
            let path = pipeline::reporting::report(&config)?;
            println!("wrote {}", path.display());
        }
        Commands::Diagnose => {
            let config = PipelineConfig::from_file(&config_path)?;
            let snapshots = ArtifactStore::new(&config.output_folder_path);
            let snapshot_path = snapshots.latest_required(ArtifactKind::Dataset)?;
            let snapshot = data::drop_excluded(&data::read_csv(&snapshot_path)?)?;

            let summary = diagnostics::summary_stats(&snapshot);
            let diagnosis = diagnostics::diagnose(&config, &snapshot)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            println!("{}", serde_json::to_string_pretty(&diagnosis)?);
        }
        Commands::Serve { host, port } => {
            let config = PipelineConfig::from_file(&config_path)?;
            api::serve(config, SocketAddr::new(host, port)).await?;
        }
        Commands::SmokeTest => {
            let config = PipelineConfig::from_file(&config_path)?;
            let path = api::client::smoke_test(&config).await?;
            println!("wrote {}", path.display());
        }
        Commands::Schedule { command } => match command {
            ScheduleCommands::Add {
                interval_minutes,
                command,
            } => {
                let line = scheduler::add(interval_minutes, &command)?;
                println!("{line}");
            }
            ScheduleCommands::List => {
                for line in scheduler::list()? {
                    println!("{line}");
                }
            }
            ScheduleCommands::Remove { command } => {
                let removed = scheduler::remove(&command)?;
                println!("removed {removed} entries");
            }
        },
    }

    Ok(())
}

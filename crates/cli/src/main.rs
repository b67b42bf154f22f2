use crate::{
    conn::{EnvTokenSource, PostgresConnectionPinger},
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use connectors::{
    postgres::{destination::PgAddressDestination, source::PgAddressSource},
    provider::{ConnectionProvider, PgConnectionProvider},
};
use engine_core::{
    retry::RetryPolicy,
    state::{StateStore, sled_store::SledStateStore},
};
use engine_processing::heuristic::HeuristicNormalizer;
use engine_runtime::{
    config::RunConfig,
    runner::{PipelineParams, PipelineRunner, RunState},
};
use std::{path::PathBuf, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(name = "canonaddr", version = "0.1.0", about = "Address normalization pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // Initialize logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            conn_str,
            source_table,
            dest_table,
            token_env,
            batch_size,
            parallel,
            workers,
            output,
            resume,
            state_dir,
            json,
        } => {
            run_pipeline(RunArgs {
                conn_str,
                source_table,
                dest_table,
                token_env,
                batch_size,
                parallel,
                workers,
                output,
                resume,
                state_dir,
                json,
            })
            .await?;
        }
        Commands::Progress {
            table,
            state_dir,
            json,
        } => {
            show_progress(&table, state_dir, json).await?;
        }
        Commands::TestConn {
            conn_str,
            token_env,
        } => {
            let provider = build_provider(&conn_str, token_env.as_deref());
            PostgresConnectionPinger { provider }.ping().await?;
        }
    }

    Ok(())
}

struct RunArgs {
    conn_str: String,
    source_table: String,
    dest_table: String,
    token_env: Option<String>,
    batch_size: usize,
    parallel: bool,
    workers: Option<usize>,
    output: Option<PathBuf>,
    resume: bool,
    state_dir: Option<PathBuf>,
    json: bool,
}

async fn run_pipeline(args: RunArgs) -> Result<(), CliError> {
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let provider = build_provider(&args.conn_str, args.token_env.as_deref());
    let source = Arc::new(PgAddressSource::new(provider.clone(), &args.source_table));
    let destination = Arc::new(PgAddressDestination::new(provider, &args.dest_table));
    let state = open_state_store(args.state_dir)?;

    let mut config = RunConfig::new(&args.source_table)
        .with_batch_size(args.batch_size)
        .with_parallel(args.parallel)
        .with_output_file(args.output)
        .with_resume(args.resume);
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }

    let runner = PipelineRunner::new(PipelineParams {
        source,
        normalizer: Arc::new(HeuristicNormalizer::new()),
        destination,
        state,
        config,
        cancel: shutdown.cancel_token(),
        retry: RetryPolicy::for_database(),
    });

    let report = runner.run().await?;

    if args.json {
        output::print_report_json(&report)?;
    } else {
        output::print_report_table(&report);
    }

    if report.state == RunState::Aborted {
        let code = if shutdown.is_shutdown_requested() {
            ExitCode::ShutdownRequested
        } else {
            ExitCode::GeneralError
        };
        std::process::exit(code.as_i32());
    }

    Ok(())
}

fn build_provider(conn_str: &str, token_env: Option<&str>) -> Arc<dyn ConnectionProvider> {
    let mut provider = PgConnectionProvider::new(conn_str);
    if let Some(var) = token_env {
        provider = provider.with_token_source(Arc::new(EnvTokenSource::new(var)));
    }
    Arc::new(provider)
}

fn open_state_store(state_dir: Option<PathBuf>) -> Result<Arc<dyn StateStore>, CliError> {
    let path = match state_dir {
        Some(dir) => dir,
        None => dirs::home_dir()
            .ok_or_else(|| CliError::Unexpected("Could not determine home directory".into()))?
            .join(".canonaddr/state"),
    };
    let store = SledStateStore::open(&path).map_err(|err| {
        CliError::Unexpected(format!(
            "Failed to open state store at {}: {err}",
            path.display()
        ))
    })?;
    Ok(Arc::new(store))
}

async fn show_progress(
    table: &str,
    state_dir: Option<PathBuf>,
    as_json: bool,
) -> Result<(), CliError> {
    let store = open_state_store(state_dir)?;

    let checkpoint = store
        .load_checkpoint(table)
        .await
        .map_err(|err| CliError::Unexpected(format!("Failed to load checkpoint: {err}")))?;

    match checkpoint {
        Some(cp) => {
            if as_json {
                output::print_checkpoint_json(&cp)?;
            } else {
                output::print_checkpoint_table(table, &cp);
            }
        }
        None => println!("No checkpoint stored for table '{table}'"),
    }

    Ok(())
}

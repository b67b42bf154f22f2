use clap::Subcommand;
use engine_runtime::config::DEFAULT_BATCH_SIZE;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize a raw address table into the canonical address table
    Run {
        #[arg(long, help = "Postgres connection string")]
        conn_str: String,

        #[arg(long, help = "Source table holding the raw addresses")]
        source_table: String,

        #[arg(long, help = "Destination table for normalized addresses")]
        dest_table: String,

        #[arg(
            long,
            help = "Environment variable holding a database access token, used as the connection password"
        )]
        token_env: Option<String>,

        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, help = "Rows per batch")]
        batch_size: usize,

        #[arg(long, help = "Fan each batch out across worker threads")]
        parallel: bool,

        #[arg(long, help = "Worker count in parallel mode, defaults to the CPU count")]
        workers: Option<usize>,

        #[arg(long, help = "Write failed record keys to this csv file")]
        output: Option<PathBuf>,

        #[arg(long, help = "Continue from the last committed checkpoint")]
        resume: bool,

        #[arg(long, help = "Checkpoint store directory, defaults to ~/.canonaddr/state")]
        state_dir: Option<PathBuf>,

        #[arg(
            long,
            help = "If set, prints the run report as JSON instead of a table"
        )]
        json: bool,
    },
    /// Show the stored checkpoint for a source table
    Progress {
        #[arg(long, help = "Source table to inspect")]
        table: String,

        #[arg(long, help = "Checkpoint store directory, defaults to ~/.canonaddr/state")]
        state_dir: Option<PathBuf>,

        #[arg(
            long,
            help = "If set, prints the checkpoint as JSON instead of a table"
        )]
        json: bool,
    },
    /// Test a Postgres connection string
    TestConn {
        /// Connection string
        #[arg(long)]
        conn_str: String,

        #[arg(
            long,
            help = "Environment variable holding a database access token, used as the connection password"
        )]
        token_env: Option<String>,
    },
}

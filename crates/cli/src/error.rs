use connectors::error::DbError;
use engine_runtime::error::RunError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(serde_json::Error),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Pipeline error: {0}")]
    Run(#[from] RunError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

use crate::error::CliError;
use async_trait::async_trait;
use connectors::{
    error::DbError,
    provider::{AccessTokenSource, ConnectionProvider},
};
use std::sync::Arc;
use tracing::{error, info};

/// Reads a fresh access token from an environment variable on every
/// connect. Suits setups where a sidecar keeps the variable current.
pub struct EnvTokenSource {
    var: String,
}

impl EnvTokenSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl AccessTokenSource for EnvTokenSource {
    async fn access_token(&self) -> Result<String, DbError> {
        std::env::var(&self.var)
            .map_err(|_| DbError::Unavailable(format!("token variable '{}' is not set", self.var)))
    }
}

/// Pings the database through the same provider the pipeline uses, so a
/// successful ping also validates the token path.
pub struct PostgresConnectionPinger {
    pub provider: Arc<dyn ConnectionProvider>,
}

impl PostgresConnectionPinger {
    pub async fn ping(&self) -> Result<(), CliError> {
        let client = self.provider.connect().await.map_err(|e| {
            error!("Postgres connection failed: {}", e);
            CliError::Db(e)
        })?;

        let row = client.query_one("SELECT 1", &[]).await.map_err(|e| {
            error!("Postgres ping query failed: {}", e);
            CliError::Postgres(e)
        })?;

        let val: i32 = row.get(0);
        if val != 1 {
            let msg = format!("Postgres ping returned unexpected result: {val}");
            error!("{}", msg);
            return Err(CliError::Unexpected(msg));
        }

        info!("Postgres ping succeeded");
        Ok(())
    }
}

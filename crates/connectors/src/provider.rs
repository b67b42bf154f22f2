use crate::error::DbError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error};

/// Supplies short-lived database access tokens, e.g. from a cloud identity
/// service. The token is injected as the connection password on every
/// connect, so expiry between batches is handled transparently.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, DbError>;
}

/// Hands out live database sessions on demand. Called by the source for
/// reads and by the destination for batch commits; sessions are not assumed
/// to be shareable across tasks.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn connect(&self) -> Result<Client, DbError>;
}

pub struct PgConnectionProvider {
    conn_str: String,
    token_source: Option<Arc<dyn AccessTokenSource>>,
}

impl PgConnectionProvider {
    pub fn new(conn_str: impl Into<String>) -> Self {
        Self {
            conn_str: conn_str.into(),
            token_source: None,
        }
    }

    /// Use token-based auth instead of a password baked into the
    /// connection string.
    pub fn with_token_source(mut self, source: Arc<dyn AccessTokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }
}

#[async_trait]
impl ConnectionProvider for PgConnectionProvider {
    async fn connect(&self) -> Result<Client, DbError> {
        let mut config: tokio_postgres::Config = self
            .conn_str
            .parse()
            .map_err(|e: tokio_postgres::Error| DbError::Unavailable(e.to_string()))?;

        if let Some(source) = &self.token_source {
            let token = source.access_token().await?;
            config.password(token);
        }

        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| DbError::Unavailable(e.to_string()))?;

        // The connection object drives the socket; it has to be polled for
        // the client to make progress.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "Postgres connection terminated");
            }
        });

        debug!("Obtained Postgres session");
        Ok(client)
    }
}

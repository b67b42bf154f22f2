use crate::{destination::AddressDestination, error::DbError, provider::ConnectionProvider};
use async_trait::async_trait;
use model::records::address::NormalizedAddress;
use std::{sync::Arc, time::Instant};
use tracing::info;

/// Writes normalized addresses into the canonical table, one transaction
/// per batch. Reruns upsert on the address key, so retrying a batch that
/// failed before its commit is idempotent.
pub struct PgAddressDestination {
    provider: Arc<dyn ConnectionProvider>,
    table: String,
}

impl PgAddressDestination {
    pub fn new(provider: Arc<dyn ConnectionProvider>, table: impl Into<String>) -> Self {
        Self {
            provider,
            table: table.into(),
        }
    }

    fn upsert_sql(&self) -> String {
        format!(
            "INSERT INTO {} \
             (address_key, street, unit, city, region, postal_code, country, \
              latitude, longitude, match_quality) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (address_key) DO UPDATE SET \
              street = EXCLUDED.street, unit = EXCLUDED.unit, \
              city = EXCLUDED.city, region = EXCLUDED.region, \
              postal_code = EXCLUDED.postal_code, country = EXCLUDED.country, \
              latitude = EXCLUDED.latitude, longitude = EXCLUDED.longitude, \
              match_quality = EXCLUDED.match_quality",
            self.table
        )
    }
}

#[async_trait]
impl AddressDestination for PgAddressDestination {
    async fn write_batch(
        &self,
        batch_id: &str,
        rows: &[NormalizedAddress],
    ) -> Result<(), DbError> {
        if rows.is_empty() {
            return Ok(());
        }

        let start = Instant::now();
        let commit_err = |e: tokio_postgres::Error| DbError::Commit {
            batch_id: batch_id.to_string(),
            message: e.to_string(),
        };

        let mut client = self.provider.connect().await?;
        let tx = client.transaction().await.map_err(commit_err)?;
        let stmt = tx.prepare(&self.upsert_sql()).await.map_err(commit_err)?;

        for row in rows {
            tx.execute(
                &stmt,
                &[
                    &row.key,
                    &row.street,
                    &row.unit,
                    &row.city,
                    &row.region,
                    &row.postal_code,
                    &row.country,
                    &row.latitude,
                    &row.longitude,
                    &row.match_quality.as_str(),
                ],
            )
            .await
            .map_err(commit_err)?;
        }

        tx.commit().await.map_err(commit_err)?;

        info!(
            batch_id,
            rows = rows.len(),
            duration_ms = start.elapsed().as_millis(),
            "Committed normalized batch"
        );
        Ok(())
    }
}

use crate::{error::DbError, provider::ConnectionProvider, source::AddressSource};
use async_trait::async_trait;
use model::{
    pagination::{cursor::Cursor, page::FetchResult},
    records::address::RawAddressRecord,
};
use std::{sync::Arc, time::Instant};
use tokio_postgres::Row;
use tracing::debug;

/// Keyset-paginated reader over the raw address table.
///
/// A fresh session is obtained per fetch so that token-authenticated
/// connections stay valid across long runs; the cursor carries all read
/// state, so reconnecting between windows is safe.
pub struct PgAddressSource {
    provider: Arc<dyn ConnectionProvider>,
    table: String,
}

impl PgAddressSource {
    pub fn new(provider: Arc<dyn ConnectionProvider>, table: impl Into<String>) -> Self {
        Self {
            provider,
            table: table.into(),
        }
    }

    fn decode(row: &Row) -> Result<RawAddressRecord, DbError> {
        let key: i64 = row.try_get("address_key").map_err(|e| DbError::Decode {
            key: 0,
            message: e.to_string(),
        })?;

        let field = |name: &str| -> Result<Option<String>, DbError> {
            row.try_get(name).map_err(|e| DbError::Decode {
                key,
                message: format!("column '{name}': {e}"),
            })
        };

        Ok(RawAddressRecord {
            key,
            line_one: field("line_one")?.unwrap_or_default(),
            line_two: field("line_two")?,
            city: field("city")?,
            region: field("region")?,
            postal_code: field("postal_code")?,
        })
    }
}

#[async_trait]
impl AddressSource for PgAddressSource {
    async fn fetch(&self, batch_size: usize, cursor: Cursor) -> Result<FetchResult, DbError> {
        let start = Instant::now();
        let client = self.provider.connect().await?;

        let sql = format!(
            "SELECT address_key, line_one, line_two, city, region, postal_code \
             FROM {} WHERE address_key > $1 ORDER BY address_key ASC LIMIT $2",
            self.table
        );

        let rows = client
            .query(&sql, &[&cursor.lower_bound(), &(batch_size as i64)])
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(Self::decode(row)?);
        }

        let row_count = records.len();
        let reached_end = row_count < batch_size;
        let next_cursor = if reached_end {
            None
        } else {
            records.last().map(|r| Cursor::after(r.key))
        };

        let took_ms = start.elapsed().as_millis();
        debug!(
            table = %self.table,
            rows = row_count,
            cursor = %cursor,
            took_ms,
            "Fetched source window"
        );

        Ok(FetchResult {
            records,
            next_cursor,
            reached_end,
            row_count,
            took_ms,
        })
    }
}

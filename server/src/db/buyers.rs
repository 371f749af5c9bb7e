//! Database operations for the buyers table.

use obsidian_engine::error::Result as EngineResult;
use obsidian_engine::{BuyerRecord, Error as EngineError, LoadOptions, RemoteStore};
use serde_json::{json, Value};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tokio::runtime::Handle;

const COLUMNS: &str = "id, buyer_name, destination_country, total_usd, total_invoices, \
    exporters, emails, websites, phones, addresses, \
    company_name_english, country_english, country_code";

/// A stored buyer row from the database.
#[derive(Debug)]
pub struct StoredBuyer {
    pub id: String,
    pub buyer_name: String,
    pub destination_country: Option<String>,
    pub total_usd: Option<f64>,
    pub total_invoices: Option<i64>,
    pub exporters: Value,
    pub emails: Value,
    pub websites: Value,
    pub phones: Value,
    pub addresses: Value,
    pub company_name_english: Option<String>,
    pub country_english: Option<String>,
    pub country_code: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredBuyer {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredBuyer {
            id: row.try_get("id")?,
            buyer_name: row.try_get("buyer_name")?,
            destination_country: row.try_get("destination_country")?,
            total_usd: row.try_get("total_usd")?,
            total_invoices: row.try_get("total_invoices")?,
            exporters: row.try_get("exporters")?,
            emails: row.try_get("emails")?,
            websites: row.try_get("websites")?,
            phones: row.try_get("phones")?,
            addresses: row.try_get("addresses")?,
            company_name_english: row.try_get("company_name_english")?,
            country_english: row.try_get("country_english")?,
            country_code: row.try_get("country_code")?,
        })
    }
}

impl StoredBuyer {
    /// The row as a raw JSON object keyed by canonical field names.
    pub fn to_row(&self) -> Value {
        json!({
            "id": self.id,
            "buyer_name": self.buyer_name,
            "destination_country": self.destination_country,
            "total_usd": self.total_usd,
            "total_invoices": self.total_invoices,
            "exporters": self.exporters,
            "emails": self.emails,
            "websites": self.websites,
            "phones": self.phones,
            "addresses": self.addresses,
            "company_name_english": self.company_name_english,
            "country_english": self.country_english,
            "country_code": self.country_code,
        })
    }

    /// Validate the row into an engine record.
    ///
    /// Remote rows go through the same coercions as local ones.
    pub fn to_record(&self, index: usize) -> EngineResult<BuyerRecord> {
        BuyerRecord::from_value(&self.to_row(), index, LoadOptions::default())
    }
}

/// Upsert a buyer (insert or replace every column).
pub async fn upsert_buyer(pool: &PgPool, table: &str, record: &BuyerRecord) -> Result<(), sqlx::Error> {
    let total_invoices = record
        .total_invoices
        .map(i64::try_from)
        .transpose()
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    let sql = format!(
        r#"
        INSERT INTO {table} ({COLUMNS})
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (id) DO UPDATE SET
            buyer_name = EXCLUDED.buyer_name,
            destination_country = EXCLUDED.destination_country,
            total_usd = EXCLUDED.total_usd,
            total_invoices = EXCLUDED.total_invoices,
            exporters = EXCLUDED.exporters,
            emails = EXCLUDED.emails,
            websites = EXCLUDED.websites,
            phones = EXCLUDED.phones,
            addresses = EXCLUDED.addresses,
            company_name_english = EXCLUDED.company_name_english,
            country_english = EXCLUDED.country_english,
            country_code = EXCLUDED.country_code,
            updated_at = now()
        "#
    );

    sqlx::query(&sql)
        .bind(record.id())
        .bind(&record.buyer_name)
        .bind(&record.destination_country)
        .bind(record.total_usd)
        .bind(total_invoices)
        .bind(Json(&record.exporters))
        .bind(Json(&record.emails))
        .bind(Json(&record.websites))
        .bind(Json(&record.phones))
        .bind(Json(&record.addresses))
        .bind(&record.company_name_english)
        .bind(&record.country_english)
        .bind(&record.country_code)
        .execute(pool)
        .await?;

    Ok(())
}

/// Get every buyer row, ordered by id.
pub async fn fetch_buyers(pool: &PgPool, table: &str) -> Result<Vec<StoredBuyer>, sqlx::Error> {
    let sql = format!("SELECT {COLUMNS} FROM {table} ORDER BY id");
    sqlx::query_as::<_, StoredBuyer>(&sql).fetch_all(pool).await
}

/// Count the rows in the buyers table.
pub async fn count_buyers(pool: &PgPool, table: &str) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    sqlx::query_scalar::<_, i64>(&sql).fetch_one(pool).await
}

/// The buyers table seen through the engine's [`RemoteStore`] seam.
///
/// The engine is synchronous, so every call blocks on the runtime handle.
/// Use it only from a blocking thread (`spawn_blocking`), never from inside
/// an async task.
#[derive(Debug, Clone)]
pub struct PgRemoteStore {
    pool: PgPool,
    table: String,
    handle: Handle,
}

impl PgRemoteStore {
    pub fn new(pool: PgPool, table: impl Into<String>, handle: Handle) -> Self {
        Self {
            pool,
            table: table.into(),
            handle,
        }
    }
}

impl RemoteStore for PgRemoteStore {
    fn fetch_all(&self) -> EngineResult<Vec<BuyerRecord>> {
        let rows = self
            .handle
            .block_on(fetch_buyers(&self.pool, &self.table))
            .map_err(|e| EngineError::SourceUnavailable(format!("{}: {e}", self.table)))?;

        rows.iter()
            .enumerate()
            .map(|(index, row)| row.to_record(index))
            .collect()
    }

    fn upsert(&mut self, record: &BuyerRecord) -> EngineResult<()> {
        self.handle
            .block_on(upsert_buyer(&self.pool, &self.table, record))
            .map_err(|e| EngineError::WriteError {
                id: record.id().to_string(),
                cause: e.to_string(),
            })
    }
}

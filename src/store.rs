//! Durable mirror storage on SQLite.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use std::str::FromStr;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Currency, Rate};

/// Durable keyed storage for currencies and rates.
///
/// Writes are first-write-wins: a key that already exists is silently left
/// untouched, never updated. Each batch commits as a unit.
#[async_trait]
pub trait RateStore: Send + Sync {
    async fn upsert_currencies(&self, currencies: &[Currency]) -> Result<()>;
    async fn upsert_rates(&self, rates: &[Rate]) -> Result<()>;
    async fn get_currency(&self, abbreviation: &str) -> Result<Option<Currency>>;
    async fn get_rate(&self, currency: &Currency, on_date: NaiveDate) -> Result<Option<Rate>>;
}

pub struct SqliteStore {
    pool: SqlitePool,
}

type CurrencyRow = (
    Option<i64>,
    Option<String>,
    String,
    String,
    String,
    String,
    i64,
    NaiveDateTime,
    NaiveDateTime,
);

type RateRow = (NaiveDate, i64, String, String);

fn stored_decimal(text: &str, column: &str) -> Result<Decimal> {
    Decimal::from_str(text).map_err(|e| Error::Decode(format!("{column} = {text:?}: {e}")))
}

impl SqliteStore {
    /// Creates the database if it does not exist, runs migrations and
    /// returns a connected store.
    pub async fn connect(db_url: &str) -> Result<SqliteStore> {
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url).await?;
        }

        // One connection: access is single-threaded per run, and this keeps
        // in-memory databases coherent across queries.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(db_url)
            .await?;

        sqlx::migrate!().run(&pool).await?;

        Ok(SqliteStore { pool })
    }

    /// Closes the connection. Every later operation fails with
    /// [`Error::Connection`].
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.pool.is_closed() {
            return Err(Error::Connection);
        }
        Ok(())
    }

    fn validate_currency(currency: &Currency) -> Result<()> {
        if currency.abbreviation.is_empty() {
            return Err(Error::MalformedEntity(
                "currency with an empty abbreviation".to_string(),
            ));
        }
        if currency.internal_id.is_none() {
            return Err(Error::MalformedEntity(format!(
                "currency {} has no internal id",
                currency.abbreviation
            )));
        }
        Ok(())
    }

    fn validate_rate(rate: &Rate) -> Result<()> {
        if rate.currency_id.is_none() {
            return Err(Error::MalformedEntity(format!(
                "rate for {} on {} has no currency id",
                rate.abbreviation, rate.date
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RateStore for SqliteStore {
    async fn upsert_currencies(&self, currencies: &[Currency]) -> Result<()> {
        self.ensure_open()?;
        if currencies.is_empty() {
            return Err(Error::MalformedEntity("empty currency batch".to_string()));
        }
        for currency in currencies {
            Self::validate_currency(currency)?;
        }

        let mut tx = self.pool.begin().await?;
        for currency in currencies {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO currency (
                    internal_id, internal_code, abbreviation, name, name_bel,
                    scale, periodicity, date_start, date_end
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(currency.internal_id)
            .bind(&currency.internal_code)
            .bind(&currency.abbreviation)
            .bind(&currency.name)
            .bind(&currency.name_bel)
            .bind(currency.scale.to_string())
            .bind(currency.periodicity)
            .bind(currency.date_start)
            .bind(currency.date_end)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        debug!(count = currencies.len(), "currency batch committed");
        Ok(())
    }

    async fn upsert_rates(&self, rates: &[Rate]) -> Result<()> {
        self.ensure_open()?;
        if rates.is_empty() {
            return Err(Error::MalformedEntity("empty rate batch".to_string()));
        }
        for rate in rates {
            Self::validate_rate(rate)?;
        }

        let mut tx = self.pool.begin().await?;
        for rate in rates {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO rate (date, currency_id, abbreviation, rate)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(rate.date)
            .bind(rate.currency_id)
            .bind(&rate.abbreviation)
            .bind(rate.rate.to_string())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        debug!(count = rates.len(), "rate batch committed");
        Ok(())
    }

    async fn get_currency(&self, abbreviation: &str) -> Result<Option<Currency>> {
        self.ensure_open()?;
        let row = sqlx::query_as::<_, CurrencyRow>(
            r#"
            SELECT internal_id, internal_code, abbreviation, name, name_bel,
                   scale, periodicity, date_start, date_end
            FROM currency
            WHERE abbreviation = ?
            "#,
        )
        .bind(abbreviation)
        .fetch_optional(&self.pool)
        .await?;

        row.map(
            |(internal_id, internal_code, abbreviation, name, name_bel, scale, periodicity, date_start, date_end)| {
                Ok(Currency {
                    internal_id,
                    internal_code,
                    abbreviation,
                    name,
                    name_bel,
                    scale: stored_decimal(&scale, "currency.scale")?,
                    periodicity,
                    date_start,
                    date_end,
                })
            },
        )
        .transpose()
    }

    async fn get_rate(&self, currency: &Currency, on_date: NaiveDate) -> Result<Option<Rate>> {
        self.ensure_open()?;
        let currency_id = currency.internal_id.ok_or_else(|| {
            Error::MalformedEntity(format!(
                "currency {} has no internal id",
                currency.abbreviation
            ))
        })?;

        let row = sqlx::query_as::<_, RateRow>(
            r#"
            SELECT date, currency_id, abbreviation, rate
            FROM rate
            WHERE date = ? AND currency_id = ?
            "#,
        )
        .bind(on_date)
        .bind(currency_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(date, currency_id, abbreviation, rate)| {
            Ok(Rate {
                currency_id: Some(currency_id),
                date,
                abbreviation,
                rate: stored_decimal(&rate, "rate.rate")?,
            })
        })
        .transpose()
    }
}

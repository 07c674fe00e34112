//! Client for the NBRB exchange-rate HTTP API.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Currency, Rate};

/// The remote rate provider. Fetch-only; no retry, no backoff.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// The full catalog, keyed by abbreviation.
    async fn available_currencies(&self) -> Result<HashMap<String, Currency>>;

    /// One rate, optionally for a specific date (latest when `None`).
    async fn rate(&self, currency: &Currency, on_date: Option<NaiveDate>) -> Result<Rate>;

    /// The full current rate set, one call.
    async fn all_rates(&self) -> Result<Vec<Rate>>;
}

pub const DEFAULT_API_BASE_URL: &str = "https://api.nbrb.by/exrates";

pub struct NbrbClient {
    client: reqwest::Client,
    base_url: String,
    // Catalog memo, scoped to this instance. Cleared only by
    // `invalidate_catalog`; construct a new client for a guaranteed
    // fresh fetch.
    catalog: tokio::sync::Mutex<Option<HashMap<String, Currency>>>,
}

#[derive(Debug, Deserialize)]
struct NbrbCurrency {
    #[serde(rename = "Cur_ID")]
    cur_id: i64,
    #[serde(rename = "Cur_Code")]
    cur_code: Option<String>,
    #[serde(rename = "Cur_Abbreviation")]
    cur_abbreviation: String,
    #[serde(rename = "Cur_Name_Eng")]
    cur_name_eng: String,
    #[serde(rename = "Cur_Name_Bel")]
    cur_name_bel: String,
    #[serde(rename = "Cur_Scale")]
    cur_scale: serde_json::Number,
    #[serde(rename = "Cur_Periodicity")]
    cur_periodicity: i64,
    #[serde(rename = "Cur_DateStart")]
    cur_date_start: NaiveDateTime,
    #[serde(rename = "Cur_DateEnd")]
    cur_date_end: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
struct NbrbRate {
    #[serde(rename = "Cur_ID")]
    cur_id: i64,
    #[serde(rename = "Date")]
    date: NaiveDateTime,
    #[serde(rename = "Cur_Abbreviation")]
    cur_abbreviation: String,
    #[serde(rename = "Cur_OfficialRate")]
    cur_official_rate: serde_json::Number,
}

// The API serializes rates as JSON numbers. Going through the textual
// representation keeps the decimal exact instead of inheriting a binary
// float expansion.
fn decimal_from_number(value: &serde_json::Number, field: &str) -> Result<Decimal> {
    Decimal::from_str(&value.to_string())
        .map_err(|e| Error::Decode(format!("{field} = {value}: {e}")))
}

impl TryFrom<NbrbCurrency> for Currency {
    type Error = Error;

    fn try_from(raw: NbrbCurrency) -> Result<Currency> {
        let scale = decimal_from_number(&raw.cur_scale, "Cur_Scale")?;
        Ok(Currency {
            internal_id: Some(raw.cur_id),
            internal_code: raw.cur_code,
            abbreviation: raw.cur_abbreviation,
            name: raw.cur_name_eng,
            name_bel: raw.cur_name_bel,
            scale,
            periodicity: raw.cur_periodicity,
            date_start: raw.cur_date_start,
            date_end: raw.cur_date_end,
        })
    }
}

impl TryFrom<NbrbRate> for Rate {
    type Error = Error;

    fn try_from(raw: NbrbRate) -> Result<Rate> {
        let rate = decimal_from_number(&raw.cur_official_rate, "Cur_OfficialRate")?;
        Ok(Rate {
            currency_id: Some(raw.cur_id),
            date: raw.date.date(),
            abbreviation: raw.cur_abbreviation,
            rate,
        })
    }
}

impl NbrbClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            catalog: tokio::sync::Mutex::new(None),
        }
    }

    /// Drops the memoized catalog so the next `available_currencies`
    /// call hits the network again.
    #[allow(dead_code)]
    pub async fn invalidate_catalog(&self) {
        self.catalog.lock().await.take();
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "remote fetch");
        let response = self.client.get(&url).query(query).send().await?;
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.get(path, query).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::RemoteUnavailable(format!(
                "GET {}/{} returned {}",
                self.base_url, path, status
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Decode(e.to_string()))
    }
}

#[async_trait]
impl RateSource for NbrbClient {
    async fn available_currencies(&self) -> Result<HashMap<String, Currency>> {
        let mut memo = self.catalog.lock().await;
        if let Some(map) = memo.as_ref() {
            return Ok(map.clone());
        }
        let rows: Vec<NbrbCurrency> = self.get_json("currencies", &[]).await?;
        let map = rows
            .into_iter()
            .map(|raw| {
                let currency = Currency::try_from(raw)?;
                Ok((currency.abbreviation.clone(), currency))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        *memo = Some(map.clone());
        Ok(map)
    }

    async fn rate(&self, currency: &Currency, on_date: Option<NaiveDate>) -> Result<Rate> {
        let id = currency.internal_id.ok_or_else(|| {
            Error::MalformedEntity(format!(
                "currency {} has no internal id",
                currency.abbreviation
            ))
        })?;
        let mut query = Vec::new();
        if let Some(date) = on_date {
            query.push(("ondate", date.format("%Y-%m-%d").to_string()));
        }
        let response = self.get(&format!("rates/{id}"), &query).await?;
        let status = response.status();
        // A date the bank has no published rate for comes back 404. That is
        // an absent record, not an outage.
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!(
                "no rate for {} (id {id}){}",
                currency.abbreviation,
                on_date.map_or(String::new(), |d| format!(" on {d}"))
            )));
        }
        if !status.is_success() {
            return Err(Error::RemoteUnavailable(format!(
                "GET {}/rates/{id} returned {status}",
                self.base_url
            )));
        }
        let raw: NbrbRate = response
            .json()
            .await
            .map_err(|e| Error::Decode(e.to_string()))?;
        Rate::try_from(raw)
    }

    async fn all_rates(&self) -> Result<Vec<Rate>> {
        // periodicity=0 selects the daily rate set.
        let rows: Vec<NbrbRate> =
            self.get_json("rates", &[("periodicity", "0".to_string())]).await?;
        rows.into_iter().map(Rate::try_from).collect()
    }
}

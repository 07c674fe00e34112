//! Hand-rolled fakes behind the `RateSource` / `RateStore` seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::api::RateSource;
use crate::error::{Error, Result};
use crate::models::{Currency, Rate};
use crate::store::RateStore;

/// Canned remote source that counts its calls.
#[derive(Default)]
pub struct FakeSource {
    currencies: HashMap<String, Currency>,
    rates: HashMap<(i64, NaiveDate), Rate>,
    all_rates: Vec<Rate>,
    fail: bool,
    catalog_calls: AtomicUsize,
    rate_calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currencies
            .insert(currency.abbreviation.clone(), currency);
        self
    }

    pub fn with_rate(mut self, rate: Rate) -> Self {
        let key = (rate.currency_id.unwrap(), rate.date);
        self.rates.insert(key, rate);
        self
    }

    pub fn with_all_rates(mut self, rates: Vec<Rate>) -> Self {
        self.all_rates = rates;
        self
    }

    /// Every call fails with `RemoteUnavailable`.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }

    pub fn rate_calls(&self) -> usize {
        self.rate_calls.load(Ordering::SeqCst)
    }

    fn check_up(&self) -> Result<()> {
        if self.fail {
            return Err(Error::RemoteUnavailable("fake outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RateSource for FakeSource {
    async fn available_currencies(&self) -> Result<HashMap<String, Currency>> {
        self.check_up()?;
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.currencies.clone())
    }

    async fn rate(&self, currency: &Currency, on_date: Option<NaiveDate>) -> Result<Rate> {
        self.check_up()?;
        self.rate_calls.fetch_add(1, Ordering::SeqCst);
        let id = currency
            .internal_id
            .ok_or_else(|| Error::MalformedEntity("currency has no internal id".to_string()))?;
        let date = on_date.ok_or_else(|| {
            Error::NotFound("fake source only serves dated requests".to_string())
        })?;
        self.rates
            .get(&(id, date))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no rate for id {id} on {date}")))
    }

    async fn all_rates(&self) -> Result<Vec<Rate>> {
        self.check_up()?;
        Ok(self.all_rates.clone())
    }
}

/// In-memory store that records the order of write calls.
#[derive(Default)]
pub struct RecordingStore {
    pub calls: Mutex<Vec<&'static str>>,
    currencies: Mutex<HashMap<String, Currency>>,
    rates: Mutex<HashMap<(i64, NaiveDate), Rate>>,
}

impl RecordingStore {
    pub fn call_order(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stored_rates(&self) -> Vec<Rate> {
        self.rates.lock().unwrap().values().cloned().collect()
    }

    pub fn currency_count(&self) -> usize {
        self.currencies.lock().unwrap().len()
    }
}

#[async_trait]
impl RateStore for RecordingStore {
    async fn upsert_currencies(&self, currencies: &[Currency]) -> Result<()> {
        self.calls.lock().unwrap().push("upsert_currencies");
        let mut map = self.currencies.lock().unwrap();
        for currency in currencies {
            map.entry(currency.abbreviation.clone())
                .or_insert_with(|| currency.clone());
        }
        Ok(())
    }

    async fn upsert_rates(&self, rates: &[Rate]) -> Result<()> {
        self.calls.lock().unwrap().push("upsert_rates");
        let mut map = self.rates.lock().unwrap();
        for rate in rates {
            let key = (rate.currency_id.unwrap_or_default(), rate.date);
            map.entry(key).or_insert_with(|| rate.clone());
        }
        Ok(())
    }

    async fn get_currency(&self, abbreviation: &str) -> Result<Option<Currency>> {
        Ok(self.currencies.lock().unwrap().get(abbreviation).cloned())
    }

    async fn get_rate(&self, currency: &Currency, on_date: NaiveDate) -> Result<Option<Rate>> {
        let id = currency.internal_id.unwrap_or_default();
        Ok(self.rates.lock().unwrap().get(&(id, on_date)).cloned())
    }
}

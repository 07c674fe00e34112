//! Read-through lookups: store first, remote on a miss, no write-back.

use chrono::NaiveDate;

use crate::api::RateSource;
use crate::error::{Error, Result};
use crate::models::{Currency, Rate};
use crate::store::RateStore;

/// Resolves currencies and rates against the local mirror, falling back to
/// the remote source on a miss.
///
/// Fallback results are deliberately not written back: resolution stays
/// read-only, and a caller that wants a remote hit to become durable runs
/// the bulk sync (or an explicit upsert) itself. The cost is that the same
/// miss repeats on every call until a sync runs.
pub struct Resolver<'a, S, P> {
    source: &'a S,
    store: &'a P,
}

impl<'a, S: RateSource, P: RateStore> Resolver<'a, S, P> {
    pub fn new(source: &'a S, store: &'a P) -> Self {
        Self { source, store }
    }

    /// Store lookup first; on a miss, the remote catalog. `None` when the
    /// abbreviation is unknown to both.
    pub async fn resolve_currency(&self, abbreviation: &str) -> Result<Option<Currency>> {
        if let Some(currency) = self.store.get_currency(abbreviation).await? {
            return Ok(Some(currency));
        }
        let mut catalog = self.source.available_currencies().await?;
        Ok(catalog.remove(abbreviation))
    }

    /// Same ordering for a rate. A remote "no rate published for that date"
    /// is a miss (`None`); a remote outage is an error.
    pub async fn resolve_rate(
        &self,
        currency: &Currency,
        on_date: NaiveDate,
    ) -> Result<Option<Rate>> {
        if let Some(rate) = self.store.get_rate(currency, on_date).await? {
            return Ok(Some(rate));
        }
        match self.source.rate(currency, Some(on_date)).await {
            Ok(rate) => Ok(Some(rate)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

//! One full refresh cycle: remote catalog and rate set into the store.

use std::time::Instant;

use tracing::{info, warn};

use crate::api::RateSource;
use crate::error::Result;
use crate::models::Currency;
use crate::store::RateStore;

/// Pulls the entire remote catalog and rate set and persists both.
///
/// Currencies are committed before any rate is fetched or written, because
/// rate rows reference currency ids; the store does not enforce that
/// ordering, this function does. A failure aborts the remaining steps and
/// leaves the batches already committed in place.
pub async fn refresh<S: RateSource, P: RateStore>(source: &S, store: &P) -> Result<()> {
    let mut step = Instant::now();

    let currencies: Vec<Currency> = source
        .available_currencies()
        .await?
        .into_values()
        .collect();
    info!(
        count = currencies.len(),
        elapsed_ms = step.elapsed().as_millis() as u64,
        "fetched currency catalog"
    );
    step = Instant::now();

    if currencies.is_empty() {
        warn!("remote catalog is empty, nothing to refresh");
        return Ok(());
    }
    store.upsert_currencies(&currencies).await?;
    info!(
        elapsed_ms = step.elapsed().as_millis() as u64,
        "currencies persisted"
    );
    step = Instant::now();

    let rates = source.all_rates().await?;
    info!(
        count = rates.len(),
        elapsed_ms = step.elapsed().as_millis() as u64,
        "fetched rate set"
    );

    // Observational only: the date span of what the remote handed back.
    let min_date = rates.iter().map(|r| r.date).min();
    let max_date = rates.iter().map(|r| r.date).max();
    if let (Some(min), Some(max)) = (min_date, max_date) {
        info!(%min, %max, "rate dates span");
    }

    if rates.is_empty() {
        warn!("remote returned no rates");
        return Ok(());
    }
    step = Instant::now();
    store.upsert_rates(&rates).await?;
    info!(
        elapsed_ms = step.elapsed().as_millis() as u64,
        "rates persisted"
    );

    Ok(())
}

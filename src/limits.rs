//! Day-over-day rate change detection.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use crate::api::RateSource;
use crate::error::Result;
use crate::models::Currency;
use crate::resolver::Resolver;
use crate::store::RateStore;

// One decimal digit, truncated toward zero. Exact decimal arithmetic so
// values near a .x5 boundary never misclassify.
fn truncated(rate: Decimal) -> Decimal {
    rate.trunc_with_scale(1)
}

/// Compares today's rate against yesterday's, ignoring fluctuations below
/// 0.1 local units.
///
/// Returns `Ok(None)` ("cannot determine") when either day's rate resolves
/// to absent, e.g. the first day a currency is tracked or a day with no
/// published rate. Remote failures propagate as errors.
pub async fn rate_changed<S: RateSource, P: RateStore>(
    resolver: &Resolver<'_, S, P>,
    currency: &Currency,
    today: NaiveDate,
) -> Result<Option<bool>> {
    let yesterday = today - Days::new(1);

    let today_rate = resolver.resolve_rate(currency, today).await?;
    let yesterday_rate = resolver.resolve_rate(currency, yesterday).await?;

    match (today_rate, yesterday_rate) {
        (Some(today_rate), Some(yesterday_rate)) => {
            Ok(Some(truncated(today_rate.rate) != truncated(yesterday_rate.rate)))
        }
        _ => Ok(None),
    }
}

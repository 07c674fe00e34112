use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// A currency known to the NBRB catalog.
///
/// `internal_id` is the identifier the bank assigns; it is `None` only for
/// records that never came from (or through) the remote catalog, and once
/// known it never changes. `abbreviation` is the natural key for lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    pub internal_id: Option<i64>,
    pub internal_code: Option<String>,
    pub abbreviation: String,
    pub name: String,
    pub name_bel: String,
    pub scale: Decimal,
    /// Opaque periodicity code from the catalog. Meaning undefined here;
    /// stored and exposed as-is.
    pub periodicity: i64,
    pub date_start: NaiveDateTime,
    pub date_end: NaiveDateTime,
}

/// One official daily quote: `rate` local units per `scale` units of the
/// currency identified by `currency_id`. At most one rate per currency per
/// calendar date is ever persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rate {
    pub currency_id: Option<i64>,
    pub date: NaiveDate,
    pub abbreviation: String,
    pub rate: Decimal,
}

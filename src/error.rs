//! Error kinds for the mirror core.

/// Failures the store and remote source surface to their callers.
///
/// A lookup that finds nothing is `Ok(None)` at the call site, not an error;
/// `NotFound` is reserved for the remote source explicitly reporting that a
/// requested record does not exist (e.g. a date with no published rate).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The store was used before connecting or after `close()`. Fatal for
    /// the current process; callers must not retry.
    #[error("store connection is closed")]
    Connection,

    /// Network failure or non-success HTTP status from the remote API.
    /// Surfaced as-is; no retry happens anywhere in this layer.
    #[error("remote source unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote source reported that the requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A value handed to a persistence write does not form a valid record
    /// (missing internal id, empty abbreviation, empty batch). Detected
    /// before any I/O.
    #[error("malformed entity: {0}")]
    MalformedEntity(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A remote payload or stored value that cannot be parsed into a record.
    #[error("malformed value: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::RemoteUnavailable(err.to_string())
    }
}

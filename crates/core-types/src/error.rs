use thiserror::Error;

/// The error taxonomy for everything between the venue and the normalized
/// records. Shared across crates so the cache and engine can propagate
/// fetch failures without re-wrapping them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network-level failure (timeout, connect, DNS). Retryable with backoff.
    #[error("Transient network error: {0}")]
    Transient(String),

    /// The venue rejected our credentials. Fatal for the session; never retried.
    #[error("Authentication rejected by venue: {0}")]
    Auth(String),

    /// A permanent venue-side error for this endpoint or parameter set.
    #[error("Venue error {code}: {message}")]
    Venue { code: i64, message: String },

    /// Some records failed normalization and were dropped. Non-fatal; the
    /// surviving records are still usable.
    #[error("{dropped} record(s) dropped during normalization")]
    PartialFetch { dropped: usize },

    /// The response body could not be decoded into the expected shape.
    #[error("Failed to decode venue response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether the fetcher is allowed to retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

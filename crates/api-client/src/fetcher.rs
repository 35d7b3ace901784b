//! The retrying adapter between the raw [`ExchangeClient`] and the rest of
//! the system. Transient failures are retried a bounded number of times
//! with exponential backoff; auth and venue errors surface immediately.
//! Everything that comes out of here is normalized.

use crate::normalize::{self, Normalized};
use crate::ExchangeClient;
use configuration::RetrySettings;
use core_types::{AccountSnapshot, FetchError, Order, Position, TimeRange, Trade};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub struct Fetcher {
    client: Arc<dyn ExchangeClient>,
    retry: RetrySettings,
}

impl Fetcher {
    pub fn new(client: Arc<dyn ExchangeClient>, retry: RetrySettings) -> Self {
        Self { client, retry }
    }

    pub async fn account_summary(&self) -> Result<AccountSnapshot, FetchError> {
        let raw = self
            .with_retry("account_summary", |c| async move {
                c.get_account_summary().await
            })
            .await?;
        normalize::account_snapshot(&raw)
    }

    pub async fn positions(&self) -> Result<Normalized<Position>, FetchError> {
        let raw = self
            .with_retry("positions", |c| async move { c.get_positions().await })
            .await?;
        Ok(self.report_drops("positions", normalize::positions(raw)))
    }

    pub async fn open_orders(&self) -> Result<Normalized<Order>, FetchError> {
        let raw = self
            .with_retry("open_orders", |c| async move { c.get_open_orders().await })
            .await?;
        Ok(self.report_drops("open_orders", normalize::orders(raw)))
    }

    pub async fn trade_history(
        &self,
        range: Option<TimeRange>,
    ) -> Result<Normalized<Trade>, FetchError> {
        let raw = self
            .with_retry("trade_history", move |c| async move {
                c.get_trade_history(range).await
            })
            .await?;
        Ok(self.report_drops("trade_history", normalize::trades(raw)))
    }

    fn report_drops<T>(&self, endpoint: &'static str, normalized: Normalized<T>) -> Normalized<T> {
        if normalized.dropped > 0 {
            tracing::warn!(
                endpoint,
                dropped = normalized.dropped,
                "dropped malformed records during normalization"
            );
        }
        normalized
    }

    /// Runs `call` with the configured retry policy. Only
    /// [`FetchError::Transient`] is retried; the backoff doubles on each
    /// attempt starting from `base_backoff_ms`.
    async fn with_retry<T, F, Fut>(&self, endpoint: &'static str, mut call: F) -> Result<T, FetchError>
    where
        F: FnMut(Arc<dyn ExchangeClient>) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match call(Arc::clone(&self.client)).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    // Doubling backoff, capped so a misconfigured retry
                    // budget cannot overflow the shift.
                    let delay = Duration::from_millis(
                        self.retry
                            .base_backoff_ms
                            .saturating_mul(1u64 << attempt.min(16)),
                    );
                    tracing::warn!(
                        endpoint,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient fetch failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responses::{RawAccountSummary, RawOrder, RawPosition, RawTrade};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails with a chosen error a fixed number of times, then succeeds
    /// with an empty position list.
    struct FlakyClient {
        failures: usize,
        error: FetchError,
        calls: AtomicUsize,
    }

    impl FlakyClient {
        fn new(failures: usize, error: FetchError) -> Self {
            Self {
                failures,
                error,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ExchangeClient for FlakyClient {
        async fn get_account_summary(&self) -> Result<RawAccountSummary, FetchError> {
            unimplemented!("not exercised")
        }

        async fn get_positions(&self) -> Result<Vec<RawPosition>, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(self.error.clone())
            } else {
                Ok(vec![])
            }
        }

        async fn get_open_orders(&self) -> Result<Vec<RawOrder>, FetchError> {
            unimplemented!("not exercised")
        }

        async fn get_trade_history(
            &self,
            _range: Option<TimeRange>,
        ) -> Result<Vec<RawTrade>, FetchError> {
            unimplemented!("not exercised")
        }
    }

    fn fast_retry() -> RetrySettings {
        RetrySettings {
            max_retries: 3,
            base_backoff_ms: 1,
        }
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let client = Arc::new(FlakyClient::new(
            2,
            FetchError::Transient("connection reset".to_string()),
        ));
        let fetcher = Fetcher::new(client.clone(), fast_retry());

        let out = fetcher.positions().await.unwrap();
        assert!(out.records.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn transient_errors_surface_after_retry_budget() {
        let client = Arc::new(FlakyClient::new(
            usize::MAX,
            FetchError::Transient("timeout".to_string()),
        ));
        let fetcher = Fetcher::new(client.clone(), fast_retry());

        let err = fetcher.positions().await.unwrap_err();
        assert!(matches!(err, FetchError::Transient(_)));
        // Initial attempt plus the full retry budget.
        assert_eq!(client.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn auth_errors_are_never_retried() {
        let client = Arc::new(FlakyClient::new(
            usize::MAX,
            FetchError::Auth("bad key".to_string()),
        ));
        let fetcher = Fetcher::new(client.clone(), fast_retry());

        let err = fetcher.positions().await.unwrap_err();
        assert!(matches!(err, FetchError::Auth(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn venue_errors_are_never_retried() {
        let client = Arc::new(FlakyClient::new(
            usize::MAX,
            FetchError::Venue {
                code: -1121,
                message: "Invalid symbol.".to_string(),
            },
        ));
        let fetcher = Fetcher::new(client.clone(), fast_retry());

        let err = fetcher.positions().await.unwrap_err();
        assert!(matches!(err, FetchError::Venue { .. }));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}

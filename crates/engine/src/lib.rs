//! # Meridian Dashboard Engine
//!
//! The facade the presentation layer talks to: one call per analytics view,
//! each returning a typed result or a typed error. Internally it wires the
//! cache layer in front of the retrying fetcher and hands filtered records
//! to the metrics engine.
//!
//! Failures stay scoped to the view that hit them. A dead trade-history
//! endpoint renders a warning on that section; positions and the account
//! summary keep working, because every view runs its own fetch path against
//! its own cache key.

use analytics::{AnalyticsEngine, PerformanceReport, top_losers, top_winners};
use api_client::{ExchangeClient, Fetcher, Normalized};
use cache::{Cache, CacheKey, Endpoint};
use configuration::Settings;
use core_types::{AccountSnapshot, Order, PnlPoint, Position, TimeRange, Trade};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub mod error;
pub mod filter;

pub use error::EngineError;
pub use filter::{DateRange, OrderFilter, TradeFilter, filter_orders, filter_trades};

/// Everything the performance view renders: the metrics bundle, the PNL
/// curve behind the charts, and the ranked winners/losers among open
/// positions.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub report: PerformanceReport,
    pub curve: Vec<PnlPoint>,
    pub winners: Vec<Position>,
    pub losers: Vec<Position>,
}

/// The central orchestrator: cache in front, fetcher behind, metrics on
/// demand. One instance serves the whole dashboard; it is cheap to share
/// because all mutable state lives inside the caches.
pub struct DashboardEngine {
    fetcher: Fetcher,
    analytics: AnalyticsEngine,
    settings: Settings,

    // One cache per endpoint class, so unrelated views refresh
    // concurrently and a failure never evicts a neighbor's data.
    account: Cache<AccountSnapshot>,
    positions: Cache<Normalized<Position>>,
    orders: Cache<Normalized<Order>>,
    trades: Cache<Normalized<Trade>>,
}

impl DashboardEngine {
    pub fn new(client: Arc<dyn ExchangeClient>, settings: Settings) -> Self {
        Self {
            fetcher: Fetcher::new(client, settings.retry.clone()),
            analytics: AnalyticsEngine::new(settings.reporting_timezone),
            account: Cache::new(),
            positions: Cache::new(),
            orders: Cache::new(),
            trades: Cache::new(),
            settings,
        }
    }

    /// Current balances and margin state.
    pub async fn account_summary(&self) -> Result<AccountSnapshot, EngineError> {
        let ttl = Duration::from_secs(self.settings.cache.account_ttl_secs);
        let snapshot = self
            .account
            .get_or_fetch(CacheKey::bare(Endpoint::AccountSummary), ttl, || {
                self.fetcher.account_summary()
            })
            .await?;
        Ok(snapshot)
    }

    /// All open positions (nonzero size), with unknown mark prices intact.
    pub async fn positions(&self) -> Result<Normalized<Position>, EngineError> {
        let ttl = Duration::from_secs(self.settings.cache.positions_ttl_secs);
        let positions = self
            .positions
            .get_or_fetch(CacheKey::bare(Endpoint::Positions), ttl, || {
                self.fetcher.positions()
            })
            .await?;
        Ok(positions)
    }

    /// Open orders, filtered by symbol/type/side.
    pub async fn open_orders(&self, filter: &OrderFilter) -> Result<Normalized<Order>, EngineError> {
        let ttl = Duration::from_secs(self.settings.cache.orders_ttl_secs);
        let orders = self
            .orders
            .get_or_fetch(CacheKey::bare(Endpoint::OpenOrders), ttl, || {
                self.fetcher.open_orders()
            })
            .await?;
        Ok(Normalized {
            records: filter_orders(orders.records, filter),
            dropped: orders.dropped,
        })
    }

    /// Executed trades matching the filter, newest state of the venue's
    /// history. The upstream request window follows the filter's date
    /// range; symbol and side predicates apply after the cache.
    pub async fn trade_history(&self, filter: &TradeFilter) -> Result<Normalized<Trade>, EngineError> {
        // Unsatisfiable is well-formed: nothing can match, skip the fetch.
        if !filter.is_satisfiable() {
            return Ok(Normalized {
                records: Vec::new(),
                dropped: 0,
            });
        }

        let range = filter
            .range
            .and_then(|r| r.to_time_range(self.settings.reporting_timezone));
        let ttl = Duration::from_secs(self.settings.cache.trades_ttl_secs);
        let trades = self
            .trades
            .get_or_fetch(trade_history_key(range), ttl, || {
                self.fetcher.trade_history(range)
            })
            .await?;

        Ok(Normalized {
            records: filter_trades(trades.records, filter, self.settings.reporting_timezone),
            dropped: trades.dropped,
        })
    }

    /// The analytics view: metrics bundle, PNL curve, and ranked positions.
    ///
    /// Position ranking opts into serve-last-good: a failed position
    /// refresh degrades the ranking to stale (or empty) data instead of
    /// taking down the trade-derived metrics with it.
    pub async fn performance(&self, filter: &TradeFilter) -> Result<PerformanceSummary, EngineError> {
        let trades = self.trade_history(filter).await?;

        let report = self.analytics.calculate(&trades.records);
        let curve = self.analytics.pnl_curve(&trades.records);

        let ttl = Duration::from_secs(self.settings.cache.positions_ttl_secs);
        let positions = self
            .positions
            .get_or_fetch_with_fallback(CacheKey::bare(Endpoint::Positions), ttl, || {
                self.fetcher.positions()
            })
            .await
            .map(|n| n.records)
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "position ranking unavailable for this report");
                Vec::new()
            });

        Ok(PerformanceSummary {
            report,
            curve,
            winners: top_winners(&positions, self.settings.top_n),
            losers: top_losers(&positions, self.settings.top_n),
        })
    }

    /// Drops every cached entry, forcing the next access on each view to
    /// refetch.
    pub async fn invalidate_all(&self) {
        self.account.invalidate_all().await;
        self.positions.invalidate_all().await;
        self.orders.invalidate_all().await;
        self.trades.invalidate_all().await;
    }
}

fn trade_history_key(range: Option<TimeRange>) -> CacheKey {
    match range {
        Some(r) => CacheKey::new(
            Endpoint::TradeHistory,
            format!(
                "start={}&end={}",
                r.start.timestamp_millis(),
                r.end.timestamp_millis()
            ),
        ),
        None => CacheKey::bare(Endpoint::TradeHistory),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::SimClient;
    use api_client::responses::{RawAccountSummary, RawOrder, RawPosition, RawTrade};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use core_types::FetchError;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Delegates to [`SimClient`] while counting upstream calls per
    /// endpoint.
    struct CountingClient {
        inner: SimClient,
        trade_calls: AtomicUsize,
        position_calls: AtomicUsize,
    }

    impl CountingClient {
        fn new() -> Self {
            Self {
                inner: SimClient::new(),
                trade_calls: AtomicUsize::new(0),
                position_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ExchangeClient for CountingClient {
        async fn get_account_summary(&self) -> Result<RawAccountSummary, FetchError> {
            self.inner.get_account_summary().await
        }

        async fn get_positions(&self) -> Result<Vec<RawPosition>, FetchError> {
            self.position_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_positions().await
        }

        async fn get_open_orders(&self) -> Result<Vec<RawOrder>, FetchError> {
            self.inner.get_open_orders().await
        }

        async fn get_trade_history(
            &self,
            range: Option<TimeRange>,
        ) -> Result<Vec<RawTrade>, FetchError> {
            self.trade_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_trade_history(range).await
        }
    }

    fn sim_engine() -> (DashboardEngine, Arc<CountingClient>) {
        let client = Arc::new(CountingClient::new());
        let engine = DashboardEngine::new(client.clone(), Settings::default());
        (engine, client)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[tokio::test]
    async fn views_return_sim_data_end_to_end() {
        let (engine, _) = sim_engine();

        let summary = engine.account_summary().await.unwrap();
        assert_eq!(summary.balance, dec!(10000.00));

        let positions = engine.positions().await.unwrap();
        assert_eq!(positions.records.len(), 3);

        let trades = engine.trade_history(&TradeFilter::default()).await.unwrap();
        assert_eq!(trades.records.len(), 5);
    }

    #[tokio::test]
    async fn single_day_filter_returns_that_day_only() {
        let (engine, _) = sim_engine();
        let filter = TradeFilter {
            range: Some(DateRange::single_day(day(5))),
            ..Default::default()
        };
        let trades = engine.trade_history(&filter).await.unwrap();
        assert_eq!(trades.records.len(), 1);
        assert_eq!(trades.records[0].symbol, "BTCUSDT");
        assert_eq!(trades.records[0].realized_pnl, dec!(5.00));
    }

    #[tokio::test]
    async fn unsatisfiable_range_skips_upstream_entirely() {
        let (engine, client) = sim_engine();
        let filter = TradeFilter {
            range: Some(DateRange::new(day(9), day(5))),
            ..Default::default()
        };
        let trades = engine.trade_history(&filter).await.unwrap();
        assert!(trades.records.is_empty());
        assert_eq!(client.trade_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_views_within_ttl_share_one_fetch() {
        let (engine, client) = sim_engine();

        engine.trade_history(&TradeFilter::default()).await.unwrap();
        engine.performance(&TradeFilter::default()).await.unwrap();
        assert_eq!(client.trade_calls.load(Ordering::SeqCst), 1);

        // Differently parameterized queries get their own cache entry.
        let filtered = TradeFilter {
            range: Some(DateRange::single_day(day(4))),
            ..Default::default()
        };
        engine.trade_history(&filtered).await.unwrap();
        assert_eq!(client.trade_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn performance_bundle_is_consistent() {
        let (engine, _) = sim_engine();
        let summary = engine.performance(&TradeFilter::default()).await.unwrap();

        // Sim data: +10, -3, +5, +12.5, -7.25 over three days.
        assert_eq!(summary.report.total_trades, 5);
        assert_eq!(summary.report.total_net_pnl, dec!(17.25));
        assert_eq!(
            summary.curve.last().unwrap().cumulative_pnl,
            summary.report.total_net_pnl
        );
        assert_eq!(summary.winners[0].symbol, "BTCUSDT");
        assert_eq!(summary.losers[0].symbol, "ETHUSDT");
    }

    #[tokio::test]
    async fn symbol_filter_narrows_performance_inputs() {
        let (engine, _) = sim_engine();
        let filter = TradeFilter {
            symbol: Some("ETHUSDT".to_string()),
            ..Default::default()
        };
        let summary = engine.performance(&filter).await.unwrap();
        assert_eq!(summary.report.total_trades, 2);
        assert_eq!(summary.report.total_net_pnl, dec!(-10.25));
        assert_eq!(summary.report.win_rate, Decimal::ZERO);
    }

    #[tokio::test]
    async fn invalidate_all_forces_refetch() {
        let (engine, client) = sim_engine();
        engine.positions().await.unwrap();
        engine.invalidate_all().await;
        engine.positions().await.unwrap();
        assert_eq!(client.position_calls.load(Ordering::SeqCst), 2);
    }
}

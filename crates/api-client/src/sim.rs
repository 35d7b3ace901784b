//! A deterministic, in-process backend for demos and tests.
//!
//! The three dashboard variants of old (mainnet, testnet, mock) collapse
//! into one engine parameterized by an [`ExchangeClient`]; `SimClient` is
//! the mock leg. It answers every call instantly with a fixed data set, so
//! two runs always render the same dashboard.

use crate::responses::{RawAccountSummary, RawOrder, RawPosition, RawTrade};
use crate::ExchangeClient;
use async_trait::async_trait;
use core_types::{FetchError, TimeRange};

#[derive(Debug, Default, Clone)]
pub struct SimClient;

impl SimClient {
    pub fn new() -> Self {
        Self
    }
}

fn raw_trade(symbol: &str, side: &str, price: &str, qty: &str, pnl: &str, time: i64) -> RawTrade {
    RawTrade {
        symbol: symbol.to_string(),
        side: side.to_string(),
        price: price.to_string(),
        qty: qty.to_string(),
        realized_pnl: pnl.to_string(),
        commission: "0.25".to_string(),
        time,
    }
}

// Millisecond timestamps for the simulated session, 2025-01-04..06 UTC.
const JAN_4: i64 = 1_735_948_800_000;
const JAN_5: i64 = JAN_4 + 86_400_000;
const JAN_6: i64 = JAN_5 + 86_400_000;

#[async_trait]
impl ExchangeClient for SimClient {
    async fn get_account_summary(&self) -> Result<RawAccountSummary, FetchError> {
        Ok(RawAccountSummary {
            balance: "10000.00".to_string(),
            total_unrealized_profit: "389.50".to_string(),
            total_margin_balance: "10389.50".to_string(),
            available_balance: "8200.00".to_string(),
        })
    }

    async fn get_positions(&self) -> Result<Vec<RawPosition>, FetchError> {
        Ok(vec![
            RawPosition {
                symbol: "BTCUSDT".to_string(),
                position_amt: "0.5".to_string(),
                entry_price: "94000".to_string(),
                mark_price: Some("94800".to_string()),
                un_realized_profit: "400.00".to_string(),
            },
            RawPosition {
                symbol: "ETHUSDT".to_string(),
                position_amt: "-2".to_string(),
                entry_price: "3400".to_string(),
                // The venue sometimes omits this; the dashboard must show
                // "unknown", not zero.
                mark_price: None,
                un_realized_profit: "-55.50".to_string(),
            },
            RawPosition {
                symbol: "SOLUSDT".to_string(),
                position_amt: "10".to_string(),
                entry_price: "210".to_string(),
                mark_price: Some("214.50".to_string()),
                un_realized_profit: "45.00".to_string(),
            },
            // Flat position, filtered out by normalization.
            RawPosition {
                symbol: "DOGEUSDT".to_string(),
                position_amt: "0".to_string(),
                entry_price: "0".to_string(),
                mark_price: Some("0.32".to_string()),
                un_realized_profit: "0".to_string(),
            },
        ])
    }

    async fn get_open_orders(&self) -> Result<Vec<RawOrder>, FetchError> {
        Ok(vec![
            RawOrder {
                symbol: "BTCUSDT".to_string(),
                price: "92000".to_string(),
                orig_qty: "0.25".to_string(),
                order_type: "LIMIT".to_string(),
                side: "BUY".to_string(),
                status: "NEW".to_string(),
            },
            RawOrder {
                symbol: "SOLUSDT".to_string(),
                price: "230".to_string(),
                orig_qty: "10".to_string(),
                order_type: "TAKE_PROFIT_MARKET".to_string(),
                side: "SELL".to_string(),
                status: "NEW".to_string(),
            },
        ])
    }

    async fn get_trade_history(
        &self,
        range: Option<TimeRange>,
    ) -> Result<Vec<RawTrade>, FetchError> {
        let trades = vec![
            raw_trade("BTCUSDT", "SELL", "93500", "0.1", "10.00", JAN_4 + 3_600_000),
            raw_trade("ETHUSDT", "BUY", "3350", "1", "-3.00", JAN_4 + 7_200_000),
            raw_trade("BTCUSDT", "SELL", "94100", "0.05", "5.00", JAN_5 + 3_600_000),
            raw_trade("SOLUSDT", "BUY", "208", "5", "12.50", JAN_6 + 1_800_000),
            raw_trade("ETHUSDT", "SELL", "3420", "1", "-7.25", JAN_6 + 5_400_000),
        ];

        // The live venue applies the window server-side; the sim mirrors it.
        Ok(match range {
            Some(range) => trades
                .into_iter()
                .filter(|t| {
                    t.time >= range.start.timestamp_millis()
                        && t.time <= range.end.timestamp_millis()
                })
                .collect(),
            None => trades,
        })
    }
}

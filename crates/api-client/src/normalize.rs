//! Normalization of venue-shaped records into the stable internal types.
//!
//! The rules, applied uniformly:
//! - a required field that fails to parse drops the whole record and is
//!   counted, never defaulted;
//! - an optional field that fails to parse becomes an explicit unknown
//!   (`None`), never zero;
//! - zero-size positions are filtered out, since a position record is only
//!   meaningful with a nonzero signed size.

use crate::responses::{RawAccountSummary, RawOrder, RawPosition, RawTrade};
use chrono::{DateTime, TimeZone, Utc};
use core_types::{AccountSnapshot, FetchError, Order, OrderSide, Position, Trade};
use rust_decimal::Decimal;
use std::str::FromStr;

/// The outcome of normalizing a batch of venue records: the records that
/// survived plus the count of those dropped for failing a required parse.
///
/// A nonzero `dropped` is a partial fetch, not a failure; callers that
/// cannot tolerate missing records can tighten it via
/// [`Normalized::into_strict`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub dropped: usize,
}

impl<T> Normalized<T> {
    /// Converts a partial result into an error carrying the dropped count.
    pub fn into_strict(self) -> Result<Vec<T>, FetchError> {
        if self.dropped > 0 {
            Err(FetchError::PartialFetch {
                dropped: self.dropped,
            })
        } else {
            Ok(self.records)
        }
    }
}

fn required(s: &str) -> Option<Decimal> {
    Decimal::from_str(s).ok()
}

fn optional(s: Option<&str>) -> Option<Decimal> {
    s.and_then(|v| Decimal::from_str(v).ok())
}

fn millis(t: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(t).single()
}

/// The account summary is a single record: any required parse failure fails
/// the whole snapshot rather than yielding a partially-zeroed one.
pub fn account_snapshot(raw: &RawAccountSummary) -> Result<AccountSnapshot, FetchError> {
    let field = |name: &str, value: &str| {
        required(value).ok_or_else(|| {
            FetchError::Decode(format!("account summary field '{name}' is not a decimal: {value:?}"))
        })
    };

    Ok(AccountSnapshot {
        balance: field("balance", &raw.balance)?,
        unrealized_pnl: field("totalUnrealizedProfit", &raw.total_unrealized_profit)?,
        margin_balance: field("totalMarginBalance", &raw.total_margin_balance)?,
        available_balance: field("availableBalance", &raw.available_balance)?,
    })
}

pub fn positions(raw: Vec<RawPosition>) -> Normalized<Position> {
    let mut records = Vec::with_capacity(raw.len());
    let mut dropped = 0;

    for pos in raw {
        let (Some(size), Some(entry_price), Some(unrealized_pnl)) = (
            required(&pos.position_amt),
            required(&pos.entry_price),
            required(&pos.un_realized_profit),
        ) else {
            dropped += 1;
            continue;
        };

        // Flat positions are noise, not data. This is a filtering rule, so
        // it does not count toward `dropped`.
        if size.is_zero() {
            continue;
        }

        records.push(Position {
            symbol: pos.symbol,
            size,
            entry_price,
            mark_price: optional(pos.mark_price.as_deref()),
            unrealized_pnl,
        });
    }

    Normalized { records, dropped }
}

pub fn orders(raw: Vec<RawOrder>) -> Normalized<Order> {
    let mut records = Vec::with_capacity(raw.len());
    let mut dropped = 0;

    for order in raw {
        let (Some(price), Some(quantity), Some(side)) = (
            required(&order.price),
            required(&order.orig_qty),
            OrderSide::from_venue(&order.side),
        ) else {
            dropped += 1;
            continue;
        };

        records.push(Order {
            symbol: order.symbol,
            price,
            quantity,
            order_type: order.order_type.into(),
            side,
            status: order.status.into(),
        });
    }

    Normalized { records, dropped }
}

pub fn trades(raw: Vec<RawTrade>) -> Normalized<Trade> {
    let mut records = Vec::with_capacity(raw.len());
    let mut dropped = 0;

    for trade in raw {
        let (Some(price), Some(quantity), Some(realized_pnl), Some(commission), Some(side), Some(timestamp)) = (
            required(&trade.price),
            required(&trade.qty),
            required(&trade.realized_pnl),
            required(&trade.commission),
            OrderSide::from_venue(&trade.side),
            millis(trade.time),
        ) else {
            dropped += 1;
            continue;
        };

        records.push(Trade {
            symbol: trade.symbol,
            side,
            price,
            quantity,
            realized_pnl,
            commission,
            timestamp,
        });
    }

    Normalized { records, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{OrderStatus, OrderType};
    use rust_decimal_macros::dec;

    fn raw_position(symbol: &str, amt: &str, mark: Option<&str>) -> RawPosition {
        RawPosition {
            symbol: symbol.to_string(),
            position_amt: amt.to_string(),
            entry_price: "100.0".to_string(),
            mark_price: mark.map(str::to_string),
            un_realized_profit: "1.5".to_string(),
        }
    }

    #[test]
    fn zero_size_positions_are_filtered_not_counted() {
        let out = positions(vec![
            raw_position("BTCUSDT", "0.5", Some("101.0")),
            raw_position("ETHUSDT", "0", Some("101.0")),
        ]);
        assert_eq!(out.dropped, 0);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].symbol, "BTCUSDT");
    }

    #[test]
    fn absent_or_garbled_mark_price_becomes_unknown() {
        let out = positions(vec![
            raw_position("BTCUSDT", "1", None),
            raw_position("ETHUSDT", "1", Some("not-a-number")),
            raw_position("SOLUSDT", "1", Some("42.5")),
        ]);
        assert_eq!(out.dropped, 0);
        assert_eq!(out.records[0].mark_price, None);
        assert_eq!(out.records[1].mark_price, None);
        assert_eq!(out.records[2].mark_price, Some(dec!(42.5)));
    }

    #[test]
    fn required_parse_failure_drops_record_and_counts() {
        let out = positions(vec![
            raw_position("BTCUSDT", "garbage", Some("1")),
            raw_position("ETHUSDT", "2", Some("1")),
        ]);
        assert_eq!(out.dropped, 1);
        assert_eq!(out.records.len(), 1);
    }

    #[test]
    fn strict_mode_surfaces_partial_fetch() {
        let out = positions(vec![raw_position("BTCUSDT", "garbage", None)]);
        assert_eq!(
            out.into_strict(),
            Err(FetchError::PartialFetch { dropped: 1 })
        );

        let clean = positions(vec![raw_position("BTCUSDT", "1", None)]);
        assert_eq!(clean.into_strict().unwrap().len(), 1);
    }

    #[test]
    fn unknown_order_type_and_status_pass_through() {
        let out = orders(vec![RawOrder {
            symbol: "BTCUSDT".to_string(),
            price: "95000".to_string(),
            orig_qty: "0.01".to_string(),
            order_type: "LIQUIDATION".to_string(),
            side: "SELL".to_string(),
            status: "PENDING_NEW".to_string(),
        }]);
        assert_eq!(out.dropped, 0);
        assert_eq!(
            out.records[0].order_type,
            OrderType::Other("LIQUIDATION".to_string())
        );
        assert_eq!(
            out.records[0].status,
            OrderStatus::Other("PENDING_NEW".to_string())
        );
    }

    #[test]
    fn unknown_side_drops_the_record() {
        let out = orders(vec![RawOrder {
            symbol: "BTCUSDT".to_string(),
            price: "95000".to_string(),
            orig_qty: "0.01".to_string(),
            order_type: "LIMIT".to_string(),
            side: "BOTH".to_string(),
            status: "NEW".to_string(),
        }]);
        assert_eq!(out.dropped, 1);
        assert!(out.records.is_empty());
    }

    #[test]
    fn trade_timestamps_normalize_from_millis() {
        let out = trades(vec![RawTrade {
            symbol: "BTCUSDT".to_string(),
            side: "BUY".to_string(),
            price: "95000".to_string(),
            qty: "0.01".to_string(),
            realized_pnl: "-3.2".to_string(),
            commission: "0.38".to_string(),
            time: 1_736_035_200_000, // 2025-01-05T00:00:00Z
        }]);
        assert_eq!(out.dropped, 0);
        let trade = &out.records[0];
        assert_eq!(trade.timestamp.to_rfc3339(), "2025-01-05T00:00:00+00:00");
        assert_eq!(trade.realized_pnl, dec!(-3.2));
    }

    #[test]
    fn garbled_account_summary_fails_whole_snapshot() {
        let raw = RawAccountSummary {
            balance: "1000.0".to_string(),
            total_unrealized_profit: "??".to_string(),
            total_margin_balance: "1010.0".to_string(),
            available_balance: "900.0".to_string(),
        };
        assert!(matches!(
            account_snapshot(&raw),
            Err(FetchError::Decode(_))
        ));
    }
}

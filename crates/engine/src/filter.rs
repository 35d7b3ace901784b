//! Symbol/date/type predicates applied to normalized records before they
//! reach the metrics engine.
//!
//! Semantics: an empty value on any dimension means "no restriction", not
//! "match nothing". Date ranges are inclusive on both ends, compared at day
//! granularity in the reporting time zone. A range with `start > end` is
//! well-formed but unsatisfiable: it yields an empty result, never an error.

use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use core_types::{Order, OrderSide, OrderType, TimeRange, Trade};
use std::collections::HashSet;

/// An inclusive calendar-day range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    pub fn is_satisfiable(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Converts the day range into the absolute window to request upstream:
    /// midnight at the start of `start` through the last millisecond of
    /// `end`, both interpreted in the reporting time zone.
    pub fn to_time_range(&self, tz: Tz) -> Option<TimeRange> {
        if !self.is_satisfiable() {
            return None;
        }
        let start = tz
            .from_local_datetime(&self.start.and_hms_opt(0, 0, 0)?)
            .earliest()?;
        let end = tz
            .from_local_datetime(&self.end.and_hms_milli_opt(23, 59, 59, 999)?)
            .latest()?;
        Some(TimeRange {
            start: start.with_timezone(&Utc),
            end: end.with_timezone(&Utc),
        })
    }
}

fn symbol_matches(wanted: Option<&str>, symbol: &str) -> bool {
    match wanted {
        // "all" survives from the dashboard's symbol dropdown.
        Some(s) if !s.is_empty() && !s.eq_ignore_ascii_case("all") => s == symbol,
        _ => true,
    }
}

fn set_matches<T: Eq + std::hash::Hash>(wanted: Option<&HashSet<T>>, value: &T) -> bool {
    match wanted {
        Some(set) if !set.is_empty() => set.contains(value),
        _ => true,
    }
}

/// Predicates over executed trades.
#[derive(Debug, Clone, Default)]
pub struct TradeFilter {
    pub symbol: Option<String>,
    pub range: Option<DateRange>,
    pub sides: Option<HashSet<OrderSide>>,
}

impl TradeFilter {
    /// False only for a `start > end` range, which matches nothing.
    pub fn is_satisfiable(&self) -> bool {
        self.range.is_none_or(|r| r.is_satisfiable())
    }

    pub fn matches(&self, trade: &Trade, tz: Tz) -> bool {
        if !symbol_matches(self.symbol.as_deref(), &trade.symbol) {
            return false;
        }
        if let Some(range) = &self.range {
            let day = trade.timestamp.with_timezone(&tz).date_naive();
            if !range.contains(day) {
                return false;
            }
        }
        set_matches(self.sides.as_ref(), &trade.side)
    }
}

/// Predicates over open orders. Orders carry no timestamp, so there is no
/// date dimension here.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub symbol: Option<String>,
    pub types: Option<HashSet<OrderType>>,
    pub sides: Option<HashSet<OrderSide>>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        symbol_matches(self.symbol.as_deref(), &order.symbol)
            && set_matches(self.types.as_ref(), &order.order_type)
            && set_matches(self.sides.as_ref(), &order.side)
    }
}

pub fn filter_trades(trades: Vec<Trade>, filter: &TradeFilter, tz: Tz) -> Vec<Trade> {
    if !filter.is_satisfiable() {
        return Vec::new();
    }
    trades
        .into_iter()
        .filter(|t| filter.matches(t, tz))
        .collect()
}

pub fn filter_orders(orders: Vec<Order>, filter: &OrderFilter) -> Vec<Order> {
    orders.into_iter().filter(|o| filter.matches(o)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn trade(symbol: &str, side: OrderSide, day: u32, hour: u32) -> Trade {
        Trade {
            symbol: symbol.to_string(),
            side,
            price: dec!(100),
            quantity: dec!(1),
            realized_pnl: dec!(1),
            commission: dec!(0.1),
            timestamp: Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn empty_filter_restricts_nothing() {
        let trades = vec![
            trade("BTCUSDT", OrderSide::Buy, 4, 1),
            trade("ETHUSDT", OrderSide::Sell, 5, 2),
        ];
        let out = filter_trades(trades.clone(), &TradeFilter::default(), chrono_tz::UTC);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn single_day_range_is_inclusive() {
        let trades = vec![
            trade("BTCUSDT", OrderSide::Buy, 4, 23),
            trade("BTCUSDT", OrderSide::Buy, 5, 0),
            trade("BTCUSDT", OrderSide::Buy, 5, 23),
            trade("BTCUSDT", OrderSide::Buy, 6, 0),
        ];
        let filter = TradeFilter {
            range: Some(DateRange::single_day(day(5))),
            ..Default::default()
        };
        let out = filter_trades(trades, &filter, chrono_tz::UTC);
        assert_eq!(out.len(), 2);
        assert!(out
            .iter()
            .all(|t| t.timestamp.date_naive() == day(5)));
    }

    #[test]
    fn inverted_range_yields_empty_not_error() {
        let trades = vec![trade("BTCUSDT", OrderSide::Buy, 5, 1)];
        let filter = TradeFilter {
            range: Some(DateRange::new(day(9), day(5))),
            ..Default::default()
        };
        assert!(filter_trades(trades, &filter, chrono_tz::UTC).is_empty());
    }

    #[test]
    fn symbol_all_and_empty_mean_unrestricted() {
        let trades = vec![
            trade("BTCUSDT", OrderSide::Buy, 5, 1),
            trade("ETHUSDT", OrderSide::Buy, 5, 2),
        ];
        for wildcard in ["all", "ALL", ""] {
            let filter = TradeFilter {
                symbol: Some(wildcard.to_string()),
                ..Default::default()
            };
            assert_eq!(filter_trades(trades.clone(), &filter, chrono_tz::UTC).len(), 2);
        }

        let exact = TradeFilter {
            symbol: Some("ETHUSDT".to_string()),
            ..Default::default()
        };
        assert_eq!(filter_trades(trades, &exact, chrono_tz::UTC).len(), 1);
    }

    #[test]
    fn side_membership_filters_and_empty_set_does_not() {
        let trades = vec![
            trade("BTCUSDT", OrderSide::Buy, 5, 1),
            trade("BTCUSDT", OrderSide::Sell, 5, 2),
        ];
        let buys_only = TradeFilter {
            sides: Some([OrderSide::Buy].into_iter().collect()),
            ..Default::default()
        };
        assert_eq!(filter_trades(trades.clone(), &buys_only, chrono_tz::UTC).len(), 1);

        let empty_set = TradeFilter {
            sides: Some(HashSet::new()),
            ..Default::default()
        };
        assert_eq!(filter_trades(trades, &empty_set, chrono_tz::UTC).len(), 2);
    }

    #[test]
    fn day_membership_follows_reporting_timezone() {
        // 20:00 UTC on Jan 5 is Jan 6 in Kolkata.
        let trades = vec![trade("BTCUSDT", OrderSide::Buy, 5, 20)];
        let filter = TradeFilter {
            range: Some(DateRange::single_day(day(6))),
            ..Default::default()
        };
        assert!(filter_trades(trades.clone(), &filter, chrono_tz::UTC).is_empty());
        assert_eq!(
            filter_trades(trades, &filter, chrono_tz::Asia::Kolkata).len(),
            1
        );
    }

    #[test]
    fn date_range_converts_to_full_day_window() {
        let range = DateRange::single_day(day(5)).to_time_range(chrono_tz::UTC).unwrap();
        assert_eq!(range.start.to_rfc3339(), "2025-01-05T00:00:00+00:00");
        assert_eq!(range.end.timestamp_millis(), range.start.timestamp_millis() + 86_399_999);

        assert_eq!(DateRange::new(day(9), day(5)).to_time_range(chrono_tz::UTC), None);
    }
}

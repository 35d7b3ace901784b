use crate::enums::{OrderSide, OrderStatus, OrderType};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A point-in-time view of the account's balances, as reported by the venue.
///
/// Values are passed through as-is; this system does not enforce invariants
/// between them (e.g. margin balance vs. available balance is the venue's
/// business). A snapshot is immutable and superseded wholesale by the next
/// fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub balance: Decimal,
    pub unrealized_pnl: Decimal,
    pub margin_balance: Decimal,
    pub available_balance: Decimal,
}

/// An open position. Recomputed wholesale on every fetch; the only identity
/// it carries across fetches is its symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Signed size. Nonzero by construction: flat positions are filtered out
    /// during normalization.
    pub size: Decimal,
    pub entry_price: Decimal,
    /// `None` when the venue did not report a usable mark price. Explicitly
    /// not defaulted to zero, which would silently corrupt PNL math.
    pub mark_price: Option<Decimal>,
    pub unrealized_pnl: Decimal,
}

/// An open order. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub symbol: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub order_type: OrderType,
    pub side: OrderSide,
    pub status: OrderStatus,
}

/// An executed trade: an immutable historical fact. Once fetched it is only
/// ever filtered and aggregated, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub side: OrderSide,
    pub price: Decimal,
    pub quantity: Decimal,
    pub realized_pnl: Decimal,
    pub commission: Decimal,
    /// Millisecond precision at the source, normalized to UTC.
    pub timestamp: DateTime<Utc>,
}

/// One day of the PNL curve, in the configured reporting time zone.
/// Derived on demand from a trade set; never stored independently of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlPoint {
    pub date: NaiveDate,
    pub daily_pnl: Decimal,
    pub cumulative_pnl: Decimal,
}

/// An absolute time window passed upstream to the venue (e.g. for trade
/// history). Both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

use serde::{Deserialize, Serialize};

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.
//
// Numeric fields deliberately stay `String` here: the venue reports decimals
// as text, and parsing them is the normalizer's job so that a single bad
// field drops one record instead of failing the whole response.

/// One asset's wallet balance from `GET /fapi/v2/balance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBalance {
    pub asset: String,
    pub balance: String,
}

/// The account-wide margin fields from `GET /fapi/v2/account`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccountInfo {
    pub total_unrealized_profit: String,
    pub total_margin_balance: String,
    pub available_balance: String,
}

/// The merged account summary the [`crate::ExchangeClient`] trait exposes:
/// wallet balance plus margin state, still venue-shaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccountSummary {
    pub balance: String,
    pub total_unrealized_profit: String,
    pub total_margin_balance: String,
    pub available_balance: String,
}

/// A single position from `GET /fapi/v2/positionRisk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPosition {
    pub symbol: String,
    pub position_amt: String,
    pub entry_price: String,
    /// Optional on the wire. An absent or unparsable mark price normalizes
    /// to "unknown", never to zero.
    #[serde(default)]
    pub mark_price: Option<String>,
    pub un_realized_profit: String,
}

/// A single open order from `GET /fapi/v1/openOrders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    pub symbol: String,
    pub price: String,
    pub orig_qty: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub side: String,
    pub status: String,
}

/// A single executed trade from `GET /fapi/v1/userTrades`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrade {
    pub symbol: String,
    pub side: String,
    pub price: String,
    pub qty: String,
    pub realized_pnl: String,
    pub commission: String,
    /// Milliseconds since the Unix epoch.
    pub time: i64,
}

/// Represents an error response body from the venue.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueErrorBody {
    pub code: i64,
    pub msg: String,
}
